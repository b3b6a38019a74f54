//! Building and describing the persistent domain model.
//!
//! Declarations ([`decl`]) are collected into definitions ([`def`]), which
//! module hooks may edit, and are then resolved by the [`Builder`] into an
//! immutable [`DomainModel`].

mod builder;
pub use builder::{AutoGenerics, Builder};

pub mod decl;

pub mod def;

pub mod model;
pub use model::DomainModel;

mod module;
pub use module::Module;

pub mod name;
pub use name::{NameBuilder, NamingConvention};

pub mod stored;
pub use stored::StoredDomainModel;

mod verify;
