mod config;
pub use config::{DomainConfig, SequenceSettings};

pub mod domain;
pub use domain::Domain;

mod key;
pub use key::Key;

pub mod key_generator;
pub use key_generator::KeyGenerator;

pub use keel_core::schema::{self, decl, def, model, stored};
pub use keel_core::schema::{DomainModel, Module, NameBuilder, NamingConvention, StoredDomainModel};
pub use keel_core::{bail, err, graph, upgrade, Error, Result, Value, ValueTy};
