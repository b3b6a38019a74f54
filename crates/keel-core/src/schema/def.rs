//! Mutable, build-time definitions.
//!
//! The collector turns declarations into definitions without checking them.
//! Module hooks may edit definitions freely before the resolver stages run;
//! all legality checks happen afterwards.

mod domain;
pub use domain::DomainDef;

mod field;
pub use field::{AssociationDef, FieldDef, KeyPosition, RemoveAction};

mod generator;
pub use generator::GeneratorKind;

mod index;
pub use index::{Direction, IndexDef};

mod inheritance;
pub use inheritance::InheritanceSchema;

mod ty;
pub use ty::{GenericInstance, HierarchyOptions, TypeDef, TypeKind};
