//! Declarative type descriptions consumed by the domain builder.
//!
//! A [`TypeDecl`] plays the role of an annotated class: it names a type, its
//! base type, the interfaces it implements and its members, and carries
//! attributes describing persistence metadata. Declarations are registered in
//! a [`Registry`] in any order.

mod member;
pub use member::{MemberAttr, MemberDecl};

mod registry;
pub use registry::Registry;

mod ty;
pub use ty::{DeclKind, GenericParam, TypeAttr, TypeDecl};

mod type_ref;
pub use type_ref::TypeRef;

use super::def::{GeneratorKind, InheritanceSchema, RemoveAction};
