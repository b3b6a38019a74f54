//! The sealed, immutable domain model produced by the builder.

mod association;
pub use association::{AssociationInfo, Multiplicity};

mod column;
pub use column::ColumnInfo;

mod field;
pub use field::{FieldInfo, FieldKind};

mod hierarchy;
pub use hierarchy::{HierarchyId, HierarchyInfo, TableInfo};

mod index;
pub use index::{FullTextColumn, FullTextIndexInfo, IndexInfo};

mod key;
pub use key::{EqualityIdentifier, KeyInfo};

mod ty;
pub use ty::{TypeInfo, TypeInfoId};

use super::def::TypeKind;

use indexmap::IndexMap;

/// A validated domain model. Once built it is never mutated and may be
/// shared freely between threads.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainModel {
    /// Types in build order, keyed by name. A type's [`TypeInfoId`] is its
    /// position in this map.
    pub types: IndexMap<String, TypeInfo>,

    pub hierarchies: Vec<HierarchyInfo>,

    pub associations: Vec<AssociationInfo>,
}

impl DomainModel {
    /// Get a type by ID
    ///
    /// # Panics
    ///
    /// Panics if the ID does not belong to this model.
    #[track_caller]
    pub fn type_info(&self, id: impl Into<TypeInfoId>) -> &TypeInfo {
        let id = id.into();
        self.types
            .get_index(id.0)
            .map(|(_, ty)| ty)
            .unwrap_or_else(|| panic!("no type with id {id:?}"))
    }

    /// Get a type by name
    pub fn get(&self, name: &str) -> Option<&TypeInfo> {
        self.types.get(name)
    }

    pub fn types(&self) -> impl ExactSizeIterator<Item = &TypeInfo> + '_ {
        self.types.values()
    }

    pub fn entities(&self) -> impl Iterator<Item = &TypeInfo> + '_ {
        self.types_of_kind(TypeKind::Entity)
    }

    pub fn structures(&self) -> impl Iterator<Item = &TypeInfo> + '_ {
        self.types_of_kind(TypeKind::Structure)
    }

    pub fn interfaces(&self) -> impl Iterator<Item = &TypeInfo> + '_ {
        self.types_of_kind(TypeKind::Interface)
    }

    #[track_caller]
    pub fn hierarchy(&self, id: HierarchyId) -> &HierarchyInfo {
        &self.hierarchies[id.0]
    }

    /// Returns the hierarchy the named entity belongs to.
    pub fn hierarchy_of(&self, name: &str) -> Option<&HierarchyInfo> {
        self.get(name)?.hierarchy.map(|id| self.hierarchy(id))
    }

    /// Returns the key of the hierarchy the named entity belongs to.
    pub fn key_of(&self, name: &str) -> Option<&KeyInfo> {
        self.hierarchy_of(name).map(|hierarchy| &hierarchy.key)
    }

    /// Returns the type with the given type id.
    pub fn by_type_id(&self, type_id: i32) -> Option<&TypeInfo> {
        self.types().find(|ty| ty.type_id == Some(type_id))
    }

    /// Returns associations owned by the named type.
    pub fn associations_of<'a>(
        &'a self,
        name: &str,
    ) -> impl Iterator<Item = &'a AssociationInfo> + 'a {
        let owner = self.get(name).map(|ty| ty.id);
        self.associations
            .iter()
            .filter(move |association| Some(association.owner) == owner)
    }

    fn types_of_kind(&self, kind: TypeKind) -> impl Iterator<Item = &TypeInfo> + '_ {
        self.types().filter(move |ty| ty.kind == kind)
    }
}
