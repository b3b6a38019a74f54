use super::{ColumnInfo, FieldInfo, FullTextIndexInfo, HierarchyId, IndexInfo};
use crate::schema::def::TypeKind;

use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq)]
pub struct TypeInfo {
    pub id: TypeInfoId,

    pub name: String,

    /// Table (or, for structures and interfaces, prefix) name after the
    /// naming convention is applied.
    pub mapping_name: String,

    /// Explicit mapping name override, kept so names can be rebuilt under a
    /// different convention.
    pub mapping_override: Option<String>,

    pub kind: TypeKind,

    /// Numeric type identifier. Assigned to entities only.
    pub type_id: Option<i32>,

    pub is_abstract: bool,

    /// Template name for closed generic types.
    pub generic_template: Option<String>,

    pub ancestor: Option<TypeInfoId>,

    /// Direct descendants.
    pub descendants: Vec<TypeInfoId>,

    /// Set for entities.
    pub hierarchy: Option<HierarchyId>,

    /// Directly implemented (or, for interfaces, extended) interfaces.
    pub interfaces: Vec<TypeInfoId>,

    /// For interfaces: every type implementing it, directly or not.
    pub implementors: Vec<TypeInfoId>,

    /// Flattened fields: declared, inherited and expanded, keyed by dotted
    /// name.
    pub fields: IndexMap<String, FieldInfo>,

    /// Physical columns keyed by column name.
    pub columns: IndexMap<String, ColumnInfo>,

    /// Primary index first, for entities.
    pub indexes: Vec<IndexInfo>,

    /// Set on hierarchy roots with full-text fields.
    pub full_text_index: Option<FullTextIndexInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeInfoId(pub usize);

impl TypeInfo {
    pub fn is_entity(&self) -> bool {
        self.kind == TypeKind::Entity
    }

    pub fn is_structure(&self) -> bool {
        self.kind == TypeKind::Structure
    }

    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.get(name)
    }

    /// Fields that are not nested in another field.
    pub fn top_level_fields(&self) -> impl Iterator<Item = &FieldInfo> + '_ {
        self.fields.values().filter(|field| field.parent.is_none())
    }

    /// Fields declared (or redeclared) by this type, as opposed to inherited.
    pub fn declared_fields(&self) -> impl Iterator<Item = &FieldInfo> + '_ {
        self.fields.values().filter(|field| !field.is_inherited)
    }

    pub fn primary_index(&self) -> Option<&IndexInfo> {
        self.indexes.first().filter(|index| index.is_primary)
    }

    pub fn index(&self, name: &str) -> Option<&IndexInfo> {
        self.indexes.iter().find(|index| index.name == name)
    }
}

impl TypeInfoId {
    pub(crate) const fn placeholder() -> Self {
        Self(usize::MAX)
    }
}

impl From<&TypeInfoId> for TypeInfoId {
    fn from(value: &TypeInfoId) -> Self {
        *value
    }
}

impl From<&TypeInfo> for TypeInfoId {
    fn from(value: &TypeInfo) -> Self {
        value.id
    }
}
