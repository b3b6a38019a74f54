use super::{ColumnInfo, KeyInfo, TypeInfoId};
use crate::schema::def::InheritanceSchema;

use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq)]
pub struct HierarchyInfo {
    pub id: HierarchyId,

    pub root: TypeInfoId,

    /// Root first, then descendants in build order.
    pub types: Vec<TypeInfoId>,

    pub key: KeyInfo,

    pub schema: InheritanceSchema,

    /// Physical tables backing the hierarchy.
    pub tables: Vec<TableInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HierarchyId(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub struct TableInfo {
    pub name: String,

    /// Types whose instances have a row in this table.
    pub types: Vec<TypeInfoId>,

    pub columns: IndexMap<String, ColumnInfo>,
}

impl HierarchyInfo {
    pub fn contains(&self, ty: TypeInfoId) -> bool {
        self.types.contains(&ty)
    }

    pub fn table(&self, name: &str) -> Option<&TableInfo> {
        self.tables.iter().find(|table| table.name == name)
    }
}
