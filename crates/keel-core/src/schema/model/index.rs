use super::TypeInfoId;
use crate::schema::def::Direction;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexInfo {
    pub name: String,

    /// Key columns with their sort direction.
    pub columns: Vec<(String, Direction)>,

    /// Dotted names of the fields the key columns come from.
    pub fields: Vec<String>,

    pub included_columns: Vec<String>,

    pub unique: bool,

    pub is_primary: bool,

    /// Set for indexes declared on an ancestor.
    pub is_inherited: bool,
}

/// The full-text index of a hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct FullTextIndexInfo {
    pub name: String,
    pub columns: Vec<FullTextColumn>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FullTextColumn {
    pub column: String,

    /// Type whose flattened fields contain [`field`](Self::field).
    pub declaring_type: TypeInfoId,

    /// Dotted name of the leaf field mapped to the column.
    pub field: String,

    pub language: String,
}

impl IndexInfo {
    pub fn column_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.iter().map(|(name, _)| name.as_str())
    }
}

impl FullTextIndexInfo {
    pub fn column_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.iter().map(|column| column.column.as_str())
    }
}
