use crate::value::ValueTy;

use serde::{Deserialize, Serialize};

/// A physical column of a type or table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,

    /// Dotted name of the leaf field mapped to this column.
    pub field: String,

    pub ty: ValueTy,

    pub nullable: bool,

    pub length: Option<usize>,

    pub precision: Option<u8>,

    pub scale: Option<u8>,

    pub is_inherited: bool,

    pub is_primary_key: bool,

    pub is_system: bool,
}
