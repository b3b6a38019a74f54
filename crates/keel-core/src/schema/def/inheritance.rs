use serde::{Deserialize, Serialize};

/// Physical table layout of a hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InheritanceSchema {
    /// Each type level gets a table holding its own declared fields, joined
    /// by key to the tables of its ancestors.
    ClassTable,

    /// Each concrete type gets a complete table, duplicating ancestor fields.
    #[default]
    ConcreteTable,

    /// The whole hierarchy shares the root's table.
    SingleTable,
}
