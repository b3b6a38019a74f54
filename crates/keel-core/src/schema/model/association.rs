use super::TypeInfoId;
use crate::schema::def::RemoveAction;

use serde::{Deserialize, Serialize};

/// A reference or entity-set field, seen as a relationship between types.
#[derive(Debug, Clone, PartialEq)]
pub struct AssociationInfo {
    pub owner: TypeInfoId,

    /// Dotted name of the owning field.
    pub field: String,

    pub target: TypeInfoId,

    pub multiplicity: Multiplicity,

    pub on_owner_remove: RemoveAction,

    pub on_target_remove: RemoveAction,

    /// The paired field on the target type.
    pub paired: Option<(TypeInfoId, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Multiplicity {
    ZeroToOne,
    ZeroToMany,
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

impl Multiplicity {
    pub(crate) fn new(owner_is_set: bool, paired: Option<bool>) -> Self {
        match (owner_is_set, paired) {
            (false, None) => Self::ZeroToOne,
            (true, None) => Self::ZeroToMany,
            (false, Some(false)) => Self::OneToOne,
            (false, Some(true)) => Self::ManyToOne,
            (true, Some(false)) => Self::OneToMany,
            (true, Some(true)) => Self::ManyToMany,
        }
    }
}
