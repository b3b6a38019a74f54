use crate::schema::decl::TypeRef;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,

    pub ty: TypeRef,

    /// Set for key fields. Implicit positions follow declaration order.
    pub key_position: Option<KeyPosition>,

    /// `None` means nullability follows the value type.
    pub nullable: Option<bool>,

    pub length: Option<usize>,

    pub precision: Option<u8>,

    pub scale: Option<u8>,

    pub lazy_load: bool,

    pub is_version: bool,

    /// Full-text language, if the field is full-text indexed.
    pub full_text: Option<String>,

    /// Explicit mapping name override.
    pub mapping_name: Option<String>,

    pub association: Option<AssociationDef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyPosition {
    Implicit,
    Explicit(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationDef {
    /// Name of the paired field on the target type.
    pub pair_to: Option<String>,
    pub on_owner_remove: RemoveAction,
    pub on_target_remove: RemoveAction,
}

/// What happens to the other side of an association when one side is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoveAction {
    #[default]
    Default,
    Clear,
    Cascade,
    Deny,
    None,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            key_position: None,
            nullable: None,
            length: None,
            precision: None,
            scale: None,
            lazy_load: false,
            is_version: false,
            full_text: None,
            mapping_name: None,
            association: None,
        }
    }

    pub fn is_key(&self) -> bool {
        self.key_position.is_some()
    }

    pub fn is_entity_set(&self) -> bool {
        matches!(self.ty, TypeRef::EntitySet(_))
    }

    pub fn is_full_text(&self) -> bool {
        self.full_text.is_some()
    }
}
