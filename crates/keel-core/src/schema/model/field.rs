use super::TypeInfoId;
use crate::value::ValueTy;

#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    /// Dotted path of declared names, e.g. `Address.City`.
    pub name: String,

    /// Path of declared names with mapping overrides applied, before the
    /// naming convention runs.
    pub raw_name: String,

    /// Name after the naming convention is applied. For leaf fields this is
    /// the column name.
    pub mapping_name: String,

    /// Type declaring the top-level field this field belongs to.
    pub declaring_type: TypeInfoId,

    pub is_inherited: bool,

    pub kind: FieldKind,

    /// Dotted name of the enclosing field, for expanded fields.
    pub parent: Option<String>,

    /// Physical columns: one for value fields, one per leaf for structures
    /// and references, none for entity sets.
    pub columns: Vec<String>,

    pub is_key: bool,

    /// Set for fields the builder adds itself (`TypeId`).
    pub is_system: bool,

    pub nullable: bool,

    pub length: Option<usize>,

    pub precision: Option<u8>,

    pub scale: Option<u8>,

    pub lazy_load: bool,

    pub is_version: bool,

    /// Full-text language.
    pub full_text: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Value(ValueTy),
    Structure(TypeInfoId),
    Reference(TypeInfoId),
    EntitySet(TypeInfoId),
}

impl FieldInfo {
    pub fn value_ty(&self) -> Option<ValueTy> {
        match self.kind {
            FieldKind::Value(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self.kind, FieldKind::Value(_))
    }

    pub fn is_structure(&self) -> bool {
        matches!(self.kind, FieldKind::Structure(_))
    }

    pub fn is_reference(&self) -> bool {
        matches!(self.kind, FieldKind::Reference(_))
    }

    pub fn is_entity_set(&self) -> bool {
        matches!(self.kind, FieldKind::EntitySet(_))
    }

    /// Returns the referenced, embedded or collected type.
    pub fn target(&self) -> Option<TypeInfoId> {
        match self.kind {
            FieldKind::Value(_) => None,
            FieldKind::Structure(id) | FieldKind::Reference(id) | FieldKind::EntitySet(id) => {
                Some(id)
            }
        }
    }

    /// Number of segments in the dotted name minus one.
    pub fn depth(&self) -> usize {
        self.name.matches('.').count()
    }
}
