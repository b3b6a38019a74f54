use crate::schema::def::GeneratorKind;
use crate::value::ValueTy;

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyInfo {
    /// Top-level key fields of the hierarchy root, in key order. Includes
    /// `TypeId` when the hierarchy includes the type id in its key.
    pub fields: Vec<String>,

    /// Dotted names of the leaf fields making up the key.
    pub leaves: Vec<String>,

    /// Physical key columns, parallel to `leaves`.
    pub columns: Vec<String>,

    /// Value types of the key leaves, in order.
    pub tuple: Vec<ValueTy>,

    pub generator: GeneratorKind,

    pub equality_identifier: EqualityIdentifier,

    pub contains_type_id: bool,
}

/// Identifies key shapes. Keys with the same ordered leaf value types share
/// an identifier, whatever hierarchy they belong to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EqualityIdentifier(Vec<ValueTy>);

impl KeyInfo {
    /// Value types a key generator has to produce. The type id, if part of
    /// the key, is supplied by the domain.
    pub fn generated_tuple(&self) -> &[ValueTy] {
        if self.contains_type_id {
            &self.tuple[..self.tuple.len() - 1]
        } else {
            &self.tuple
        }
    }

    pub fn len(&self) -> usize {
        self.tuple.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuple.is_empty()
    }
}

impl EqualityIdentifier {
    pub fn new(tuple: impl Into<Vec<ValueTy>>) -> Self {
        Self(tuple.into())
    }

    pub fn tuple(&self) -> &[ValueTy] {
        &self.0
    }
}

impl fmt::Display for EqualityIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, ty) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{ty}")?;
        }
        f.write_str(")")
    }
}
