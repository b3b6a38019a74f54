use serde::{Deserialize, Serialize};
use std::fmt;

/// Strategy used to populate the key of a new instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorKind {
    /// Framework-provided generator shared by every hierarchy with the same
    /// key shape.
    #[default]
    Default,

    /// A named, independently configurable instance of the default strategy.
    Named(String),

    /// A user-supplied generator, matched by name.
    Custom(String),

    /// Keys are always supplied by the caller.
    None,
}

impl GeneratorKind {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named(name) | Self::Custom(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("default"),
            Self::Named(name) | Self::Custom(name) => f.write_str(name),
            Self::None => f.write_str("none"),
        }
    }
}
