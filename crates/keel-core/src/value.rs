use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Primitive value types a persistent field can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueTy {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Decimal,
    String,
    Guid,
    DateTime,
    TimeSpan,
    Bytes,
}

/// A runtime value, used for key components.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    I64(i64),
    U64(u64),
    F64(f64),
    Decimal(String),
    String(String),
    Guid(Uuid),
    /// Milliseconds since the Unix epoch.
    DateTime(i64),
    /// Milliseconds.
    TimeSpan(i64),
    Bytes(Vec<u8>),
}

impl ValueTy {
    pub fn is_integral(self) -> bool {
        matches!(
            self,
            Self::I8
                | Self::I16
                | Self::I32
                | Self::I64
                | Self::U8
                | Self::U16
                | Self::U32
                | Self::U64
        )
    }

    pub fn is_signed(self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32 | Self::I64)
    }

    pub fn is_string(self) -> bool {
        matches!(self, Self::String)
    }

    /// Returns `true` for types whose values are reference-like and therefore
    /// nullable unless declared otherwise.
    pub fn is_nullable_by_default(self) -> bool {
        matches!(self, Self::String | Self::Bytes)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Decimal => "decimal",
            Self::String => "string",
            Self::Guid => "guid",
            Self::DateTime => "datetime",
            Self::TimeSpan => "timespan",
            Self::Bytes => "bytes",
        }
    }

    /// Inclusive upper bound of an integral type, as `i128`.
    pub(crate) fn integral_max(self) -> Option<i128> {
        Some(match self {
            Self::I8 => i8::MAX as i128,
            Self::I16 => i16::MAX as i128,
            Self::I32 => i32::MAX as i128,
            Self::I64 => i64::MAX as i128,
            Self::U8 => u8::MAX as i128,
            Self::U16 => u16::MAX as i128,
            Self::U32 => u32::MAX as i128,
            Self::U64 => u64::MAX as i128,
            _ => return None,
        })
    }

    pub(crate) fn integral_min(self) -> Option<i128> {
        Some(match self {
            Self::I8 => i8::MIN as i128,
            Self::I16 => i16::MIN as i128,
            Self::I32 => i32::MIN as i128,
            Self::I64 => i64::MIN as i128,
            Self::U8 | Self::U16 | Self::U32 | Self::U64 => 0,
            _ => return None,
        })
    }
}

impl fmt::Display for ValueTy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Value {
    /// Returns `true` if the value can be stored in a field of type `ty`.
    pub fn is_a(&self, ty: ValueTy) -> bool {
        match self {
            Self::Bool(_) => ty == ValueTy::Bool,
            Self::I64(v) => Self::fits(*v as i128, ty),
            Self::U64(v) => Self::fits(*v as i128, ty),
            Self::F64(_) => matches!(ty, ValueTy::F32 | ValueTy::F64),
            Self::Decimal(_) => ty == ValueTy::Decimal,
            Self::String(_) => ty == ValueTy::String,
            Self::Guid(_) => ty == ValueTy::Guid,
            Self::DateTime(_) => ty == ValueTy::DateTime,
            Self::TimeSpan(_) => ty == ValueTy::TimeSpan,
            Self::Bytes(_) => ty == ValueTy::Bytes,
        }
    }

    fn fits(v: i128, ty: ValueTy) -> bool {
        match (ty.integral_min(), ty.integral_max()) {
            (Some(min), Some(max)) => min <= v && v <= max,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::U64(v) => write!(f, "{v}"),
            Self::F64(v) => write!(f, "{v}"),
            Self::Decimal(v) => f.write_str(v),
            Self::String(v) => write!(f, "{v:?}"),
            Self::Guid(v) => write!(f, "{v}"),
            Self::DateTime(v) => write!(f, "datetime({v})"),
            Self::TimeSpan(v) => write!(f, "timespan({v})"),
            Self::Bytes(v) => write!(f, "bytes[{}]", v.len()),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::I64(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::I64(value.into())
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Self::U64(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Uuid> for Value {
    fn from(value: Uuid) -> Self {
        Self::Guid(value)
    }
}
