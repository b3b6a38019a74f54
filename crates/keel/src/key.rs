use keel_core::Value;

use std::fmt;

/// Identity of an entity instance: the entity type and its key values, in
/// key order.
#[derive(Debug, Clone, PartialEq)]
pub struct Key {
    ty: String,
    values: Vec<Value>,
}

impl Key {
    pub(crate) fn new(ty: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            ty: ty.into(),
            values,
        }
    }

    /// Name of the entity type the key was created for.
    pub fn ty(&self) -> &str {
        &self.ty
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.ty)?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{value}")?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let key = Key::new("Order", vec![Value::I64(7), Value::from("EU")]);
        assert_eq!(key.to_string(), "Order(7, \"EU\")");
    }
}
