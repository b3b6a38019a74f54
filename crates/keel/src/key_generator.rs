//! Runtime key generators.
//!
//! Generator instances are owned by a [`Domain`](crate::Domain): one per
//! default key shape, one per named generator and one per registered custom
//! generator. Their state lives and dies with the domain.

use keel_core::{err, Result, Value, ValueTy};

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use uuid::Uuid;

/// Produces the values of new keys.
pub trait KeyGenerator: Send + Sync {
    /// Value types of the produced keys, in key order.
    fn output(&self) -> Vec<ValueTy>;

    /// Returns the values of the next key.
    fn next_values(&self) -> Result<Vec<Value>>;
}

/// Integer sequence. Also serves whole-number decimal keys.
pub struct SequenceGenerator {
    ty: ValueTy,
    next: AtomicI64,
    step: i64,
}

/// Random v4 UUIDs.
#[derive(Debug, Default)]
pub struct GuidGenerator;

/// Hyphenated v4 UUIDs as text.
#[derive(Debug, Default)]
pub struct StringGenerator;

impl SequenceGenerator {
    pub const DEFAULT_SEED: i64 = 1;
    pub const DEFAULT_STEP: i64 = 1;

    pub fn new(ty: ValueTy) -> Self {
        Self::with_seed(ty, Self::DEFAULT_SEED, Self::DEFAULT_STEP)
    }

    pub fn with_seed(ty: ValueTy, seed: i64, step: i64) -> Self {
        debug_assert!(ty.is_integral() || ty == ValueTy::Decimal, "ty={ty}");
        debug_assert!(step != 0);

        Self {
            ty,
            next: AtomicI64::new(seed),
            step,
        }
    }

    /// Returns `true` if a sequence can produce values of `ty`.
    pub fn supports(ty: ValueTy) -> bool {
        ty.is_integral() || ty == ValueTy::Decimal
    }
}

impl KeyGenerator for SequenceGenerator {
    fn output(&self) -> Vec<ValueTy> {
        vec![self.ty]
    }

    fn next_values(&self) -> Result<Vec<Value>> {
        let next = self.next.fetch_add(self.step, Ordering::Relaxed);

        let value = match self.ty {
            ValueTy::Decimal => Value::Decimal(next.to_string()),
            _ => Value::I64(next),
        };

        if !value.is_a(self.ty) {
            return Err(err!("{} sequence is exhausted at {next}", self.ty));
        }

        Ok(vec![value])
    }
}

impl fmt::Debug for SequenceGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceGenerator")
            .field("ty", &self.ty)
            .field("next", &self.next.load(Ordering::Relaxed))
            .field("step", &self.step)
            .finish()
    }
}

impl KeyGenerator for GuidGenerator {
    fn output(&self) -> Vec<ValueTy> {
        vec![ValueTy::Guid]
    }

    fn next_values(&self) -> Result<Vec<Value>> {
        Ok(vec![Value::Guid(Uuid::new_v4())])
    }
}

impl KeyGenerator for StringGenerator {
    fn output(&self) -> Vec<ValueTy> {
        vec![ValueTy::String]
    }

    fn next_values(&self) -> Result<Vec<Value>> {
        Ok(vec![Value::String(Uuid::new_v4().to_string())])
    }
}
