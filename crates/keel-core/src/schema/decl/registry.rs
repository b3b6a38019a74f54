use super::TypeDecl;
use crate::{Error, Result};

use indexmap::IndexMap;

/// Ordered registration table of type declarations.
///
/// Registration order is irrelevant to the builder; it only makes iteration
/// (and therefore error messages and type ids) deterministic.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    types: IndexMap<String, TypeDecl>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a declaration. Registering an identical declaration twice is
    /// a no-op; registering a different declaration under an existing name
    /// fails.
    pub fn register(&mut self, decl: TypeDecl) -> Result<&mut Self> {
        if let Some(existing) = self.types.get(&decl.name) {
            if *existing != decl {
                return Err(Error::domain_builder(format!(
                    "Type '{}' is registered more than once with different declarations",
                    decl.name
                )));
            }
            return Ok(self);
        }

        self.types.insert(decl.name.clone(), decl);
        Ok(self)
    }

    pub fn register_all(&mut self, decls: impl IntoIterator<Item = TypeDecl>) -> Result<&mut Self> {
        for decl in decls {
            self.register(decl)?;
        }
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&TypeDecl> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &TypeDecl> + '_ {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl FromIterator<TypeDecl> for Registry {
    /// Collects declarations, keeping the last one for duplicated names.
    fn from_iter<I: IntoIterator<Item = TypeDecl>>(iter: I) -> Self {
        Self {
            types: iter
                .into_iter()
                .map(|decl| (decl.name.clone(), decl))
                .collect(),
        }
    }
}
