use super::TypeDef;

use indexmap::{IndexMap, IndexSet};

/// The full set of definitions being built.
#[derive(Debug, Clone, Default)]
pub struct DomainDef {
    /// Persistent types, in registration order. Generic closures are appended
    /// after the types that use them.
    pub types: IndexMap<String, TypeDef>,

    /// Open generic templates. Templates never become part of the model.
    pub templates: IndexMap<String, TypeDef>,

    /// Registered types that are not persistent.
    pub non_persistent: IndexSet<String>,
}

impl DomainDef {
    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut TypeDef> {
        self.types.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn types(&self) -> impl ExactSizeIterator<Item = &TypeDef> + '_ {
        self.types.values()
    }

    /// Adds a type definition, replacing any type with the same name.
    pub fn add_type(&mut self, ty: TypeDef) -> &mut TypeDef {
        let name = ty.name.clone();
        self.types.insert(name.clone(), ty);
        &mut self.types[&name]
    }

    pub fn remove_type(&mut self, name: &str) -> Option<TypeDef> {
        self.types.shift_remove(name)
    }

    /// Returns `true` if `name` is `ancestor` or derives from it, directly or
    /// through intermediate types.
    pub fn is_same_or_derived(&self, name: &str, ancestor: &str) -> bool {
        let mut current = Some(name);
        let mut steps = 0;

        while let Some(ty) = current {
            if ty == ancestor {
                return true;
            }

            // Ancestor loops are reported by the orchestrator; stop here.
            steps += 1;
            if steps > self.types.len() {
                return false;
            }

            current = self.get(ty).and_then(|def| def.ancestor.as_deref());
        }

        false
    }

    /// Returns `true` if `name` implements `interface`, directly, through an
    /// ancestor, or through an extended interface.
    pub fn implements(&self, name: &str, interface: &str) -> bool {
        let mut pending = vec![name];
        let mut seen = IndexSet::new();

        while let Some(ty) = pending.pop() {
            if !seen.insert(ty) {
                continue;
            }

            let Some(def) = self.get(ty) else { continue };

            for implemented in &def.interfaces {
                if implemented == interface {
                    return true;
                }
                pending.push(implemented);
            }

            if let Some(ancestor) = &def.ancestor {
                pending.push(ancestor);
            }
        }

        false
    }

    /// Returns `true` if a value of type `name` is assignable to `target`.
    pub fn is_assignable(&self, name: &str, target: &str) -> bool {
        self.is_same_or_derived(name, target) || self.implements(name, target)
    }
}
