use super::builder::AutoGenerics;
use super::def::DomainDef;

/// Extension hooks invoked while a domain model is being built.
///
/// Both hooks run synchronously on the builder's thread, once per build.
pub trait Module: Send + Sync {
    /// Called with the candidate set of generic closures before they are
    /// synthesized. Closures may be added or removed.
    fn on_auto_generics_building(&self, generics: &mut AutoGenerics) {
        let _ = generics;
    }

    /// Called once all definitions (including generic closures) exist and
    /// before any of them is validated.
    fn on_definitions_built(&self, domain: &mut DomainDef) {
        let _ = domain;
    }
}
