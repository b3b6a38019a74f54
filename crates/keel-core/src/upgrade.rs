//! Upgrade handler ordering and upgrade hint resolution.
//!
//! Handlers are ordered by the dependencies between the assemblies they
//! upgrade, then their hints are validated against the previously stored
//! model and the newly built one. The validated hints drive the
//! [`TypesDiff`] between the two models. No storage changes are produced
//! here.

use crate::graph::{EdgeWeight, Graph};
use crate::schema::stored::{
    DiffContext, FieldsDiffItem, RenameHints, StoredDomainModel, TypesDiff, TypesDiffItem,
};
use crate::{Error, Result};

use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Describes how the types of one assembly changed between versions.
pub trait UpgradeHandler: Send + Sync {
    /// Name of the assembly whose types this handler upgrades.
    fn assembly(&self) -> &str;

    /// Assemblies that must be upgraded first.
    fn dependencies(&self) -> Vec<String> {
        vec![]
    }

    fn hints(&self) -> Vec<UpgradeHint> {
        vec![]
    }
}

impl fmt::Debug for dyn UpgradeHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UpgradeHandler").field(&self.assembly()).finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UpgradeHint {
    RenameType { from: String, to: String },

    /// `ty` is the previous name of the declaring type.
    RenameField { ty: String, from: String, to: String },

    RemoveType(String),

    RemoveField { ty: String, field: String },
}

/// Handlers in dependency order and their validated hints.
#[derive(Debug, Clone)]
pub struct UpgradePlan {
    assemblies: Vec<String>,
    hints: Vec<UpgradeHint>,
    rename_hints: RenameHints,
}

impl UpgradeHint {
    pub fn rename_type(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::RenameType {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn rename_field(
        ty: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self::RenameField {
            ty: ty.into(),
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn remove_type(name: impl Into<String>) -> Self {
        Self::RemoveType(name.into())
    }

    pub fn remove_field(ty: impl Into<String>, field: impl Into<String>) -> Self {
        Self::RemoveField {
            ty: ty.into(),
            field: field.into(),
        }
    }
}

/// Orders handlers so that every handler comes after the handlers of the
/// assemblies it depends on. Dependencies on assemblies without a handler
/// are ignored.
pub fn order_handlers(
    handlers: impl IntoIterator<Item = Arc<dyn UpgradeHandler>>,
) -> Result<Vec<Arc<dyn UpgradeHandler>>> {
    let mut by_assembly: IndexMap<String, Arc<dyn UpgradeHandler>> = IndexMap::new();

    for handler in handlers {
        let assembly = handler.assembly().to_string();

        if by_assembly.contains_key(&assembly) {
            return Err(Error::upgrade(format!(
                "More than one upgrade handler is registered for assembly '{assembly}'"
            )));
        }

        by_assembly.insert(assembly, handler);
    }

    let mut graph = Graph::new();

    for assembly in by_assembly.keys() {
        graph.add_node(assembly.as_str());
    }

    for (assembly, handler) in &by_assembly {
        for dependency in handler.dependencies() {
            if let Some((_, dependency, _)) = by_assembly.get_full(&dependency) {
                graph.add_edge(dependency.as_str(), assembly.as_str(), EdgeWeight::Normal);
            }
        }
    }

    let order = graph.topological_sort().map_err(|cycle| {
        Error::upgrade(format!(
            "At least one loop have been found in upgrade handler dependencies graph. Suspicious assemblies: {cycle}"
        ))
    })?;

    Ok(order
        .into_iter()
        .map(|assembly| by_assembly[assembly].clone())
        .collect())
}

impl UpgradePlan {
    /// Orders `handlers` and validates their hints against the previous and
    /// next models.
    pub fn new(
        handlers: impl IntoIterator<Item = Arc<dyn UpgradeHandler>>,
        previous: &StoredDomainModel,
        next: &StoredDomainModel,
    ) -> Result<Self> {
        let handlers = order_handlers(handlers)?;

        let mut plan = Self {
            assemblies: vec![],
            hints: vec![],
            rename_hints: RenameHints::new(),
        };

        for handler in &handlers {
            let hints = handler.hints();
            log::debug!(
                "collecting upgrade hints; assembly={} hints={}",
                handler.assembly(),
                hints.len()
            );

            for hint in hints {
                plan.add_hint(hint, previous, next)?;
            }

            plan.assemblies.push(handler.assembly().to_string());
        }

        Ok(plan)
    }

    pub fn assemblies(&self) -> &[String] {
        &self.assemblies
    }

    pub fn hints(&self) -> &[UpgradeHint] {
        &self.hints
    }

    pub fn rename_hints(&self) -> &RenameHints {
        &self.rename_hints
    }

    /// Computes the differences between the two models, following the
    /// rename hints.
    pub fn diff<'a>(
        &'a self,
        previous: &'a StoredDomainModel,
        next: &'a StoredDomainModel,
    ) -> TypesDiff<'a> {
        let cx = DiffContext::new(previous, next, &self.rename_hints);
        TypesDiff::from(&cx)
    }

    /// Types and declared fields that disappear in `diff` without a removal
    /// hint. Fields are reported as `Type.Field`, by previous name.
    pub fn unexpected_removals(&self, diff: &TypesDiff<'_>) -> Vec<String> {
        let mut removals = vec![];

        for item in diff.iter() {
            match item {
                TypesDiffItem::RemoveType(ty) => {
                    if !self.hints.contains(&UpgradeHint::remove_type(&ty.name)) {
                        removals.push(ty.name.clone());
                    }
                }
                TypesDiffItem::AlterType { from, fields, .. } => {
                    for field in fields.iter() {
                        let FieldsDiffItem::RemoveField(field) = field else {
                            continue;
                        };

                        if field.is_inherited {
                            continue;
                        }

                        let hint = UpgradeHint::remove_field(&from.name, &field.name);
                        if !self.hints.contains(&hint) {
                            removals.push(format!("{}.{}", from.name, field.name));
                        }
                    }
                }
                TypesDiffItem::AddType(_) => {}
            }
        }

        removals
    }

    fn add_hint(
        &mut self,
        hint: UpgradeHint,
        previous: &StoredDomainModel,
        next: &StoredDomainModel,
    ) -> Result<()> {
        match &hint {
            UpgradeHint::RenameType { from, to } => {
                if !previous.contains(from) {
                    return Err(Error::upgrade(format!(
                        "Upgrade hint renames unknown type '{from}'"
                    )));
                }

                if !next.contains(to) {
                    return Err(Error::upgrade(format!(
                        "Upgrade hint renames '{from}' to unknown type '{to}'"
                    )));
                }

                if let Some(existing) = self.rename_hints.get_type(from) {
                    if existing != to.as_str() {
                        return Err(Error::upgrade(format!(
                            "Type '{from}' is renamed to both '{existing}' and '{to}'"
                        )));
                    }
                }

                self.rename_hints.add_type_hint(from, to);
            }
            UpgradeHint::RenameField { ty, from, to } => {
                let exists = previous
                    .get(ty)
                    .and_then(|ty| ty.field(from))
                    .is_some_and(|field| field.parent.is_none());

                if !exists {
                    return Err(Error::upgrade(format!(
                        "Upgrade hint renames unknown field '{ty}.{from}'"
                    )));
                }

                let next_ty = self.rename_hints.get_type(ty).unwrap_or(ty);
                let exists = next
                    .get(next_ty)
                    .and_then(|ty| ty.field(to))
                    .is_some_and(|field| field.parent.is_none());

                if !exists {
                    return Err(Error::upgrade(format!(
                        "Upgrade hint renames '{ty}.{from}' to unknown field '{next_ty}.{to}'"
                    )));
                }

                self.rename_hints.add_field_hint(ty, from, to);
            }
            UpgradeHint::RemoveType(name) => {
                if !previous.contains(name) {
                    return Err(Error::upgrade(format!(
                        "Upgrade hint removes unknown type '{name}'"
                    )));
                }

                if next.contains(name) {
                    return Err(Error::upgrade(format!(
                        "Upgrade hint removes type '{name}' which still exists"
                    )));
                }
            }
            UpgradeHint::RemoveField { ty, field } => {
                if previous.get(ty).and_then(|ty| ty.field(field)).is_none() {
                    return Err(Error::upgrade(format!(
                        "Upgrade hint removes unknown field '{ty}.{field}'"
                    )));
                }
            }
        }

        self.hints.push(hint);
        Ok(())
    }
}
