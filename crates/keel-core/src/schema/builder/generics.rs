use crate::schema::decl::TypeRef;
use crate::schema::def::{DomainDef, GenericInstance, TypeDef};
use crate::schema::Module;

use indexmap::IndexSet;
use std::sync::Arc;

/// Candidate closures of generic templates.
///
/// Candidates are discovered from the field types of registered types.
/// Modules see the set before closures are synthesized and may add or
/// remove entries; every entry left in the set is synthesized.
#[derive(Debug, Clone, Default)]
pub struct AutoGenerics {
    closures: IndexSet<GenericInstance>,
}

impl AutoGenerics {
    /// Adds a closure. Returns `false` if it was already present.
    pub fn add(
        &mut self,
        template: impl Into<String>,
        args: impl IntoIterator<Item = TypeRef>,
    ) -> bool {
        self.closures.insert(GenericInstance {
            template: template.into(),
            args: args.into_iter().collect(),
        })
    }

    /// Removes a closure. Returns `false` if it wasn't present.
    pub fn remove(&mut self, template: &str, args: &[TypeRef]) -> bool {
        self.closures.shift_remove(&GenericInstance {
            template: template.to_string(),
            args: args.to_vec(),
        })
    }

    pub fn contains(&self, template: &str, args: &[TypeRef]) -> bool {
        self.iter()
            .any(|closure| closure.template == template && closure.args == args)
    }

    pub fn retain(&mut self, f: impl FnMut(&GenericInstance) -> bool) {
        self.closures.retain(f);
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &GenericInstance> + '_ {
        self.closures.iter()
    }

    pub fn len(&self) -> usize {
        self.closures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closures.is_empty()
    }
}

/// Synthesizes closed types for every generic template usage.
///
/// Only usages in registered, non-template types are discovered; closures
/// do not in turn trigger further closures.
pub(super) fn expand(domain: &mut DomainDef, modules: &[Arc<dyn Module>]) {
    let mut generics = AutoGenerics::default();

    for ty in domain.types.values() {
        for field in ty.fields.values() {
            field.ty.each_generic(&mut |template, args| {
                if !args.iter().any(TypeRef::has_params) {
                    generics.add(template, args.iter().cloned());
                }
            });
        }
    }

    for module in modules {
        module.on_auto_generics_building(&mut generics);
    }

    let mut synthesized = 0;

    for closure in generics.iter() {
        let name = closure.name();

        if domain.contains(&name) {
            continue;
        }

        match close(domain, closure) {
            Ok(def) => {
                domain.add_type(def);
                synthesized += 1;
            }
            Err(reason) => log::warn!("skipping generic closure '{name}'; {reason}"),
        }
    }

    log::debug!(
        "auto-generics resolved; candidates={} synthesized={synthesized}",
        generics.len()
    );
}

fn close(domain: &DomainDef, closure: &GenericInstance) -> Result<TypeDef, String> {
    let template = domain
        .templates
        .get(&closure.template)
        .ok_or_else(|| format!("unknown generic template '{}'", closure.template))?;

    if template.generic_params.len() != closure.args.len() {
        return Err(format!(
            "template '{}' expects {} arguments, got {}",
            template.name,
            template.generic_params.len(),
            closure.args.len()
        ));
    }

    for (param, arg) in template.generic_params.iter().zip(&closure.args) {
        let Some(constraint) = &param.constraint else {
            continue;
        };

        let satisfied = arg
            .type_name()
            .is_some_and(|name| domain.is_assignable(&name, constraint));

        if !satisfied {
            return Err(format!(
                "argument '{arg}' doesn't satisfy constraint '{constraint}' of parameter '{}'",
                param.name
            ));
        }
    }

    let lookup = |name: &str| {
        template
            .generic_params
            .iter()
            .position(|param| param.name == name)
            .map(|i| closure.args[i].clone())
    };
    let rename = |name: &String| {
        lookup(name)
            .and_then(|arg| arg.type_name())
            .unwrap_or_else(|| name.clone())
    };

    let mut def = template.clone();
    def.name = closure.name();
    def.generic_params.clear();
    def.generic = Some(closure.clone());
    def.mapping_name = None;
    def.ancestor = def.ancestor.as_ref().map(rename);
    def.interfaces = def.interfaces.iter().map(rename).collect();

    for field in def.fields.values_mut() {
        field.ty = field.ty.substitute(&lookup);
    }

    Ok(def)
}
