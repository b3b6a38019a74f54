use crate::graph::{EdgeWeight, Graph};
use crate::schema::decl::TypeRef;
use crate::schema::def::{DomainDef, TypeDef, TypeKind};
use crate::{Error, Result};

/// Orders definitions so that every type comes after the types it depends
/// on:
///
/// * an ancestor precedes its descendants,
/// * an interface precedes its implementors and extending interfaces,
/// * a structure precedes the types containing it,
/// * the root of a hierarchy used in a key precedes the root of the
///   hierarchy owning that key.
///
/// Unknown type names are ignored here and reported by later stages.
pub(super) fn build_order(domain: &DomainDef) -> Result<Vec<String>> {
    let mut graph = Graph::new();

    for ty in domain.types() {
        graph.add_node(ty.name.clone());
    }

    for ty in domain.types() {
        if let Some(ancestor) = &ty.ancestor {
            if domain.contains(ancestor) {
                graph.add_edge(ancestor.clone(), ty.name.clone(), EdgeWeight::Normal);
            }
        }

        for interface in &ty.interfaces {
            if domain.contains(interface) {
                graph.add_edge(interface.clone(), ty.name.clone(), EdgeWeight::Low);
            }
        }

        for field in ty.fields.values() {
            let Some(target) = target_name(&field.ty) else {
                continue;
            };
            let Some(target) = domain.get(&target) else {
                continue;
            };

            match target.kind {
                TypeKind::Structure => {
                    graph.add_edge(target.name.clone(), ty.name.clone(), EdgeWeight::Normal);
                }
                TypeKind::Entity | TypeKind::Interface if field.is_key() && ty.is_entity() => {
                    let owner = root_of(domain, &ty.name);

                    for source in key_sources(domain, target) {
                        graph.add_edge(root_of(domain, source), owner.clone(), EdgeWeight::High);
                    }
                }
                _ => {}
            }
        }
    }

    graph.topological_sort().map_err(|cycle| {
        Error::domain_builder(format!(
            "At least one loop have been found in persistent type dependencies graph. Suspicious types: {cycle}"
        ))
    })
}

/// Name of the registered type a field points at, if any. Entity sets don't
/// create ordering constraints.
fn target_name(ty: &TypeRef) -> Option<String> {
    match ty {
        TypeRef::Named(_) | TypeRef::Generic { .. } => ty.type_name(),
        _ => None,
    }
}

/// Topmost known ancestor of a type.
fn root_of(domain: &DomainDef, name: &str) -> String {
    let mut current = name;

    // Bounded walk: ancestor loops are reported by the sort.
    for _ in 0..domain.types.len() {
        match domain.get(current).and_then(|def| def.ancestor.as_deref()) {
            Some(ancestor) if domain.contains(ancestor) => current = ancestor,
            _ => break,
        }
    }

    current.to_string()
}

/// Entities whose keys make up the key of a reference to `target`.
fn key_sources<'a>(domain: &'a DomainDef, target: &'a TypeDef) -> Vec<&'a str> {
    if target.is_entity() {
        return vec![target.name.as_str()];
    }

    domain
        .types()
        .filter(|ty| ty.is_entity() && domain.implements(&ty.name, &target.name))
        .map(|ty| ty.name.as_str())
        .collect()
}
