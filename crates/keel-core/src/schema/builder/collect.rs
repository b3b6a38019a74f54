use crate::schema::decl::{DeclKind, MemberAttr, MemberDecl, Registry, TypeAttr, TypeDecl};
use crate::schema::def::{
    AssociationDef, DomainDef, FieldDef, HierarchyOptions, IndexDef, KeyPosition, TypeDef,
    TypeKind,
};
use crate::{Error, Result};

/// Turns registered declarations into definitions. Only the shape of the
/// input is checked here; legality checks run after module hooks.
pub(super) fn collect(registry: &Registry) -> Result<DomainDef> {
    let mut domain = DomainDef::default();

    for decl in registry.iter() {
        let kind = match decl.kind {
            DeclKind::Entity => TypeKind::Entity,
            DeclKind::Structure => TypeKind::Structure,
            DeclKind::Interface => TypeKind::Interface,
            DeclKind::Other => {
                domain.non_persistent.insert(decl.name.clone());
                continue;
            }
        };

        let def = collect_type(decl, kind)?;

        if def.is_template() {
            domain.templates.insert(def.name.clone(), def);
        } else {
            domain.types.insert(def.name.clone(), def);
        }
    }

    Ok(domain)
}

fn collect_type(decl: &TypeDecl, kind: TypeKind) -> Result<TypeDef> {
    let mut def = TypeDef::new(&decl.name, kind);
    def.ancestor = decl.base.clone();
    def.interfaces = decl.interfaces.clone();
    def.generic_params = decl.generic_params.clone();

    for attr in &decl.attributes {
        match attr {
            TypeAttr::HierarchyRoot {
                generator,
                include_type_id,
                schema,
            } => {
                def.hierarchy_root = Some(HierarchyOptions {
                    generator: generator.clone(),
                    include_type_id: *include_type_id,
                    schema: *schema,
                });
            }
            TypeAttr::Index {
                name,
                key_fields,
                included_fields,
                unique,
            } => {
                let mut index = IndexDef::new(key_fields);
                index.name = name.clone();
                index.included_fields = included_fields.clone();
                index.unique = *unique;
                def.indexes.push(index);
            }
            TypeAttr::TableMapping(name) => def.mapping_name = Some(name.clone()),
            TypeAttr::Abstract => def.is_abstract = true,
        }
    }

    for member in decl.members.iter().filter(|member| member.is_field()) {
        if def.fields.contains_key(&member.name) {
            return Err(Error::domain_builder(format!(
                "Type '{}' declares field '{}' more than once",
                decl.name, member.name
            )));
        }

        def.add_field(collect_field(member));
    }

    Ok(def)
}

fn collect_field(member: &MemberDecl) -> FieldDef {
    let mut field = FieldDef::new(&member.name, member.ty.clone());

    for attr in &member.attributes {
        match attr {
            MemberAttr::Field {
                nullable,
                length,
                precision,
                scale,
                lazy_load,
            } => {
                field.nullable = *nullable;
                field.length = *length;
                field.precision = *precision;
                field.scale = *scale;
                field.lazy_load = *lazy_load;
            }
            MemberAttr::Key(position) => {
                field.key_position = Some(match position {
                    Some(position) => KeyPosition::Explicit(*position),
                    None => KeyPosition::Implicit,
                });
            }
            MemberAttr::Version => field.is_version = true,
            MemberAttr::FullText { language } => field.full_text = Some(language.clone()),
            MemberAttr::MapTo(name) => field.mapping_name = Some(name.clone()),
            MemberAttr::Association {
                pair_to,
                on_owner_remove,
                on_target_remove,
            } => {
                field.association = Some(AssociationDef {
                    pair_to: pair_to.clone(),
                    on_owner_remove: *on_owner_remove,
                    on_target_remove: *on_target_remove,
                });
            }
        }
    }

    field
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::decl::TypeRef;
    use crate::value::ValueTy;

    #[test]
    fn members_without_field_marker_are_ignored() {
        let registry: Registry = [TypeDecl::entity("Customer")
            .hierarchy_root()
            .member(MemberDecl::field("Id", ValueTy::I32).key())
            .member(MemberDecl::new("Cache", TypeRef::named("Session")))]
        .into_iter()
        .collect();

        let domain = collect(&registry).unwrap();
        let customer = domain.get("Customer").unwrap();
        assert_eq!(customer.fields.len(), 1);
        assert!(customer.fields["Id"].is_key());
    }

    #[test]
    fn templates_and_non_persistent_types_are_kept_apart() {
        let registry: Registry = [
            TypeDecl::entity("Audit")
                .generic_param("T", None)
                .member(MemberDecl::field("Target", TypeRef::param("T"))),
            TypeDecl::other("Session"),
        ]
        .into_iter()
        .collect();

        let domain = collect(&registry).unwrap();
        assert!(domain.types.is_empty());
        assert!(domain.templates.contains_key("Audit"));
        assert!(domain.non_persistent.contains("Session"));
    }
}
