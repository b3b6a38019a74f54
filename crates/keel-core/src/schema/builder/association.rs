use super::BuildDomain;
use crate::schema::def::FieldDef;
use crate::schema::model::{
    AssociationInfo, FieldInfo, FieldKind, Multiplicity, TypeInfo, TypeInfoId,
};
use crate::{Error, Result};

impl BuildDomain<'_> {
    /// Turns the reference and entity-set fields declared by entities into
    /// associations, validating declared pairings.
    pub(super) fn build_associations(&mut self) -> Result<()> {
        let mut associations = vec![];

        for ty in self.types.values().filter(|ty| ty.is_entity()) {
            for field in ty.declared_fields() {
                let Some(target) = field.target().filter(|_| !field.is_structure()) else {
                    continue;
                };

                let def = self.field_def(ty, &field.name).and_then(|def| def.association.as_ref());

                let paired = match def.and_then(|def| def.pair_to.as_deref()) {
                    Some(pair) => Some(self.resolve_pair(ty, field, target, pair)?),
                    None => None,
                };

                associations.push(AssociationInfo {
                    owner: ty.id,
                    field: field.name.clone(),
                    target,
                    multiplicity: Multiplicity::new(
                        field.is_entity_set(),
                        paired.as_ref().map(|pair| pair.is_entity_set()),
                    ),
                    on_owner_remove: def.map(|def| def.on_owner_remove).unwrap_or_default(),
                    on_target_remove: def.map(|def| def.on_target_remove).unwrap_or_default(),
                    paired: paired.map(|pair| (target, pair.name.clone())),
                });
            }
        }

        log::debug!("associations resolved; associations={}", associations.len());
        self.associations = associations;
        Ok(())
    }

    /// The paired field must live on the target and point back to the
    /// owner, one of its ancestors, or one of its interfaces.
    fn resolve_pair(
        &self,
        owner: &TypeInfo,
        field: &FieldInfo,
        target: TypeInfoId,
        pair: &str,
    ) -> Result<&FieldInfo> {
        let target = self.type_info(target);

        let paired = target.fields.get(pair).ok_or_else(|| {
            Error::domain_builder(format!(
                "Association '{}.{}' is paired with unknown field '{}.{pair}'",
                owner.name, field.name, target.name
            ))
        })?;

        let back = match paired.kind {
            FieldKind::Reference(back) | FieldKind::EntitySet(back) => back,
            _ => {
                return Err(Error::domain_builder(format!(
                    "Association '{}.{}' is paired with '{}.{pair}' which is neither a reference nor an entity set",
                    owner.name, field.name, target.name
                )))
            }
        };

        if !self
            .domain
            .is_assignable(&owner.name, &self.type_info(back).name)
        {
            return Err(Error::domain_builder(format!(
                "Association '{}.{}' is paired with '{}.{pair}' which doesn't refer back to '{}'",
                owner.name, field.name, target.name, owner.name
            )));
        }

        Ok(paired)
    }

    /// Finds the definition a flattened field was built from.
    fn field_def(&self, ty: &TypeInfo, name: &str) -> Option<&FieldDef> {
        let field = ty.fields.get(name)?;

        match &field.parent {
            None => {
                let declaring = &self.type_info(field.declaring_type).name;
                self.domain.get(declaring)?.field(name)
            }
            Some(parent) => {
                let FieldKind::Structure(structure) = ty.fields.get(parent)?.kind else {
                    return None;
                };
                let relative = name.strip_prefix(parent.as_str())?.strip_prefix('.')?;
                self.field_def(self.type_info(structure), relative)
            }
        }
    }
}
