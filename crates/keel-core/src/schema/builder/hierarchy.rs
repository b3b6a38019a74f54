use super::BuildDomain;
use crate::schema::def::TypeDef;
use crate::schema::model::{HierarchyId, HierarchyInfo, TypeInfoId};
use crate::{Error, Result};

/// Type ids are assigned sequentially from this value, in build order.
const FIRST_TYPE_ID: i32 = 100;

impl BuildDomain<'_> {
    /// Groups entities into hierarchies and resolves each hierarchy's key.
    ///
    /// Entities are visited in build order, so ancestors are grouped before
    /// their descendants and hierarchies used in keys are resolved before
    /// the hierarchies whose keys reference them.
    pub(super) fn build_hierarchies(&mut self) -> Result<()> {
        let domain = self.domain;
        let entities: Vec<TypeInfoId> = self
            .types
            .values()
            .filter(|ty| ty.is_entity())
            .map(|ty| ty.id)
            .collect();

        for id in entities {
            let def = &domain.types[self.type_info(id).name.as_str()];
            let ancestor_hierarchy = self
                .type_info(id)
                .ancestor
                .and_then(|ancestor| self.type_info(ancestor).hierarchy);

            let hierarchy = match (&def.hierarchy_root, ancestor_hierarchy) {
                (Some(_), Some(enclosing)) => {
                    let root = self.hierarchies[enclosing.0].root;
                    return Err(Error::domain_builder(format!(
                        "Type '{}' can't be a hierarchy root: it already belongs to hierarchy '{}'",
                        def.name,
                        self.type_info(root).name
                    )));
                }
                (Some(options), None) => {
                    let key = self.build_key(def, options)?;
                    let hierarchy = HierarchyId(self.hierarchies.len());

                    self.hierarchies.push(HierarchyInfo {
                        id: hierarchy,
                        root: id,
                        types: vec![id],
                        key,
                        schema: options.schema.unwrap_or(self.default_schema()),
                        tables: vec![],
                    });

                    hierarchy
                }
                (None, Some(hierarchy)) => {
                    self.check_descendant_keys(def, hierarchy)?;
                    self.hierarchies[hierarchy.0].types.push(id);
                    hierarchy
                }
                (None, None) => {
                    return Err(Error::domain_builder(format!(
                        "Type '{}' doesn't belong to any hierarchy: neither it nor its ancestors are marked as hierarchy root",
                        def.name
                    )));
                }
            };

            self.type_info_mut(id).hierarchy = Some(hierarchy);
        }

        let mut next = FIRST_TYPE_ID;
        for ty in self.types.values_mut().filter(|ty| ty.is_entity()) {
            ty.type_id = Some(next);
            next += 1;
        }

        log::debug!(
            "hierarchies resolved; hierarchies={} entities={}",
            self.hierarchies.len(),
            next - FIRST_TYPE_ID
        );

        Ok(())
    }

    /// Key fields may only be declared on the hierarchy root. A descendant
    /// may redeclare an inherited key field.
    fn check_descendant_keys(&self, def: &TypeDef, hierarchy: HierarchyId) -> Result<()> {
        let hierarchy = &self.hierarchies[hierarchy.0];

        for field in def.fields.values().filter(|field| field.is_key()) {
            if !hierarchy.key.fields.contains(&field.name) {
                return Err(Error::domain_builder(format!(
                    "Key field '{}.{}' is declared on type '{}' which is not the root of hierarchy '{}'",
                    def.name,
                    field.name,
                    def.name,
                    self.type_info(hierarchy.root).name
                )));
            }
        }

        Ok(())
    }
}
