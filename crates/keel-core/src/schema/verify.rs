use super::model::{DomainModel, FieldKind, TypeInfoId};
use crate::{Error, Result};

use indexmap::IndexMap;
use std::collections::HashSet;

struct Verify<'a> {
    model: &'a DomainModel,
}

impl DomainModel {
    pub(super) fn verify(&self) -> Result<()> {
        Verify { model: self }.verify()
    }
}

impl Verify<'_> {
    fn verify(&self) -> Result<()> {
        debug_assert!(self.verify_ids_populated());

        self.verify_each_entity_has_primary_index();
        self.verify_table_names_are_unique()?;
        self.verify_index_names_are_unique()?;
        self.verify_index_columns_exist()?;
        Ok(())
    }

    fn verify_ids_populated(&self) -> bool {
        for (index, ty) in self.model.types().enumerate() {
            assert_eq!(ty.id, TypeInfoId(index));
            assert_ne!(ty.id, TypeInfoId::placeholder());

            if ty.is_entity() {
                assert!(ty.hierarchy.is_some(), "entity without hierarchy; type={}", ty.name);
                assert!(ty.type_id.is_some(), "entity without type id; type={}", ty.name);
            }

            for field in ty.fields.values() {
                match field.kind {
                    FieldKind::Structure(target)
                    | FieldKind::Reference(target)
                    | FieldKind::EntitySet(target) => {
                        assert_ne!(target, TypeInfoId::placeholder());
                    }
                    FieldKind::Value(_) => {}
                }
            }
        }

        for association in &self.model.associations {
            assert_ne!(association.owner, TypeInfoId::placeholder());
            assert_ne!(association.target, TypeInfoId::placeholder());
        }

        true
    }

    fn verify_each_entity_has_primary_index(&self) {
        for ty in self.model.entities() {
            assert!(
                ty.primary_index().is_some(),
                "entity without primary index; type={}",
                ty.name
            );
        }
    }

    fn verify_table_names_are_unique(&self) -> Result<()> {
        let mut tables: IndexMap<&str, &str> = IndexMap::new();

        for hierarchy in &self.model.hierarchies {
            for table in &hierarchy.tables {
                let owner = self.model.type_info(table.types[0]).name.as_str();

                if let Some(existing) = tables.insert(table.name.as_str(), owner) {
                    return Err(Error::domain_builder(format!(
                        "Table '{}' is mapped by both '{existing}' and '{owner}'",
                        table.name
                    )));
                }
            }
        }

        Ok(())
    }

    fn verify_index_names_are_unique(&self) -> Result<()> {
        for ty in self.model.entities() {
            let mut names = HashSet::new();

            for index in &ty.indexes {
                if !names.insert(&index.name) {
                    return Err(Error::domain_builder(format!(
                        "Type '{}' has more than one index named '{}'",
                        ty.name, index.name
                    )));
                }
            }
        }

        Ok(())
    }

    fn verify_index_columns_exist(&self) -> Result<()> {
        for ty in self.model.entities() {
            for index in &ty.indexes {
                let columns = index
                    .column_names()
                    .chain(index.included_columns.iter().map(String::as_str));

                for column in columns {
                    if !ty.columns.contains_key(column) {
                        return Err(Error::domain_builder(format!(
                            "Index '{}' of type '{}' refers to unknown column '{column}'",
                            index.name, ty.name
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}
