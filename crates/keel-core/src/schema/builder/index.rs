use super::BuildDomain;
use crate::schema::def::{Direction, IndexDef};
use crate::schema::model::{FieldInfo, IndexInfo, TypeInfo, TypeInfoId};
use crate::{Error, Result};

impl BuildDomain<'_> {
    /// Builds the primary index and the declared indexes of every entity.
    /// Indexes declared on an ancestor apply to its descendants as well.
    pub(super) fn build_indexes(&mut self) -> Result<()> {
        let domain = self.domain;
        let entities: Vec<TypeInfoId> = self
            .types
            .values()
            .filter(|ty| ty.is_entity())
            .map(|ty| ty.id)
            .collect();

        for id in entities {
            let mut indexes = vec![self.primary_index(id)];

            for declaring in self.ancestor_chain(id) {
                let def = &domain.types[self.type_info(declaring).name.as_str()];

                for index in &def.indexes {
                    if let Some(index) = self.resolve_index(id, index, declaring != id)? {
                        indexes.push(index);
                    }
                }
            }

            self.type_info_mut(id).indexes = indexes;
        }

        log::debug!(
            "indexes resolved; indexes={}",
            self.types.values().map(|ty| ty.indexes.len()).sum::<usize>()
        );

        Ok(())
    }

    fn primary_index(&self, id: TypeInfoId) -> IndexInfo {
        let ty = self.type_info(id);
        let leaves = self
            .key_of(&ty.name)
            .map(|key| key.leaves.clone())
            .unwrap_or_default();

        let columns = leaves
            .iter()
            .filter_map(|leaf| ty.fields.get(leaf))
            .flat_map(|field| field.columns.iter())
            .map(|column| (column.clone(), Direction::Asc))
            .collect();

        IndexInfo {
            name: self.names.primary_index_name(&ty.mapping_name),
            columns,
            fields: leaves,
            included_columns: vec![],
            unique: true,
            is_primary: true,
            is_inherited: false,
        }
    }

    /// Returns `None` for indexes without any key column.
    fn resolve_index(
        &self,
        id: TypeInfoId,
        def: &IndexDef,
        is_inherited: bool,
    ) -> Result<Option<IndexInfo>> {
        let ty = self.type_info(id);

        let name = match &def.name {
            Some(name) => self.names.index_name(name),
            None => {
                let fields: Vec<&str> =
                    def.key_fields.iter().map(|(name, _)| name.as_str()).collect();
                self.names.index_name(&format!("IX_{}", fields.concat()))
            }
        };

        let mut columns = vec![];
        let mut fields = vec![];

        for (field, direction) in &def.key_fields {
            let field = index_field(ty, &name, field)?;
            columns.extend(field.columns.iter().map(|column| (column.clone(), *direction)));
            fields.push(field.name.clone());
        }

        let mut included_columns = vec![];
        for field in &def.included_fields {
            included_columns.extend(index_field(ty, &name, field)?.columns.iter().cloned());
        }

        if columns.is_empty() {
            log::debug!("dropping index without key columns; type={} index={name}", ty.name);
            return Ok(None);
        }

        Ok(Some(IndexInfo {
            name,
            columns,
            fields,
            included_columns,
            unique: def.unique,
            is_primary: false,
            is_inherited,
        }))
    }

    /// The type and its ancestors, root first.
    fn ancestor_chain(&self, id: TypeInfoId) -> Vec<TypeInfoId> {
        let mut chain = vec![id];
        let mut current = id;

        while let Some(ancestor) = self.type_info(current).ancestor {
            chain.push(ancestor);
            current = ancestor;
        }

        chain.reverse();
        chain
    }
}

fn index_field<'a>(ty: &'a TypeInfo, index: &str, name: &str) -> Result<&'a FieldInfo> {
    let field = ty.fields.get(name).ok_or_else(|| {
        Error::domain_builder(format!(
            "Index '{index}' of type '{}' refers to unknown field '{name}'",
            ty.name
        ))
    })?;

    if field.is_entity_set() {
        return Err(Error::domain_builder(format!(
            "Index '{index}' of type '{}' can't include entity set field '{name}'",
            ty.name
        )));
    }

    Ok(field)
}
