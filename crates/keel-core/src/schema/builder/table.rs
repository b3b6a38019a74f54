use super::BuildDomain;
use crate::schema::def::InheritanceSchema;
use crate::schema::model::{ColumnInfo, HierarchyInfo, TableInfo, TypeInfo};
use crate::{Error, Result};

use indexmap::IndexMap;

impl BuildDomain<'_> {
    /// Lays out the physical tables of every hierarchy according to its
    /// inheritance schema.
    pub(super) fn build_tables(&mut self) -> Result<()> {
        for i in 0..self.hierarchies.len() {
            let hierarchy = &self.hierarchies[i];

            let tables = match hierarchy.schema {
                InheritanceSchema::ConcreteTable => self.concrete_tables(hierarchy),
                InheritanceSchema::ClassTable => self.class_tables(hierarchy),
                InheritanceSchema::SingleTable => vec![self.single_table(hierarchy)?],
            };

            self.hierarchies[i].tables = tables;
        }

        log::debug!(
            "tables laid out; tables={}",
            self.hierarchies.iter().map(|h| h.tables.len()).sum::<usize>()
        );

        Ok(())
    }

    /// One complete table per concrete type.
    fn concrete_tables(&self, hierarchy: &HierarchyInfo) -> Vec<TableInfo> {
        self.hierarchy_types(hierarchy)
            .filter(|ty| !ty.is_abstract)
            .map(|ty| TableInfo {
                name: ty.mapping_name.clone(),
                types: vec![ty.id],
                columns: ty.columns.clone(),
            })
            .collect()
    }

    /// One table per type, holding the key and the columns the type declares.
    fn class_tables(&self, hierarchy: &HierarchyInfo) -> Vec<TableInfo> {
        self.hierarchy_types(hierarchy)
            .map(|ty| {
                let columns = ty
                    .columns
                    .values()
                    .filter(|column| {
                        column.is_primary_key
                            || (column.is_system && ty.id == hierarchy.root)
                            || (!column.is_inherited && !column.is_system)
                    })
                    .map(|column| (column.name.clone(), column.clone()))
                    .collect();

                TableInfo {
                    name: ty.mapping_name.clone(),
                    types: vec![ty.id],
                    columns,
                }
            })
            .collect()
    }

    /// The root's table, holding the columns of every type in the
    /// hierarchy. Columns not stored by the root are nullable.
    fn single_table(&self, hierarchy: &HierarchyInfo) -> Result<TableInfo> {
        let root = self.type_info(hierarchy.root);
        let mut columns: IndexMap<String, ColumnInfo> = IndexMap::new();
        let mut owners: IndexMap<String, &str> = IndexMap::new();

        for ty in self.hierarchy_types(hierarchy) {
            for column in ty.columns.values() {
                match columns.get(&column.name) {
                    Some(existing) if existing.ty != column.ty => {
                        return Err(Error::domain_builder(format!(
                            "Column '{}' of table '{}' is mapped to different types: '{}' in '{}' and '{}' in '{}'",
                            column.name,
                            root.mapping_name,
                            existing.ty,
                            owners[&column.name],
                            column.ty,
                            ty.name
                        )));
                    }
                    Some(_) => {}
                    None => {
                        let mut column = column.clone();
                        if ty.id != root.id {
                            column.nullable = true;
                        }
                        owners.insert(column.name.clone(), &ty.name);
                        columns.insert(column.name.clone(), column);
                    }
                }
            }
        }

        Ok(TableInfo {
            name: root.mapping_name.clone(),
            types: hierarchy.types.clone(),
            columns,
        })
    }

    fn hierarchy_types<'b>(
        &'b self,
        hierarchy: &'b HierarchyInfo,
    ) -> impl Iterator<Item = &'b TypeInfo> + 'b {
        hierarchy.types.iter().map(|id| self.type_info(*id))
    }
}
