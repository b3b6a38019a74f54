use super::BuildDomain;
use crate::schema::model::{FieldInfo, FullTextColumn, FullTextIndexInfo, TypeInfo};
use crate::value::ValueTy;
use crate::Result;

impl BuildDomain<'_> {
    /// Aggregates the full-text fields of every hierarchy into a single
    /// index on the hierarchy root.
    ///
    /// A string column qualifies when its field, or any structure field
    /// enclosing it, is marked for full-text indexing; the nearest mark
    /// provides the language. Columns are deduplicated by physical name.
    pub(super) fn build_full_text_indexes(&mut self) -> Result<()> {
        let mut built = 0;

        for i in 0..self.hierarchies.len() {
            let hierarchy = &self.hierarchies[i];
            let mut columns: Vec<FullTextColumn> = vec![];

            for ty in hierarchy.types.iter().map(|id| self.type_info(*id)) {
                for field in ty.fields.values() {
                    if field.value_ty() != Some(ValueTy::String) {
                        continue;
                    }

                    let Some(language) = full_text_language(ty, field) else {
                        continue;
                    };

                    for column in &field.columns {
                        if columns.iter().any(|existing| existing.column == *column) {
                            continue;
                        }

                        columns.push(FullTextColumn {
                            column: column.clone(),
                            declaring_type: ty.id,
                            field: field.name.clone(),
                            language: language.to_string(),
                        });
                    }
                }
            }

            if columns.is_empty() {
                continue;
            }

            let root = hierarchy.root;
            let name = self
                .names
                .full_text_index_name(&self.type_info(root).mapping_name);

            self.type_info_mut(root).full_text_index = Some(FullTextIndexInfo { name, columns });
            built += 1;
        }

        log::debug!("full-text indexes built; indexes={built}");
        Ok(())
    }
}

/// Language of the nearest full-text mark on the field or its enclosing
/// structure fields. Key parts of references never qualify.
fn full_text_language<'a>(ty: &'a TypeInfo, field: &'a FieldInfo) -> Option<&'a str> {
    let mut current = Some(field);

    while let Some(field) = current {
        if field.is_reference() {
            return None;
        }

        if let Some(language) = &field.full_text {
            return Some(language);
        }

        current = field.parent.as_ref().and_then(|parent| ty.fields.get(parent));
    }

    None
}
