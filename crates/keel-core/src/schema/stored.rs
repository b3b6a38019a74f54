//! Flat, serializable form of a sealed [`DomainModel`].
//!
//! Cross references are stored by name. After deserialization,
//! [`StoredDomainModel::update_references`] resolves them back into
//! positional links and rejects documents with dangling names.

mod diff;
pub use diff::{DiffContext, FieldsDiff, FieldsDiffItem, RenameHints, TypesDiff, TypesDiffItem};

use super::def::{InheritanceSchema, RemoveAction, TypeKind};
use super::model::{
    AssociationInfo, ColumnInfo, DomainModel, FieldInfo, FieldKind, FullTextColumn,
    FullTextIndexInfo, HierarchyId, HierarchyInfo, IndexInfo, KeyInfo, Multiplicity, TableInfo,
    TypeInfo, TypeInfoId,
};
use crate::value::ValueTy;
use crate::{Error, Result};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

const STORED_MODEL_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDomainModel {
    /// Stored document format version
    version: u32,

    /// Types in build order.
    pub types: Vec<StoredType>,

    pub hierarchies: Vec<StoredHierarchy>,

    pub associations: Vec<StoredAssociation>,

    /// Type positions by name. Populated by reference resolution.
    #[serde(skip)]
    lookup: IndexMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredType {
    pub name: String,
    pub mapping_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping_override: Option<String>,

    pub kind: TypeKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_id: Option<i32>,

    #[serde(default)]
    pub is_abstract: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generic_template: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ancestor: Option<String>,

    #[serde(default)]
    pub interfaces: Vec<String>,

    #[serde(default)]
    pub implementors: Vec<String>,

    /// Name of the hierarchy root, for entities.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hierarchy: Option<String>,

    pub fields: Vec<StoredField>,

    pub columns: Vec<ColumnInfo>,

    #[serde(default)]
    pub indexes: Vec<IndexInfo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_text_index: Option<StoredFullTextIndex>,

    #[serde(skip)]
    ancestor_index: Option<usize>,

    #[serde(skip)]
    hierarchy_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredField {
    pub name: String,
    pub raw_name: String,
    pub mapping_name: String,

    /// Name of the type declaring the field. For inherited fields this is
    /// the ancestor the field comes from.
    pub declaring_type: String,

    #[serde(default)]
    pub is_inherited: bool,

    pub kind: StoredFieldKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    #[serde(default)]
    pub columns: Vec<String>,

    #[serde(default)]
    pub is_key: bool,

    #[serde(default)]
    pub is_system: bool,

    #[serde(default)]
    pub nullable: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u8>,

    #[serde(default)]
    pub lazy_load: bool,

    #[serde(default)]
    pub is_version: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_text: Option<String>,

    #[serde(skip)]
    declaring_index: usize,

    #[serde(skip)]
    target_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoredFieldKind {
    Value(ValueTy),
    Structure(String),
    Reference(String),
    EntitySet(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFullTextIndex {
    pub name: String,
    pub columns: Vec<StoredFullTextColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFullTextColumn {
    pub column: String,
    pub declaring_type: String,
    pub field: String,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredHierarchy {
    pub root: String,
    pub types: Vec<String>,
    pub key: KeyInfo,
    pub schema: InheritanceSchema,
    pub tables: Vec<StoredTable>,

    #[serde(skip)]
    root_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTable {
    pub name: String,
    pub types: Vec<String>,
    pub columns: Vec<ColumnInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredAssociation {
    pub owner: String,
    pub field: String,
    pub target: String,
    pub multiplicity: Multiplicity,

    #[serde(default)]
    pub on_owner_remove: RemoveAction,

    #[serde(default)]
    pub on_target_remove: RemoveAction,

    /// Paired type and field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paired: Option<(String, String)>,
}

impl StoredDomainModel {
    /// Parses a stored model and resolves its references.
    pub fn from_json(src: &str) -> Result<Self> {
        let mut stored: StoredDomainModel = serde_json::from_str(src)
            .map_err(|err| Error::invalid_stored_model(format!("malformed document: {err}")))?;

        if stored.version != STORED_MODEL_VERSION {
            return Err(Error::invalid_stored_model(format!(
                "unsupported version {}; expected version {STORED_MODEL_VERSION}",
                stored.version
            )));
        }

        stored.update_references()?;
        Ok(stored)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&contents)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_json()?)?;
        Ok(())
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn get(&self, name: &str) -> Option<&StoredType> {
        match self.lookup.get(name) {
            Some(index) => self.types.get(*index),
            None => self.types.iter().find(|ty| ty.name == name),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Resolves names into positional links: ancestors, hierarchy roots,
    /// field declaring types and targets, association ends.
    pub fn update_references(&mut self) -> Result<()> {
        let mut lookup = IndexMap::with_capacity(self.types.len());
        for (index, ty) in self.types.iter().enumerate() {
            if lookup.insert(ty.name.clone(), index).is_some() {
                return Err(Error::invalid_stored_model(format!(
                    "type '{}' is stored more than once",
                    ty.name
                )));
            }
        }

        let mut roots = IndexMap::with_capacity(self.hierarchies.len());
        for (index, hierarchy) in self.hierarchies.iter_mut().enumerate() {
            hierarchy.root_index = resolve(&lookup, &hierarchy.root, "hierarchy root")?;
            roots.insert(hierarchy.root.clone(), index);

            for name in hierarchy
                .types
                .iter()
                .chain(hierarchy.tables.iter().flat_map(|table| table.types.iter()))
            {
                resolve(&lookup, name, "hierarchy member")?;
            }
        }

        for ty in &mut self.types {
            ty.ancestor_index = match &ty.ancestor {
                Some(ancestor) => Some(resolve(&lookup, ancestor, "ancestor")?),
                None => None,
            };

            ty.hierarchy_index = match &ty.hierarchy {
                Some(root) => Some(*roots.get(root).ok_or_else(|| {
                    Error::invalid_stored_model(format!(
                        "type '{}' belongs to unknown hierarchy '{root}'",
                        ty.name
                    ))
                })?),
                None => None,
            };

            for name in ty.interfaces.iter().chain(&ty.implementors) {
                resolve(&lookup, name, "interface")?;
            }

            for field in &mut ty.fields {
                field.declaring_index = resolve(&lookup, &field.declaring_type, "declaring type")?;
                field.target_index = match &field.kind {
                    StoredFieldKind::Value(_) => None,
                    StoredFieldKind::Structure(target)
                    | StoredFieldKind::Reference(target)
                    | StoredFieldKind::EntitySet(target) => {
                        Some(resolve(&lookup, target, "field target")?)
                    }
                };
            }

            if let Some(full_text) = &ty.full_text_index {
                for column in &full_text.columns {
                    resolve(&lookup, &column.declaring_type, "full-text declaring type")?;
                }
            }
        }

        self.lookup = lookup;
        self.verify_inherited_fields()?;
        self.verify_associations()?;

        log::debug!(
            "stored model references resolved; types={} hierarchies={}",
            self.types.len(),
            self.hierarchies.len()
        );
        Ok(())
    }

    /// Rebuilds the sealed model. References must have been resolved.
    pub fn to_model(&self) -> Result<DomainModel> {
        if self.lookup.len() != self.types.len() {
            return Err(Error::invalid_stored_model(
                "references have not been resolved",
            ));
        }

        let mut types = IndexMap::with_capacity(self.types.len());

        for (index, stored) in self.types.iter().enumerate() {
            let descendants = self
                .types
                .iter()
                .enumerate()
                .filter(|(_, ty)| ty.ancestor_index == Some(index))
                .map(|(index, _)| TypeInfoId(index))
                .collect();

            let fields = stored
                .fields
                .iter()
                .map(|field| (field.name.clone(), field.to_info()))
                .collect();

            let full_text_index = stored.full_text_index.as_ref().map(|index| FullTextIndexInfo {
                name: index.name.clone(),
                columns: index
                    .columns
                    .iter()
                    .map(|column| FullTextColumn {
                        column: column.column.clone(),
                        declaring_type: self.id(&column.declaring_type),
                        field: column.field.clone(),
                        language: column.language.clone(),
                    })
                    .collect(),
            });

            types.insert(
                stored.name.clone(),
                TypeInfo {
                    id: TypeInfoId(index),
                    name: stored.name.clone(),
                    mapping_name: stored.mapping_name.clone(),
                    mapping_override: stored.mapping_override.clone(),
                    kind: stored.kind,
                    type_id: stored.type_id,
                    is_abstract: stored.is_abstract,
                    generic_template: stored.generic_template.clone(),
                    ancestor: stored.ancestor_index.map(TypeInfoId),
                    descendants,
                    hierarchy: stored.hierarchy_index.map(HierarchyId),
                    interfaces: stored.interfaces.iter().map(|name| self.id(name)).collect(),
                    implementors: stored.implementors.iter().map(|name| self.id(name)).collect(),
                    fields,
                    columns: columns_by_name(&stored.columns),
                    indexes: stored.indexes.clone(),
                    full_text_index,
                },
            );
        }

        let hierarchies = self
            .hierarchies
            .iter()
            .enumerate()
            .map(|(index, hierarchy)| HierarchyInfo {
                id: HierarchyId(index),
                root: TypeInfoId(hierarchy.root_index),
                types: hierarchy.types.iter().map(|name| self.id(name)).collect(),
                key: hierarchy.key.clone(),
                schema: hierarchy.schema,
                tables: hierarchy
                    .tables
                    .iter()
                    .map(|table| TableInfo {
                        name: table.name.clone(),
                        types: table.types.iter().map(|name| self.id(name)).collect(),
                        columns: columns_by_name(&table.columns),
                    })
                    .collect(),
            })
            .collect();

        let associations = self
            .associations
            .iter()
            .map(|association| AssociationInfo {
                owner: self.id(&association.owner),
                field: association.field.clone(),
                target: self.id(&association.target),
                multiplicity: association.multiplicity,
                on_owner_remove: association.on_owner_remove,
                on_target_remove: association.on_target_remove,
                paired: association
                    .paired
                    .as_ref()
                    .map(|(ty, field)| (self.id(ty), field.clone())),
            })
            .collect();

        Ok(DomainModel {
            types,
            hierarchies,
            associations,
        })
    }

    /// Every inherited top-level field must exist on the ancestor.
    fn verify_inherited_fields(&self) -> Result<()> {
        for ty in &self.types {
            let inherited = ty
                .fields
                .iter()
                .filter(|field| field.is_inherited && field.parent.is_none());

            for field in inherited {
                let ancestor = ty.ancestor_index.map(|index| &self.types[index]);

                let found = ancestor
                    .map(|ancestor| ancestor.fields.iter().any(|f| f.name == field.name))
                    .unwrap_or(false);

                if !found {
                    return Err(Error::invalid_stored_model(format!(
                        "inherited field '{}.{}' is missing from the ancestor",
                        ty.name, field.name
                    )));
                }
            }
        }

        Ok(())
    }

    fn verify_associations(&self) -> Result<()> {
        for association in &self.associations {
            resolve(&self.lookup, &association.owner, "association owner")?;
            resolve(&self.lookup, &association.target, "association target")?;

            if let Some((ty, field)) = &association.paired {
                let paired = &self.types[resolve(&self.lookup, ty, "paired type")?];

                if !paired.fields.iter().any(|f| f.name == *field) {
                    return Err(Error::invalid_stored_model(format!(
                        "association '{}.{}' is paired with unknown field '{ty}.{field}'",
                        association.owner, association.field
                    )));
                }
            }
        }

        Ok(())
    }

    /// Only called once references are resolved.
    fn id(&self, name: &str) -> TypeInfoId {
        TypeInfoId(self.lookup.get(name).copied().unwrap_or_default())
    }
}

impl StoredType {
    pub fn field(&self, name: &str) -> Option<&StoredField> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Fields that are not nested in another field.
    pub fn top_level_fields(&self) -> impl Iterator<Item = &StoredField> + '_ {
        self.fields.iter().filter(|field| field.parent.is_none())
    }
}

impl StoredField {
    fn to_info(&self) -> FieldInfo {
        let target = TypeInfoId(self.target_index.unwrap_or_default());

        FieldInfo {
            name: self.name.clone(),
            raw_name: self.raw_name.clone(),
            mapping_name: self.mapping_name.clone(),
            declaring_type: TypeInfoId(self.declaring_index),
            is_inherited: self.is_inherited,
            kind: match &self.kind {
                StoredFieldKind::Value(ty) => FieldKind::Value(*ty),
                StoredFieldKind::Structure(_) => FieldKind::Structure(target),
                StoredFieldKind::Reference(_) => FieldKind::Reference(target),
                StoredFieldKind::EntitySet(_) => FieldKind::EntitySet(target),
            },
            parent: self.parent.clone(),
            columns: self.columns.clone(),
            is_key: self.is_key,
            is_system: self.is_system,
            nullable: self.nullable,
            length: self.length,
            precision: self.precision,
            scale: self.scale,
            lazy_load: self.lazy_load,
            is_version: self.is_version,
            full_text: self.full_text.clone(),
        }
    }
}

impl DomainModel {
    /// Flattens the model into its stored form. The result has its
    /// references resolved already.
    pub fn to_stored(&self) -> StoredDomainModel {
        let name = |id: TypeInfoId| self.type_info(id).name.clone();

        let types = self
            .types()
            .map(|ty| StoredType {
                name: ty.name.clone(),
                mapping_name: ty.mapping_name.clone(),
                mapping_override: ty.mapping_override.clone(),
                kind: ty.kind,
                type_id: ty.type_id,
                is_abstract: ty.is_abstract,
                generic_template: ty.generic_template.clone(),
                ancestor: ty.ancestor.map(name),
                interfaces: ty.interfaces.iter().copied().map(name).collect(),
                implementors: ty.implementors.iter().copied().map(name).collect(),
                hierarchy: ty.hierarchy.map(|id| name(self.hierarchy(id).root)),
                fields: ty
                    .fields
                    .values()
                    .map(|field| StoredField {
                        name: field.name.clone(),
                        raw_name: field.raw_name.clone(),
                        mapping_name: field.mapping_name.clone(),
                        declaring_type: name(field.declaring_type),
                        is_inherited: field.is_inherited,
                        kind: match field.kind {
                            FieldKind::Value(ty) => StoredFieldKind::Value(ty),
                            FieldKind::Structure(id) => StoredFieldKind::Structure(name(id)),
                            FieldKind::Reference(id) => StoredFieldKind::Reference(name(id)),
                            FieldKind::EntitySet(id) => StoredFieldKind::EntitySet(name(id)),
                        },
                        parent: field.parent.clone(),
                        columns: field.columns.clone(),
                        is_key: field.is_key,
                        is_system: field.is_system,
                        nullable: field.nullable,
                        length: field.length,
                        precision: field.precision,
                        scale: field.scale,
                        lazy_load: field.lazy_load,
                        is_version: field.is_version,
                        full_text: field.full_text.clone(),
                        declaring_index: field.declaring_type.0,
                        target_index: field.target().map(|id| id.0),
                    })
                    .collect(),
                columns: ty.columns.values().cloned().collect(),
                indexes: ty.indexes.clone(),
                full_text_index: ty.full_text_index.as_ref().map(|index| StoredFullTextIndex {
                    name: index.name.clone(),
                    columns: index
                        .columns
                        .iter()
                        .map(|column| StoredFullTextColumn {
                            column: column.column.clone(),
                            declaring_type: name(column.declaring_type),
                            field: column.field.clone(),
                            language: column.language.clone(),
                        })
                        .collect(),
                }),
                ancestor_index: ty.ancestor.map(|id| id.0),
                hierarchy_index: ty.hierarchy.map(|id| id.0),
            })
            .collect();

        let hierarchies = self
            .hierarchies
            .iter()
            .map(|hierarchy| StoredHierarchy {
                root: name(hierarchy.root),
                types: hierarchy.types.iter().copied().map(name).collect(),
                key: hierarchy.key.clone(),
                schema: hierarchy.schema,
                tables: hierarchy
                    .tables
                    .iter()
                    .map(|table| StoredTable {
                        name: table.name.clone(),
                        types: table.types.iter().copied().map(name).collect(),
                        columns: table.columns.values().cloned().collect(),
                    })
                    .collect(),
                root_index: hierarchy.root.0,
            })
            .collect();

        let associations = self
            .associations
            .iter()
            .map(|association| StoredAssociation {
                owner: name(association.owner),
                field: association.field.clone(),
                target: name(association.target),
                multiplicity: association.multiplicity,
                on_owner_remove: association.on_owner_remove,
                on_target_remove: association.on_target_remove,
                paired: association
                    .paired
                    .as_ref()
                    .map(|(ty, field)| (name(*ty), field.clone())),
            })
            .collect();

        StoredDomainModel {
            version: STORED_MODEL_VERSION,
            types,
            hierarchies,
            associations,
            lookup: self
                .types
                .keys()
                .enumerate()
                .map(|(index, name)| (name.clone(), index))
                .collect(),
        }
    }
}

fn resolve(lookup: &IndexMap<String, usize>, name: &str, role: &str) -> Result<usize> {
    lookup.get(name).copied().ok_or_else(|| {
        Error::invalid_stored_model(format!("{role} '{name}' doesn't match any stored type"))
    })
}

fn columns_by_name(columns: &[ColumnInfo]) -> IndexMap<String, ColumnInfo> {
    columns
        .iter()
        .map(|column| (column.name.clone(), column.clone()))
        .collect()
}
