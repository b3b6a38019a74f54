use super::{FieldDef, GeneratorKind, IndexDef, InheritanceSchema};
use crate::schema::decl::{GenericParam, TypeRef};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    pub name: String,

    pub kind: TypeKind,

    /// Base type name.
    pub ancestor: Option<String>,

    /// Implemented interfaces, or extended interfaces for an interface.
    pub interfaces: Vec<String>,

    /// Non-empty for generic templates.
    pub generic_params: Vec<GenericParam>,

    /// Set for closures synthesized from a generic template.
    pub generic: Option<GenericInstance>,

    /// Declared fields, in declaration order.
    pub fields: IndexMap<String, FieldDef>,

    pub indexes: Vec<IndexDef>,

    /// Set when the type is marked as a hierarchy root.
    pub hierarchy_root: Option<HierarchyOptions>,

    /// Explicit mapping name override.
    pub mapping_name: Option<String>,

    pub is_abstract: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Entity,
    Structure,
    Interface,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenericInstance {
    pub template: String,
    pub args: Vec<TypeRef>,
}

/// Options attached to a hierarchy root.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HierarchyOptions {
    pub generator: GeneratorKind,
    pub include_type_id: bool,

    /// `None` uses the builder's default schema.
    pub schema: Option<InheritanceSchema>,
}

impl TypeDef {
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            ancestor: None,
            interfaces: vec![],
            generic_params: vec![],
            generic: None,
            fields: IndexMap::new(),
            indexes: vec![],
            hierarchy_root: None,
            mapping_name: None,
            is_abstract: false,
        }
    }

    pub fn is_entity(&self) -> bool {
        self.kind == TypeKind::Entity
    }

    pub fn is_structure(&self) -> bool {
        self.kind == TypeKind::Structure
    }

    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    pub fn is_template(&self) -> bool {
        !self.generic_params.is_empty()
    }

    /// Adds a field, replacing any field with the same name.
    pub fn add_field(&mut self, field: FieldDef) -> &mut FieldDef {
        let name = field.name.clone();
        self.fields.insert(name.clone(), field);
        &mut self.fields[&name]
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.get(name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut FieldDef> {
        self.fields.get_mut(name)
    }
}

impl GenericInstance {
    /// The closure's type name, e.g. `Audit<Customer, i32>`.
    pub fn name(&self) -> String {
        TypeRef::Generic {
            template: self.template.clone(),
            args: self.args.clone(),
        }
        .to_string()
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Entity => "entity",
            Self::Structure => "structure",
            Self::Interface => "interface",
        })
    }
}
