use super::key::{DEFAULT_KEY_LENGTH, TYPE_ID_FIELD};
use super::BuildDomain;
use crate::schema::decl::TypeRef;
use crate::schema::def::{FieldDef, InheritanceSchema, TypeDef};
use crate::schema::model::{ColumnInfo, FieldInfo, FieldKind, TypeInfoId};
use crate::value::ValueTy;
use crate::{Error, Result};

use indexmap::IndexMap;

impl BuildDomain<'_> {
    /// Computes the flattened fields and columns of every type.
    ///
    /// Types are visited in build order, so ancestors and embedded
    /// structures are always flattened before the types using them.
    pub(super) fn build_fields(&mut self) -> Result<()> {
        let order: Vec<TypeInfoId> = self.types.values().map(|ty| ty.id).collect();

        for id in order {
            self.flatten_type(id)?;
        }

        self.resolve_key_columns();
        self.check_interface_fields()?;

        log::debug!(
            "fields flattened; fields={} columns={}",
            self.types.values().map(|ty| ty.fields.len()).sum::<usize>(),
            self.types.values().map(|ty| ty.columns.len()).sum::<usize>()
        );

        Ok(())
    }

    fn flatten_type(&mut self, id: TypeInfoId) -> Result<()> {
        let domain = self.domain;
        let def = &domain.types[self.type_info(id).name.as_str()];

        if !def.is_entity() {
            if let Some(field) = def.fields.values().find(|field| field.is_key()) {
                return Err(Error::domain_builder(format!(
                    "Key field '{}.{}' is declared on {} '{}'; only entities have keys",
                    def.name,
                    field.name,
                    def.kind,
                    def.name
                )));
            }
        }

        let mut fields: IndexMap<String, FieldInfo> = IndexMap::new();

        if let Some(ancestor) = self.type_info(id).ancestor {
            for field in self.type_info(ancestor).fields.values() {
                let mut field = field.clone();
                field.is_inherited = true;
                fields.insert(field.name.clone(), field);
            }
        }

        let root_key = self
            .type_info(id)
            .hierarchy
            .map(|hierarchy| &self.hierarchies[hierarchy.0])
            .filter(|hierarchy| hierarchy.root == id)
            .map(|hierarchy| (hierarchy.key.clone(), hierarchy.schema));

        match root_key {
            Some((key, schema)) => {
                // Key fields first, in key order, followed by the type id.
                for name in key.fields.iter().filter(|name| *name != TYPE_ID_FIELD) {
                    self.add_field(&mut fields, def, &def.fields[name.as_str()], id)?;
                }

                let stored = key.contains_type_id || schema != InheritanceSchema::ConcreteTable;
                fields.insert(
                    TYPE_ID_FIELD.to_string(),
                    self.type_id_field(id, key.contains_type_id, stored),
                );

                for field in def.fields.values().filter(|field| !field.is_key()) {
                    self.add_field(&mut fields, def, field, id)?;
                }
            }
            None => {
                for field in def.fields.values() {
                    self.add_field(&mut fields, def, field, id)?;
                }
            }
        }

        let columns = self.build_columns(def, &fields)?;
        check_field_names(def, &fields)?;

        let info = self.type_info_mut(id);
        info.fields = fields;
        info.columns = columns;
        Ok(())
    }

    /// Adds a declared field and its nested fields. A field with the name of
    /// an inherited field redeclares it in place.
    fn add_field(
        &self,
        fields: &mut IndexMap<String, FieldInfo>,
        owner: &TypeDef,
        def: &FieldDef,
        declaring: TypeInfoId,
    ) -> Result<()> {
        let inherited = fields
            .get(&def.name)
            .filter(|field| field.parent.is_none() && field.is_inherited);

        let Some(inherited) = inherited else {
            for field in self.expand_field(owner, def, declaring, def.is_key(), None)? {
                fields.insert(field.name.clone(), field);
            }
            return Ok(());
        };

        // Without its own override, a redeclaration keeps the inherited one.
        let expanded = self.expand_field(
            owner,
            def,
            declaring,
            inherited.is_key,
            Some(&inherited.raw_name),
        )?;

        if expanded[0].kind != inherited.kind {
            let what = if inherited.is_key { "Key field" } else { "Field" };
            return Err(Error::domain_builder(format!(
                "{what} '{}.{}' can't be redeclared with type '{}'; '{}' declares it as '{}'",
                owner.name,
                def.name,
                def.ty,
                self.type_info(inherited.declaring_type).name,
                self.kind_name(inherited.kind)
            )));
        }

        for field in expanded {
            match fields.get_mut(&field.name) {
                Some(slot) => *slot = field,
                None => {
                    fields.insert(field.name.clone(), field);
                }
            }
        }

        Ok(())
    }

    /// Expands a declared field into the field itself followed by all of its
    /// nested fields: structure fields recursively, references as the key
    /// fields of their target.
    fn expand_field(
        &self,
        owner: &TypeDef,
        def: &FieldDef,
        declaring: TypeInfoId,
        is_key: bool,
        inherited_override: Option<&str>,
    ) -> Result<Vec<FieldInfo>> {
        let qualified = format!("{}.{}", owner.name, def.name);
        let kind = self.resolve_field_kind(owner, def, &qualified)?;

        if def.is_version {
            match kind {
                FieldKind::Value(ty) if ty != ValueTy::Bytes => {}
                _ => {
                    return Err(Error::domain_builder(format!(
                        "Version field '{qualified}' must be of a primitive type, not '{}'",
                        def.ty
                    )))
                }
            }

            if def.lazy_load {
                return Err(Error::domain_builder(format!(
                    "Version field '{qualified}' can't be lazy loaded"
                )));
            }
        }

        if def.is_full_text() {
            match kind {
                FieldKind::Value(ValueTy::String) | FieldKind::Structure(_) => {}
                _ => {
                    return Err(Error::domain_builder(format!(
                        "Field '{qualified}' can't be full-text indexed: type '{}' is neither a string nor a structure",
                        def.ty
                    )))
                }
            }
        }

        let inherited_override = inherited_override.filter(|_| def.mapping_name.is_none());
        let raw = match inherited_override {
            Some(name) => name.to_string(),
            None => def.mapping_name.clone().unwrap_or_else(|| def.name.clone()),
        };
        let mapping_name = match inherited_override {
            Some(name) => self.names.member_name(&def.name, Some(name)),
            None => self.names.field_name(def),
        };

        let nullable = match kind {
            FieldKind::Value(ty) => !is_key && def.nullable.unwrap_or(ty.is_nullable_by_default()),
            FieldKind::Reference(_) => !is_key && def.nullable.unwrap_or(true),
            FieldKind::Structure(_) | FieldKind::EntitySet(_) => false,
        };

        let length = match kind {
            FieldKind::Value(ValueTy::String) if is_key => def.length.or(Some(DEFAULT_KEY_LENGTH)),
            _ => def.length,
        };

        let mut expanded = vec![FieldInfo {
            name: def.name.clone(),
            raw_name: raw.clone(),
            mapping_name,
            declaring_type: declaring,
            is_inherited: false,
            kind,
            parent: None,
            columns: vec![],
            is_key,
            is_system: false,
            nullable,
            length,
            precision: def.precision,
            scale: def.scale,
            lazy_load: def.lazy_load,
            is_version: def.is_version,
            full_text: def.full_text.clone(),
        }];

        match kind {
            FieldKind::Structure(structure) => {
                for child in self.type_info(structure).fields.values() {
                    let mut child = child.clone();
                    child.parent = Some(match &child.parent {
                        Some(parent) => format!("{}.{parent}", def.name),
                        None => def.name.clone(),
                    });
                    child.name = format!("{}.{}", def.name, child.name);
                    child.raw_name = format!("{raw}.{}", child.raw_name);
                    child.mapping_name = self.names.column_name(&child);
                    child.declaring_type = declaring;
                    child.is_inherited = false;
                    child.is_key = is_key;
                    expanded.push(child);
                }
            }
            FieldKind::Reference(target) => {
                let target = &self.type_info(target).name;
                let (leaves, tuple) = match self.key_of(target) {
                    Some(key) => (key.leaves.clone(), key.tuple.clone()),
                    None => self.interface_key(target)?,
                };

                for (leaf, ty) in leaves.iter().zip(tuple) {
                    let mut child = FieldInfo {
                        name: format!("{}.{leaf}", def.name),
                        raw_name: format!("{raw}.{leaf}"),
                        mapping_name: String::new(),
                        declaring_type: declaring,
                        is_inherited: false,
                        kind: FieldKind::Value(ty),
                        parent: Some(def.name.clone()),
                        columns: vec![],
                        is_key,
                        is_system: false,
                        nullable,
                        length: None,
                        precision: None,
                        scale: None,
                        lazy_load: def.lazy_load,
                        is_version: false,
                        full_text: None,
                    };
                    child.mapping_name = self.names.column_name(&child);
                    expanded.push(child);
                }
            }
            FieldKind::Value(_) | FieldKind::EntitySet(_) => {}
        }

        for field in &mut expanded {
            if field.is_primitive() {
                field.columns = vec![field.mapping_name.clone()];
            }
        }

        for i in 0..expanded.len() {
            if expanded[i].is_primitive() {
                continue;
            }

            let prefix = format!("{}.", expanded[i].name);
            let columns = expanded
                .iter()
                .filter(|field| field.is_primitive() && field.name.starts_with(&prefix))
                .map(|field| field.mapping_name.clone())
                .collect();
            expanded[i].columns = columns;
        }

        Ok(expanded)
    }

    fn resolve_field_kind(
        &self,
        owner: &TypeDef,
        def: &FieldDef,
        qualified: &str,
    ) -> Result<FieldKind> {
        match &def.ty {
            TypeRef::Value(ty) => Ok(FieldKind::Value(*ty)),
            TypeRef::Named(_) | TypeRef::Generic { .. } => {
                let target = def.ty.to_string();

                match self.types.get(target.as_str()) {
                    Some(info) if info.is_structure() => Ok(FieldKind::Structure(info.id)),
                    Some(info) => Ok(FieldKind::Reference(info.id)),
                    None => Err(self.unresolved_type(qualified, &def.ty, &target)),
                }
            }
            TypeRef::EntitySet(target) => match self.types.get(target.as_str()) {
                Some(_) if owner.is_structure() => Err(Error::domain_builder(format!(
                    "Structure '{}' can't contain entity set field '{}'",
                    owner.name, def.name
                ))),
                Some(info) if !info.is_structure() => Ok(FieldKind::EntitySet(info.id)),
                Some(_) => Err(Error::domain_builder(format!(
                    "Field '{qualified}' can't be of type '{}': '{target}' is not an entity",
                    def.ty
                ))),
                None => Err(self.unresolved_type(qualified, &def.ty, target)),
            },
            TypeRef::Array(_) => Err(Error::domain_builder(format!(
                "Field '{qualified}' can't be of type '{}'",
                def.ty
            ))),
            TypeRef::Param(param) => Err(Error::domain_builder(format!(
                "Field '{qualified}' has unresolved generic parameter '{param}'"
            ))),
        }
    }

    fn unresolved_type(&self, qualified: &str, ty: &TypeRef, target: &str) -> Error {
        if self.domain.non_persistent.contains(target) {
            Error::domain_builder(format!(
                "Field '{qualified}' can't be of type '{ty}': type is not persistent"
            ))
        } else if self.domain.templates.contains_key(target) {
            Error::domain_builder(format!(
                "Field '{qualified}' can't be of type '{ty}': type is an open generic template"
            ))
        } else {
            Error::domain_builder(format!(
                "Field '{qualified}' refers to unknown type '{target}'"
            ))
        }
    }

    fn type_id_field(&self, declaring: TypeInfoId, is_key: bool, stored: bool) -> FieldInfo {
        let mapping_name = self.names.member_name(TYPE_ID_FIELD, None);

        FieldInfo {
            name: TYPE_ID_FIELD.to_string(),
            raw_name: TYPE_ID_FIELD.to_string(),
            columns: if stored { vec![mapping_name.clone()] } else { vec![] },
            mapping_name,
            declaring_type: declaring,
            is_inherited: false,
            kind: FieldKind::Value(ValueTy::I32),
            parent: None,
            is_key,
            is_system: true,
            nullable: false,
            length: None,
            precision: None,
            scale: None,
            lazy_load: false,
            is_version: false,
            full_text: None,
        }
    }

    /// Collects the physical columns of leaf fields, rejecting names that
    /// collide once the naming convention has been applied.
    fn build_columns(
        &self,
        def: &TypeDef,
        fields: &IndexMap<String, FieldInfo>,
    ) -> Result<IndexMap<String, ColumnInfo>> {
        let mut columns: IndexMap<String, ColumnInfo> = IndexMap::new();

        for field in fields.values() {
            let FieldKind::Value(ty) = field.kind else {
                continue;
            };

            for column in &field.columns {
                if let Some(existing) = columns.get(column) {
                    return Err(Error::domain_builder(format!(
                        "Column '{column}' of type '{}' is mapped by both fields '{}' and '{}'",
                        def.name, existing.field, field.name
                    )));
                }

                columns.insert(
                    column.clone(),
                    ColumnInfo {
                        name: column.clone(),
                        field: field.name.clone(),
                        ty,
                        nullable: field.nullable,
                        length: field.length,
                        precision: field.precision,
                        scale: field.scale,
                        is_inherited: field.is_inherited,
                        is_primary_key: field.is_key,
                        is_system: field.is_system,
                    },
                );
            }
        }

        Ok(columns)
    }

    fn resolve_key_columns(&mut self) {
        for i in 0..self.hierarchies.len() {
            let root = self.type_info(self.hierarchies[i].root);
            let columns = self.hierarchies[i]
                .key
                .leaves
                .iter()
                .filter_map(|leaf| root.fields.get(leaf))
                .flat_map(|field| field.columns.iter().cloned())
                .collect();
            self.hierarchies[i].key.columns = columns;
        }
    }

    /// Every implementor must provide each field of its interfaces with the
    /// same type.
    fn check_interface_fields(&self) -> Result<()> {
        for interface in self.types.values().filter(|ty| ty.is_interface()) {
            for implementor in interface.implementors.iter().map(|id| self.type_info(*id)) {
                for field in interface.top_level_fields() {
                    match implementor.fields.get(&field.name) {
                        Some(implemented)
                            if implemented.parent.is_none() && implemented.kind == field.kind => {}
                        Some(implemented) => {
                            return Err(Error::domain_builder(format!(
                                "Field '{}.{}' implementing '{}.{}' must be of type '{}', not '{}'",
                                implementor.name,
                                implemented.name,
                                interface.name,
                                field.name,
                                self.kind_name(field.kind),
                                self.kind_name(implemented.kind)
                            )));
                        }
                        None => {
                            return Err(Error::domain_builder(format!(
                                "Type '{}' doesn't implement field '{}.{}'",
                                implementor.name, interface.name, field.name
                            )));
                        }
                    }
                }
            }
        }

        Ok(())
    }

    pub(super) fn kind_name(&self, kind: FieldKind) -> String {
        match kind {
            FieldKind::Value(ty) => ty.name().to_string(),
            FieldKind::Structure(id) | FieldKind::Reference(id) => self.type_info(id).name.clone(),
            FieldKind::EntitySet(id) => format!("EntitySet<{}>", self.type_info(id).name),
        }
    }
}

/// Top-level fields must keep distinct names once the naming convention has
/// been applied, including fields that map no column.
fn check_field_names(def: &TypeDef, fields: &IndexMap<String, FieldInfo>) -> Result<()> {
    let mut seen: IndexMap<&str, &str> = IndexMap::new();

    for field in fields.values().filter(|field| field.parent.is_none()) {
        if let Some(existing) = seen.insert(&field.mapping_name, &field.name) {
            return Err(Error::domain_builder(format!(
                "Field name '{}' of type '{}' is mapped by both fields '{existing}' and '{}'",
                field.mapping_name, def.name, field.name
            )));
        }
    }

    Ok(())
}
