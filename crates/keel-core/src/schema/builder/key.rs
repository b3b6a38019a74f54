use super::{is_default_like, shape, BuildDomain};
use crate::schema::decl::TypeRef;
use crate::schema::def::{FieldDef, GeneratorKind, HierarchyOptions, KeyPosition, TypeDef, TypeKind};
use crate::schema::model::{EqualityIdentifier, KeyInfo};
use crate::value::ValueTy;
use crate::{Error, Result};

/// Name of the system field holding the type id.
pub(crate) const TYPE_ID_FIELD: &str = "TypeId";

/// Length of string key fields that don't declare one.
pub(crate) const DEFAULT_KEY_LENGTH: usize = 255;

impl BuildDomain<'_> {
    pub(super) fn build_key(
        &mut self,
        root: &TypeDef,
        options: &HierarchyOptions,
    ) -> Result<KeyInfo> {
        let key_fields = self.ordered_key_fields(root)?;

        let mut fields = vec![];
        let mut leaves = vec![];
        let mut tuple = vec![];

        for field in &key_fields {
            let qualified = format!("{}.{}", root.name, field.name);

            if field.lazy_load {
                return Err(Error::domain_builder(format!(
                    "Key field '{qualified}' can't be lazy loaded"
                )));
            }

            if field.is_version {
                return Err(Error::domain_builder(format!(
                    "Key field '{qualified}' can't be a version field"
                )));
            }

            if field.nullable == Some(true) {
                return Err(Error::domain_builder(format!(
                    "Key field '{qualified}' can't be nullable"
                )));
            }

            let cant_be = || {
                Error::domain_builder(format!(
                    "Key field '{qualified}' can't be of type '{}'",
                    field.ty
                ))
            };

            match &field.ty {
                TypeRef::Value(ValueTy::Bytes) => return Err(cant_be()),
                TypeRef::Value(ty) => {
                    leaves.push(field.name.clone());
                    tuple.push(*ty);
                }
                TypeRef::Named(_) | TypeRef::Generic { .. } => {
                    let target = field.ty.to_string();

                    let target_kind = self.domain.get(&target).map(|def| def.kind);
                    let (target_leaves, target_tuple) = match target_kind {
                        Some(TypeKind::Entity) => {
                            let key = self.key_of(&target).ok_or_else(|| {
                                Error::domain_builder(format!(
                                    "Key field '{qualified}' refers to '{target}' which doesn't belong to any hierarchy"
                                ))
                            })?;
                            (key.leaves.clone(), key.tuple.clone())
                        }
                        Some(TypeKind::Interface) => self.interface_key(&target)?,
                        Some(TypeKind::Structure) => return Err(cant_be()),
                        None if self.domain.non_persistent.contains(&target)
                            || self.domain.templates.contains_key(&target) =>
                        {
                            return Err(cant_be())
                        }
                        None => {
                            return Err(Error::domain_builder(format!(
                                "Key field '{qualified}' refers to unknown type '{target}'"
                            )))
                        }
                    };

                    leaves.extend(
                        target_leaves
                            .iter()
                            .map(|leaf| format!("{}.{leaf}", field.name)),
                    );
                    tuple.extend(target_tuple);
                }
                TypeRef::EntitySet(_) | TypeRef::Array(_) | TypeRef::Param(_) => {
                    return Err(cant_be())
                }
            }

            fields.push(field.name.clone());
        }

        let generator = self.resolve_generator(root, options, &key_fields, &tuple)?;

        if options.include_type_id {
            fields.push(TYPE_ID_FIELD.to_string());
            leaves.push(TYPE_ID_FIELD.to_string());
            tuple.push(ValueTy::I32);
        }

        Ok(KeyInfo {
            fields,
            leaves,
            columns: vec![],
            equality_identifier: EqualityIdentifier::new(tuple.clone()),
            tuple,
            generator,
            contains_type_id: options.include_type_id,
        })
    }

    /// Key fields of the root, ordered by position. Implicit positions
    /// follow declaration order; positions must be unique and contiguous
    /// from zero.
    fn ordered_key_fields<'d>(&self, root: &'d TypeDef) -> Result<Vec<&'d FieldDef>> {
        let mut key_fields: Vec<(usize, &FieldDef)> = root
            .fields
            .values()
            .filter(|field| field.is_key())
            .enumerate()
            .map(|(implicit, field)| match field.key_position {
                Some(KeyPosition::Explicit(position)) => (position, field),
                _ => (implicit, field),
            })
            .collect();

        if key_fields.is_empty() {
            return Err(Error::domain_builder(format!(
                "Hierarchy '{}' doesn't contain any key fields",
                root.name
            )));
        }

        key_fields.sort_by_key(|(position, _)| *position);

        for (expected, (position, _)) in key_fields.iter().enumerate() {
            if *position < expected {
                return Err(Error::domain_builder(format!(
                    "Hierarchy '{}' has more than one key field at position {position}",
                    root.name
                )));
            }

            if *position > expected {
                return Err(Error::domain_builder(format!(
                    "Hierarchy '{}' has no key field at position {expected}",
                    root.name
                )));
            }
        }

        Ok(key_fields.into_iter().map(|(_, field)| field).collect())
    }

    /// The common key of all hierarchies implementing an interface.
    pub(super) fn interface_key(&self, interface: &str) -> Result<(Vec<String>, Vec<ValueTy>)> {
        let mut common: Option<(&str, &KeyInfo)> = None;

        for implementor in &self.types[interface].implementors {
            let implementor = self.type_info(*implementor);
            let Some(key) = self.key_of(&implementor.name) else {
                continue;
            };

            match common {
                None => common = Some((implementor.name.as_str(), key)),
                Some((first, first_key)) if first_key.tuple != key.tuple => {
                    return Err(Error::domain_builder(format!(
                        "Interface '{interface}' is implemented by hierarchies with different keys: '{first}' {} and '{}' {}",
                        shape(&first_key.tuple),
                        implementor.name,
                        shape(&key.tuple)
                    )));
                }
                Some(_) => {}
            }
        }

        let (_, key) = common.ok_or_else(|| {
            Error::domain_builder(format!(
                "Interface '{interface}' has no implementors with a key"
            ))
        })?;

        Ok((key.leaves.clone(), key.tuple.clone()))
    }

    fn resolve_generator(
        &mut self,
        root: &TypeDef,
        options: &HierarchyOptions,
        key_fields: &[&FieldDef],
        tuple: &[ValueTy],
    ) -> Result<GeneratorKind> {
        let generator = match &options.generator {
            generator if is_default_like(generator) => {
                match default_incompatibility(root, key_fields) {
                    Some(reason) => {
                        log::warn!(
                            "key generator of hierarchy '{}' resolved to none; {reason}",
                            root.name
                        );
                        GeneratorKind::None
                    }
                    None => generator.clone(),
                }
            }
            GeneratorKind::Custom(name) => {
                let output = self.generator_output(name).ok_or_else(|| {
                    Error::domain_builder(format!("Key generator '{name}' is not registered"))
                })?;

                if output.len() != tuple.len() {
                    let arity = match output.len() {
                        1 => "exactly one key field".to_string(),
                        n => format!("exactly {n} key fields"),
                    };
                    return Err(Error::domain_builder(format!(
                        "Key generator '{name}' can serve hierarchy with {arity}; hierarchy '{}' has {}",
                        root.name,
                        tuple.len()
                    )));
                }

                if output != tuple {
                    return Err(Error::domain_builder(format!(
                        "Key generator '{name}' produces keys of type {} but hierarchy '{}' has key {}",
                        shape(output),
                        root.name,
                        shape(tuple)
                    )));
                }

                options.generator.clone()
            }
            _ => GeneratorKind::None,
        };

        if let GeneratorKind::Named(name) = &generator {
            match self.named_generators.get(name) {
                Some((first, shape_of_first)) if shape_of_first != tuple => {
                    return Err(Error::domain_builder(format!(
                        "Key generator '{name}' can't serve hierarchies with different keys: '{first}' {} and '{}' {}",
                        shape(shape_of_first),
                        root.name,
                        shape(tuple)
                    )));
                }
                Some(_) => {}
                None => {
                    self.named_generators
                        .insert(name.clone(), (root.name.clone(), tuple.to_vec()));
                }
            }
        }

        Ok(generator)
    }
}

/// Explains why the framework generator can't populate a key, if it can't.
fn default_incompatibility(root: &TypeDef, key_fields: &[&FieldDef]) -> Option<String> {
    let [field] = key_fields else {
        return Some(format!("key has {} fields", key_fields.len()));
    };

    match &field.ty {
        TypeRef::Value(ty) if ty.is_integral() || ty.is_string() || *ty == ValueTy::Guid => None,
        TypeRef::Value(ValueTy::Decimal) if field.scale.unwrap_or(0) == 0 => None,
        TypeRef::Value(ty) => Some(format!(
            "key field '{}.{}' is of type '{ty}'",
            root.name, field.name
        )),
        ty => Some(format!(
            "key field '{}.{}' is of type '{ty}'",
            root.name, field.name
        )),
    }
}
