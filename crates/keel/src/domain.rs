use crate::key_generator::{GuidGenerator, SequenceGenerator, StringGenerator};
use crate::{DomainConfig, Key, KeyGenerator, SequenceSettings};

use keel_core::schema::def::GeneratorKind;
use keel_core::schema::model::{HierarchyInfo, TypeInfo};
use keel_core::schema::{self, DomainModel, NameBuilder, NamingConvention, StoredDomainModel};
use keel_core::{err, Error, Result, Value, ValueTy};

use indexmap::IndexMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A built domain: the sealed model and the key generators serving it.
///
/// Cloning is cheap; clones share the model and the generators.
#[derive(Clone)]
pub struct Domain {
    shared: Arc<Shared>,
}

struct Shared {
    model: Arc<DomainModel>,

    generators: Generators,

    /// Replaced wholesale by [`Domain::set_naming_convention`].
    names: RwLock<Arc<NameBuilder>>,
}

/// Generator instances, one per default key shape, per named generator and
/// per custom generator.
#[derive(Default)]
struct Generators {
    default: IndexMap<ValueTy, Arc<dyn KeyGenerator>>,
    named: IndexMap<String, Arc<dyn KeyGenerator>>,
    custom: IndexMap<String, Arc<dyn KeyGenerator>>,
}

impl Domain {
    pub fn builder() -> DomainConfig {
        DomainConfig::default()
    }

    pub fn build(config: &DomainConfig) -> Result<Domain> {
        let mut builder = schema::Builder::new();
        builder
            .naming_convention(config.naming.clone())
            .default_inheritance_schema(config.default_inheritance_schema);

        for (name, generator) in &config.custom_generators {
            builder.custom_generator(name.clone(), generator.output());
        }

        for module in &config.modules {
            builder.shared_module(module.clone());
        }

        let names = Arc::new(NameBuilder::new(config.naming.clone()));
        let model = builder.build_with_names(&config.registry, &names)?;
        let generators = Generators::new(&model, config)?;

        log::debug!(
            "domain built; types={} default_generators={} named_generators={} custom_generators={}",
            model.types.len(),
            generators.default.len(),
            generators.named.len(),
            generators.custom.len()
        );

        Ok(Domain {
            shared: Arc::new(Shared {
                model: Arc::new(model),
                generators,
                names: RwLock::new(names),
            }),
        })
    }

    pub fn model(&self) -> &DomainModel {
        &self.shared.model
    }

    pub fn shared_model(&self) -> Arc<DomainModel> {
        self.shared.model.clone()
    }

    /// The flat representation of the model, ready to be saved.
    pub fn stored_model(&self) -> StoredDomainModel {
        self.shared.model.to_stored()
    }

    /// The name builder currently in use.
    pub fn names(&self) -> Arc<NameBuilder> {
        self.read_names().clone()
    }

    /// Installs a new name builder for `convention`. Names computed from
    /// now on follow it; the sealed model keeps the names it was built
    /// with.
    pub fn set_naming_convention(&self, convention: NamingConvention) {
        log::debug!("installing naming convention; convention={convention:?}");
        *self.write_names() = Arc::new(NameBuilder::new(convention));
    }

    /// Table name of a type under the current naming convention.
    pub fn table_name(&self, ty: &str) -> Option<String> {
        let ty = self.model().get(ty)?;
        Some(
            self.names()
                .type_name(&ty.name, ty.mapping_override.as_deref()),
        )
    }

    /// Columns of a field, by dotted field name, under the current naming
    /// convention.
    pub fn column_names(&self, ty: &str, field: &str) -> Option<Vec<String>> {
        let ty = self.model().get(ty)?;
        ty.field(field)?;

        let names = self.names();
        let prefix = format!("{field}.");

        Some(
            ty.fields
                .values()
                .filter(|f| f.name == field || f.name.starts_with(&prefix))
                .filter(|f| f.is_primitive() && !f.columns.is_empty())
                .map(|f| names.column_name(f))
                .collect(),
        )
    }

    /// Creates a new key for an instance of `ty` with the hierarchy's
    /// generator.
    pub fn create_key(&self, ty: &str) -> Result<Key> {
        let (info, hierarchy) = self.entity(ty)?;
        let key = &hierarchy.key;

        if info.is_abstract {
            return Err(Error::unable_to_create_key(ty, "type is abstract"));
        }

        let generator = self.shared.generators.get(&key.generator, key.generated_tuple());
        let Some(generator) = generator else {
            let root = &self.model().type_info(hierarchy.root).name;
            return Err(Error::unable_to_create_key(
                ty,
                format!("hierarchy '{root}' has no key generator"),
            ));
        };

        let mut values = generator.next_values().map_err(|cause| {
            cause.context(Error::unable_to_create_key(
                ty,
                format!("key generator '{}' failed", key.generator),
            ))
        })?;

        let expected = key.generated_tuple();
        let shape_matches = values.len() == expected.len()
            && values.iter().zip(expected).all(|(value, ty)| value.is_a(*ty));

        if !shape_matches {
            return Err(Error::unable_to_create_key(
                ty,
                format!(
                    "key generator '{}' produced {} values that don't match the key",
                    key.generator,
                    values.len()
                ),
            ));
        }

        if key.contains_type_id {
            values.push(type_id_value(info)?);
        }

        Ok(Key::new(ty, values))
    }

    /// Builds a key for `ty` from caller-supplied values. When the key
    /// includes the type id it may be omitted.
    pub fn key(&self, ty: &str, values: impl IntoIterator<Item = Value>) -> Result<Key> {
        let (info, hierarchy) = self.entity(ty)?;
        let key = &hierarchy.key;
        let mut values: Vec<Value> = values.into_iter().collect();

        if key.contains_type_id && values.len() == key.generated_tuple().len() {
            values.push(type_id_value(info)?);
        }

        if values.len() != key.len() {
            return Err(err!(
                "{} values given for the key of '{ty}'; expected {}",
                values.len(),
                key.len()
            ));
        }

        for ((value, value_ty), leaf) in values.iter().zip(&key.tuple).zip(&key.leaves) {
            if !value.is_a(*value_ty) {
                return Err(err!(
                    "key value {value} of '{ty}' doesn't fit '{leaf}' of type '{value_ty}'"
                ));
            }
        }

        Ok(Key::new(ty, values))
    }

    fn entity(&self, ty: &str) -> Result<(&TypeInfo, &HierarchyInfo)> {
        let model = self.model();

        let info = model
            .get(ty)
            .ok_or_else(|| Error::unable_to_create_key(ty, "type is not part of the domain"))?;

        let hierarchy = model
            .hierarchy_of(ty)
            .ok_or_else(|| Error::unable_to_create_key(ty, "type is not an entity"))?;

        Ok((info, hierarchy))
    }

    fn read_names(&self) -> RwLockReadGuard<'_, Arc<NameBuilder>> {
        // The lock guards a handle swap only; a poisoned lock is still usable.
        self.shared
            .names
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_names(&self) -> RwLockWriteGuard<'_, Arc<NameBuilder>> {
        self.shared
            .names
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Domain")
            .field("types", &self.shared.model.types.len())
            .field("names", &self.read_names().convention())
            .finish()
    }
}

impl Generators {
    fn new(model: &DomainModel, config: &DomainConfig) -> Result<Self> {
        let mut generators = Generators::default();

        for hierarchy in &model.hierarchies {
            let key = &hierarchy.key;

            match &key.generator {
                GeneratorKind::Default => {
                    let ty = single(key.generated_tuple(), &key.generator)?;
                    if !generators.default.contains_key(&ty) {
                        generators.default.insert(ty, default_generator(ty));
                    }
                }
                GeneratorKind::Named(name) => {
                    if generators.named.contains_key(name) {
                        continue;
                    }

                    let ty = single(key.generated_tuple(), &key.generator)?;
                    let generator = named_generator(name, ty, config.key_generators.get(name))?;
                    generators.named.insert(name.clone(), generator);
                }
                GeneratorKind::Custom(name) => {
                    let generator = config.custom_generators.get(name).ok_or_else(|| {
                        Error::configuration(format!("key generator `{name}` is not registered"))
                    })?;
                    generators.custom.insert(name.clone(), generator.clone());
                }
                GeneratorKind::None => {}
            }
        }

        for name in config.key_generators.keys() {
            if !generators.named.contains_key(name) {
                log::warn!("configured key generator is not used by any hierarchy; name={name}");
            }
        }

        Ok(generators)
    }

    fn get(&self, kind: &GeneratorKind, tuple: &[ValueTy]) -> Option<&Arc<dyn KeyGenerator>> {
        match kind {
            GeneratorKind::Default => match tuple {
                [ty] => self.default.get(ty),
                _ => None,
            },
            GeneratorKind::Named(name) => self.named.get(name),
            GeneratorKind::Custom(name) => self.custom.get(name),
            GeneratorKind::None => None,
        }
    }
}

fn default_generator(ty: ValueTy) -> Arc<dyn KeyGenerator> {
    match ty {
        ValueTy::Guid => Arc::new(GuidGenerator),
        ValueTy::String => Arc::new(StringGenerator),
        ty => Arc::new(SequenceGenerator::new(ty)),
    }
}

fn named_generator(
    name: &str,
    ty: ValueTy,
    settings: Option<&SequenceSettings>,
) -> Result<Arc<dyn KeyGenerator>> {
    if SequenceGenerator::supports(ty) {
        let settings = settings.copied().unwrap_or_default();
        return Ok(Arc::new(SequenceGenerator::with_seed(
            ty,
            settings.seed,
            settings.step,
        )));
    }

    if settings.is_some() {
        return Err(Error::configuration(format!(
            "key generator `{name}` produces {ty} keys and can't be configured as a sequence"
        )));
    }

    Ok(default_generator(ty))
}

/// Default and named generators only serve single-field keys.
fn single(tuple: &[ValueTy], generator: &GeneratorKind) -> Result<ValueTy> {
    match tuple {
        [ty] => Ok(*ty),
        _ => Err(err!(
            "key generator '{generator}' can't produce keys of {} fields",
            tuple.len()
        )),
    }
}

fn type_id_value(info: &TypeInfo) -> Result<Value> {
    info.type_id
        .map(Value::from)
        .ok_or_else(|| Error::unable_to_create_key(&info.name, "type has no type id"))
}
