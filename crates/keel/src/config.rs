use crate::{Domain, KeyGenerator};

use keel_core::schema::decl::{Registry, TypeDecl};
use keel_core::schema::def::InheritanceSchema;
use keel_core::schema::name::{LetterCase, NamespacePolicy, NamingRules};
use keel_core::schema::{Module, NamingConvention};
use keel_core::{Error, Result};

use anyhow::Context;
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// Everything needed to build a [`Domain`].
///
/// Naming, the default inheritance schema and named generator settings can
/// be loaded from TOML. Types, custom generators and modules are registered
/// in code.
#[derive(Default, Clone)]
pub struct DomainConfig {
    pub naming: NamingConvention,

    pub default_inheritance_schema: InheritanceSchema,

    /// Settings of named generators, by name.
    pub key_generators: IndexMap<String, SequenceSettings>,

    pub(crate) registry: Registry,

    /// Custom key generators, by name.
    pub(crate) custom_generators: IndexMap<String, Arc<dyn KeyGenerator>>,

    pub(crate) modules: Vec<Arc<dyn Module>>,
}

/// Seed and step of a named sequence generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceSettings {
    pub seed: i64,
    pub step: i64,
}

/// The TOML document, before validation.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    naming: NamingFile,
    default_inheritance_schema: Option<String>,
    key_generators: Vec<KeyGeneratorFile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct NamingFile {
    letter_case: Option<String>,
    namespace: Option<String>,
    rules: Vec<String>,
    synonyms: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct KeyGeneratorFile {
    name: String,
    seed: Option<i64>,
    step: Option<i64>,
}

impl DomainConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(src: &str) -> Result<Self> {
        src.parse()
    }

    /// Loads a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read domain configuration {}", path.display()))?;
        contents.parse()
    }

    /// Registers a type declaration. See [`Registry::register`].
    pub fn register(&mut self, decl: TypeDecl) -> Result<&mut Self> {
        self.registry.register(decl)?;
        Ok(self)
    }

    pub fn register_all(&mut self, decls: impl IntoIterator<Item = TypeDecl>) -> Result<&mut Self> {
        self.registry.register_all(decls)?;
        Ok(self)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn naming_convention(&mut self, convention: NamingConvention) -> &mut Self {
        self.naming = convention;
        self
    }

    pub fn default_inheritance_schema(&mut self, schema: InheritanceSchema) -> &mut Self {
        self.default_inheritance_schema = schema;
        self
    }

    /// Configures the named generator `name` as a sequence starting at
    /// `seed`.
    pub fn named_generator(&mut self, name: impl Into<String>, seed: i64, step: i64) -> &mut Self {
        self.key_generators
            .insert(name.into(), SequenceSettings { seed, step });
        self
    }

    /// Registers a custom key generator. Hierarchies request it by name.
    pub fn key_generator(
        &mut self,
        name: impl Into<String>,
        generator: impl KeyGenerator + 'static,
    ) -> &mut Self {
        self.custom_generators
            .insert(name.into(), Arc::new(generator));
        self
    }

    pub fn module(&mut self, module: impl Module + 'static) -> &mut Self {
        self.modules.push(Arc::new(module));
        self
    }

    pub fn shared_module(&mut self, module: Arc<dyn Module>) -> &mut Self {
        self.modules.push(module);
        self
    }

    pub fn build(&self) -> Result<Domain> {
        Domain::build(self)
    }
}

impl FromStr for DomainConfig {
    type Err = Error;

    fn from_str(src: &str) -> Result<Self> {
        let file: ConfigFile =
            toml::from_str(src).map_err(|err| Error::configuration(err.message()))?;

        let mut config = Self {
            naming: file.naming.into_convention()?,
            ..Self::default()
        };

        if let Some(schema) = &file.default_inheritance_schema {
            config.default_inheritance_schema = parse_schema(schema)?;
        }

        for generator in file.key_generators {
            if generator.name.is_empty() {
                return Err(Error::configuration("key generator without a name"));
            }

            if config.key_generators.contains_key(&generator.name) {
                return Err(Error::configuration(format!(
                    "key generator `{}` is configured more than once",
                    generator.name
                )));
            }

            let settings = SequenceSettings {
                seed: generator.seed.unwrap_or(SequenceSettings::DEFAULT.seed),
                step: generator.step.unwrap_or(SequenceSettings::DEFAULT.step),
            };

            if settings.step == 0 {
                return Err(Error::configuration(format!(
                    "key generator `{}` has a step of zero",
                    generator.name
                )));
            }

            config.key_generators.insert(generator.name, settings);
        }

        log::debug!(
            "loaded domain configuration; naming={:?} key_generators={}",
            config.naming,
            config.key_generators.len()
        );

        Ok(config)
    }
}

impl fmt::Debug for DomainConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomainConfig")
            .field("naming", &self.naming)
            .field("default_inheritance_schema", &self.default_inheritance_schema)
            .field("key_generators", &self.key_generators)
            .field("types", &self.registry.len())
            .field(
                "custom_generators",
                &self.custom_generators.keys().collect::<Vec<_>>(),
            )
            .field("modules", &self.modules.len())
            .finish()
    }
}

impl SequenceSettings {
    pub const DEFAULT: Self = Self { seed: 1, step: 1 };
}

impl Default for SequenceSettings {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl NamingFile {
    fn into_convention(self) -> Result<NamingConvention> {
        let mut convention = NamingConvention::new();

        if let Some(letter_case) = &self.letter_case {
            convention = convention.letter_case(match letter_case.as_str() {
                "as_is" => LetterCase::AsIs,
                "uppercase" => LetterCase::Uppercase,
                "lowercase" => LetterCase::Lowercase,
                "snake_case" => LetterCase::SnakeCase,
                other => {
                    return Err(Error::configuration(format!(
                        "unknown letter case `{other}`"
                    )))
                }
            });
        }

        if let Some(namespace) = &self.namespace {
            convention = convention.namespace_policy(match namespace.as_str() {
                "omit" => NamespacePolicy::Omit,
                "as_is" => NamespacePolicy::AsIs,
                "synonymize" => NamespacePolicy::Synonymize,
                other => {
                    return Err(Error::configuration(format!(
                        "unknown namespace policy `{other}`"
                    )))
                }
            });
        }

        let mut rules = NamingRules::NONE;
        for rule in &self.rules {
            rules |= match rule.as_str() {
                "underscore_dots" => NamingRules::UNDERSCORE_DOTS,
                "underscore_hyphens" => NamingRules::UNDERSCORE_HYPHENS,
                "remove_dots" => NamingRules::REMOVE_DOTS,
                "remove_hyphens" => NamingRules::REMOVE_HYPHENS,
                other => {
                    return Err(Error::configuration(format!(
                        "unknown naming rule `{other}`"
                    )))
                }
            };
        }
        convention = convention.rules(rules);

        if !self.synonyms.is_empty() && convention.namespace_policy != NamespacePolicy::Synonymize {
            log::warn!(
                "naming synonyms are ignored unless the namespace policy is `synonymize`; synonyms={}",
                self.synonyms.len()
            );
        }

        for (namespace, synonym) in self.synonyms {
            convention = convention.synonym(namespace, synonym);
        }

        Ok(convention)
    }
}

fn parse_schema(schema: &str) -> Result<InheritanceSchema> {
    match schema {
        "class_table" => Ok(InheritanceSchema::ClassTable),
        "concrete_table" => Ok(InheritanceSchema::ConcreteTable),
        "single_table" => Ok(InheritanceSchema::SingleTable),
        other => Err(Error::configuration(format!(
            "unknown inheritance schema `{other}`"
        ))),
    }
}
