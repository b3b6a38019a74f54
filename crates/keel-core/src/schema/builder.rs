mod association;
mod collect;
mod flatten;
mod full_text;
mod generics;
mod hierarchy;
mod index;
mod key;
mod order;
mod table;

pub use generics::AutoGenerics;

use super::def::{DomainDef, GeneratorKind, InheritanceSchema};
use super::model::{
    AssociationInfo, DomainModel, HierarchyInfo, KeyInfo, TypeInfo, TypeInfoId,
};
use super::name::{NameBuilder, NamingConvention};
use super::{decl::Registry, Module};
use crate::value::ValueTy;
use crate::{Error, Result};

use indexmap::IndexMap;
use std::{fmt, sync::Arc};

pub struct Builder {
    naming: NamingConvention,

    /// Schema used by hierarchies that don't request one.
    default_schema: InheritanceSchema,

    /// Custom key generators by name, with the value types they produce.
    generators: IndexMap<String, Vec<ValueTy>>,

    modules: Vec<Arc<dyn Module>>,
}

/// Used to track state during the build process
struct BuildDomain<'a> {
    /// Build options
    builder: &'a Builder,

    domain: &'a DomainDef,

    names: &'a NameBuilder,

    /// Types as they are built, in build order.
    types: IndexMap<String, TypeInfo>,

    hierarchies: Vec<HierarchyInfo>,

    associations: Vec<AssociationInfo>,

    /// Named generators and the key shape of the first hierarchy using them.
    named_generators: IndexMap<String, (String, Vec<ValueTy>)>,
}

impl Builder {
    pub fn new() -> Self {
        Self {
            naming: NamingConvention::default(),
            default_schema: InheritanceSchema::default(),
            generators: IndexMap::new(),
            modules: vec![],
        }
    }

    pub fn naming_convention(&mut self, convention: NamingConvention) -> &mut Self {
        self.naming = convention;
        self
    }

    pub fn default_inheritance_schema(&mut self, schema: InheritanceSchema) -> &mut Self {
        self.default_schema = schema;
        self
    }

    /// Registers a custom key generator producing keys of the given shape.
    pub fn custom_generator(
        &mut self,
        name: impl Into<String>,
        output: impl IntoIterator<Item = ValueTy>,
    ) -> &mut Self {
        self.generators
            .insert(name.into(), output.into_iter().collect());
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

    pub fn build(&self, registry: &Registry) -> Result<DomainModel> {
        let names = NameBuilder::new(self.naming.clone());
        self.build_with_names(registry, &names)
    }

    /// Builds the model, resolving names with `names` instead of a builder
    /// created from the configured convention.
    pub fn build_with_names(
        &self,
        registry: &Registry,
        names: &NameBuilder,
    ) -> Result<DomainModel> {
        let mut domain = collect::collect(registry)?;
        log::debug!(
            "collected definitions; types={} templates={} non_persistent={}",
            domain.types.len(),
            domain.templates.len(),
            domain.non_persistent.len()
        );

        generics::expand(&mut domain, &self.modules);

        for module in &self.modules {
            module.on_definitions_built(&mut domain);
        }
        log::debug!("module hooks applied; modules={}", self.modules.len());

        let order = order::build_order(&domain)?;
        log::debug!("build order resolved; types={}", order.len());

        let mut builder = BuildDomain {
            builder: self,
            domain: &domain,
            names,
            types: IndexMap::new(),
            hierarchies: vec![],
            associations: vec![],
            named_generators: IndexMap::new(),
        };

        builder.build_type_stubs(&order)?;
        builder.build_hierarchies()?;
        builder.build_fields()?;
        builder.build_tables()?;
        builder.build_indexes()?;
        builder.build_full_text_indexes()?;
        builder.build_associations()?;

        let model = DomainModel {
            types: builder.types,
            hierarchies: builder.hierarchies,
            associations: builder.associations,
        };

        // Verify the model structure
        model.verify()?;

        log::debug!(
            "domain model sealed; types={} hierarchies={} associations={}",
            model.types.len(),
            model.hierarchies.len(),
            model.associations.len()
        );

        Ok(model)
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("naming", &self.naming)
            .field("default_schema", &self.default_schema)
            .field("generators", &self.generators)
            .field("modules", &self.modules.len())
            .finish()
    }
}

impl BuildDomain<'_> {
    /// Creates a type info shell for every definition, in build order, and
    /// links ancestors and interfaces.
    fn build_type_stubs(&mut self, order: &[String]) -> Result<()> {
        let domain = self.domain;

        for (index, name) in order.iter().enumerate() {
            let def = &domain.types[name.as_str()];

            self.types.insert(
                name.clone(),
                TypeInfo {
                    id: TypeInfoId(index),
                    name: name.clone(),
                    mapping_name: self.names.type_name(name, def.mapping_name.as_deref()),
                    mapping_override: def.mapping_name.clone(),
                    kind: def.kind,
                    type_id: None,
                    is_abstract: def.is_abstract,
                    generic_template: def.generic.as_ref().map(|g| g.template.clone()),
                    ancestor: None,
                    descendants: vec![],
                    hierarchy: None,
                    interfaces: vec![],
                    implementors: vec![],
                    fields: IndexMap::new(),
                    columns: IndexMap::new(),
                    indexes: vec![],
                    full_text_index: None,
                },
            );
        }

        for def in order.iter().map(|name| &domain.types[name.as_str()]) {
            let id = self.id(&def.name);

            if let Some(ancestor) = &def.ancestor {
                let ancestor_info = self.types.get(ancestor.as_str()).ok_or_else(|| {
                    Error::domain_builder(format!(
                        "Type '{}' derives from unknown type '{ancestor}'",
                        def.name
                    ))
                })?;

                if def.is_interface() || ancestor_info.kind != def.kind {
                    return Err(Error::domain_builder(format!(
                        "Type '{}' can't derive from {} '{ancestor}'",
                        def.name, ancestor_info.kind
                    )));
                }

                let ancestor_id = ancestor_info.id;
                self.types[ancestor.as_str()].descendants.push(id);
                self.types[def.name.as_str()].ancestor = Some(ancestor_id);
            }

            for interface in &def.interfaces {
                let interface_id = match self.types.get(interface.as_str()) {
                    Some(info) if info.is_interface() => info.id,
                    Some(info) => {
                        return Err(Error::domain_builder(format!(
                            "Type '{}' can't implement {} '{interface}'",
                            def.name, info.kind
                        )))
                    }
                    None => {
                        return Err(Error::domain_builder(format!(
                            "Type '{}' implements unknown interface '{interface}'",
                            def.name
                        )))
                    }
                };
                self.types[def.name.as_str()].interfaces.push(interface_id);
            }
        }

        let interfaces: Vec<String> = self
            .types
            .values()
            .filter(|ty| ty.is_interface())
            .map(|ty| ty.name.clone())
            .collect();

        for interface in interfaces {
            let implementors = self
                .types
                .values()
                .filter(|ty| !ty.is_interface() && domain.implements(&ty.name, &interface))
                .map(|ty| ty.id)
                .collect();
            self.types[interface.as_str()].implementors = implementors;
        }

        log::debug!("type names resolved; types={}", self.types.len());
        Ok(())
    }

    fn id(&self, name: &str) -> TypeInfoId {
        self.types[name].id
    }

    fn type_info(&self, id: TypeInfoId) -> &TypeInfo {
        &self.types[id.0]
    }

    fn type_info_mut(&mut self, id: TypeInfoId) -> &mut TypeInfo {
        &mut self.types[id.0]
    }

    /// Returns the resolved key of the hierarchy `name` belongs to.
    fn key_of(&self, name: &str) -> Option<&KeyInfo> {
        let hierarchy = self.types.get(name)?.hierarchy?;
        Some(&self.hierarchies[hierarchy.0].key)
    }

    fn generator_output(&self, name: &str) -> Option<&[ValueTy]> {
        self.builder.generators.get(name).map(Vec::as_slice)
    }

    fn default_schema(&self) -> InheritanceSchema {
        self.builder.default_schema
    }
}

/// Renders a key shape for error messages.
fn shape(tuple: &[ValueTy]) -> String {
    let parts: Vec<_> = tuple.iter().map(|ty| ty.name()).collect();
    format!("({})", parts.join(", "))
}

/// Returns `true` if the framework generator can populate keys of this
/// generator kind.
fn is_default_like(generator: &GeneratorKind) -> bool {
    matches!(generator, GeneratorKind::Default | GeneratorKind::Named(_))
}
