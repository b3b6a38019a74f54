use super::{GeneratorKind, InheritanceSchema, MemberDecl};

/// A declared type and its persistence metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    /// Full type name, optionally dotted with a namespace (`App.Model.Order`).
    pub name: String,

    pub kind: DeclKind,

    /// Name of the base type, if any.
    pub base: Option<String>,

    /// Names of implemented (or, for interfaces, extended) interfaces.
    pub interfaces: Vec<String>,

    /// Non-empty for generic templates.
    pub generic_params: Vec<GenericParam>,

    pub members: Vec<MemberDecl>,

    pub attributes: Vec<TypeAttr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKind {
    Entity,
    Structure,
    Interface,

    /// A type known to the application but not persistent. Registering it
    /// lets the builder report precise errors when it is used as a field type.
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenericParam {
    pub name: String,

    /// Arguments must be this type, derive from it, or implement it.
    pub constraint: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeAttr {
    /// Marks the root of an entity hierarchy.
    HierarchyRoot {
        generator: GeneratorKind,
        include_type_id: bool,
        schema: Option<InheritanceSchema>,
    },

    /// A secondary index over the type's fields.
    Index {
        name: Option<String>,
        key_fields: Vec<String>,
        included_fields: Vec<String>,
        unique: bool,
    },

    /// Explicit mapping (table) name.
    TableMapping(String),

    Abstract,
}

impl TypeDecl {
    pub fn new(name: impl Into<String>, kind: DeclKind) -> Self {
        Self {
            name: name.into(),
            kind,
            base: None,
            interfaces: vec![],
            generic_params: vec![],
            members: vec![],
            attributes: vec![],
        }
    }

    pub fn entity(name: impl Into<String>) -> Self {
        Self::new(name, DeclKind::Entity)
    }

    pub fn structure(name: impl Into<String>) -> Self {
        Self::new(name, DeclKind::Structure)
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(name, DeclKind::Interface)
    }

    pub fn other(name: impl Into<String>) -> Self {
        Self::new(name, DeclKind::Other)
    }

    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn generic_param(mut self, name: impl Into<String>, constraint: Option<&str>) -> Self {
        self.generic_params.push(GenericParam {
            name: name.into(),
            constraint: constraint.map(str::to_string),
        });
        self
    }

    pub fn member(mut self, member: MemberDecl) -> Self {
        self.members.push(member);
        self
    }

    pub fn attr(mut self, attr: TypeAttr) -> Self {
        self.attributes.push(attr);
        self
    }

    /// Marks the type as a hierarchy root with the default generator and the
    /// default inheritance schema.
    pub fn hierarchy_root(self) -> Self {
        self.hierarchy_root_with(GeneratorKind::Default, false, None)
    }

    pub fn hierarchy_root_with(
        self,
        generator: GeneratorKind,
        include_type_id: bool,
        schema: Option<InheritanceSchema>,
    ) -> Self {
        self.attr(TypeAttr::HierarchyRoot {
            generator,
            include_type_id,
            schema,
        })
    }

    pub fn index<S: Into<String>>(self, key_fields: impl IntoIterator<Item = S>) -> Self {
        self.attr(TypeAttr::Index {
            name: None,
            key_fields: key_fields.into_iter().map(Into::into).collect(),
            included_fields: vec![],
            unique: false,
        })
    }

    pub fn table(self, name: impl Into<String>) -> Self {
        self.attr(TypeAttr::TableMapping(name.into()))
    }

    pub fn is_abstract(self) -> Self {
        self.attr(TypeAttr::Abstract)
    }

    pub fn is_generic(&self) -> bool {
        !self.generic_params.is_empty()
    }
}
