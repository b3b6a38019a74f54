use crate::value::ValueTy;
use std::fmt;

/// The declared type of a member.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// A primitive value.
    Value(ValueTy),

    /// A registered type referenced by name: an entity or interface
    /// (reference), a structure (embedded), or a non-persistent type.
    Named(String),

    /// A collection of entities of the named type.
    EntitySet(String),

    /// An array of values. Only `bytes` is storable; other arrays are
    /// rejected by the builder.
    Array(Box<TypeRef>),

    /// A generic parameter of the enclosing template.
    Param(String),

    /// A closed instance of a generic template.
    Generic { template: String, args: Vec<TypeRef> },
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn entity_set(name: impl Into<String>) -> Self {
        Self::EntitySet(name.into())
    }

    pub fn param(name: impl Into<String>) -> Self {
        Self::Param(name.into())
    }

    pub fn array(element: TypeRef) -> Self {
        Self::Array(Box::new(element))
    }

    pub fn generic(template: impl Into<String>, args: impl IntoIterator<Item = TypeRef>) -> Self {
        Self::Generic {
            template: template.into(),
            args: args.into_iter().collect(),
        }
    }

    /// The name of the registered type this reference points at, if any.
    /// Closed generics resolve to the name of their closure.
    pub fn type_name(&self) -> Option<String> {
        match self {
            Self::Named(name) => Some(name.clone()),
            Self::Generic { .. } => Some(self.to_string()),
            _ => None,
        }
    }

    /// Replaces generic parameters according to `lookup`.
    pub fn substitute(&self, lookup: &impl Fn(&str) -> Option<TypeRef>) -> TypeRef {
        match self {
            Self::Param(name) => lookup(name).unwrap_or_else(|| self.clone()),
            Self::Array(element) => Self::Array(Box::new(element.substitute(lookup))),
            Self::Generic { template, args } => Self::Generic {
                template: template.clone(),
                args: args.iter().map(|arg| arg.substitute(lookup)).collect(),
            },
            Self::EntitySet(name) => match lookup(name) {
                Some(arg) => match arg.type_name() {
                    Some(name) => Self::EntitySet(name),
                    None => self.clone(),
                },
                None => self.clone(),
            },
            _ => self.clone(),
        }
    }

    /// Calls `f` with every closed generic reachable from this reference.
    pub(crate) fn each_generic(&self, f: &mut impl FnMut(&str, &[TypeRef])) {
        match self {
            Self::Generic { template, args } => {
                for arg in args {
                    arg.each_generic(f);
                }
                f(template, args);
            }
            Self::Array(element) => element.each_generic(f),
            _ => {}
        }
    }

    pub(crate) fn has_params(&self) -> bool {
        match self {
            Self::Param(_) => true,
            Self::Array(element) => element.has_params(),
            Self::Generic { args, .. } => args.iter().any(TypeRef::has_params),
            _ => false,
        }
    }
}

impl From<ValueTy> for TypeRef {
    fn from(value: ValueTy) -> Self {
        Self::Value(value)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(ty) => write!(f, "{ty}"),
            Self::Named(name) => f.write_str(name),
            Self::EntitySet(name) => write!(f, "EntitySet<{name}>"),
            Self::Array(element) => write!(f, "{element}[]"),
            Self::Param(name) => f.write_str(name),
            Self::Generic { template, args } => {
                write!(f, "{template}<")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(">")
            }
        }
    }
}
