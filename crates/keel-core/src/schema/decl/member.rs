use super::{RemoveAction, TypeRef};

/// A declared member of a type. Only members carrying [`MemberAttr::Field`]
/// are persistent.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberDecl {
    pub name: String,
    pub ty: TypeRef,
    pub attributes: Vec<MemberAttr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberAttr {
    /// Marks the member as a persistent field.
    Field {
        nullable: Option<bool>,
        length: Option<usize>,
        precision: Option<u8>,
        scale: Option<u8>,
        lazy_load: bool,
    },

    /// Marks the field as part of the key, at the given position.
    Key(Option<usize>),

    Version,

    /// Includes the field in the hierarchy's full-text index.
    FullText { language: String },

    /// Explicit mapping name override.
    MapTo(String),

    Association {
        pair_to: Option<String>,
        on_owner_remove: RemoveAction,
        on_target_remove: RemoveAction,
    },
}

impl MemberDecl {
    /// A plain, non-persistent member.
    pub fn new(name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            attributes: vec![],
        }
    }

    /// A persistent field with default options.
    pub fn field(name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        Self::new(name, ty).attr(MemberAttr::Field {
            nullable: None,
            length: None,
            precision: None,
            scale: None,
            lazy_load: false,
        })
    }

    pub fn attr(mut self, attr: MemberAttr) -> Self {
        self.attributes.push(attr);
        self
    }

    pub fn key(self) -> Self {
        self.attr(MemberAttr::Key(None))
    }

    pub fn key_at(self, position: usize) -> Self {
        self.attr(MemberAttr::Key(Some(position)))
    }

    pub fn version(self) -> Self {
        self.attr(MemberAttr::Version)
    }

    pub fn full_text(self, language: impl Into<String>) -> Self {
        self.attr(MemberAttr::FullText {
            language: language.into(),
        })
    }

    pub fn map_to(self, name: impl Into<String>) -> Self {
        self.attr(MemberAttr::MapTo(name.into()))
    }

    pub fn paired_with(self, pair_to: impl Into<String>) -> Self {
        self.attr(MemberAttr::Association {
            pair_to: Some(pair_to.into()),
            on_owner_remove: RemoveAction::Default,
            on_target_remove: RemoveAction::Default,
        })
    }

    pub fn nullable(self, nullable: bool) -> Self {
        self.update_field(|options| *options.0 = Some(nullable))
    }

    pub fn length(self, length: usize) -> Self {
        self.update_field(|options| *options.1 = Some(length))
    }

    pub fn precision(self, precision: u8, scale: u8) -> Self {
        self.update_field(|options| {
            *options.2 = Some(precision);
            *options.3 = Some(scale);
        })
    }

    pub fn lazy_load(self) -> Self {
        self.update_field(|options| *options.4 = true)
    }

    pub fn is_field(&self) -> bool {
        self.attributes
            .iter()
            .any(|attr| matches!(attr, MemberAttr::Field { .. }))
    }

    #[allow(clippy::type_complexity)]
    fn update_field(
        mut self,
        f: impl FnOnce((
            &mut Option<bool>,
            &mut Option<usize>,
            &mut Option<u8>,
            &mut Option<u8>,
            &mut bool,
        )),
    ) -> Self {
        for attr in &mut self.attributes {
            if let MemberAttr::Field {
                nullable,
                length,
                precision,
                scale,
                lazy_load,
            } = attr
            {
                f((nullable, length, precision, scale, lazy_load));
                break;
            }
        }
        self
    }
}
