use super::{StoredDomainModel, StoredField, StoredFieldKind, StoredType};

use std::collections::{HashMap, HashSet};

/// Maps names in a previous model to their names in the next model.
#[derive(Debug, Default, Clone)]
pub struct RenameHints {
    types: HashMap<String, String>,

    /// Keyed by previous type name and previous field name.
    fields: HashMap<(String, String), String>,
}

impl RenameHints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_type_hint(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.types.insert(from.into(), to.into());
    }

    pub fn add_field_hint(
        &mut self,
        ty: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) {
        self.fields.insert((ty.into(), from.into()), to.into());
    }

    pub fn get_type(&self, from: &str) -> Option<&str> {
        self.types.get(from).map(String::as_str)
    }

    pub fn get_field(&self, ty: &str, from: &str) -> Option<&str> {
        self.fields
            .get(&(ty.to_string(), from.to_string()))
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.fields.is_empty()
    }
}

pub struct DiffContext<'a> {
    previous: &'a StoredDomainModel,
    next: &'a StoredDomainModel,

    rename_hints: &'a RenameHints,
}

impl<'a> DiffContext<'a> {
    pub fn new(
        previous: &'a StoredDomainModel,
        next: &'a StoredDomainModel,
        rename_hints: &'a RenameHints,
    ) -> Self {
        Self {
            previous,
            next,
            rename_hints,
        }
    }

    pub fn rename_hints(&self) -> &'a RenameHints {
        self.rename_hints
    }

    pub fn previous(&self) -> &'a StoredDomainModel {
        self.previous
    }

    pub fn next(&self) -> &'a StoredDomainModel {
        self.next
    }

    /// Name a previous type is expected to have in the next model.
    fn next_type_name<'b>(&self, previous: &'b str) -> &'b str
    where
        'a: 'b,
    {
        self.rename_hints.get_type(previous).unwrap_or(previous)
    }
}

/// Differences between the types of two stored models.
#[derive(Debug)]
pub struct TypesDiff<'a> {
    items: Vec<TypesDiffItem<'a>>,
}

impl<'a> TypesDiff<'a> {
    pub fn from(cx: &DiffContext<'a>) -> Self {
        let mut items = vec![];
        let mut matched = HashSet::new();

        for from in &cx.previous().types {
            let Some(to) = cx.next().get(cx.next_type_name(&from.name)) else {
                items.push(TypesDiffItem::RemoveType(from));
                continue;
            };

            matched.insert(to.name.as_str());

            let fields = FieldsDiff::from(cx, from, to);
            if from.name != to.name || from.kind != to.kind || !fields.is_empty() {
                items.push(TypesDiffItem::AlterType { from, to, fields });
            }
        }

        for to in &cx.next().types {
            if !matched.contains(to.name.as_str()) {
                items.push(TypesDiffItem::AddType(to));
            }
        }

        Self { items }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &TypesDiffItem<'a>> + '_ {
        self.items.iter()
    }
}

#[derive(Debug)]
pub enum TypesDiffItem<'a> {
    AddType(&'a StoredType),
    RemoveType(&'a StoredType),
    AlterType {
        from: &'a StoredType,
        to: &'a StoredType,
        fields: FieldsDiff<'a>,
    },
}

impl TypesDiffItem<'_> {
    pub fn is_rename(&self) -> bool {
        matches!(self, Self::AlterType { from, to, .. } if from.name != to.name)
    }
}

/// Differences between the top-level fields of a type in two stored models.
#[derive(Debug)]
pub struct FieldsDiff<'a> {
    items: Vec<FieldsDiffItem<'a>>,
}

impl<'a> FieldsDiff<'a> {
    pub fn from(cx: &DiffContext<'a>, from_type: &'a StoredType, to_type: &'a StoredType) -> Self {
        let mut items = vec![];
        let mut matched = HashSet::new();

        for from in from_type.top_level_fields() {
            let name = cx
                .rename_hints()
                .get_field(&from_type.name, &from.name)
                .unwrap_or(from.name.as_str());

            let Some(to) = to_type.field(name).filter(|to| to.parent.is_none()) else {
                items.push(FieldsDiffItem::RemoveField(from));
                continue;
            };

            matched.insert(to.name.as_str());

            let retyped = !same_kind(cx, &from.kind, &to.kind);
            if from.name != to.name || retyped {
                items.push(FieldsDiffItem::AlterField { from, to, retyped });
            }
        }

        for to in to_type.top_level_fields() {
            if !matched.contains(to.name.as_str()) {
                items.push(FieldsDiffItem::AddField(to));
            }
        }

        Self { items }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &FieldsDiffItem<'a>> + '_ {
        self.items.iter()
    }
}

#[derive(Debug)]
pub enum FieldsDiffItem<'a> {
    AddField(&'a StoredField),
    RemoveField(&'a StoredField),
    AlterField {
        from: &'a StoredField,
        to: &'a StoredField,

        /// Set when the field's type changed.
        retyped: bool,
    },
}

impl FieldsDiffItem<'_> {
    pub fn is_rename(&self) -> bool {
        matches!(self, Self::AlterField { from, to, .. } if from.name != to.name)
    }

    pub fn is_retype(&self) -> bool {
        matches!(self, Self::AlterField { retyped: true, .. })
    }
}

/// Field types are equal when their targets match once type renames apply.
fn same_kind(cx: &DiffContext<'_>, from: &StoredFieldKind, to: &StoredFieldKind) -> bool {
    use StoredFieldKind::*;

    match (from, to) {
        (Value(from), Value(to)) => from == to,
        (Structure(from), Structure(to))
        | (Reference(from), Reference(to))
        | (EntitySet(from), EntitySet(to)) => cx.next_type_name(from) == to.as_str(),
        _ => false,
    }
}
