//! Physical name resolution.
//!
//! Names are a pure function of the declared name, its override and the
//! [`NamingConvention`]. Results are cached per builder instance; installing
//! a different convention means creating a new [`NameBuilder`].

mod convention;
pub use convention::{LetterCase, NamespacePolicy, NamingConvention, NamingRules};

use super::def::FieldDef;
use super::model::FieldInfo;

use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug)]
pub struct NameBuilder {
    convention: NamingConvention,
    cache: Mutex<HashMap<(NameKind, String), String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum NameKind {
    Type,
    Member,
    Index,
}

impl NameBuilder {
    pub fn new(convention: NamingConvention) -> Self {
        Self {
            convention,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn convention(&self) -> &NamingConvention {
        &self.convention
    }

    /// Table name of a type. Generic closures map to `Template-Arg-Arg`.
    pub fn type_name(&self, name: &str, mapping_override: Option<&str>) -> String {
        match mapping_override {
            Some(name) => self.build(NameKind::Member, name),
            None => self.build(NameKind::Type, name),
        }
    }

    /// Name of a declared member, honoring its override.
    pub fn member_name(&self, name: &str, mapping_override: Option<&str>) -> String {
        self.build(NameKind::Member, mapping_override.unwrap_or(name))
    }

    /// Name of a field definition. Agrees with [`member_name`](Self::member_name).
    pub fn field_name(&self, field: &FieldDef) -> String {
        self.member_name(&field.name, field.mapping_name.as_deref())
    }

    /// Name of a flattened field; for leaf fields, its column name.
    pub fn column_name(&self, field: &FieldInfo) -> String {
        self.build(NameKind::Member, &field.raw_name)
    }

    pub fn index_name(&self, name: &str) -> String {
        self.build(NameKind::Index, name)
    }

    pub fn primary_index_name(&self, table: &str) -> String {
        format!("PK_{table}")
    }

    pub fn full_text_index_name(&self, table: &str) -> String {
        format!("FT_{table}")
    }

    fn build(&self, kind: NameKind, raw: &str) -> String {
        let key = (kind, raw.to_string());

        if let Some(name) = self.lock().get(&key) {
            return name.clone();
        }

        let name = match kind {
            NameKind::Type => self.apply(self.strip_type_name(raw)),
            NameKind::Member | NameKind::Index => self.apply(raw.to_string()),
        };

        log::trace!("name cache miss; raw={raw:?} kind={kind:?} name={name:?}");
        self.lock().insert(key, name.clone());
        name
    }

    fn apply(&self, name: String) -> String {
        self.convention
            .letter_case
            .apply(self.convention.rules.apply(&name))
    }

    /// Applies the namespace policy, expanding generic closures.
    fn strip_type_name(&self, name: &str) -> String {
        let (base, args) = match (name.find('<'), name.rfind('>')) {
            (Some(open), Some(close)) if open < close => {
                (&name[..open], Some(&name[open + 1..close]))
            }
            _ => (name, None),
        };

        let mut out = self.strip_namespace(base.trim());

        if let Some(args) = args {
            for arg in std_util::str::split_top_level(args, ',') {
                out.push('-');
                out.push_str(&self.strip_type_name(arg.trim()));
            }
        }

        out
    }

    fn strip_namespace(&self, name: &str) -> String {
        let Some((namespace, short)) = name.rsplit_once('.') else {
            return name.to_string();
        };

        match self.convention.namespace_policy {
            NamespacePolicy::Omit => short.to_string(),
            NamespacePolicy::AsIs => name.to_string(),
            NamespacePolicy::Synonymize => match self.convention.synonyms.get(namespace) {
                Some(synonym) if synonym.is_empty() => short.to_string(),
                Some(synonym) => format!("{synonym}.{short}"),
                None => name.to_string(),
            },
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<(NameKind, String), String>> {
        // The cache only holds derived data; a poisoned lock is still usable.
        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for NameBuilder {
    fn default() -> Self {
        Self::new(NamingConvention::default())
    }
}
