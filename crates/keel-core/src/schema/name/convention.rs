use indexmap::IndexMap;
use std::ops;

/// Rules used to turn declared names into physical names.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NamingConvention {
    pub letter_case: LetterCase,
    pub namespace_policy: NamespacePolicy,
    pub rules: NamingRules,

    /// Namespace replacements used by [`NamespacePolicy::Synonymize`].
    pub synonyms: IndexMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LetterCase {
    #[default]
    AsIs,
    Uppercase,
    Lowercase,
    SnakeCase,
}

/// What happens to the namespace part of a dotted type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NamespacePolicy {
    #[default]
    Omit,
    AsIs,
    Synonymize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NamingRules(u8);

impl NamingRules {
    pub const NONE: Self = Self(0);
    pub const UNDERSCORE_DOTS: Self = Self(1);
    pub const UNDERSCORE_HYPHENS: Self = Self(1 << 1);
    pub const REMOVE_DOTS: Self = Self(1 << 2);
    pub const REMOVE_HYPHENS: Self = Self(1 << 3);

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Applies the dot and hyphen rules. Removal takes precedence over
    /// replacement.
    pub fn apply(self, name: &str) -> String {
        let mut out = String::with_capacity(name.len());

        for c in name.chars() {
            match c {
                '.' if self.contains(Self::REMOVE_DOTS) => {}
                '.' if self.contains(Self::UNDERSCORE_DOTS) => out.push('_'),
                '-' if self.contains(Self::REMOVE_HYPHENS) => {}
                '-' if self.contains(Self::UNDERSCORE_HYPHENS) => out.push('_'),
                c => out.push(c),
            }
        }

        out
    }
}

impl ops::BitOr for NamingRules {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl ops::BitOrAssign for NamingRules {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl NamingConvention {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn letter_case(mut self, letter_case: LetterCase) -> Self {
        self.letter_case = letter_case;
        self
    }

    pub fn namespace_policy(mut self, policy: NamespacePolicy) -> Self {
        self.namespace_policy = policy;
        self
    }

    pub fn rules(mut self, rules: NamingRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn synonym(mut self, namespace: impl Into<String>, synonym: impl Into<String>) -> Self {
        self.synonyms.insert(namespace.into(), synonym.into());
        self
    }
}

impl LetterCase {
    pub(super) fn apply(self, name: String) -> String {
        match self {
            Self::AsIs => name,
            Self::Uppercase => name.to_uppercase(),
            Self::Lowercase => name.to_lowercase(),
            Self::SnakeCase => std_util::str::snake_case(&name),
        }
    }
}
