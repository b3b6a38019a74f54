use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDef {
    /// Explicit name override.
    pub name: Option<String>,

    /// Indexed fields, by (possibly dotted) field name.
    pub key_fields: Vec<(String, Direction)>,

    pub included_fields: Vec<String>,

    pub unique: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl IndexDef {
    /// Parses key field specs. A field may be suffixed with `:desc` or `:asc`.
    pub fn new<S: AsRef<str>>(key_fields: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: None,
            key_fields: key_fields
                .into_iter()
                .map(|spec| parse_key_field(spec.as_ref()))
                .collect(),
            included_fields: vec![],
            unique: false,
        }
    }
}

fn parse_key_field(spec: &str) -> (String, Direction) {
    match spec.rsplit_once(':') {
        Some((name, dir)) if dir.eq_ignore_ascii_case("desc") => {
            (name.to_string(), Direction::Desc)
        }
        Some((name, dir)) if dir.eq_ignore_ascii_case("asc") => (name.to_string(), Direction::Asc),
        _ => (spec.to_string(), Direction::Asc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_directions() {
        let index = IndexDef::new(["Name", "Created:desc", "Total:ASC"]);
        assert_eq!(
            index.key_fields,
            [
                ("Name".to_string(), Direction::Asc),
                ("Created".to_string(), Direction::Desc),
                ("Total".to_string(), Direction::Asc),
            ]
        );
    }
}
