use keel::decl::{MemberDecl, TypeDecl};
use keel::def::InheritanceSchema;
use keel::schema::name::{LetterCase, NamespacePolicy, NamingRules};
use keel::{DomainConfig, NamingConvention, SequenceSettings, ValueTy};
use pretty_assertions::assert_eq;
use std_util::prelude::*;

const CONFIG: &str = r#"
default_inheritance_schema = "single_table"

[naming]
letter_case = "uppercase"
namespace = "synonymize"
rules = ["underscore_dots", "remove_hyphens"]

[naming.synonyms]
"App.Model" = "M"

[[key_generators]]
name = "Orders"
seed = 1000
step = 10

[[key_generators]]
name = "Invoices"
"#;

#[test]
fn full_document() {
    let config = assert_ok!(DomainConfig::from_toml_str(CONFIG));

    assert_eq!(
        config.naming,
        NamingConvention::new()
            .letter_case(LetterCase::Uppercase)
            .namespace_policy(NamespacePolicy::Synonymize)
            .rules(NamingRules::UNDERSCORE_DOTS | NamingRules::REMOVE_HYPHENS)
            .synonym("App.Model", "M")
    );
    assert_eq!(
        config.default_inheritance_schema,
        InheritanceSchema::SingleTable
    );
    assert_eq!(
        config.key_generators["Orders"],
        SequenceSettings { seed: 1000, step: 10 }
    );
    assert_eq!(config.key_generators["Invoices"], SequenceSettings::DEFAULT);
}

#[test]
fn configuration_applies_to_the_build() {
    let mut config = assert_ok!(DomainConfig::from_toml_str(CONFIG));
    assert_ok!(config.register_all([
        TypeDecl::entity("App.Model.Document")
            .hierarchy_root()
            .member(MemberDecl::field("Id", ValueTy::I32).key()),
        TypeDecl::entity("App.Model.Invoice")
            .base("App.Model.Document")
            .member(MemberDecl::field("Total", ValueTy::Decimal)),
    ]));

    let domain = assert_ok!(config.build());
    let model = domain.model();

    assert_eq!(model.get("App.Model.Document").unwrap().mapping_name, "M_DOCUMENT");

    let hierarchy = model.hierarchy_of("App.Model.Invoice").unwrap();
    assert_eq!(hierarchy.schema, InheritanceSchema::SingleTable);
    assert_eq!(hierarchy.tables.len(), 1);
    assert_eq!(hierarchy.tables[0].name, "M_DOCUMENT");
}

#[test]
fn load_from_file() {
    let path = std::env::temp_dir().join(format!("keel-config-{}.toml", uuid::Uuid::new_v4()));
    assert_ok!(std::fs::write(&path, CONFIG));

    let config = DomainConfig::load(&path);
    let _ = std::fs::remove_file(&path);

    let config = assert_ok!(config);
    assert_eq!(config.key_generators.len(), 2);
}

#[test]
fn missing_file() {
    let path = std::env::temp_dir().join(format!("keel-missing-{}.toml", uuid::Uuid::new_v4()));

    let err = assert_err!(DomainConfig::load(&path));
    assert!(!err.is_configuration());
    assert!(
        err.to_string().starts_with("failed to read domain configuration"),
        "{err}"
    );
}

#[test]
fn invalid_values() {
    let cases = [
        ("[naming]\nletter_case = \"title\"\n", "unknown letter case `title`"),
        ("[naming]\nnamespace = \"drop\"\n", "unknown namespace policy `drop`"),
        ("[naming]\nrules = [\"snake\"]\n", "unknown naming rule `snake`"),
        (
            "default_inheritance_schema = \"table_per_type\"\n",
            "unknown inheritance schema `table_per_type`",
        ),
        (
            "[[key_generators]]\nname = \"Orders\"\nstep = 0\n",
            "key generator `Orders` has a step of zero",
        ),
        (
            "[[key_generators]]\nname = \"Orders\"\n\n[[key_generators]]\nname = \"Orders\"\n",
            "key generator `Orders` is configured more than once",
        ),
        ("[[key_generators]]\nname = \"\"\n", "key generator without a name"),
    ];

    for (src, message) in cases {
        let err = assert_err!(DomainConfig::from_toml_str(src), "src={src:?}");
        assert!(err.is_configuration(), "{err}");
        assert_eq!(err.to_string(), format!("invalid configuration: {message}"));
    }
}

#[test]
fn malformed_toml() {
    let err = assert_err!(DomainConfig::from_toml_str("[naming\n"));
    assert!(err.is_configuration(), "{err}");

    let err = assert_err!(DomainConfig::from_toml_str("[[key_generators]]\nseed = 1\n"));
    assert!(err.is_configuration(), "{err}");
}
