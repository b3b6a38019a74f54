use keel_core::schema::decl::{MemberDecl, Registry, TypeDecl, TypeRef};
use keel_core::schema::def::{GeneratorKind, InheritanceSchema};
use keel_core::schema::stored::StoredFieldKind;
use keel_core::schema::{Builder, StoredDomainModel};
use keel_core::{DomainModel, ValueTy};
use pretty_assertions::assert_eq;
use std_util::prelude::*;

fn model() -> DomainModel {
    let registry: Registry = [
        TypeDecl::structure("Address")
            .member(MemberDecl::field("City", ValueTy::String))
            .member(MemberDecl::field("Zip", ValueTy::String)),
        TypeDecl::interface("Named").member(MemberDecl::field("Name", ValueTy::String)),
        TypeDecl::entity("Customer")
            .implements("Named")
            .hierarchy_root_with(GeneratorKind::Default, false, Some(InheritanceSchema::ClassTable))
            .member(MemberDecl::field("Id", ValueTy::I32).key())
            .member(MemberDecl::field("Name", ValueTy::String).full_text("English"))
            .member(MemberDecl::field("Home", TypeRef::named("Address")))
            .member(
                MemberDecl::field("Orders", TypeRef::entity_set("Order")).paired_with("Customer"),
            )
            .index(["Name:desc"]),
        TypeDecl::entity("VipCustomer")
            .base("Customer")
            .member(MemberDecl::field("Level", ValueTy::I16)),
        TypeDecl::entity("Order")
            .hierarchy_root()
            .member(MemberDecl::field("Customer", TypeRef::named("Customer")).key())
            .member(MemberDecl::field("Number", ValueTy::I64).key())
            .member(MemberDecl::field("Total", ValueTy::Decimal).precision(18, 2))
            .member(MemberDecl::field("Stamp", ValueTy::I64).version()),
    ]
    .into_iter()
    .collect();

    assert_ok!(Builder::new().build(&registry))
}

#[test]
fn round_trips_through_json() {
    let model = model();
    let stored = model.to_stored();

    let json = assert_ok!(stored.to_json());
    let parsed = assert_ok!(StoredDomainModel::from_json(&json));

    assert_eq!(parsed, stored);
    assert_eq!(parsed.version(), 1);
    assert_eq!(assert_ok!(parsed.to_model()), model);
}

#[test]
fn references_are_stored_by_name() {
    let stored = model().to_stored();

    let vip = stored.get("VipCustomer").unwrap();
    assert_eq!(vip.ancestor.as_deref(), Some("Customer"));
    assert_eq!(vip.hierarchy.as_deref(), Some("Customer"));

    let customer = stored.get("Customer").unwrap();
    assert_eq!(customer.interfaces, ["Named"]);
    assert_eq!(
        customer.field("Orders").unwrap().kind,
        StoredFieldKind::EntitySet("Order".to_string())
    );
    assert_eq!(
        customer.field("Home").unwrap().kind,
        StoredFieldKind::Structure("Address".to_string())
    );

    let order = stored.get("Order").unwrap();
    assert_eq!(
        order.field("Customer.Id").unwrap().kind,
        StoredFieldKind::Value(ValueTy::I32)
    );

    let json = assert_ok!(stored.to_json());
    assert!(json.contains("\"ancestor\": \"Customer\""));
}

#[test]
fn save_and_load() {
    let stored = model().to_stored();
    let path = std::env::temp_dir().join(format!("keel-model-{}.json", uuid::Uuid::new_v4()));

    assert_ok!(stored.save(&path));
    let loaded = StoredDomainModel::load(&path);
    let _ = std::fs::remove_file(&path);

    assert_eq!(assert_ok!(loaded), stored);
}

#[test]
fn loading_a_missing_file() {
    let path = std::env::temp_dir().join(format!("keel-missing-{}.json", uuid::Uuid::new_v4()));
    let err = assert_err!(StoredDomainModel::load(&path));
    assert!(!err.is_invalid_stored_model());
}

#[test]
fn dangling_ancestor() {
    let json = assert_ok!(model().to_stored().to_json());
    let json = json.replace("\"ancestor\": \"Customer\"", "\"ancestor\": \"Ghost\"");

    let err = assert_err!(StoredDomainModel::from_json(&json));
    assert!(err.is_invalid_stored_model());
    assert!(
        err.to_string().contains("ancestor 'Ghost' doesn't match any stored type"),
        "{err}"
    );
}

#[test]
fn dangling_field_target() {
    let json = assert_ok!(model().to_stored().to_json());
    let json = json.replace("\"entity_set\": \"Order\"", "\"entity_set\": \"Invoice\"");

    let err = assert_err!(StoredDomainModel::from_json(&json));
    assert!(err.is_invalid_stored_model());
    assert!(err.to_string().contains("'Invoice'"), "{err}");
}

#[test]
fn unsupported_version() {
    let json = assert_ok!(model().to_stored().to_json());
    let json = json.replacen("\"version\": 1", "\"version\": 2", 1);

    let err = assert_err!(StoredDomainModel::from_json(&json));
    assert!(err.is_invalid_stored_model());
    assert!(err.to_string().contains("unsupported version 2"), "{err}");
}

#[test]
fn malformed_document() {
    let err = assert_err!(StoredDomainModel::from_json("{ \"version\": "));
    assert!(err.is_invalid_stored_model());
    assert!(err.to_string().contains("malformed document"), "{err}");
}

#[test]
fn unresolved_document_can_not_be_converted() {
    let json = assert_ok!(model().to_stored().to_json());
    let stored: StoredDomainModel = serde_json::from_str(&json).unwrap();

    let err = assert_err!(stored.to_model());
    assert!(err.is_invalid_stored_model());

    let mut stored = stored;
    assert_ok!(stored.update_references());
    assert_ok!(stored.to_model());
}
