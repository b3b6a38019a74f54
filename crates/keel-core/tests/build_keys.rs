use keel_core::schema::decl::{MemberDecl, Registry, TypeDecl, TypeRef};
use keel_core::schema::def::GeneratorKind;
use keel_core::schema::Builder;
use keel_core::{DomainModel, Result, ValueTy};
use pretty_assertions::assert_eq;
use std_util::prelude::*;

fn build(decls: impl IntoIterator<Item = TypeDecl>) -> Result<DomainModel> {
    build_with(&Builder::new(), decls)
}

fn build_with(builder: &Builder, decls: impl IntoIterator<Item = TypeDecl>) -> Result<DomainModel> {
    let registry: Registry = decls.into_iter().collect();
    builder.build(&registry)
}

fn build_err(decls: impl IntoIterator<Item = TypeDecl>) -> String {
    let err = assert_err!(build(decls));
    assert!(err.is_domain_builder(), "unexpected error kind: {err}");
    err.to_string()
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn customer() -> TypeDecl {
    TypeDecl::entity("Customer")
        .hierarchy_root()
        .member(MemberDecl::field("Id", ValueTy::I32).key())
        .member(MemberDecl::field("Name", ValueTy::String))
}

#[test]
fn hierarchy_without_key_fields() {
    let msg = build_err([TypeDecl::entity("Customer")
        .hierarchy_root()
        .member(MemberDecl::field("Name", ValueTy::String))]);

    assert_eq!(msg, "Hierarchy 'Customer' doesn't contain any key fields");
}

#[test]
fn entity_outside_any_hierarchy() {
    let msg = build_err([TypeDecl::entity("Orphan").member(MemberDecl::field("Id", ValueTy::I32))]);
    assert!(msg.starts_with("Type 'Orphan' doesn't belong to any hierarchy"), "{msg}");
}

#[test]
fn explicit_positions_order_the_key() {
    let model = assert_ok!(build([TypeDecl::entity("Line")
        .hierarchy_root()
        .member(MemberDecl::field("A", ValueTy::I32).key_at(1))
        .member(MemberDecl::field("B", ValueTy::String).key_at(0))]));

    let key = model.key_of("Line").unwrap();
    assert_eq!(key.fields, ["B", "A"]);
    assert_eq!(key.tuple, [ValueTy::String, ValueTy::I32]);
    assert_eq!(key.columns, ["B", "A"]);

    let line = model.get("Line").unwrap();
    let names: Vec<_> = line.fields.keys().map(String::as_str).collect();
    assert_eq!(names, ["B", "A", "TypeId"]);
}

#[test]
fn implicit_positions_follow_declaration_order() {
    let model = assert_ok!(build([TypeDecl::entity("Line")
        .hierarchy_root()
        .member(MemberDecl::field("Name", ValueTy::String))
        .member(MemberDecl::field("Order", ValueTy::I64).key())
        .member(MemberDecl::field("Number", ValueTy::I32).key())]));

    assert_eq!(model.key_of("Line").unwrap().fields, ["Order", "Number"]);
}

#[test]
fn duplicate_key_position() {
    let msg = build_err([TypeDecl::entity("Line")
        .hierarchy_root()
        .member(MemberDecl::field("A", ValueTy::I32).key_at(0))
        .member(MemberDecl::field("B", ValueTy::I32).key_at(0))]);

    assert_eq!(msg, "Hierarchy 'Line' has more than one key field at position 0");
}

#[test]
fn gap_in_key_positions() {
    let msg = build_err([TypeDecl::entity("Line")
        .hierarchy_root()
        .member(MemberDecl::field("A", ValueTy::I32).key_at(0))
        .member(MemberDecl::field("B", ValueTy::I32).key_at(2))]);

    assert_eq!(msg, "Hierarchy 'Line' has no key field at position 1");
}

#[test]
fn illegal_key_field_types() {
    let msg = build_err([TypeDecl::entity("Blob")
        .hierarchy_root()
        .member(MemberDecl::field("Data", ValueTy::Bytes).key())]);
    assert_eq!(msg, "Key field 'Blob.Data' can't be of type 'bytes'");

    let msg = build_err([
        TypeDecl::structure("Address").member(MemberDecl::field("City", ValueTy::String)),
        TypeDecl::entity("Site")
            .hierarchy_root()
            .member(MemberDecl::field("Location", TypeRef::named("Address")).key()),
    ]);
    assert_eq!(msg, "Key field 'Site.Location' can't be of type 'Address'");

    let msg = build_err([
        customer(),
        TypeDecl::entity("Group")
            .hierarchy_root()
            .member(MemberDecl::field("Members", TypeRef::entity_set("Customer")).key()),
    ]);
    assert_eq!(msg, "Key field 'Group.Members' can't be of type 'EntitySet<Customer>'");
}

#[test]
fn nullable_key_field() {
    let msg = build_err([TypeDecl::entity("Customer")
        .hierarchy_root()
        .member(MemberDecl::field("Id", ValueTy::I32).key().nullable(true))]);

    assert_eq!(msg, "Key field 'Customer.Id' can't be nullable");
}

#[test]
fn string_key_is_not_nullable_and_gets_a_length() {
    let model = assert_ok!(build([TypeDecl::entity("Country")
        .hierarchy_root()
        .member(MemberDecl::field("Code", ValueTy::String).key())]));

    let code = &model.get("Country").unwrap().columns["Code"];
    assert!(!code.nullable);
    assert!(code.is_primary_key);
    assert_eq!(code.length, Some(255));
}

#[test]
fn key_field_on_descendant() {
    let msg = build_err([
        customer(),
        TypeDecl::entity("VipCustomer")
            .base("Customer")
            .member(MemberDecl::field("Level", ValueTy::I32).key()),
    ]);

    assert_eq!(
        msg,
        "Key field 'VipCustomer.Level' is declared on type 'VipCustomer' which is not the root of hierarchy 'Customer'"
    );
}

#[test]
fn descendant_may_redeclare_inherited_key() {
    let model = assert_ok!(build([
        customer(),
        TypeDecl::entity("VipCustomer")
            .base("Customer")
            .member(MemberDecl::field("Id", ValueTy::I32).key()),
    ]));

    let id = model.get("VipCustomer").unwrap().field("Id").unwrap();
    assert!(id.is_key);
    assert!(!id.is_inherited);
}

#[test]
fn descendant_marked_as_root() {
    let msg = build_err([
        customer(),
        TypeDecl::entity("VipCustomer")
            .base("Customer")
            .hierarchy_root()
            .member(MemberDecl::field("Level", ValueTy::I32)),
    ]);

    assert_eq!(
        msg,
        "Type 'VipCustomer' can't be a hierarchy root: it already belongs to hierarchy 'Customer'"
    );
}

#[test]
fn reference_key_expands_to_target_key() {
    let model = assert_ok!(build([
        TypeDecl::entity("Order")
            .hierarchy_root()
            .member(MemberDecl::field("Customer", TypeRef::named("Customer")).key())
            .member(MemberDecl::field("Number", ValueTy::I32).key()),
        customer(),
    ]));

    let key = model.key_of("Order").unwrap();
    assert_eq!(key.fields, ["Customer", "Number"]);
    assert_eq!(key.leaves, ["Customer.Id", "Number"]);
    assert_eq!(key.columns, ["Customer.Id", "Number"]);
    assert_eq!(key.tuple, [ValueTy::I32, ValueTy::I32]);

    // More than one key field: the default generator can't serve it.
    assert_eq!(key.generator, GeneratorKind::None);

    let order = model.get("Order").unwrap();
    let reference = order.field("Customer").unwrap();
    assert!(reference.is_reference());
    assert!(order.field("Customer.Id").unwrap().is_key);
    assert!(!order.columns["Customer.Id"].nullable);
}

#[test]
fn include_type_id_in_key() {
    let model = assert_ok!(build([TypeDecl::entity("Customer")
        .hierarchy_root_with(GeneratorKind::Default, true, None)
        .member(MemberDecl::field("Id", ValueTy::I32).key())]));

    let key = model.key_of("Customer").unwrap();
    assert!(key.contains_type_id);
    assert_eq!(key.fields, ["Id", "TypeId"]);
    assert_eq!(key.columns, ["Id", "TypeId"]);
    assert_eq!(key.tuple, [ValueTy::I32, ValueTy::I32]);
    assert_eq!(key.generated_tuple(), [ValueTy::I32]);
    assert_eq!(key.generator, GeneratorKind::Default);

    let type_id = model.get("Customer").unwrap().field("TypeId").unwrap();
    assert!(type_id.is_system);
    assert!(type_id.is_key);
}

#[test]
fn type_id_is_not_stored_in_concrete_tables_by_default() {
    let model = assert_ok!(build([customer()]));

    let customer = model.get("Customer").unwrap();
    assert!(customer.field("TypeId").unwrap().columns.is_empty());
    assert!(!customer.columns.contains_key("TypeId"));
}

#[test]
fn default_generator_downgrades_for_unsupported_keys() {
    init_logging();

    let model = assert_ok!(build([
        TypeDecl::entity("Measure")
            .hierarchy_root()
            .member(MemberDecl::field("Value", ValueTy::F64).key()),
        TypeDecl::entity("Amount")
            .hierarchy_root()
            .member(MemberDecl::field("Value", ValueTy::Decimal).key().precision(10, 2)),
        TypeDecl::entity("Ticket")
            .hierarchy_root()
            .member(MemberDecl::field("Id", ValueTy::Guid).key()),
    ]));

    assert_eq!(model.key_of("Measure").unwrap().generator, GeneratorKind::None);
    assert_eq!(model.key_of("Amount").unwrap().generator, GeneratorKind::None);
    assert_eq!(model.key_of("Ticket").unwrap().generator, GeneratorKind::Default);
}

#[test]
fn custom_generator_arity() {
    let mut builder = Builder::new();
    builder
        .custom_generator("Pair", [ValueTy::I32, ValueTy::I32])
        .custom_generator("Single", [ValueTy::I64]);

    let triple = TypeDecl::entity("Triple")
        .hierarchy_root_with(GeneratorKind::custom("Pair"), false, None)
        .member(MemberDecl::field("A", ValueTy::I32).key())
        .member(MemberDecl::field("B", ValueTy::I32).key())
        .member(MemberDecl::field("C", ValueTy::I32).key());

    let err = assert_err!(build_with(&builder, [triple]));
    assert_eq!(
        err.to_string(),
        "Key generator 'Pair' can serve hierarchy with exactly 2 key fields; hierarchy 'Triple' has 3"
    );

    let double = TypeDecl::entity("Double")
        .hierarchy_root_with(GeneratorKind::custom("Single"), false, None)
        .member(MemberDecl::field("A", ValueTy::I64).key())
        .member(MemberDecl::field("B", ValueTy::I64).key());

    let err = assert_err!(build_with(&builder, [double]));
    assert_eq!(
        err.to_string(),
        "Key generator 'Single' can serve hierarchy with exactly one key field; hierarchy 'Double' has 2"
    );
}

#[test]
fn custom_generator_shape() {
    let mut builder = Builder::new();
    builder.custom_generator("Pair", [ValueTy::I32, ValueTy::I32]);

    let pair = |name: &str, second: ValueTy| {
        TypeDecl::entity(name)
            .hierarchy_root_with(GeneratorKind::custom("Pair"), false, None)
            .member(MemberDecl::field("A", ValueTy::I32).key())
            .member(MemberDecl::field("B", second).key())
    };

    let model = assert_ok!(build_with(&builder, [pair("Good", ValueTy::I32)]));
    assert_eq!(model.key_of("Good").unwrap().generator, GeneratorKind::custom("Pair"));

    let err = assert_err!(build_with(&builder, [pair("Bad", ValueTy::String)]));
    assert!(err.is_domain_builder());
    assert!(err.to_string().starts_with("Key generator 'Pair' produces keys of type (i32, i32)"));
}

#[test]
fn custom_generator_ignores_type_id() {
    let mut builder = Builder::new();
    builder.custom_generator("Single", [ValueTy::I32]);

    let model = assert_ok!(build_with(
        &builder,
        [TypeDecl::entity("Customer")
            .hierarchy_root_with(GeneratorKind::custom("Single"), true, None)
            .member(MemberDecl::field("Id", ValueTy::I32).key())]
    ));

    let key = model.key_of("Customer").unwrap();
    assert_eq!(key.generator, GeneratorKind::custom("Single"));
    assert_eq!(key.tuple.len(), 2);
}

#[test]
fn unregistered_custom_generator() {
    let msg = build_err([TypeDecl::entity("Customer")
        .hierarchy_root_with(GeneratorKind::custom("Missing"), false, None)
        .member(MemberDecl::field("Id", ValueTy::I32).key())]);

    assert_eq!(msg, "Key generator 'Missing' is not registered");
}

#[test]
fn named_generator_serves_one_key_shape() {
    let root = |name: &str, ty: ValueTy| {
        TypeDecl::entity(name)
            .hierarchy_root_with(GeneratorKind::named("Shared"), false, None)
            .member(MemberDecl::field("Id", ty).key())
    };

    let model = assert_ok!(build([root("A", ValueTy::I64), root("B", ValueTy::I64)]));
    assert_eq!(model.key_of("B").unwrap().generator, GeneratorKind::named("Shared"));

    let msg = build_err([root("A", ValueTy::I64), root("B", ValueTy::String)]);
    assert_eq!(
        msg,
        "Key generator 'Shared' can't serve hierarchies with different keys: 'A' (i64) and 'B' (string)"
    );
}

#[test]
fn equality_identifiers_are_shared_by_shape() {
    let model = assert_ok!(build([
        customer(),
        TypeDecl::entity("Product")
            .hierarchy_root()
            .member(MemberDecl::field("Code", ValueTy::I32).key()),
        TypeDecl::entity("Line")
            .hierarchy_root()
            .member(MemberDecl::field("Order", ValueTy::I32).key())
            .member(MemberDecl::field("Sku", ValueTy::String).key()),
    ]));

    let customer = &model.key_of("Customer").unwrap().equality_identifier;
    let product = &model.key_of("Product").unwrap().equality_identifier;
    let line = &model.key_of("Line").unwrap().equality_identifier;

    assert_eq!(customer, product);
    assert_ne!(customer, line);
    assert_eq!(customer.to_string(), "(i32)");
    assert_eq!(line.to_string(), "(i32, string)");
}
