use keel_core::schema::decl::{MemberAttr, MemberDecl, Registry, TypeDecl, TypeRef};
use keel_core::schema::def::{Direction, RemoveAction};
use keel_core::schema::model::Multiplicity;
use keel_core::schema::Builder;
use keel_core::{DomainModel, Result, ValueTy};
use pretty_assertions::assert_eq;
use std_util::prelude::*;

fn build(decls: impl IntoIterator<Item = TypeDecl>) -> Result<DomainModel> {
    let registry: Registry = decls.into_iter().collect();
    Builder::new().build(&registry)
}

fn build_err(decls: impl IntoIterator<Item = TypeDecl>) -> String {
    let err = assert_err!(build(decls));
    assert!(err.is_domain_builder(), "unexpected error kind: {err}");
    err.to_string()
}

fn customer(orders: MemberDecl) -> TypeDecl {
    TypeDecl::entity("Customer")
        .hierarchy_root()
        .member(MemberDecl::field("Id", ValueTy::I32).key())
        .member(orders)
}

fn order() -> TypeDecl {
    TypeDecl::entity("Order")
        .hierarchy_root()
        .member(MemberDecl::field("Id", ValueTy::I32).key())
        .member(MemberDecl::field("Name", ValueTy::String))
        .member(MemberDecl::field("Created", ValueTy::DateTime))
        .member(MemberDecl::field("Customer", TypeRef::named("Customer")))
        .index(["Name", "Created:desc"])
}

fn orders() -> MemberDecl {
    MemberDecl::field("Orders", TypeRef::entity_set("Order"))
}

#[test]
fn paired_entity_set_and_reference() {
    let model = assert_ok!(build([customer(orders().paired_with("Customer")), order()]));

    let associations: Vec<_> = model.associations_of("Customer").collect();
    assert_eq!(associations.len(), 1);

    let orders = associations[0];
    assert_eq!(orders.field, "Orders");
    assert_eq!(orders.multiplicity, Multiplicity::OneToMany);
    assert_eq!(model.type_info(orders.target).name, "Order");

    let (paired_type, paired_field) = orders.paired.as_ref().unwrap();
    assert_eq!(model.type_info(*paired_type).name, "Order");
    assert_eq!(paired_field, "Customer");

    let customer = model.associations_of("Order").next().unwrap();
    assert_eq!(customer.field, "Customer");
    assert_eq!(customer.multiplicity, Multiplicity::ZeroToOne);
    assert!(customer.paired.is_none());

    assert!(model.get("Customer").unwrap().field("Orders").unwrap().columns.is_empty());
}

#[test]
fn unpaired_entity_set() {
    let model = assert_ok!(build([customer(orders()), order()]));

    let orders = model.associations_of("Customer").next().unwrap();
    assert_eq!(orders.multiplicity, Multiplicity::ZeroToMany);
}

#[test]
fn many_to_many() {
    let model = assert_ok!(build([
        TypeDecl::entity("Student")
            .hierarchy_root()
            .member(MemberDecl::field("Id", ValueTy::I32).key())
            .member(
                MemberDecl::field("Courses", TypeRef::entity_set("Course"))
                    .paired_with("Students"),
            ),
        TypeDecl::entity("Course")
            .hierarchy_root()
            .member(MemberDecl::field("Id", ValueTy::I32).key())
            .member(
                MemberDecl::field("Students", TypeRef::entity_set("Student"))
                    .paired_with("Courses"),
            ),
    ]));

    for association in &model.associations {
        assert_eq!(association.multiplicity, Multiplicity::ManyToMany);
    }
    assert_eq!(model.associations.len(), 2);
}

#[test]
fn remove_actions() {
    let model = assert_ok!(build([
        customer(orders().attr(MemberAttr::Association {
            pair_to: Some("Customer".to_string()),
            on_owner_remove: RemoveAction::Cascade,
            on_target_remove: RemoveAction::Clear,
        })),
        order(),
    ]));

    let orders = model.associations_of("Customer").next().unwrap();
    assert_eq!(orders.on_owner_remove, RemoveAction::Cascade);
    assert_eq!(orders.on_target_remove, RemoveAction::Clear);

    let customer = model.associations_of("Order").next().unwrap();
    assert_eq!(customer.on_owner_remove, RemoveAction::Default);
}

#[test]
fn pairing_errors() {
    let msg = build_err([customer(orders().paired_with("Missing")), order()]);
    assert_eq!(
        msg,
        "Association 'Customer.Orders' is paired with unknown field 'Order.Missing'"
    );

    let msg = build_err([customer(orders().paired_with("Name")), order()]);
    assert_eq!(
        msg,
        "Association 'Customer.Orders' is paired with 'Order.Name' which is neither a reference nor an entity set"
    );

    let msg = build_err([
        customer(orders().paired_with("Product")),
        order().member(MemberDecl::field("Product", TypeRef::named("Product"))),
        TypeDecl::entity("Product")
            .hierarchy_root()
            .member(MemberDecl::field("Id", ValueTy::I32).key()),
    ]);
    assert_eq!(
        msg,
        "Association 'Customer.Orders' is paired with 'Order.Product' which doesn't refer back to 'Customer'"
    );
}

#[test]
fn nested_references_are_associations() {
    let model = assert_ok!(build([
        customer(orders()),
        order(),
        TypeDecl::structure("Contact")
            .member(MemberDecl::field("Owner", TypeRef::named("Customer")))
            .member(MemberDecl::field("Phone", ValueTy::String)),
        TypeDecl::entity("Lead")
            .hierarchy_root()
            .member(MemberDecl::field("Id", ValueTy::I32).key())
            .member(MemberDecl::field("Contact", TypeRef::named("Contact"))),
    ]));

    let fields: Vec<_> = model
        .associations_of("Lead")
        .map(|association| association.field.as_str())
        .collect();
    assert_eq!(fields, ["Contact.Owner"]);
}

#[test]
fn inherited_references_belong_to_the_declaring_type() {
    let model = assert_ok!(build([
        customer(orders()),
        order(),
        TypeDecl::entity("RushOrder")
            .base("Order")
            .member(MemberDecl::field("Deadline", ValueTy::DateTime)),
    ]));

    assert_eq!(model.associations_of("RushOrder").count(), 0);
    assert_eq!(model.associations_of("Order").count(), 1);
}

#[test]
fn entity_sets_are_not_allowed_in_structures() {
    let msg = build_err([
        order(),
        customer(orders()),
        TypeDecl::structure("Basket").member(orders()),
    ]);
    assert_eq!(msg, "Structure 'Basket' can't contain entity set field 'Orders'");
}

#[test]
fn primary_and_declared_indexes() {
    let model = assert_ok!(build([customer(orders()), order()]));
    let order = model.get("Order").unwrap();

    let primary = order.primary_index().unwrap();
    assert_eq!(primary.name, "PK_Order");
    assert_eq!(primary.columns, [("Id".to_string(), Direction::Asc)]);
    assert!(primary.unique);

    let index = order.index("IX_NameCreated").unwrap();
    assert_eq!(
        index.columns,
        [
            ("Name".to_string(), Direction::Asc),
            ("Created".to_string(), Direction::Desc),
        ]
    );
    assert_eq!(index.fields, ["Name", "Created"]);
    assert!(!index.unique);
    assert!(!index.is_inherited);
}

#[test]
fn indexes_on_references_use_key_columns() {
    let model = assert_ok!(build([
        customer(orders()),
        order().index(["Customer"]),
    ]));

    let index = model.get("Order").unwrap().index("IX_Customer").unwrap();
    assert_eq!(index.column_names().collect::<Vec<_>>(), ["Customer.Id"]);
}

#[test]
fn indexes_are_inherited() {
    let model = assert_ok!(build([
        customer(orders()),
        order(),
        TypeDecl::entity("RushOrder").base("Order"),
    ]));

    let rush = model.get("RushOrder").unwrap();
    assert_eq!(rush.primary_index().unwrap().name, "PK_RushOrder");

    let index = rush.index("IX_NameCreated").unwrap();
    assert!(index.is_inherited);
}

#[test]
fn index_errors() {
    let msg = build_err([customer(orders()), order().index(["Missing"])]);
    assert_eq!(msg, "Index 'IX_Missing' of type 'Order' refers to unknown field 'Missing'");

    let msg = build_err([customer(orders()).index(["Orders"]), order()]);
    assert_eq!(
        msg,
        "Index 'IX_Orders' of type 'Customer' can't include entity set field 'Orders'"
    );
}

#[test]
fn index_without_columns_is_dropped() {
    let model = assert_ok!(build([
        TypeDecl::structure("Empty"),
        TypeDecl::entity("Item")
            .hierarchy_root()
            .member(MemberDecl::field("Id", ValueTy::I32).key())
            .member(MemberDecl::field("Meta", TypeRef::named("Empty")))
            .index(["Meta"]),
    ]));

    let item = model.get("Item").unwrap();
    assert_eq!(item.indexes.len(), 1);
    assert!(item.indexes[0].is_primary);
}

fn documents(receipt_key: ValueTy) -> Vec<TypeDecl> {
    vec![
        TypeDecl::interface("Document").member(MemberDecl::field("Title", ValueTy::String)),
        TypeDecl::entity("Invoice")
            .implements("Document")
            .hierarchy_root()
            .member(MemberDecl::field("Id", ValueTy::I32).key())
            .member(MemberDecl::field("Title", ValueTy::String)),
        TypeDecl::entity("Receipt")
            .implements("Document")
            .hierarchy_root()
            .member(MemberDecl::field("Id", receipt_key).key())
            .member(MemberDecl::field("Title", ValueTy::String)),
        TypeDecl::entity("Attachment")
            .hierarchy_root()
            .member(MemberDecl::field("Id", ValueTy::I32).key())
            .member(MemberDecl::field("Document", TypeRef::named("Document"))),
    ]
}

#[test]
fn references_to_interfaces_use_the_common_key() {
    let model = assert_ok!(build(documents(ValueTy::I32)));

    let document = model.get("Document").unwrap();
    let implementors: Vec<_> = document
        .implementors
        .iter()
        .map(|id| model.type_info(*id).name.as_str())
        .collect();
    assert_eq!(implementors, ["Invoice", "Receipt"]);

    let attachment = model.get("Attachment").unwrap();
    assert_eq!(attachment.field("Document").unwrap().columns, ["Document.Id"]);

    let association = model.associations_of("Attachment").next().unwrap();
    assert_eq!(model.type_info(association.target).name, "Document");
}

#[test]
fn interface_implemented_with_different_keys() {
    let msg = build_err(documents(ValueTy::String));
    assert_eq!(
        msg,
        "Interface 'Document' is implemented by hierarchies with different keys: 'Invoice' (i32) and 'Receipt' (string)"
    );
}

#[test]
fn interface_fields_must_be_implemented() {
    let mut decls = documents(ValueTy::I32);
    decls[2] = TypeDecl::entity("Receipt")
        .implements("Document")
        .hierarchy_root()
        .member(MemberDecl::field("Id", ValueTy::I32).key());

    let msg = build_err(decls);
    assert_eq!(msg, "Type 'Receipt' doesn't implement field 'Document.Title'");

    let mut decls = documents(ValueTy::I32);
    decls[1] = TypeDecl::entity("Invoice")
        .implements("Document")
        .hierarchy_root()
        .member(MemberDecl::field("Id", ValueTy::I32).key())
        .member(MemberDecl::field("Title", ValueTy::I64));

    let msg = build_err(decls);
    assert_eq!(
        msg,
        "Field 'Invoice.Title' implementing 'Document.Title' must be of type 'string', not 'i64'"
    );
}
