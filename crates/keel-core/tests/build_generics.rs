use keel_core::schema::decl::{MemberDecl, Registry, TypeDecl, TypeRef};
use keel_core::schema::def::{DomainDef, FieldDef};
use keel_core::schema::{AutoGenerics, Builder, Module};
use keel_core::{DomainModel, Result, ValueTy};
use pretty_assertions::assert_eq;
use std_util::prelude::*;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn decls() -> Vec<TypeDecl> {
    vec![
        TypeDecl::entity("Audit")
            .generic_param("T", Some("Customer"))
            .hierarchy_root()
            .member(MemberDecl::field("Id", ValueTy::I64).key())
            .member(MemberDecl::field("Target", TypeRef::param("T"))),
        TypeDecl::entity("Customer")
            .hierarchy_root()
            .member(MemberDecl::field("Id", ValueTy::I32).key()),
        TypeDecl::entity("Order")
            .hierarchy_root()
            .member(MemberDecl::field("Id", ValueTy::I32).key()),
        TypeDecl::entity("User")
            .hierarchy_root()
            .member(MemberDecl::field("Id", ValueTy::I32).key())
            .member(MemberDecl::field(
                "Log",
                TypeRef::generic("Audit", [TypeRef::named("Customer")]),
            )),
    ]
}

fn build_with(builder: &Builder) -> Result<DomainModel> {
    let registry: Registry = decls().into_iter().collect();
    builder.build(&registry)
}

#[test]
fn used_closures_are_synthesized() {
    let model = assert_ok!(build_with(&Builder::new()));

    assert!(model.get("Audit").is_none());

    let audit = model.get("Audit<Customer>").unwrap();
    assert_eq!(audit.mapping_name, "Audit-Customer");
    assert_eq!(audit.generic_template.as_deref(), Some("Audit"));
    assert!(model.hierarchy_of("Audit<Customer>").is_some());

    let target = audit.field("Target").unwrap();
    assert!(target.is_reference());
    assert_eq!(model.type_info(target.target().unwrap()).name, "Customer");
    assert_eq!(target.columns, ["Target.Id"]);

    assert_eq!(model.get("User").unwrap().field("Log").unwrap().columns, ["Log.Id"]);
}

struct AuditOrders;

impl Module for AuditOrders {
    fn on_auto_generics_building(&self, generics: &mut AutoGenerics) {
        generics.add("Audit", [TypeRef::named("Order")]);
    }
}

#[test]
fn closures_violating_constraints_are_skipped() {
    let mut builder = Builder::new();
    builder.module(AuditOrders);

    let model = assert_ok!(build_with(&builder));
    assert!(model.get("Audit<Customer>").is_some());
    assert!(model.get("Audit<Order>").is_none());
}

struct AuditVip;

impl Module for AuditVip {
    fn on_auto_generics_building(&self, generics: &mut AutoGenerics) {
        assert!(generics.contains("Audit", &[TypeRef::named("Customer")]));
        generics.add("Audit", [TypeRef::named("VipCustomer")]);
    }
}

#[test]
fn modules_can_add_closures() {
    let mut decls = decls();
    decls.push(TypeDecl::entity("VipCustomer").base("Customer"));
    let registry: Registry = decls.into_iter().collect();

    let model = assert_ok!(Builder::new().module(AuditVip).build(&registry));

    let audit = model.get("Audit<VipCustomer>").unwrap();
    assert_eq!(audit.mapping_name, "Audit-VipCustomer");
}

struct NoAudits;

impl Module for NoAudits {
    fn on_auto_generics_building(&self, generics: &mut AutoGenerics) {
        generics.retain(|closure| closure.template != "Audit");
    }
}

#[test]
fn removed_closures_are_not_built() {
    let mut builder = Builder::new();
    builder.module(NoAudits);

    let err = assert_err!(build_with(&builder));
    assert!(err.is_domain_builder());
    assert_eq!(
        err.to_string(),
        "Field 'User.Log' refers to unknown type 'Audit<Customer>'"
    );
}

#[derive(Default)]
struct Stamp {
    calls: AtomicUsize,
}

impl Module for Stamp {
    fn on_definitions_built(&self, domain: &mut DomainDef) {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let names: Vec<String> = domain
            .types()
            .filter(|ty| ty.hierarchy_root.is_some())
            .map(|ty| ty.name.clone())
            .collect();

        for name in names {
            if let Some(ty) = domain.get_mut(&name) {
                ty.add_field(FieldDef::new("Stamp", ValueTy::DateTime));
            }
        }
    }
}

#[test]
fn definitions_hook_sees_closures_and_runs_once() {
    let stamp = Arc::new(Stamp::default());

    let mut builder = Builder::new();
    builder.shared_module(stamp.clone());

    let model = assert_ok!(build_with(&builder));
    assert_eq!(stamp.calls.load(Ordering::SeqCst), 1);

    for name in ["Customer", "Order", "User", "Audit<Customer>"] {
        let stamp = model.get(name).unwrap().field("Stamp").unwrap();
        assert!(stamp.is_primitive(), "{name}");
    }
}

#[test]
fn open_template_used_as_field_type() {
    let mut decls = decls();
    decls.push(
        TypeDecl::entity("Report")
            .hierarchy_root()
            .member(MemberDecl::field("Id", ValueTy::I32).key())
            .member(MemberDecl::field("Source", TypeRef::named("Audit"))),
    );
    let registry: Registry = decls.into_iter().collect();

    let err = assert_err!(Builder::new().build(&registry));
    assert_eq!(
        err.to_string(),
        "Field 'Report.Source' can't be of type 'Audit': type is an open generic template"
    );
}
