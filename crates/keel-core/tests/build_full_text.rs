use keel_core::schema::decl::{MemberDecl, Registry, TypeDecl, TypeRef};
use keel_core::schema::def::DomainDef;
use keel_core::schema::{Builder, Module};
use keel_core::{DomainModel, Result, ValueTy};
use pretty_assertions::assert_eq;
use std_util::prelude::*;

fn decls() -> Vec<TypeDecl> {
    vec![
        TypeDecl::structure("Summary").member(MemberDecl::field("Text", ValueTy::String)),
        TypeDecl::structure("Details")
            .member(MemberDecl::field("Title", ValueTy::String).full_text("German"))
            .member(MemberDecl::field("Body", ValueTy::String))
            .member(MemberDecl::field("Pages", ValueTy::I32)),
        TypeDecl::entity("Article")
            .hierarchy_root()
            .member(MemberDecl::field("Id", ValueTy::I32).key())
            .member(MemberDecl::field("Summary", TypeRef::named("Summary")).full_text("English"))
            .member(MemberDecl::field("Details", TypeRef::named("Details")).full_text("French"))
            .member(MemberDecl::field("Content", ValueTy::String).full_text("English"))
            .member(MemberDecl::field("Author", ValueTy::String)),
    ]
}

fn build(decls: impl IntoIterator<Item = TypeDecl>) -> Result<DomainModel> {
    let registry: Registry = decls.into_iter().collect();
    Builder::new().build(&registry)
}

fn full_text_columns(model: &DomainModel, root: &str) -> Vec<(String, String)> {
    model
        .get(root)
        .unwrap()
        .full_text_index
        .as_ref()
        .unwrap()
        .columns
        .iter()
        .map(|column| (column.column.clone(), column.language.clone()))
        .collect()
}

fn pairs(expected: &[(&str, &str)]) -> Vec<(String, String)> {
    expected
        .iter()
        .map(|(column, language)| (column.to_string(), language.to_string()))
        .collect()
}

#[test]
fn string_leaves_under_marked_fields_are_indexed() {
    let model = assert_ok!(build(decls()));
    let article = model.get("Article").unwrap();

    let index = article.full_text_index.as_ref().unwrap();
    assert_eq!(index.name, "FT_Article");

    assert_eq!(
        full_text_columns(&model, "Article"),
        pairs(&[
            ("Summary.Text", "English"),
            ("Details.Title", "German"),
            ("Details.Body", "French"),
            ("Content", "English"),
        ])
    );
}

#[test]
fn hierarchy_without_marked_fields_has_no_index() {
    let model = assert_ok!(build([TypeDecl::entity("Customer")
        .hierarchy_root()
        .member(MemberDecl::field("Id", ValueTy::I32).key())
        .member(MemberDecl::field("Name", ValueTy::String))]));

    assert!(model.get("Customer").unwrap().full_text_index.is_none());
}

#[test]
fn descendant_fields_join_the_root_index() {
    let mut decls = decls();
    decls.push(
        TypeDecl::entity("Review")
            .base("Article")
            .member(MemberDecl::field("Verdict", ValueTy::String).full_text("English")),
    );

    let model = assert_ok!(build(decls));

    let index = model.get("Article").unwrap().full_text_index.as_ref().unwrap();
    assert_eq!(index.columns.len(), 5);

    let verdict = index.columns.last().unwrap();
    assert_eq!(verdict.column, "Verdict");
    assert_eq!(model.type_info(verdict.declaring_type).name, "Review");

    assert!(model.get("Review").unwrap().full_text_index.is_none());
}

#[test]
fn reference_leaves_never_qualify() {
    let model = assert_ok!(build([
        TypeDecl::entity("Person")
            .hierarchy_root()
            .member(MemberDecl::field("Login", ValueTy::String).key()),
        TypeDecl::structure("Byline")
            .member(MemberDecl::field("Writer", TypeRef::named("Person")))
            .member(MemberDecl::field("Caption", ValueTy::String)),
        TypeDecl::entity("Post")
            .hierarchy_root()
            .member(MemberDecl::field("Id", ValueTy::I64).key())
            .member(MemberDecl::field("Byline", TypeRef::named("Byline")).full_text("English")),
    ]));

    assert_eq!(
        full_text_columns(&model, "Post"),
        pairs(&[("Byline.Caption", "English")])
    );
}

#[test]
fn non_string_fields_can_not_be_marked() {
    let err = assert_err!(build([TypeDecl::entity("Book")
        .hierarchy_root()
        .member(MemberDecl::field("Id", ValueTy::I32).key())
        .member(MemberDecl::field("Pages", ValueTy::I32).full_text("English"))]));

    assert!(err.is_domain_builder());
    assert_eq!(
        err.to_string(),
        "Field 'Book.Pages' can't be full-text indexed: type 'i32' is neither a string nor a structure"
    );
}

struct IndexAuthors;

impl Module for IndexAuthors {
    fn on_definitions_built(&self, domain: &mut DomainDef) {
        if let Some(author) = domain.get_mut("Article").and_then(|ty| ty.field_mut("Author")) {
            author.full_text = Some("English".to_string());
        }
    }
}

#[test]
fn modules_can_mark_fields() {
    let registry: Registry = decls().into_iter().collect();
    let model = assert_ok!(Builder::new().module(IndexAuthors).build(&registry));

    let columns = full_text_columns(&model, "Article");
    assert_eq!(columns.len(), 5);
    assert_eq!(columns[4], ("Author".to_string(), "English".to_string()));
}
