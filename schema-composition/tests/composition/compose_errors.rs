use pretty_assertions::assert_eq;
use schema_composition::supergraph::Supergraph;

use super::ServiceDefinition;
use super::compose_services;
use super::parse_services;
use super::registry;

#[test]
fn every_merge_error_is_reported_in_one_attempt() {
    let services = [
        ServiceDefinition {
            name: "a",
            type_defs: r#"
                type Query { c: Color p: Product }
                enum Color { RED GREEN }
                type Product @cacheControl(maxAge: 1) { id: ID! }
            "#,
        },
        ServiceDefinition {
            name: "b",
            type_defs: r#"
                enum Color { RED BLUE }
                type Product @cacheControl(maxAge: 2) { id: ID! }
                union Thing = Product
            "#,
        },
        ServiceDefinition {
            name: "c",
            type_defs: "scalar Thing",
        },
    ];
    let failure = compose_services(&services).unwrap_err();
    assert_eq!(
        failure.codes(),
        [
            "CONFLICTING_DEFINITION",
            "DUPLICATE_ATTACHMENT",
            "TYPE_KIND_MISMATCH"
        ]
    );
    insta::assert_snapshot!(failure.to_string(), @r###"
    composition failed with 3 errors:
    - [CONFLICTING_DEFINITION] Enum "Color" is defined incompatibly across sources: source "a" declares it differently from "b" at [a:3:17, b:2:17]
    - [DUPLICATE_ATTACHMENT] Directive "@cacheControl" is not repeatable but is applied more than once to Product at [a:4:30, b:3:30]
    - [TYPE_KIND_MISMATCH] Type "Thing" is declared with different kinds across sources: Union in "b", Scalar in "c" at [b:4:17, c:1:1]
    "###);
}

#[test]
fn merge_errors_stop_before_resolution() {
    let failure = compose_services(&[
        ServiceDefinition {
            name: "a",
            type_defs: "type Query { a: Missing } enum E { A }",
        },
        ServiceDefinition {
            name: "b",
            type_defs: "enum E { B }",
        },
    ])
    .unwrap_err();
    assert_eq!(failure.codes(), ["CONFLICTING_DEFINITION"]);
}

#[test]
fn unresolved_references_never_reach_ready() {
    let sources = parse_services(&[
        ServiceDefinition {
            name: "a",
            type_defs: "type Query { a: Author }",
        },
        ServiceDefinition {
            name: "b",
            type_defs: "type Book { author: Author title: Title }",
        },
    ]);
    let merged = Supergraph::merge(&sources, &registry(), &Default::default()).unwrap();
    let failure = merged.resolve().unwrap_err();
    assert_eq!(
        failure
            .diagnostics
            .iter()
            .map(|diagnostic| diagnostic.to_string())
            .collect::<Vec<_>>(),
        [
            "[UNRESOLVED_TYPE_REFERENCE] Type \"Author\" referenced by field \"Query.a\" is not defined at [a:1:14]",
            "[UNRESOLVED_TYPE_REFERENCE] Type \"Author\" referenced by field \"Book.author\" is not defined at [b:1:13]",
            "[UNRESOLVED_TYPE_REFERENCE] Type \"Title\" referenced by field \"Book.title\" is not defined at [b:1:28]",
        ]
    );
}

#[test]
fn references_of_the_wrong_kind_fail() {
    let failure = compose_services(&[
        ServiceDefinition {
            name: "a",
            type_defs: "type Query { search(filter: Filter): Int }",
        },
        ServiceDefinition {
            name: "b",
            type_defs: "type Filter { term: String } union Hit = Named interface Named { name: String }",
        },
    ])
    .unwrap_err();
    assert_eq!(failure.codes(), ["KIND_MISMATCH", "KIND_MISMATCH"]);
    assert_eq!(
        failure.diagnostics[0].error.to_string(),
        "Type \"Filter\" is Object, but argument \"Query.search(filter:)\" expects an input type"
    );
    assert_eq!(
        failure.diagnostics[1].error.to_string(),
        "Type \"Named\" is Interface, but union \"Hit\" expects an object type"
    );
}

#[test]
fn rejects_invalid_source_names() {
    let failure = compose_services(&[ServiceDefinition {
        name: "product-service",
        type_defs: "type Query { a: Int }",
    }])
    .unwrap_err();
    assert_eq!(failure.codes(), ["INVALID_SOURCE_NAME"]);
}

#[test]
fn renamed_roots_are_merged_under_their_default_name() {
    let (schema, _) = compose_services(&[
        ServiceDefinition {
            name: "a",
            type_defs: "schema { query: RootQuery } type RootQuery { a: Int self: RootQuery }",
        },
        ServiceDefinition {
            name: "b",
            type_defs: "type Query { b: Int }",
        },
    ])
    .unwrap();
    let query = schema.get_object("Query").unwrap();
    assert_eq!(
        query.fields.keys().map(|name| name.as_str()).collect::<Vec<_>>(),
        ["a", "self", "b"]
    );
    assert_eq!(query.fields["self"].ty.to_string(), "Query");
    assert!(schema.try_get_type("RootQuery").is_none());
}
