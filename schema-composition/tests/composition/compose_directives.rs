use pretty_assertions::assert_eq;
use schema_composition::CompositionOptions;
use schema_composition::SingleCompositionError;
use schema_composition::directive::DirectiveTarget;

use super::ServiceDefinition;
use super::compose_services;
use super::parse_services;
use super::registry;

#[test]
fn non_repeatable_directive_from_two_sources_fails_once() {
    let failure = compose_services(&[
        ServiceDefinition {
            name: "a",
            type_defs: r#"
                type Query { product: Product }
                type Product @cacheControl(maxAge: 10) { id: ID! }
            "#,
        },
        ServiceDefinition {
            name: "b",
            type_defs: "type Product @cacheControl(maxAge: 20) { id: ID! }",
        },
    ])
    .unwrap_err();

    assert_eq!(failure.codes(), ["DUPLICATE_ATTACHMENT"]);
    let diagnostic = &failure.diagnostics[0];
    assert_eq!(
        diagnostic.error.to_string(),
        SingleCompositionError::DuplicateAttachment {
            name: apollo_compiler::name!("cacheControl"),
            coordinate: "Product".to_string(),
        }
        .to_string()
    );
    assert_eq!(
        diagnostic
            .locations
            .iter()
            .map(|location| location.source.as_str())
            .collect::<Vec<_>>(),
        ["a", "b"]
    );
}

#[test]
fn shared_field_with_the_same_directive_from_two_sources_fails_once() {
    let failure = compose_services(&[
        ServiceDefinition {
            name: "a",
            type_defs: r#"
                type Query { product: Product }
                type Product { id: ID! @cacheControl(maxAge: 10) }
            "#,
        },
        ServiceDefinition {
            name: "b",
            type_defs: "type Product { id: ID! @cacheControl(maxAge: 10) }",
        },
    ])
    .unwrap_err();

    assert_eq!(failure.codes(), ["DUPLICATE_ATTACHMENT"]);
    let diagnostic = &failure.diagnostics[0];
    assert_eq!(
        diagnostic.error.to_string(),
        "Directive \"@cacheControl\" is not repeatable but is applied more than once to Product.id"
    );
    assert_eq!(
        diagnostic
            .locations
            .iter()
            .map(|location| location.source.as_str())
            .collect::<Vec<_>>(),
        ["a", "b"]
    );
}

#[test]
fn shared_field_keeps_repeatable_directives_of_every_source() {
    let directive = "directive @tag(name: String!) repeatable on FIELD_DEFINITION";
    let a = format!("{directive} type Query {{ p: Product }} type Product {{ id: ID! @tag(name: \"x\") }}");
    let b = format!("{directive} type Product {{ id: ID! @tag(name: \"x\") }}");
    let (schema, _) = compose_services(&[
        ServiceDefinition {
            name: "a",
            type_defs: &a,
        },
        ServiceDefinition {
            name: "b",
            type_defs: &b,
        },
    ])
    .unwrap();
    let product = schema.get_object("Product").unwrap();
    assert_eq!(product.fields["id"].directives.len(), 2);
    assert_eq!(schema.field_origins("Product", "id").len(), 2);
}

#[test]
fn directives_declared_by_sources_are_registered_per_composition() {
    let services = [
        ServiceDefinition {
            name: "a",
            type_defs: r#"
                directive @tag(name: String!) repeatable on FIELD_DEFINITION | OBJECT
                type Query @tag(name: "root") { a: Int @tag(name: "x") @tag(name: "y") }
            "#,
        },
        ServiceDefinition {
            name: "b",
            type_defs: r#"
                directive @tag(name: String!) repeatable on FIELD_DEFINITION | OBJECT
                type Query { b: Int @tag(name: "z") }
            "#,
        },
    ];
    let caller_registry = registry();
    let (schema, _) = schema_composition::compose(
        &parse_services(&services),
        &caller_registry,
        &CompositionOptions::default(),
    )
    .unwrap();

    let tag = schema.get_directive("tag").unwrap();
    assert!(tag.repeatable);
    assert!(tag.allows(DirectiveTarget::Object));
    assert!(!caller_registry.contains("tag"));

    let query = schema.get_object("Query").unwrap();
    assert_eq!(query.fields["a"].directives.len(), 2);
    assert_eq!(
        query.directives[0].to_string(),
        r#"@tag(name: "root")"#
    );
}

#[test]
fn conflicting_directive_declarations_fail() {
    let failure = compose_services(&[
        ServiceDefinition {
            name: "a",
            type_defs: "directive @tag(name: String!) on OBJECT type Query { a: Int }",
        },
        ServiceDefinition {
            name: "b",
            type_defs: "directive @tag(name: Int) on OBJECT type Query { b: Int }",
        },
    ])
    .unwrap_err();
    assert_eq!(failure.codes(), ["CONFLICTING_DEFINITION"]);
}

#[test]
fn directive_arguments_are_bound() {
    let failure = compose_services(&[ServiceDefinition {
        name: "a",
        type_defs: r#"
            type Query {
              a: Int @cacheControl(maxAge: "soon")
              b: Int @cacheControl(scope: EVERYONE)
              c: Int @cacheControl(ttl: 5)
            }
            scalar Url @specifiedBy
        "#,
    }])
    .unwrap_err();
    assert_eq!(
        failure.codes(),
        [
            "TYPE_MISMATCH",
            "TYPE_MISMATCH",
            "UNKNOWN_ARGUMENT",
            "MISSING_REQUIRED_ARGUMENT"
        ]
    );
}

#[test]
fn unknown_directives_can_be_dropped() {
    let services = [ServiceDefinition {
        name: "a",
        type_defs: "type Query @key(fields: \"id\") { id: ID! }",
    }];
    let failure = compose_services(&services).unwrap_err();
    assert_eq!(failure.codes(), ["UNKNOWN_DIRECTIVE"]);

    let options = CompositionOptions {
        ignore_unknown_directives: true,
        ..Default::default()
    };
    let (schema, hints) =
        schema_composition::compose(&parse_services(&services), &registry(), &options).unwrap();
    assert!(schema.get_object("Query").unwrap().directives.is_empty());
    assert_eq!(hints[0].code.code(), "IGNORED_UNKNOWN_DIRECTIVE");
}
