use apollo_compiler::name;
use pretty_assertions::assert_eq;
use rstest::rstest;
use schema_composition::CompositionOptions;
use schema_composition::merger::FieldOrigin;
use schema_composition::merger::merge_sources;
use schema_composition::source::definition::OperationKind;

use super::ServiceDefinition;
use super::compose_services;
use super::field_names;
use super::parse_services;
use super::registry;

const INVENTORY: ServiceDefinition<'static> = ServiceDefinition {
    name: "inventory",
    type_defs: r#"
        type Query {
          product(upc: String!): Product
        }

        type Product {
          upc: String!
          inStock: Boolean
        }
    "#,
};

const REVIEWS: ServiceDefinition<'static> = ServiceDefinition {
    name: "reviews",
    type_defs: r#"
        type Query {
          product(upc: String!): Product
          topReviews(first: Int = 5): [Review!]!
        }

        type Product {
          upc: String!
          reviews: [Review!]
        }

        type Review @cacheControl(maxAge: 60, scope: PUBLIC) {
          body: String
          product: Product
        }
    "#,
};

const ACCOUNTS: ServiceDefinition<'static> = ServiceDefinition {
    name: "accounts",
    type_defs: r#"
        type Query {
          me: User
        }

        type User {
          id: ID!
          name: String
        }

        type Review {
          body: String
          author: User
        }
    "#,
};

#[test]
fn disjoint_sources_merge_without_renames() {
    let sources = parse_services(&[
        ServiceDefinition {
            name: "a",
            type_defs: "type Query { a: Int } type A { x: Int }",
        },
        ServiceDefinition {
            name: "b",
            type_defs: "type B { y: String z: Int } enum E { V W }",
        },
    ]);
    let merged = merge_sources(&sources, &registry(), &CompositionOptions::default()).unwrap();

    let type_count: usize = sources.iter().map(|source| source.len()).sum();
    assert_eq!(merged.document.types().count(), type_count);
    let field_count = |types: Vec<Option<usize>>| types.into_iter().flatten().sum::<usize>();
    assert_eq!(
        field_count(
            merged
                .document
                .types()
                .map(|ty| ty.fields().map(|fields| fields.len()))
                .collect()
        ),
        field_count(
            sources
                .iter()
                .flat_map(|source| source.definitions())
                .map(|ty| ty.fields().map(|fields| fields.len()))
                .collect()
        )
    );
    assert!(merged.document.renames().is_empty());
    assert!(merged.hints.is_empty());
}

#[test]
fn root_field_collisions_are_renamed_with_provenance() {
    let (schema, hints) = compose_services(&[
        ServiceDefinition {
            name: "Schema_B",
            type_defs: "type Query { a: String }",
        },
        ServiceDefinition {
            name: "Schema_A",
            type_defs: "type Query { a: String b: Int }",
        },
    ])
    .unwrap();

    assert_eq!(field_names(&schema, "Query"), ["Schema_A_a", "Schema_B_a", "b"]);
    assert_eq!(
        schema.field_origins("Query", "Schema_B_a"),
        [FieldOrigin {
            source: "Schema_B".to_string(),
            field_name: name!("a"),
        }]
    );
    assert_eq!(
        schema.field_origins("Query", "b"),
        [FieldOrigin {
            source: "Schema_A".to_string(),
            field_name: name!("b"),
        }]
    );
    assert!(schema.field_origins("Query", "a").is_empty());

    let renames: Vec<String> = schema
        .renames()
        .iter()
        .map(|rename| {
            format!(
                "{} <- {}.{}",
                rename.coordinate, rename.origin.source, rename.origin.field_name
            )
        })
        .collect();
    assert_eq!(
        renames,
        ["Query.Schema_A_a <- Schema_A.a", "Query.Schema_B_a <- Schema_B.a"]
    );
    assert_eq!(
        hints.iter().map(|hint| hint.code.code()).collect::<Vec<_>>(),
        ["RENAMED_COLLIDING_FIELD"]
    );
}

#[rstest]
#[case::sorted(&[ACCOUNTS, INVENTORY, REVIEWS])]
#[case::reversed(&[REVIEWS, INVENTORY, ACCOUNTS])]
#[case::interleaved(&[INVENTORY, ACCOUNTS, REVIEWS])]
fn composition_is_independent_of_source_order(#[case] services: &[ServiceDefinition<'static>]) {
    let (schema, _) = compose_services(services).unwrap();
    assert_eq!(
        field_names(&schema, "Query"),
        ["me", "inventory_product", "reviews_product", "topReviews"]
    );
    assert_eq!(
        field_names(&schema, "Review"),
        ["body", "author", "product"]
    );

    let (expected, _) = compose_services(&[ACCOUNTS, INVENTORY, REVIEWS]).unwrap();
    assert_eq!(schema.to_string(), expected.to_string());
}

#[test]
fn possible_types_cover_every_implementer() {
    let (schema, _) = compose_services(&[
        ServiceDefinition {
            name: "a",
            type_defs: r#"
                type Query { node(id: ID!): Node search: [Result!]! }
                interface Node { id: ID! }
                interface Audited { updatedAt: String }
                type User implements Node { id: ID! }
                union Result = User
            "#,
        },
        ServiceDefinition {
            name: "b",
            type_defs: r#"
                interface Node { id: ID! }
                type Post implements Node { id: ID! }
                type Comment implements Node { id: ID! }
                union Result = Post
            "#,
        },
    ])
    .unwrap();

    for object in schema.types().filter_map(|ty| ty.as_object()) {
        for interface in &object.implements_interfaces {
            let interface = schema.type_by_id(*interface).unwrap().name();
            assert!(
                schema
                    .possible_types(interface)
                    .iter()
                    .any(|possible| possible.name == object.name),
                "{} should be a possible type of {interface}",
                object.name
            );
        }
    }
    let names = |abstract_type: &str| -> Vec<String> {
        schema
            .possible_types(abstract_type)
            .iter()
            .map(|object| object.name.to_string())
            .collect()
    };
    assert_eq!(names("Node"), ["User", "Post", "Comment"]);
    assert_eq!(names("Result"), ["User", "Post"]);
    assert_eq!(names("Audited"), Vec::<String>::new());
    assert_eq!(names("Unknown"), Vec::<String>::new());
}

#[test]
fn mutually_recursive_types_across_sources() {
    let (schema, _) = compose_services(&[
        ServiceDefinition {
            name: "a",
            type_defs: "type Query { author: Author } type Author { books: [Book!]! }",
        },
        ServiceDefinition {
            name: "b",
            type_defs: "type Book { author: Author! }",
        },
    ])
    .unwrap();
    let author = schema.get_object("Author").unwrap();
    let book = schema
        .type_by_id(author.fields["books"].type_id)
        .and_then(|ty| ty.as_object())
        .unwrap();
    assert_eq!(book.name, "Book");
    assert_eq!(book.fields["author"].ty.to_string(), "Author!");
    assert_eq!(
        schema.type_by_id(book.fields["author"].type_id).unwrap().name(),
        "Author"
    );
    assert_eq!(
        schema.root_operation(OperationKind::Query).unwrap().name,
        "Query"
    );
}

#[test]
fn prints_the_composed_schema() {
    let (schema, _) = compose_services(&[REVIEWS, INVENTORY]).unwrap();
    insta::assert_snapshot!(schema.to_string(), @r###"
    "Caching hints for the annotated type or field."
    directive @cacheControl(maxAge: Int, scope: CacheControlScope, inheritMaxAge: Boolean) on OBJECT | FIELD_DEFINITION | INTERFACE | UNION

    type Query {
      inventory_product(upc: String!): Product
      reviews_product(upc: String!): Product
      topReviews(first: Int = 5): [Review!]!
    }

    type Product {
      upc: String!
      inStock: Boolean
      reviews: [Review!]
    }

    type Review @cacheControl(maxAge: 60, scope: PUBLIC) {
      body: String
      product: Product
    }

    enum CacheControlScope {
      PUBLIC
      PRIVATE
    }
    "###);
}
