//! The runtime schema: a closed, validated type graph with lookups by name, kind and abstract type.
//!
//! A [`Schema`] only exists once every type reference resolved; see [`Schema::build`].

use std::fmt;
use std::fmt::Display;

use apollo_compiler::Name;
use indexmap::IndexMap;
use itertools::Itertools;

use crate::directive::DEPRECATED_DIRECTIVE_NAME;
use crate::directive::DirectiveRegistry;
use crate::directive::DirectiveSpecification;
use crate::directive::SPECIFIED_BY_DIRECTIVE_NAME;
use crate::display_helpers::DisplayArguments;
use crate::display_helpers::DisplayDirectives;
use crate::display_helpers::DisplayInputValue;
use crate::display_helpers::State;
use crate::display_helpers::write_block;
use crate::display_helpers::write_description;
use crate::error::SingleCompositionError;
use crate::internal_error;
use crate::merger::FieldCoordinate;
use crate::merger::FieldOrigin;
use crate::merger::FieldRename;
use crate::schema::types::EnumType;
use crate::schema::types::ExtendedType;
use crate::schema::types::Field;
use crate::schema::types::InputObjectType;
use crate::schema::types::InputValue;
use crate::schema::types::InterfaceType;
use crate::schema::types::ObjectType;
use crate::schema::types::ScalarType;
use crate::schema::types::TypeId;
use crate::schema::types::UnionType;
use crate::source::definition::OperationKind;
use crate::source::definition::TypeKind;

mod builder;
pub mod types;

#[derive(Debug, Clone)]
pub struct Schema {
    types: Vec<ExtendedType>,
    ids: IndexMap<Name, TypeId>,
    root_operations: IndexMap<OperationKind, TypeId>,
    directives: DirectiveRegistry,
    possible_types: IndexMap<TypeId, Vec<TypeId>>,
    field_origins: IndexMap<FieldCoordinate, Vec<FieldOrigin>>,
    renames: Vec<FieldRename>,
}

impl Schema {
    /// Every type, built-in scalars included, in merged order.
    pub fn types(&self) -> impl Iterator<Item = &ExtendedType> {
        self.types.iter()
    }

    pub fn try_get_type(&self, name: &str) -> Option<&ExtendedType> {
        let id = self.ids.get(name)?;
        self.types.get(id.0)
    }

    /// Looks up a type that must be of `kind`.
    pub fn get_type(
        &self,
        name: &str,
        kind: TypeKind,
    ) -> Result<&ExtendedType, SingleCompositionError> {
        let ty = self
            .try_get_type(name)
            .ok_or_else(|| SingleCompositionError::TypeNotFound {
                name: name.to_string(),
            })?;
        if ty.kind() != kind {
            return Err(SingleCompositionError::KindMismatch {
                name: ty.name().clone(),
                expected: format!("a type of kind {kind}"),
                actual: ty.kind(),
                referencer: "the lookup".to_string(),
            });
        }
        Ok(ty)
    }

    pub fn type_id(&self, name: &str) -> Option<TypeId> {
        self.ids.get(name).copied()
    }

    pub fn type_by_id(&self, id: TypeId) -> Option<&ExtendedType> {
        self.types.get(id.0)
    }

    pub fn get_object(&self, name: &str) -> Result<&ObjectType, SingleCompositionError> {
        self.get_type(name, TypeKind::Object)?
            .as_object()
            .ok_or_else(|| internal_error!("type \"{name}\" is not stored as an object"))
    }

    pub fn get_interface(&self, name: &str) -> Result<&InterfaceType, SingleCompositionError> {
        self.get_type(name, TypeKind::Interface)?
            .as_interface()
            .ok_or_else(|| internal_error!("type \"{name}\" is not stored as an interface"))
    }

    pub fn get_union(&self, name: &str) -> Result<&UnionType, SingleCompositionError> {
        self.get_type(name, TypeKind::Union)?
            .as_union()
            .ok_or_else(|| internal_error!("type \"{name}\" is not stored as a union"))
    }

    pub fn get_scalar(&self, name: &str) -> Result<&ScalarType, SingleCompositionError> {
        self.get_type(name, TypeKind::Scalar)?
            .as_scalar()
            .ok_or_else(|| internal_error!("type \"{name}\" is not stored as a scalar"))
    }

    pub fn get_enum(&self, name: &str) -> Result<&EnumType, SingleCompositionError> {
        self.get_type(name, TypeKind::Enum)?
            .as_enum()
            .ok_or_else(|| internal_error!("type \"{name}\" is not stored as an enum"))
    }

    pub fn get_input_object(
        &self,
        name: &str,
    ) -> Result<&InputObjectType, SingleCompositionError> {
        self.get_type(name, TypeKind::InputObject)?
            .as_input_object()
            .ok_or_else(|| internal_error!("type \"{name}\" is not stored as an input object"))
    }

    pub fn get_directive(
        &self,
        name: &str,
    ) -> Result<&DirectiveSpecification, SingleCompositionError> {
        self.try_get_directive(name)
            .ok_or_else(|| SingleCompositionError::DirectiveNotFound {
                name: name.to_string(),
            })
    }

    pub fn try_get_directive(&self, name: &str) -> Option<&DirectiveSpecification> {
        self.directives.get(name)
    }

    pub fn directives(&self) -> &DirectiveRegistry {
        &self.directives
    }

    /// The object types implementing an interface or belonging to a union.
    ///
    /// Empty for an abstract type nothing implements, and for any name that is not an abstract
    /// type of this schema.
    pub fn possible_types(&self, abstract_type: &str) -> Vec<&ObjectType> {
        self.ids
            .get(abstract_type)
            .and_then(|id| self.possible_types.get(id))
            .into_iter()
            .flatten()
            .filter_map(|id| self.type_by_id(*id)?.as_object())
            .collect()
    }

    pub fn is_possible_type(&self, abstract_type: &str, object_type: &str) -> bool {
        let (Some(abstract_id), Some(object_id)) =
            (self.ids.get(abstract_type), self.ids.get(object_type))
        else {
            return false;
        };
        self.possible_types
            .get(abstract_id)
            .is_some_and(|objects| objects.contains(object_id))
    }

    pub fn root_operation(&self, operation: OperationKind) -> Option<&ObjectType> {
        let id = self.root_operations.get(&operation)?;
        self.type_by_id(*id)?.as_object()
    }

    pub fn root_operations(&self) -> impl Iterator<Item = (OperationKind, &ObjectType)> {
        self.root_operations.iter().filter_map(|(operation, id)| {
            Some((*operation, self.type_by_id(*id)?.as_object()?))
        })
    }

    /// Where a field of the schema comes from. Shared fields have one origin per source.
    pub fn field_origins(&self, type_name: &str, field_name: &str) -> &[FieldOrigin] {
        FieldCoordinate::from_names(type_name, field_name)
            .and_then(|coordinate| self.field_origins.get(&coordinate))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn renames(&self) -> &[FieldRename] {
        &self.renames
    }

    fn type_name(&self, id: TypeId) -> Option<&Name> {
        self.type_by_id(id).map(ExtendedType::name)
    }
}

fn is_built_in_directive(name: &Name) -> bool {
    *name == DEPRECATED_DIRECTIVE_NAME || *name == SPECIFIED_BY_DIRECTIVE_NAME
}

impl Display for Schema {
    /// Prints the schema as SDL, leaving out built-in scalars and directives.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut state = State::new(f);
        let mut first = true;
        for directive in self
            .directives
            .iter()
            .filter(|directive| !is_built_in_directive(&directive.name))
        {
            start_definition(&mut state, &mut first)?;
            write_directive_definition(&mut state, directive)?;
        }
        for ty in self.types.iter().filter(|ty| !ty.is_built_in()) {
            start_definition(&mut state, &mut first)?;
            self.write_type(&mut state, ty)?;
        }
        Ok(())
    }
}

fn start_definition(state: &mut State<'_, '_>, first: &mut bool) -> fmt::Result {
    if !std::mem::take(first) {
        state.write("\n")?;
    }
    Ok(())
}

fn write_directive_definition(
    state: &mut State<'_, '_>,
    directive: &DirectiveSpecification,
) -> fmt::Result {
    write_description(state, directive.description.as_deref())?;
    let arguments = directive
        .arguments
        .iter()
        .map(|argument| DisplayInputValue {
            description: argument.description.as_deref(),
            name: &argument.name,
            ty: &argument.ty,
            default_value: argument.default_value.as_deref(),
            directives: &[],
        })
        .collect();
    write!(
        state,
        "directive @{}{}",
        directive.name,
        DisplayArguments(arguments)
    )?;
    if directive.repeatable {
        state.write(" repeatable")?;
    }
    writeln!(state, " on {}", directive.locations.iter().join(" | "))
}

fn display_input_value(value: &InputValue) -> DisplayInputValue<'_> {
    DisplayInputValue {
        description: value.description.as_deref(),
        name: &value.name,
        ty: &value.ty,
        default_value: value.default_value.as_deref(),
        directives: &value.directives,
    }
}

impl Schema {
    fn write_type(&self, state: &mut State<'_, '_>, ty: &ExtendedType) -> fmt::Result {
        write_description(state, ty.description())?;
        match ty {
            ExtendedType::Object(object) => {
                write!(state, "type {}", object.name)?;
                self.write_implements(state, &object.implements_interfaces)?;
                state.write(DisplayDirectives(&object.directives))?;
                write_block(state, object.fields.values(), write_field)?;
            }
            ExtendedType::Interface(interface) => {
                write!(state, "interface {}", interface.name)?;
                self.write_implements(state, &interface.implements_interfaces)?;
                state.write(DisplayDirectives(&interface.directives))?;
                write_block(state, interface.fields.values(), write_field)?;
            }
            ExtendedType::Union(union) => {
                write!(
                    state,
                    "union {}{}",
                    union.name,
                    DisplayDirectives(&union.directives)
                )?;
                if !union.members.is_empty() {
                    write!(
                        state,
                        " = {}",
                        union
                            .members
                            .iter()
                            .filter_map(|member| self.type_name(*member))
                            .join(" | ")
                    )?;
                }
            }
            ExtendedType::Scalar(scalar) => {
                write!(
                    state,
                    "scalar {}{}",
                    scalar.name,
                    DisplayDirectives(&scalar.directives)
                )?;
            }
            ExtendedType::Enum(enum_type) => {
                write!(
                    state,
                    "enum {}{}",
                    enum_type.name,
                    DisplayDirectives(&enum_type.directives)
                )?;
                write_block(state, enum_type.values.values(), |state, value| {
                    write_description(state, value.description.as_deref())?;
                    write!(state, "{}{}", value.value, DisplayDirectives(&value.directives))
                })?;
            }
            ExtendedType::InputObject(input_object) => {
                write!(
                    state,
                    "input {}{}",
                    input_object.name,
                    DisplayDirectives(&input_object.directives)
                )?;
                write_block(state, input_object.fields.values(), |state, field| {
                    write_description(state, field.description.as_deref())?;
                    let field = DisplayInputValue {
                        description: None,
                        ..display_input_value(field)
                    };
                    state.write(field)
                })?;
            }
        }
        state.write("\n")
    }

    fn write_implements(&self, state: &mut State<'_, '_>, interfaces: &[TypeId]) -> fmt::Result {
        if interfaces.is_empty() {
            return Ok(());
        }
        write!(
            state,
            " implements {}",
            interfaces
                .iter()
                .filter_map(|interface| self.type_name(*interface))
                .join(" & ")
        )
    }
}

fn write_field(state: &mut State<'_, '_>, field: &Field) -> fmt::Result {
    write_description(state, field.description.as_deref())?;
    let arguments = field.arguments.values().map(display_input_value).collect();
    write!(
        state,
        "{}{}: {}{}",
        field.name,
        DisplayArguments(arguments),
        field.ty,
        DisplayDirectives(&field.directives)
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::Schema;
    use crate::directive::DirectiveRegistry;
    use crate::directive::cache_control::cache_control_directive;
    use crate::error::CompositionFailure;
    use crate::error::SingleCompositionError;
    use crate::merger::merge_sources;
    use crate::options::CompositionOptions;
    use crate::source::SourceDocument;
    use crate::source::definition::OperationKind;
    use crate::source::definition::TypeKind;

    fn build(sdls: &[(&str, &str)], options: &CompositionOptions) -> Result<Schema, CompositionFailure> {
        let sources: Vec<_> = sdls
            .iter()
            .map(|(name, sdl)| SourceDocument::parse(*name, sdl).unwrap())
            .collect();
        let mut registry = DirectiveRegistry::new();
        registry.register(cache_control_directive()).unwrap();
        let merged = merge_sources(&sources, &registry, options)?;
        Schema::build(merged.document, options)
    }

    fn schema(sdl: &str) -> Schema {
        build(&[("a", sdl)], &CompositionOptions::default()).unwrap()
    }

    #[test]
    fn resolves_mutually_recursive_types() {
        let schema = schema("type Query { a: A } type A { b: B } type B { a: A! }");
        let a = schema.get_object("A").unwrap();
        let b = schema.type_by_id(a.fields["b"].type_id).unwrap();
        assert_eq!(b.name(), "B");
        let back = b.fields().unwrap()["a"].type_id;
        assert_eq!(schema.type_by_id(back).unwrap().name(), "A");
    }

    #[test]
    fn adds_built_in_scalars_and_supporting_types() {
        let schema = schema("type Query { a: Int }");
        for name in ["Int", "Float", "String", "Boolean", "ID"] {
            assert!(schema.get_scalar(name).unwrap().built_in);
        }
        let scope = schema.get_enum("CacheControlScope").unwrap();
        assert_eq!(
            scope.values.keys().map(|value| value.as_str()).collect::<Vec<_>>(),
            ["PUBLIC", "PRIVATE"]
        );
    }

    #[test]
    fn unresolved_references_fail_the_build() {
        let failure = build(
            &[("a", "type Query { a: Missing b(x: AlsoMissing): Int }")],
            &CompositionOptions::default(),
        )
        .unwrap_err();
        assert_eq!(
            failure.codes(),
            ["UNRESOLVED_TYPE_REFERENCE", "UNRESOLVED_TYPE_REFERENCE"]
        );
        assert_eq!(
            failure.diagnostics[0].error.to_string(),
            "Type \"Missing\" referenced by field \"Query.a\" is not defined"
        );
        assert_eq!(
            failure.diagnostics[1].error.to_string(),
            "Type \"AlsoMissing\" referenced by argument \"Query.b(x:)\" is not defined"
        );
    }

    #[test]
    fn references_must_name_the_right_kind() {
        let failure = build(
            &[(
                "a",
                r#"
                type Query { a: In, b(o: Query): Int, u: U }
                input In { x: Int }
                interface I { x: Int }
                type T implements Query { x: Int }
                union U = I
                "#,
            )],
            &CompositionOptions::default(),
        )
        .unwrap_err();
        assert_eq!(
            failure.codes(),
            ["KIND_MISMATCH", "KIND_MISMATCH", "KIND_MISMATCH", "KIND_MISMATCH"]
        );
        assert_eq!(
            failure.diagnostics[0].error.to_string(),
            "Type \"In\" is InputObject, but field \"Query.a\" expects an output type"
        );
    }

    #[test]
    fn requires_a_query_root_unless_disabled() {
        let sdl = [("a", "type Thing { a: Int }")];
        let failure = build(&sdl, &CompositionOptions::default()).unwrap_err();
        assert_eq!(failure.codes(), ["MISSING_QUERY_ROOT"]);

        let options = CompositionOptions {
            require_query_root: false,
            ..Default::default()
        };
        let schema = build(&sdl, &options).unwrap();
        assert!(schema.root_operation(OperationKind::Query).is_none());
    }

    #[test]
    fn computes_possible_types() {
        let schema = schema(
            r#"
            type Query { n: Node }
            interface Node { id: ID! }
            interface Orphan { id: ID! }
            type User implements Node { id: ID! }
            type Post implements Node { id: ID! }
            union Content = Post | User
            "#,
        );
        let names = |abstract_type: &str| {
            schema
                .possible_types(abstract_type)
                .into_iter()
                .map(|object| object.name.as_str())
                .collect::<Vec<_>>()
        };
        assert_eq!(names("Node"), ["User", "Post"]);
        assert_eq!(names("Content"), ["User", "Post"]);
        assert!(names("Orphan").is_empty());
        assert!(names("Nothing").is_empty());
        assert!(names("User").is_empty());
        assert!(schema.is_possible_type("Node", "Post"));
        assert!(!schema.is_possible_type("Orphan", "Post"));
    }

    #[test]
    fn lookups_check_existence_and_kind() {
        let schema = schema("type Query { a: Int }");
        assert_eq!(
            schema.get_type("Nope", TypeKind::Object).unwrap_err(),
            SingleCompositionError::TypeNotFound {
                name: "Nope".to_string()
            }
        );
        let mismatch = schema.get_type("Query", TypeKind::Interface).unwrap_err();
        assert_eq!(mismatch.code(), "KIND_MISMATCH");
        assert_eq!(
            mismatch.to_string(),
            "Type \"Query\" is Object, but the lookup expects a type of kind Interface"
        );
        assert!(schema.get_directive("deprecated").is_ok());
        assert_eq!(schema.get_directive("key").unwrap_err().code(), "DIRECTIVE_NOT_FOUND");
    }

    #[test]
    fn prints_sdl() {
        let schema = schema(
            r#"
            "Entry point"
            type Query { thing(id: ID!): Thing @deprecated }
            interface Node { id: ID! }
            type Thing implements Node @cacheControl(maxAge: 30) {
              id: ID!
              tags: [String!]!
            }
            "#,
        );
        assert_eq!(
            schema.to_string(),
            r#""Caching hints for the annotated type or field."
directive @cacheControl(maxAge: Int, scope: CacheControlScope, inheritMaxAge: Boolean) on OBJECT | FIELD_DEFINITION | INTERFACE | UNION

"Entry point"
type Query {
  thing(id: ID!): Thing @deprecated(reason: "No longer supported")
}

interface Node {
  id: ID!
}

type Thing implements Node @cacheControl(maxAge: 30) {
  id: ID!
  tags: [String!]!
}

enum CacheControlScope {
  PUBLIC
  PRIVATE
}
"#
        );
    }
}
