//! Directive definitions and the registry that validates their applications.
//!
//! A [`DirectiveRegistry`] is an explicit value handed to each composition. Composition clones it
//! and adds the directive definitions declared by the sources, so concurrent or repeated builds
//! never share mutable state.

use std::str::FromStr;

use apollo_compiler::Name;
use apollo_compiler::ast;
use apollo_compiler::ast::Value;
use apollo_compiler::name;
use apollo_compiler::ty;
use indexmap::IndexMap;

use crate::directive::coercion::ValueCoercion;
use crate::error::SingleCompositionError;
use crate::source::definition::AppliedDirective;
use crate::source::definition::TypeDefinition;

pub mod cache_control;
mod coercion;
pub mod specification;

pub use specification::ArgumentSpecification;
pub use specification::DirectiveSpecification;

pub const DEPRECATED_DIRECTIVE_NAME: Name = name!("deprecated");
pub const SPECIFIED_BY_DIRECTIVE_NAME: Name = name!("specifiedBy");
pub const DEFAULT_DEPRECATION_REASON: &str = "No longer supported";

/// The places in a GraphQL document a directive can be applied to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DirectiveTarget {
    Query,
    Mutation,
    Subscription,
    Field,
    FragmentDefinition,
    FragmentSpread,
    InlineFragment,
    VariableDefinition,
    Schema,
    Scalar,
    Object,
    FieldDefinition,
    ArgumentDefinition,
    Interface,
    Union,
    Enum,
    EnumValue,
    InputObject,
    InputFieldDefinition,
}

impl DirectiveTarget {
    pub fn from_ast(location: ast::DirectiveLocation) -> Option<Self> {
        Self::from_str(&location.to_string()).ok()
    }
}

#[derive(Debug, Clone)]
pub struct DirectiveRegistry {
    definitions: IndexMap<Name, DirectiveSpecification>,
    supporting_types: IndexMap<Name, TypeDefinition>,
}

impl Default for DirectiveRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectiveRegistry {
    /// A registry knowing the directives every GraphQL schema has: `@deprecated` and `@specifiedBy`.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for specification in [deprecated_directive(), specified_by_directive()] {
            registry
                .definitions
                .insert(specification.name.clone(), specification);
        }
        registry
    }

    pub fn empty() -> Self {
        Self {
            definitions: IndexMap::new(),
            supporting_types: IndexMap::new(),
        }
    }

    pub fn register(
        &mut self,
        specification: DirectiveSpecification,
    ) -> Result<(), SingleCompositionError> {
        if self.definitions.contains_key(&specification.name) {
            return Err(SingleCompositionError::DuplicateAnnotation {
                name: specification.name,
            });
        }
        for supporting_type in &specification.supporting_types {
            self.supporting_types
                .entry(supporting_type.name.clone())
                .or_insert_with(|| supporting_type.clone());
        }
        self.definitions
            .insert(specification.name.clone(), specification);
        Ok(())
    }

    /// Registers a definition declared by a source document.
    ///
    /// Several sources may declare the same directive: an identical redeclaration is accepted, a
    /// different one conflicts with the registered definition.
    pub(crate) fn register_declared(
        &mut self,
        specification: DirectiveSpecification,
        source_name: &str,
    ) -> Result<(), SingleCompositionError> {
        match self.definitions.get(&specification.name) {
            Some(existing) if existing.same_structure(&specification) => Ok(()),
            Some(_) => Err(SingleCompositionError::ConflictingDefinition {
                element: format!("Directive \"@{}\"", specification.name),
                details: format!(
                    "the definition in source \"{source_name}\" differs from the one already registered"
                ),
            }),
            None => self.register(specification),
        }
    }

    pub fn get(&self, name: &str) -> Option<&DirectiveSpecification> {
        self.definitions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DirectiveSpecification> {
        self.definitions.values()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Enum and input types the registered directives' arguments need.
    pub fn supporting_types(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.supporting_types.values()
    }

    /// Checks that `directive` may be applied to an element of kind `target`, given the
    /// applications already accepted on that element.
    pub fn validate_attachment(
        &self,
        directive: &AppliedDirective,
        target: DirectiveTarget,
        coordinate: &str,
        existing: &[AppliedDirective],
    ) -> Result<&DirectiveSpecification, SingleCompositionError> {
        let Some(specification) = self.get(&directive.name) else {
            return Err(SingleCompositionError::UnknownDirective {
                name: directive.name.clone(),
                coordinate: coordinate.to_string(),
            });
        };
        if !specification.allows(target) {
            return Err(SingleCompositionError::InvalidLocation {
                name: directive.name.clone(),
                target,
                coordinate: coordinate.to_string(),
            });
        }
        if !specification.repeatable
            && existing
                .iter()
                .any(|application| application.name == directive.name)
        {
            return Err(SingleCompositionError::DuplicateAttachment {
                name: directive.name.clone(),
                coordinate: coordinate.to_string(),
            });
        }
        Ok(specification)
    }

    /// Validates the supplied arguments of `directive` and returns the application with its
    /// arguments in definition order, omitted arguments bound to their defaults.
    pub fn bind_arguments(
        &self,
        directive: &AppliedDirective,
    ) -> Result<AppliedDirective, SingleCompositionError> {
        let Some(specification) = self.get(&directive.name) else {
            return Err(SingleCompositionError::DirectiveNotFound {
                name: directive.name.to_string(),
            });
        };
        let coercion = ValueCoercion {
            supporting_types: &self.supporting_types,
        };
        for (name, value) in &directive.arguments {
            let Some(argument) = specification.argument_by_name(name) else {
                return Err(SingleCompositionError::UnknownArgument {
                    directive: directive.name.clone(),
                    argument: name.clone(),
                });
            };
            if !coercion.is_compatible(value, &argument.ty) {
                return Err(SingleCompositionError::TypeMismatch {
                    directive: directive.name.clone(),
                    argument: name.clone(),
                    expected: argument.ty.to_string(),
                    value: Value::to_string(value),
                });
            }
        }

        let mut bound = IndexMap::with_capacity(specification.arguments.len());
        for argument in &specification.arguments {
            if let Some(value) = directive.arguments.get(&argument.name) {
                bound.insert(argument.name.clone(), value.clone());
            } else if let Some(default_value) = &argument.default_value {
                bound.insert(argument.name.clone(), default_value.clone());
            } else if argument.ty.is_non_null() {
                return Err(SingleCompositionError::MissingRequiredArgument {
                    directive: directive.name.clone(),
                    argument: argument.name.clone(),
                    expected: argument.ty.to_string(),
                });
            }
        }
        Ok(AppliedDirective {
            name: directive.name.clone(),
            arguments: bound,
            location: directive.location.clone(),
        })
    }
}

fn deprecated_directive() -> DirectiveSpecification {
    DirectiveSpecification::new(
        DEPRECATED_DIRECTIVE_NAME,
        [
            DirectiveTarget::FieldDefinition,
            DirectiveTarget::ArgumentDefinition,
            DirectiveTarget::InputFieldDefinition,
            DirectiveTarget::EnumValue,
        ],
    )
    .with_argument(
        ArgumentSpecification::new(name!("reason"), ty!(String))
            .with_default(Value::String(DEFAULT_DEPRECATION_REASON.to_string())),
    )
}

fn specified_by_directive() -> DirectiveSpecification {
    DirectiveSpecification::new(SPECIFIED_BY_DIRECTIVE_NAME, [DirectiveTarget::Scalar])
        .with_argument(ArgumentSpecification::new(name!("url"), ty!(String!)))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use strum::IntoEnumIterator;

    use super::*;

    fn tag_directive() -> DirectiveSpecification {
        DirectiveSpecification::new(name!("tag"), [DirectiveTarget::FieldDefinition])
            .with_argument(ArgumentSpecification::new(name!("name"), ty!(String!)))
    }

    #[test]
    fn every_location_round_trips_through_its_name() {
        for target in DirectiveTarget::iter() {
            assert_eq!(DirectiveTarget::from_str(&target.to_string()), Ok(target));
        }
        assert_eq!(DirectiveTarget::FieldDefinition.to_string(), "FIELD_DEFINITION");
        assert_eq!(
            DirectiveTarget::from_ast(ast::DirectiveLocation::InputFieldDefinition),
            Some(DirectiveTarget::InputFieldDefinition)
        );
    }

    #[test]
    fn new_registry_knows_built_ins() {
        let registry = DirectiveRegistry::new();
        assert!(registry.contains("deprecated"));
        assert!(registry.contains("specifiedBy"));
        assert!(DirectiveRegistry::empty().is_empty());
    }

    #[test]
    fn rejects_duplicate_registration() {
        let mut registry = DirectiveRegistry::empty();
        registry.register(tag_directive()).unwrap();
        assert_eq!(
            registry.register(tag_directive()),
            Err(SingleCompositionError::DuplicateAnnotation { name: name!("tag") })
        );
    }

    #[test]
    fn accepts_identical_declarations_from_sources() {
        let mut registry = DirectiveRegistry::empty();
        registry.register_declared(tag_directive(), "a").unwrap();
        registry.register_declared(tag_directive(), "b").unwrap();

        let error = registry
            .register_declared(tag_directive().repeatable(), "c")
            .unwrap_err();
        assert_eq!(error.code(), "CONFLICTING_DEFINITION");
    }

    #[test]
    fn validates_attachment_location_and_repeatability() {
        let mut registry = DirectiveRegistry::empty();
        registry.register(tag_directive()).unwrap();
        let tag = AppliedDirective::new(name!("tag"))
            .with_argument(name!("name"), Value::String("a".to_string()));

        assert!(
            registry
                .validate_attachment(&tag, DirectiveTarget::FieldDefinition, "T.f", &[])
                .is_ok()
        );
        assert_eq!(
            registry
                .validate_attachment(&tag, DirectiveTarget::Object, "T", &[])
                .unwrap_err()
                .code(),
            "INVALID_LOCATION"
        );
        assert_eq!(
            registry
                .validate_attachment(
                    &tag,
                    DirectiveTarget::FieldDefinition,
                    "T.f",
                    std::slice::from_ref(&tag)
                )
                .unwrap_err(),
            SingleCompositionError::DuplicateAttachment {
                name: name!("tag"),
                coordinate: "T.f".to_string(),
            }
        );

        let unknown = AppliedDirective::new(name!("nope"));
        assert_eq!(
            registry
                .validate_attachment(&unknown, DirectiveTarget::Object, "T", &[])
                .unwrap_err()
                .code(),
            "UNKNOWN_DIRECTIVE"
        );
    }

    #[test]
    fn binds_defaults_and_rejects_bad_arguments() {
        let registry = DirectiveRegistry::new();

        let bound = registry
            .bind_arguments(&AppliedDirective::new(DEPRECATED_DIRECTIVE_NAME))
            .unwrap();
        assert_eq!(
            bound.argument("reason"),
            Some(&Value::String("No longer supported".to_string()))
        );

        let unknown_argument = AppliedDirective::new(DEPRECATED_DIRECTIVE_NAME)
            .with_argument(name!("why"), Value::String("x".to_string()));
        assert_eq!(
            registry.bind_arguments(&unknown_argument).unwrap_err().code(),
            "UNKNOWN_ARGUMENT"
        );

        let mismatch = AppliedDirective::new(DEPRECATED_DIRECTIVE_NAME)
            .with_argument(name!("reason"), Value::Int(1.into()));
        assert_eq!(
            registry.bind_arguments(&mismatch).unwrap_err(),
            SingleCompositionError::TypeMismatch {
                directive: name!("deprecated"),
                argument: name!("reason"),
                expected: "String".to_string(),
                value: "1".to_string(),
            }
        );

        let missing = AppliedDirective::new(SPECIFIED_BY_DIRECTIVE_NAME);
        assert_eq!(
            registry.bind_arguments(&missing).unwrap_err().code(),
            "MISSING_REQUIRED_ARGUMENT"
        );
    }
}
