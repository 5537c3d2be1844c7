//! The `@cacheControl` hint directive.
//!
//! ```graphql
//! enum CacheControlScope { PUBLIC PRIVATE }
//! directive @cacheControl(
//!   maxAge: Int
//!   scope: CacheControlScope
//!   inheritMaxAge: Boolean
//! ) on OBJECT | FIELD_DEFINITION | INTERFACE | UNION
//! ```

use apollo_compiler::Name;
use apollo_compiler::ast::Value;
use apollo_compiler::name;
use apollo_compiler::ty;
use serde::Serialize;

use crate::directive::ArgumentSpecification;
use crate::directive::DirectiveSpecification;
use crate::directive::DirectiveTarget;
use crate::source::definition::AppliedDirective;
use crate::source::definition::EnumValueDefinition;
use crate::source::definition::TypeDefinition;
use crate::source::definition::TypeShape;

pub const CACHE_CONTROL_DIRECTIVE_NAME: Name = name!("cacheControl");
pub const CACHE_CONTROL_SCOPE_TYPE_NAME: Name = name!("CacheControlScope");
const MAX_AGE_ARGUMENT_NAME: Name = name!("maxAge");
const SCOPE_ARGUMENT_NAME: Name = name!("scope");
const INHERIT_MAX_AGE_ARGUMENT_NAME: Name = name!("inheritMaxAge");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::EnumString, strum_macros::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CacheControlScope {
    Public,
    Private,
}

pub fn cache_control_directive() -> DirectiveSpecification {
    let scope_values = [CacheControlScope::Public, CacheControlScope::Private]
        .into_iter()
        .filter_map(|scope| Name::new(&scope.to_string()).ok())
        .map(|value| (value.clone(), EnumValueDefinition::new(value)))
        .collect();
    DirectiveSpecification::new(
        CACHE_CONTROL_DIRECTIVE_NAME,
        [
            DirectiveTarget::Object,
            DirectiveTarget::FieldDefinition,
            DirectiveTarget::Interface,
            DirectiveTarget::Union,
        ],
    )
    .with_description("Caching hints for the annotated type or field.")
    .with_argument(ArgumentSpecification::new(MAX_AGE_ARGUMENT_NAME, ty!(Int)))
    .with_argument(ArgumentSpecification::new(
        SCOPE_ARGUMENT_NAME,
        ty!(CacheControlScope),
    ))
    .with_argument(ArgumentSpecification::new(
        INHERIT_MAX_AGE_ARGUMENT_NAME,
        ty!(Boolean),
    ))
    .with_supporting_type(TypeDefinition::new(
        CACHE_CONTROL_SCOPE_TYPE_NAME,
        TypeShape::Enum {
            values: scope_values,
        },
    ))
}

/// The typed content of a bound `@cacheControl` application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheControlHint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<CacheControlScope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inherit_max_age: Option<bool>,
}

impl CacheControlHint {
    /// Reads a `@cacheControl` application; `None` for any other directive.
    pub fn from_directive(directive: &AppliedDirective) -> Option<Self> {
        if directive.name != CACHE_CONTROL_DIRECTIVE_NAME {
            return None;
        }
        Some(Self {
            max_age: match directive.argument(&MAX_AGE_ARGUMENT_NAME) {
                Some(Value::Int(max_age)) => max_age.try_to_i32().ok(),
                _ => None,
            },
            scope: match directive.argument(&SCOPE_ARGUMENT_NAME) {
                Some(Value::Enum(scope)) => scope.parse().ok(),
                _ => None,
            },
            inherit_max_age: match directive.argument(&INHERIT_MAX_AGE_ARGUMENT_NAME) {
                Some(Value::Boolean(inherit)) => Some(*inherit),
                _ => None,
            },
        })
    }

    /// The hint among the directives of one element, if any.
    pub fn find(directives: &[AppliedDirective]) -> Option<Self> {
        directives.iter().find_map(Self::from_directive)
    }
}
