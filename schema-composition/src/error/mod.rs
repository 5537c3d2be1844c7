//! Errors, hints and the aggregate failure returned by composition.
//!
//! Construction never stops at the first problem: every error found while indexing sources,
//! merging them and building the runtime schema is collected as a [`Diagnostic`], and the whole
//! attempt fails with a single [`CompositionFailure`] carrying all of them.

use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;

use apollo_compiler::Name;
use serde::Serialize;
use serde::ser::SerializeStruct;

use crate::directive::DirectiveTarget;
use crate::display_helpers::DisplaySlice;
use crate::source::definition::SourceLocation;
use crate::source::definition::TypeKind;

pub mod reporter;

/// Create an internal error.
///
/// # Example
/// ```rust
/// use schema_composition::internal_error;
/// use schema_composition::error::SingleCompositionError;
/// # fn may_be_none() -> Option<()> { None }
///
/// const NAME: &str = "the thing";
/// let result: Result<(), SingleCompositionError> = may_be_none()
///     .ok_or_else(|| internal_error!("Expected {NAME} to be Some"));
/// ```
#[macro_export]
macro_rules! internal_error {
    ( $( $arg:tt )+ ) => {
        $crate::error::SingleCompositionError::Internal {
            message: format!( $( $arg )+ ),
        }
    }
}

/// Break out of the current function, returning an internal error.
#[macro_export]
macro_rules! bail {
    ( $( $arg:tt )+ ) => {
        return Err($crate::internal_error!( $( $arg )+ ).into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, strum_macros::IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum SingleCompositionError {
    #[error(
        "An internal error has occurred, please report this bug to the maintainers.\n\nDetails: {message}"
    )]
    Internal { message: String },
    #[error("Source \"{source_name}\" is not valid GraphQL: {message}")]
    #[strum(serialize = "INVALID_GRAPHQL")]
    InvalidGraphQL {
        source_name: String,
        message: String,
    },
    #[error("Source name \"{source_name}\" is used by more than one source")]
    DuplicateSourceName { source_name: String },
    #[error("Source name \"{source_name}\" cannot be used to prefix renamed fields: {reason}")]
    InvalidSourceName { source_name: String, reason: String },
    #[error("Type \"{type_name}\" is defined more than once in source \"{source_name}\"")]
    DuplicateTypeDefinition {
        source_name: String,
        type_name: Name,
    },
    #[error(
        "Source \"{source_name}\" uses type \"{root_type}\" as {operation} root, but the default root name \"{default_name}\" is already used by another type"
    )]
    RootAlreadyUsed {
        source_name: String,
        operation: String,
        root_type: Name,
        default_name: Name,
    },
    #[error("Directive \"@{name}\" is already registered")]
    DuplicateAnnotation { name: Name },
    #[error(
        "Directive \"@{name}\" cannot be applied to {coordinate}: {target} is not one of its locations"
    )]
    InvalidLocation {
        name: Name,
        target: DirectiveTarget,
        coordinate: String,
    },
    #[error("Directive \"@{name}\" is not repeatable but is applied more than once to {coordinate}")]
    DuplicateAttachment { name: Name, coordinate: String },
    #[error("Directive \"@{directive}\" has no argument \"{argument}\"")]
    UnknownArgument { directive: Name, argument: Name },
    #[error(
        "Argument \"{argument}\" of directive \"@{directive}\" expects a value of type {expected}, found {value}"
    )]
    TypeMismatch {
        directive: Name,
        argument: Name,
        expected: String,
        value: String,
    },
    #[error("Directive \"@{directive}\" requires argument \"{argument}\" of type {expected}")]
    MissingRequiredArgument {
        directive: Name,
        argument: Name,
        expected: String,
    },
    #[error("Unknown directive \"@{name}\" applied to {coordinate}")]
    UnknownDirective { name: Name, coordinate: String },
    #[error(
        "Field \"{coordinate}\" from source \"{source_name}\" would be renamed to \"{renamed}\", but that name is already used on the merged type"
    )]
    UnresolvableCollision {
        coordinate: String,
        source_name: String,
        renamed: String,
    },
    #[error("{element} is defined incompatibly across sources: {details}")]
    ConflictingDefinition { element: String, details: String },
    #[error("Type \"{name}\" is declared with different kinds across sources: {details}")]
    TypeKindMismatch { name: Name, details: String },
    #[error("Type \"{name}\" referenced by {referencer} is not defined")]
    UnresolvedTypeReference { name: Name, referencer: String },
    #[error("Type \"{name}\" does not exist in the schema")]
    TypeNotFound { name: String },
    #[error("Type \"{name}\" is {actual}, but {referencer} expects {expected}")]
    KindMismatch {
        name: Name,
        expected: String,
        actual: TypeKind,
        referencer: String,
    },
    #[error("Directive \"@{name}\" does not exist in the schema")]
    DirectiveNotFound { name: String },
    #[error("The composed schema has no query root type")]
    MissingQueryRoot,
}

impl SingleCompositionError {
    pub fn code(&self) -> &'static str {
        self.into()
    }
}

/// One error together with the source locations it relates to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub error: SingleCompositionError,
    pub locations: Vec<SourceLocation>,
}

impl Diagnostic {
    pub fn new(error: SingleCompositionError) -> Self {
        Self {
            error,
            locations: Vec::new(),
        }
    }

    pub fn with_locations(
        error: SingleCompositionError,
        locations: impl IntoIterator<Item = SourceLocation>,
    ) -> Self {
        Self {
            error,
            locations: locations.into_iter().collect(),
        }
    }

    pub fn code(&self) -> &'static str {
        self.error.code()
    }
}

impl From<SingleCompositionError> for Diagnostic {
    fn from(error: SingleCompositionError) -> Self {
        Self::new(error)
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code(), self.error)?;
        if !self.locations.is_empty() {
            write!(f, " at {}", DisplaySlice(&self.locations))?;
        }
        Ok(())
    }
}

impl Serialize for Diagnostic {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Diagnostic", 3)?;
        state.serialize_field("code", self.code())?;
        state.serialize_field("message", &self.error.to_string())?;
        state.serialize_field("locations", &self.locations)?;
        state.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HintCode {
    /// Occurrences of the same element carry different descriptions; the first one is kept.
    InconsistentDescription,
    /// Fields colliding on a type were renamed with their source prefix.
    RenamedCollidingField,
    /// Identical fields declared by several sources were merged into one shared field.
    SharedIdenticalField,
    /// An application of an unregistered directive was dropped.
    IgnoredUnknownDirective,
}

impl HintCode {
    pub fn code(&self) -> &'static str {
        self.into()
    }
}

/// A non-fatal remark produced during composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompositionHint {
    pub code: HintCode,
    pub message: String,
    pub locations: Vec<SourceLocation>,
}

impl Display for CompositionHint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

/// The aggregate failure of one construction attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompositionFailure {
    pub diagnostics: Vec<Diagnostic>,
    pub hints: Vec<CompositionHint>,
}

impl CompositionFailure {
    pub fn codes(&self) -> Vec<&'static str> {
        self.diagnostics.iter().map(Diagnostic::code).collect()
    }

    pub fn errors(&self) -> impl Iterator<Item = &SingleCompositionError> {
        self.diagnostics.iter().map(|diagnostic| &diagnostic.error)
    }
}

impl From<SingleCompositionError> for CompositionFailure {
    fn from(error: SingleCompositionError) -> Self {
        Diagnostic::new(error).into()
    }
}

impl From<Diagnostic> for CompositionFailure {
    fn from(diagnostic: Diagnostic) -> Self {
        Self {
            diagnostics: vec![diagnostic],
            hints: Vec::new(),
        }
    }
}

impl Display for CompositionFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.diagnostics.as_slice() {
            [single] => write!(f, "{single}"),
            diagnostics => {
                write!(f, "composition failed with {} errors:", diagnostics.len())?;
                for diagnostic in diagnostics {
                    write!(f, "\n- {diagnostic}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for CompositionFailure {}
