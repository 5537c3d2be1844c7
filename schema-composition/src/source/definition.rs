//! The per-source type definition model.
//!
//! These types are a simplified, owned view of the type-system definitions of one schema document.
//! They carry no cross-document information; merging them is the job of [`crate::merger`].

use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;

use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::ast;
use apollo_compiler::ast::Type;
use apollo_compiler::ast::Value;
use apollo_compiler::name;
use indexmap::IndexMap;
use indexmap::IndexSet;
use serde::Serialize;

use crate::directive::DirectiveTarget;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display, Serialize)]
pub enum TypeKind {
    Object,
    Interface,
    Union,
    Scalar,
    Enum,
    InputObject,
}

impl TypeKind {
    pub const ALL: [TypeKind; 6] = [
        TypeKind::Object,
        TypeKind::Interface,
        TypeKind::Union,
        TypeKind::Scalar,
        TypeKind::Enum,
        TypeKind::InputObject,
    ];

    pub fn is_abstract(self) -> bool {
        matches!(self, TypeKind::Interface | TypeKind::Union)
    }

    /// Whether values of this kind may be used as arguments and input fields.
    pub fn is_input(self) -> bool {
        matches!(
            self,
            TypeKind::Scalar | TypeKind::Enum | TypeKind::InputObject
        )
    }

    /// Whether values of this kind may be returned by fields.
    pub fn is_output(self) -> bool {
        !matches!(self, TypeKind::InputObject)
    }

    /// The location a directive must allow to be applied to a type of this kind.
    pub fn directive_target(self) -> DirectiveTarget {
        match self {
            TypeKind::Object => DirectiveTarget::Object,
            TypeKind::Interface => DirectiveTarget::Interface,
            TypeKind::Union => DirectiveTarget::Union,
            TypeKind::Scalar => DirectiveTarget::Scalar,
            TypeKind::Enum => DirectiveTarget::Enum,
            TypeKind::InputObject => DirectiveTarget::InputObject,
        }
    }
}

/// Where an element was declared, used only to point diagnostics at it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SourceLocation {
    pub source: String,
    pub line: usize,
    pub column: usize,
}

impl Display for SourceLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.source, self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl OperationKind {
    pub const ALL: [OperationKind; 3] = [
        OperationKind::Query,
        OperationKind::Mutation,
        OperationKind::Subscription,
    ];

    pub fn default_type_name(self) -> Name {
        match self {
            OperationKind::Query => name!("Query"),
            OperationKind::Mutation => name!("Mutation"),
            OperationKind::Subscription => name!("Subscription"),
        }
    }
}

impl From<ast::OperationType> for OperationKind {
    fn from(value: ast::OperationType) -> Self {
        match value {
            ast::OperationType::Query => OperationKind::Query,
            ast::OperationType::Mutation => OperationKind::Mutation,
            ast::OperationType::Subscription => OperationKind::Subscription,
        }
    }
}

/// A directive application: `@name(arg: value, ...)`.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedDirective {
    pub name: Name,
    pub arguments: IndexMap<Name, Node<Value>>,
    pub location: Option<SourceLocation>,
}

impl AppliedDirective {
    pub fn new(name: Name) -> Self {
        Self {
            name,
            arguments: IndexMap::new(),
            location: None,
        }
    }

    pub fn with_argument(mut self, name: Name, value: Value) -> Self {
        self.arguments.insert(name, Node::new(value));
        self
    }

    pub fn argument(&self, name: &str) -> Option<&Value> {
        self.arguments.get(name).map(|value| &**value)
    }

    /// Same directive with the same argument values, wherever it was written.
    pub fn same_application(&self, other: &AppliedDirective) -> bool {
        self.name == other.name && self.arguments == other.arguments
    }
}

pub(crate) fn same_directives(a: &[AppliedDirective], b: &[AppliedDirective]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(a, b)| a.same_application(b))
}

/// An argument of a field, or a field of an input object.
#[derive(Debug, Clone, PartialEq)]
pub struct InputValueDefinition {
    pub name: Name,
    pub description: Option<String>,
    pub ty: Type,
    pub default_value: Option<Node<Value>>,
    pub directives: Vec<AppliedDirective>,
    pub location: Option<SourceLocation>,
}

impl InputValueDefinition {
    pub fn new(name: Name, ty: Type) -> Self {
        Self {
            name,
            description: None,
            ty,
            default_value: None,
            directives: Vec::new(),
            location: None,
        }
    }

    pub fn same_structure(&self, other: &InputValueDefinition) -> bool {
        self.name == other.name
            && self.ty == other.ty
            && self.default_value == other.default_value
            && same_directives(&self.directives, &other.directives)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    pub name: Name,
    pub description: Option<String>,
    pub arguments: IndexMap<Name, InputValueDefinition>,
    pub ty: Type,
    pub directives: Vec<AppliedDirective>,
    pub location: Option<SourceLocation>,
}

impl FieldDefinition {
    pub fn new(name: Name, ty: Type) -> Self {
        Self {
            name,
            description: None,
            arguments: IndexMap::new(),
            ty,
            directives: Vec::new(),
            location: None,
        }
    }

    /// Same name, type, arguments and directives. Descriptions and locations are ignored.
    pub fn same_structure(&self, other: &FieldDefinition) -> bool {
        self.name == other.name
            && self.ty == other.ty
            && same_inputs(&self.arguments, &other.arguments)
            && same_directives(&self.directives, &other.directives)
    }
}

fn same_inputs(
    a: &IndexMap<Name, InputValueDefinition>,
    b: &IndexMap<Name, InputValueDefinition>,
) -> bool {
    a.len() == b.len()
        && a.iter().all(|(name, value)| {
            b.get(name)
                .is_some_and(|other| value.same_structure(other))
        })
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumValueDefinition {
    pub value: Name,
    pub description: Option<String>,
    pub directives: Vec<AppliedDirective>,
    pub location: Option<SourceLocation>,
}

impl EnumValueDefinition {
    pub fn new(value: Name) -> Self {
        Self {
            value,
            description: None,
            directives: Vec::new(),
            location: None,
        }
    }
}

/// The kind-specific part of a type definition.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeShape {
    Object {
        implements_interfaces: IndexSet<Name>,
        fields: IndexMap<Name, FieldDefinition>,
    },
    Interface {
        implements_interfaces: IndexSet<Name>,
        fields: IndexMap<Name, FieldDefinition>,
    },
    Union {
        members: IndexSet<Name>,
    },
    Scalar,
    Enum {
        values: IndexMap<Name, EnumValueDefinition>,
    },
    InputObject {
        fields: IndexMap<Name, InputValueDefinition>,
    },
}

impl TypeShape {
    pub fn kind(&self) -> TypeKind {
        match self {
            TypeShape::Object { .. } => TypeKind::Object,
            TypeShape::Interface { .. } => TypeKind::Interface,
            TypeShape::Union { .. } => TypeKind::Union,
            TypeShape::Scalar => TypeKind::Scalar,
            TypeShape::Enum { .. } => TypeKind::Enum,
            TypeShape::InputObject { .. } => TypeKind::InputObject,
        }
    }
}

/// A named type declaration of one source document.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDefinition {
    pub name: Name,
    pub description: Option<String>,
    pub directives: Vec<AppliedDirective>,
    pub location: Option<SourceLocation>,
    pub shape: TypeShape,
}

impl TypeDefinition {
    pub fn new(name: Name, shape: TypeShape) -> Self {
        Self {
            name,
            description: None,
            directives: Vec::new(),
            location: None,
            shape,
        }
    }

    pub fn kind(&self) -> TypeKind {
        self.shape.kind()
    }

    /// Output fields of an object or interface type.
    pub fn fields(&self) -> Option<&IndexMap<Name, FieldDefinition>> {
        match &self.shape {
            TypeShape::Object { fields, .. } | TypeShape::Interface { fields, .. } => Some(fields),
            _ => None,
        }
    }

    pub fn implements_interfaces(&self) -> Option<&IndexSet<Name>> {
        match &self.shape {
            TypeShape::Object {
                implements_interfaces,
                ..
            }
            | TypeShape::Interface {
                implements_interfaces,
                ..
            } => Some(implements_interfaces),
            _ => None,
        }
    }

    /// Structural identity, ignoring descriptions and locations. Enum values compare as a set.
    pub fn same_structure(&self, other: &TypeDefinition) -> bool {
        if self.name != other.name || !same_directives(&self.directives, &other.directives) {
            return false;
        }
        match (&self.shape, &other.shape) {
            (
                TypeShape::Object {
                    implements_interfaces: a_implements,
                    fields: a_fields,
                },
                TypeShape::Object {
                    implements_interfaces: b_implements,
                    fields: b_fields,
                },
            )
            | (
                TypeShape::Interface {
                    implements_interfaces: a_implements,
                    fields: a_fields,
                },
                TypeShape::Interface {
                    implements_interfaces: b_implements,
                    fields: b_fields,
                },
            ) => {
                a_implements == b_implements
                    && a_fields.len() == b_fields.len()
                    && a_fields.iter().all(|(name, field)| {
                        b_fields
                            .get(name)
                            .is_some_and(|other| field.same_structure(other))
                    })
            }
            (TypeShape::Union { members: a }, TypeShape::Union { members: b }) => a == b,
            (TypeShape::Scalar, TypeShape::Scalar) => true,
            (TypeShape::Enum { values: a }, TypeShape::Enum { values: b }) => {
                a.len() == b.len()
                    && a.iter().all(|(name, value)| {
                        b.get(name).is_some_and(|other| {
                            same_directives(&value.directives, &other.directives)
                        })
                    })
            }
            (TypeShape::InputObject { fields: a }, TypeShape::InputObject { fields: b }) => {
                same_inputs(a, b)
            }
            _ => false,
        }
    }

    /// Rewrites every reference to a renamed type inside this definition.
    pub(crate) fn rename_references(&mut self, renames: &IndexMap<Name, Name>) {
        match &mut self.shape {
            TypeShape::Object {
                implements_interfaces,
                fields,
            }
            | TypeShape::Interface {
                implements_interfaces,
                fields,
            } => {
                *implements_interfaces = implements_interfaces
                    .iter()
                    .map(|name| renames.get(name).unwrap_or(name).clone())
                    .collect();
                for field in fields.values_mut() {
                    field.ty = renamed_type(&field.ty, renames);
                    for argument in field.arguments.values_mut() {
                        argument.ty = renamed_type(&argument.ty, renames);
                    }
                }
            }
            TypeShape::Union { members } => {
                *members = members
                    .iter()
                    .map(|name| renames.get(name).unwrap_or(name).clone())
                    .collect();
            }
            TypeShape::InputObject { fields } => {
                for field in fields.values_mut() {
                    field.ty = renamed_type(&field.ty, renames);
                }
            }
            TypeShape::Scalar | TypeShape::Enum { .. } => {}
        }
    }
}

fn renamed_type(ty: &Type, renames: &IndexMap<Name, Name>) -> Type {
    match renames.get(ty.inner_named_type()) {
        Some(new_name) => with_named_type(ty, new_name.clone()),
        None => ty.clone(),
    }
}

/// Replaces the innermost named type of `ty`, keeping its list and non-null wrappers.
pub(crate) fn with_named_type(ty: &Type, name: Name) -> Type {
    match ty {
        Type::Named(_) => Type::Named(name),
        Type::NonNullNamed(_) => Type::NonNullNamed(name),
        Type::List(inner) => Type::List(Box::new(with_named_type(inner, name))),
        Type::NonNullList(inner) => Type::NonNullList(Box::new(with_named_type(inner, name))),
    }
}
