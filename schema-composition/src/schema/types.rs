//! Resolved type objects of a runtime [`Schema`](crate::schema::Schema).
//!
//! Type references are resolved to [`TypeId`]s, indices into the schema's type arena, so recursive
//! and mutually recursive types need no pointer patching.

use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::ast::Type;
use apollo_compiler::ast::Value;
use indexmap::IndexMap;

use crate::source::definition::AppliedDirective;
use crate::source::definition::EnumValueDefinition;
use crate::source::definition::TypeKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub(crate) usize);

#[derive(Debug, Clone)]
pub struct InputValue {
    pub name: Name,
    pub description: Option<String>,
    pub ty: Type,
    /// The type `ty` names, unwrapped from lists and non-null.
    pub type_id: TypeId,
    pub default_value: Option<Node<Value>>,
    pub directives: Vec<AppliedDirective>,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: Name,
    pub description: Option<String>,
    pub arguments: IndexMap<Name, InputValue>,
    pub ty: Type,
    /// The type `ty` names, unwrapped from lists and non-null.
    pub type_id: TypeId,
    pub directives: Vec<AppliedDirective>,
}

#[derive(Debug, Clone)]
pub struct ObjectType {
    pub name: Name,
    pub description: Option<String>,
    pub directives: Vec<AppliedDirective>,
    pub implements_interfaces: Vec<TypeId>,
    pub fields: IndexMap<Name, Field>,
}

#[derive(Debug, Clone)]
pub struct InterfaceType {
    pub name: Name,
    pub description: Option<String>,
    pub directives: Vec<AppliedDirective>,
    pub implements_interfaces: Vec<TypeId>,
    pub fields: IndexMap<Name, Field>,
}

#[derive(Debug, Clone)]
pub struct UnionType {
    pub name: Name,
    pub description: Option<String>,
    pub directives: Vec<AppliedDirective>,
    pub members: Vec<TypeId>,
}

#[derive(Debug, Clone)]
pub struct ScalarType {
    pub name: Name,
    pub description: Option<String>,
    pub directives: Vec<AppliedDirective>,
    /// `Int`, `Float`, `String`, `Boolean` and `ID`.
    pub built_in: bool,
}

#[derive(Debug, Clone)]
pub struct EnumType {
    pub name: Name,
    pub description: Option<String>,
    pub directives: Vec<AppliedDirective>,
    pub values: IndexMap<Name, EnumValueDefinition>,
}

#[derive(Debug, Clone)]
pub struct InputObjectType {
    pub name: Name,
    pub description: Option<String>,
    pub directives: Vec<AppliedDirective>,
    pub fields: IndexMap<Name, InputValue>,
}

#[derive(Debug, Clone, derive_more::From)]
pub enum ExtendedType {
    Object(ObjectType),
    Interface(InterfaceType),
    Union(UnionType),
    Scalar(ScalarType),
    Enum(EnumType),
    InputObject(InputObjectType),
}

impl ExtendedType {
    pub fn name(&self) -> &Name {
        match self {
            ExtendedType::Object(ty) => &ty.name,
            ExtendedType::Interface(ty) => &ty.name,
            ExtendedType::Union(ty) => &ty.name,
            ExtendedType::Scalar(ty) => &ty.name,
            ExtendedType::Enum(ty) => &ty.name,
            ExtendedType::InputObject(ty) => &ty.name,
        }
    }

    pub fn kind(&self) -> TypeKind {
        match self {
            ExtendedType::Object(_) => TypeKind::Object,
            ExtendedType::Interface(_) => TypeKind::Interface,
            ExtendedType::Union(_) => TypeKind::Union,
            ExtendedType::Scalar(_) => TypeKind::Scalar,
            ExtendedType::Enum(_) => TypeKind::Enum,
            ExtendedType::InputObject(_) => TypeKind::InputObject,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            ExtendedType::Object(ty) => ty.description.as_deref(),
            ExtendedType::Interface(ty) => ty.description.as_deref(),
            ExtendedType::Union(ty) => ty.description.as_deref(),
            ExtendedType::Scalar(ty) => ty.description.as_deref(),
            ExtendedType::Enum(ty) => ty.description.as_deref(),
            ExtendedType::InputObject(ty) => ty.description.as_deref(),
        }
    }

    pub fn directives(&self) -> &[AppliedDirective] {
        match self {
            ExtendedType::Object(ty) => &ty.directives,
            ExtendedType::Interface(ty) => &ty.directives,
            ExtendedType::Union(ty) => &ty.directives,
            ExtendedType::Scalar(ty) => &ty.directives,
            ExtendedType::Enum(ty) => &ty.directives,
            ExtendedType::InputObject(ty) => &ty.directives,
        }
    }

    /// Output fields of an object or interface type.
    pub fn fields(&self) -> Option<&IndexMap<Name, Field>> {
        match self {
            ExtendedType::Object(ty) => Some(&ty.fields),
            ExtendedType::Interface(ty) => Some(&ty.fields),
            _ => None,
        }
    }

    pub fn is_built_in(&self) -> bool {
        matches!(self, ExtendedType::Scalar(scalar) if scalar.built_in)
    }

    pub fn as_object(&self) -> Option<&ObjectType> {
        match self {
            ExtendedType::Object(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn as_interface(&self) -> Option<&InterfaceType> {
        match self {
            ExtendedType::Interface(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn as_union(&self) -> Option<&UnionType> {
        match self {
            ExtendedType::Union(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&ScalarType> {
        match self {
            ExtendedType::Scalar(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumType> {
        match self {
            ExtendedType::Enum(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn as_input_object(&self) -> Option<&InputObjectType> {
        match self {
            ExtendedType::InputObject(ty) => Some(ty),
            _ => None,
        }
    }
}
