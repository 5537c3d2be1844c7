//! Checks directive argument values against their declared types.
//!
//! Schema documents are constant, so only literals are accepted; a variable is always a mismatch.

use apollo_compiler::Name;
use apollo_compiler::ast::Type;
use apollo_compiler::ast::Value;
use indexmap::IndexMap;

use crate::source::definition::TypeDefinition;
use crate::source::definition::TypeShape;

/// Literal-to-type compatibility, with the supporting types of the registered directives.
pub(crate) struct ValueCoercion<'a> {
    pub(crate) supporting_types: &'a IndexMap<Name, TypeDefinition>,
}

impl ValueCoercion<'_> {
    pub(crate) fn is_compatible(&self, value: &Value, ty: &Type) -> bool {
        match (value, ty) {
            (Value::Null, ty) => !ty.is_non_null(),
            (Value::Variable(_), _) => false,
            (Value::List(items), Type::List(item_type) | Type::NonNullList(item_type)) => items
                .iter()
                .all(|item| self.is_compatible(item, item_type)),
            // A single item is coerced to a one-item list.
            (_, Type::List(item_type) | Type::NonNullList(item_type)) => {
                self.is_compatible(value, item_type)
            }
            (_, Type::Named(name) | Type::NonNullNamed(name)) => {
                self.is_compatible_with_named(value, name)
            }
        }
    }

    fn is_compatible_with_named(&self, value: &Value, name: &Name) -> bool {
        match name.as_str() {
            "Int" => matches!(value, Value::Int(int) if int.try_to_i32().is_ok()),
            "Float" => matches!(value, Value::Int(_) | Value::Float(_)),
            "String" => matches!(value, Value::String(_)),
            "Boolean" => matches!(value, Value::Boolean(_)),
            "ID" => matches!(value, Value::String(_) | Value::Int(_)),
            _ => match self.supporting_types.get(name).map(|definition| &definition.shape) {
                Some(TypeShape::Enum { values }) => {
                    matches!(value, Value::Enum(enum_value) if values.contains_key(enum_value))
                }
                Some(TypeShape::InputObject { fields }) => match value {
                    Value::Object(entries) => {
                        entries.iter().all(|(name, value)| {
                            fields
                                .get(name)
                                .is_some_and(|field| self.is_compatible(value, &field.ty))
                        }) && fields.values().all(|field| {
                            !field.ty.is_non_null()
                                || field.default_value.is_some()
                                || entries.iter().any(|(name, _)| *name == field.name)
                        })
                    }
                    _ => false,
                },
                // Types declared by the sources themselves are checked by shape only.
                _ => !matches!(value, Value::Null | Value::Variable(_)),
            },
        }
    }
}
