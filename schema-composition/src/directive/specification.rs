use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::ast;
use apollo_compiler::ast::Type;
use apollo_compiler::ast::Value;
use indexmap::IndexSet;

use crate::directive::DirectiveTarget;
use crate::source::definition::TypeDefinition;

#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentSpecification {
    pub name: Name,
    pub description: Option<String>,
    pub ty: Type,
    pub default_value: Option<Node<Value>>,
}

impl ArgumentSpecification {
    pub fn new(name: Name, ty: Type) -> Self {
        Self {
            name,
            description: None,
            ty,
            default_value: None,
        }
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(Node::new(value));
        self
    }

    /// Non-null without a default: the application must supply it.
    pub fn is_required(&self) -> bool {
        self.ty.is_non_null() && self.default_value.is_none()
    }

    fn same_structure(&self, other: &ArgumentSpecification) -> bool {
        self.name == other.name && self.ty == other.ty && self.default_value == other.default_value
    }
}

/// The definition of a directive: its argument schema, where it may be applied and whether it may
/// be applied more than once to the same element.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveSpecification {
    pub name: Name,
    pub description: Option<String>,
    pub arguments: Vec<ArgumentSpecification>,
    pub locations: IndexSet<DirectiveTarget>,
    pub repeatable: bool,
    /// Types the arguments refer to that every schema using this directive needs.
    pub supporting_types: Vec<TypeDefinition>,
}

impl DirectiveSpecification {
    pub fn new(name: Name, locations: impl IntoIterator<Item = DirectiveTarget>) -> Self {
        Self {
            name,
            description: None,
            arguments: Vec::new(),
            locations: locations.into_iter().collect(),
            repeatable: false,
            supporting_types: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_argument(mut self, argument: ArgumentSpecification) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn with_supporting_type(mut self, definition: TypeDefinition) -> Self {
        self.supporting_types.push(definition);
        self
    }

    pub fn repeatable(mut self) -> Self {
        self.repeatable = true;
        self
    }

    /// Builds a specification from a `directive @name(...) on ...` definition of a document.
    pub fn from_ast(definition: &ast::DirectiveDefinition) -> Self {
        Self {
            name: definition.name.clone(),
            description: definition.description.as_deref().map(str::to_owned),
            arguments: definition
                .arguments
                .iter()
                .map(|argument| ArgumentSpecification {
                    name: argument.name.clone(),
                    description: argument.description.as_deref().map(str::to_owned),
                    ty: (*argument.ty).clone(),
                    default_value: argument.default_value.clone(),
                })
                .collect(),
            locations: definition
                .locations
                .iter()
                .filter_map(|location| DirectiveTarget::from_ast(*location))
                .collect(),
            repeatable: definition.repeatable,
            supporting_types: Vec::new(),
        }
    }

    pub fn argument_by_name(&self, name: &str) -> Option<&ArgumentSpecification> {
        self.arguments.iter().find(|argument| argument.name == name)
    }

    pub fn allows(&self, target: DirectiveTarget) -> bool {
        self.locations.contains(&target)
    }

    /// Same arguments, locations and repeatability. Descriptions and supporting types are ignored.
    pub fn same_structure(&self, other: &DirectiveSpecification) -> bool {
        self.name == other.name
            && self.repeatable == other.repeatable
            && self.locations == other.locations
            && self.arguments.len() == other.arguments.len()
            && self
                .arguments
                .iter()
                .zip(&other.arguments)
                .all(|(a, b)| a.same_structure(b))
    }
}
