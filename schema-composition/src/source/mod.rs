//! Source documents: one independently authored schema, indexed by type name and kind.
//!
//! Indexing a document folds its type extensions into their base definitions and renames its root
//! operation types to their default names (`Query`, `Mutation`, `Subscription`), so that roots of
//! different sources line up during the merge.

use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::parser::SourceMap;
use apollo_compiler::ast;
use indexmap::IndexMap;
use indexmap::IndexSet;
use indexmap::map::Entry;
use tracing::trace;

use crate::directive::DirectiveSpecification;
use crate::error::CompositionFailure;
use crate::error::SingleCompositionError;
use crate::error::reporter::ErrorReporter;
use crate::source::definition::AppliedDirective;
use crate::source::definition::EnumValueDefinition;
use crate::source::definition::FieldDefinition;
use crate::source::definition::InputValueDefinition;
use crate::source::definition::OperationKind;
use crate::source::definition::SourceLocation;
use crate::source::definition::TypeDefinition;
use crate::source::definition::TypeKind;
use crate::source::definition::TypeShape;

pub mod definition;

#[derive(Debug, Clone)]
pub struct SourceDocument {
    name: String,
    types: IndexMap<Name, TypeDefinition>,
    root_operations: IndexMap<OperationKind, Name>,
    directive_definitions: IndexMap<Name, DirectiveSpecification>,
}

impl SourceDocument {
    /// Parses `sdl` and indexes it under the source name `name`.
    pub fn parse(name: impl Into<String>, sdl: &str) -> Result<Self, CompositionFailure> {
        let name = name.into();
        let document = ast::Document::parse(sdl, format!("{name}.graphql")).map_err(|invalid| {
            SingleCompositionError::InvalidGraphQL {
                source_name: name.clone(),
                message: invalid.errors.to_string(),
            }
        })?;
        Self::new(name, &document)
    }

    /// Indexes an already parsed document. Operations and fragments are ignored.
    pub fn new(name: impl Into<String>, document: &ast::Document) -> Result<Self, CompositionFailure> {
        let name = name.into();
        let mut reporter = ErrorReporter::new();
        let lowering = Lowering {
            source: &name,
            sources: &document.sources,
        };

        let mut types: IndexMap<Name, TypeDefinition> = IndexMap::new();
        let mut declared_roots: IndexMap<OperationKind, Name> = IndexMap::new();
        let mut directive_definitions = IndexMap::new();
        let mut extensions = Vec::new();

        for definition in &document.definitions {
            if let Some(type_definition) = lowering.type_definition(definition) {
                match types.entry(type_definition.name.clone()) {
                    Entry::Occupied(_) => reporter.add_error(
                        SingleCompositionError::DuplicateTypeDefinition {
                            source_name: name.clone(),
                            type_name: type_definition.name.clone(),
                        },
                        type_definition.location.clone(),
                    ),
                    Entry::Vacant(entry) => {
                        entry.insert(type_definition);
                    }
                }
                continue;
            }
            if let Some(extension) = lowering.type_extension(definition) {
                extensions.push(extension);
                continue;
            }
            match definition {
                ast::Definition::SchemaDefinition(schema) => {
                    declared_roots.extend(root_operations(&schema.root_operations));
                }
                ast::Definition::SchemaExtension(schema) => {
                    declared_roots.extend(root_operations(&schema.root_operations));
                }
                ast::Definition::DirectiveDefinition(directive) => {
                    if directive_definitions.contains_key(&directive.name) {
                        reporter.add_error(
                            SingleCompositionError::DuplicateAnnotation {
                                name: directive.name.clone(),
                            },
                            lowering.location(directive),
                        );
                    } else {
                        directive_definitions.insert(
                            directive.name.clone(),
                            DirectiveSpecification::from_ast(directive),
                        );
                    }
                }
                _ => {}
            }
        }

        for extension in extensions {
            match types.entry(extension.name.clone()) {
                Entry::Vacant(entry) => {
                    entry.insert(extension);
                }
                Entry::Occupied(mut entry) => {
                    let base = entry.get_mut();
                    if base.kind() == extension.kind() {
                        fold_extension(base, extension);
                    } else {
                        reporter.add_error(
                            SingleCompositionError::TypeKindMismatch {
                                name: extension.name.clone(),
                                details: format!(
                                    "source \"{name}\" defines it as {} but extends it as {}",
                                    base.kind(),
                                    extension.kind()
                                ),
                            },
                            extension.location.clone(),
                        );
                    }
                }
            }
        }

        let root_operations = normalize_roots(&name, &mut types, declared_roots, &mut reporter);

        if reporter.has_errors() {
            return Err(reporter.into_failure());
        }
        trace!(
            source = %name,
            types = types.len(),
            directives = directive_definitions.len(),
            "indexed source document"
        );
        Ok(Self {
            name,
            types,
            root_operations,
            directive_definitions,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The document's definitions of one kind, in declaration order.
    ///
    /// The iterator is lazy and can be cloned to restart it.
    pub fn definitions_by_kind(
        &self,
        kind: TypeKind,
    ) -> impl Iterator<Item = &TypeDefinition> + Clone + '_ {
        self.types
            .values()
            .filter(move |definition| definition.kind() == kind)
    }

    pub fn definitions(&self) -> impl Iterator<Item = &TypeDefinition> + Clone + '_ {
        self.types.values()
    }

    pub fn definition(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.get(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Root operation types, already renamed to their default names.
    pub fn root_operations(&self) -> &IndexMap<OperationKind, Name> {
        &self.root_operations
    }

    pub fn root_operation(&self, operation: OperationKind) -> Option<&Name> {
        self.root_operations.get(&operation)
    }

    pub fn is_root_type(&self, name: &str) -> bool {
        self.root_operations.values().any(|root| root == name)
    }

    pub fn directive_definitions(&self) -> impl Iterator<Item = &DirectiveSpecification> {
        self.directive_definitions.values()
    }
}

fn root_operations(
    root_operations: &[Node<(ast::OperationType, ast::NamedType)>],
) -> impl Iterator<Item = (OperationKind, Name)> + '_ {
    root_operations
        .iter()
        .map(|root| (OperationKind::from(root.0), root.1.clone()))
}

/// Decides the root types of a document and renames them to their default names.
fn normalize_roots(
    source_name: &str,
    types: &mut IndexMap<Name, TypeDefinition>,
    declared_roots: IndexMap<OperationKind, Name>,
    reporter: &mut ErrorReporter,
) -> IndexMap<OperationKind, Name> {
    if declared_roots.is_empty() {
        return OperationKind::ALL
            .into_iter()
            .map(|operation| (operation, operation.default_type_name()))
            .filter(|(_, name)| types.contains_key(name))
            .collect();
    }

    let mut renames = IndexMap::new();
    let mut roots = IndexMap::new();
    for (operation, root_type) in declared_roots {
        let default_name = operation.default_type_name();
        if root_type != default_name {
            if types.contains_key(&default_name) {
                reporter.add_error(
                    SingleCompositionError::RootAlreadyUsed {
                        source_name: source_name.to_string(),
                        operation: operation.to_string(),
                        root_type: root_type.clone(),
                        default_name: default_name.clone(),
                    },
                    types
                        .get(&default_name)
                        .and_then(|definition| definition.location.clone()),
                );
                continue;
            }
            renames.insert(root_type, default_name.clone());
        }
        roots.insert(operation, default_name);
    }

    if !renames.is_empty() {
        *types = std::mem::take(types)
            .into_iter()
            .map(|(name, mut definition)| {
                let name = match renames.get(&name) {
                    Some(new_name) => {
                        definition.name = new_name.clone();
                        new_name.clone()
                    }
                    None => name,
                };
                definition.rename_references(&renames);
                (name, definition)
            })
            .collect();
    }
    roots
}

/// Appends the content of an extension to the definition it extends.
fn fold_extension(base: &mut TypeDefinition, extension: TypeDefinition) {
    base.directives.extend(extension.directives);
    match (&mut base.shape, extension.shape) {
        (
            TypeShape::Object {
                implements_interfaces,
                fields,
            },
            TypeShape::Object {
                implements_interfaces: extra_interfaces,
                fields: extra_fields,
            },
        )
        | (
            TypeShape::Interface {
                implements_interfaces,
                fields,
            },
            TypeShape::Interface {
                implements_interfaces: extra_interfaces,
                fields: extra_fields,
            },
        ) => {
            implements_interfaces.extend(extra_interfaces);
            for (name, field) in extra_fields {
                fields.entry(name).or_insert(field);
            }
        }
        (TypeShape::Union { members }, TypeShape::Union { members: extra }) => {
            members.extend(extra);
        }
        (TypeShape::Enum { values }, TypeShape::Enum { values: extra }) => {
            for (name, value) in extra {
                values.entry(name).or_insert(value);
            }
        }
        (TypeShape::InputObject { fields }, TypeShape::InputObject { fields: extra }) => {
            for (name, field) in extra {
                fields.entry(name).or_insert(field);
            }
        }
        _ => {}
    }
}

/// Converts apollo-compiler AST nodes into the owned definition model.
struct Lowering<'a> {
    source: &'a str,
    sources: &'a SourceMap,
}

impl Lowering<'_> {
    fn location<T>(&self, node: &Node<T>) -> Option<SourceLocation> {
        node.line_column_range(self.sources)
            .map(|range| SourceLocation {
                source: self.source.to_string(),
                line: range.start.line,
                column: range.start.column,
            })
    }

    fn directives(&self, directives: &ast::DirectiveList) -> Vec<AppliedDirective> {
        directives
            .iter()
            .map(|directive| AppliedDirective {
                name: directive.name.clone(),
                arguments: directive
                    .arguments
                    .iter()
                    .map(|argument| (argument.name.clone(), argument.value.clone()))
                    .collect(),
                location: self.location(directive),
            })
            .collect()
    }

    fn input_values(
        &self,
        values: &[Node<ast::InputValueDefinition>],
    ) -> IndexMap<Name, InputValueDefinition> {
        values
            .iter()
            .map(|value| {
                (
                    value.name.clone(),
                    InputValueDefinition {
                        name: value.name.clone(),
                        description: value.description.as_deref().map(str::to_owned),
                        ty: (*value.ty).clone(),
                        default_value: value.default_value.clone(),
                        directives: self.directives(&value.directives),
                        location: self.location(value),
                    },
                )
            })
            .collect()
    }

    fn fields(&self, fields: &[Node<ast::FieldDefinition>]) -> IndexMap<Name, FieldDefinition> {
        fields
            .iter()
            .map(|field| {
                (
                    field.name.clone(),
                    FieldDefinition {
                        name: field.name.clone(),
                        description: field.description.as_deref().map(str::to_owned),
                        arguments: self.input_values(&field.arguments),
                        ty: field.ty.clone(),
                        directives: self.directives(&field.directives),
                        location: self.location(field),
                    },
                )
            })
            .collect()
    }

    fn enum_values(
        &self,
        values: &[Node<ast::EnumValueDefinition>],
    ) -> IndexMap<Name, EnumValueDefinition> {
        values
            .iter()
            .map(|value| {
                (
                    value.value.clone(),
                    EnumValueDefinition {
                        value: value.value.clone(),
                        description: value.description.as_deref().map(str::to_owned),
                        directives: self.directives(&value.directives),
                        location: self.location(value),
                    },
                )
            })
            .collect()
    }

    fn interfaces(&self, names: &[Name]) -> IndexSet<Name> {
        names.iter().cloned().collect()
    }

    fn type_definition(&self, definition: &ast::Definition) -> Option<TypeDefinition> {
        let (name, description, directives, location, shape) = match definition {
            ast::Definition::ObjectTypeDefinition(object) => (
                &object.name,
                &object.description,
                &object.directives,
                self.location(object),
                TypeShape::Object {
                    implements_interfaces: self.interfaces(&object.implements_interfaces),
                    fields: self.fields(&object.fields),
                },
            ),
            ast::Definition::InterfaceTypeDefinition(interface) => (
                &interface.name,
                &interface.description,
                &interface.directives,
                self.location(interface),
                TypeShape::Interface {
                    implements_interfaces: self.interfaces(&interface.implements_interfaces),
                    fields: self.fields(&interface.fields),
                },
            ),
            ast::Definition::UnionTypeDefinition(union) => (
                &union.name,
                &union.description,
                &union.directives,
                self.location(union),
                TypeShape::Union {
                    members: union.members.iter().cloned().collect(),
                },
            ),
            ast::Definition::ScalarTypeDefinition(scalar) => (
                &scalar.name,
                &scalar.description,
                &scalar.directives,
                self.location(scalar),
                TypeShape::Scalar,
            ),
            ast::Definition::EnumTypeDefinition(enum_type) => (
                &enum_type.name,
                &enum_type.description,
                &enum_type.directives,
                self.location(enum_type),
                TypeShape::Enum {
                    values: self.enum_values(&enum_type.values),
                },
            ),
            ast::Definition::InputObjectTypeDefinition(input) => (
                &input.name,
                &input.description,
                &input.directives,
                self.location(input),
                TypeShape::InputObject {
                    fields: self.input_values(&input.fields),
                },
            ),
            _ => return None,
        };
        Some(TypeDefinition {
            name: name.clone(),
            description: description.as_deref().map(str::to_owned),
            directives: self.directives(directives),
            location,
            shape,
        })
    }

    fn type_extension(&self, definition: &ast::Definition) -> Option<TypeDefinition> {
        let (name, directives, location, shape) = match definition {
            ast::Definition::ObjectTypeExtension(object) => (
                &object.name,
                &object.directives,
                self.location(object),
                TypeShape::Object {
                    implements_interfaces: self.interfaces(&object.implements_interfaces),
                    fields: self.fields(&object.fields),
                },
            ),
            ast::Definition::InterfaceTypeExtension(interface) => (
                &interface.name,
                &interface.directives,
                self.location(interface),
                TypeShape::Interface {
                    implements_interfaces: self.interfaces(&interface.implements_interfaces),
                    fields: self.fields(&interface.fields),
                },
            ),
            ast::Definition::UnionTypeExtension(union) => (
                &union.name,
                &union.directives,
                self.location(union),
                TypeShape::Union {
                    members: union.members.iter().cloned().collect(),
                },
            ),
            ast::Definition::ScalarTypeExtension(scalar) => (
                &scalar.name,
                &scalar.directives,
                self.location(scalar),
                TypeShape::Scalar,
            ),
            ast::Definition::EnumTypeExtension(enum_type) => (
                &enum_type.name,
                &enum_type.directives,
                self.location(enum_type),
                TypeShape::Enum {
                    values: self.enum_values(&enum_type.values),
                },
            ),
            ast::Definition::InputObjectTypeExtension(input) => (
                &input.name,
                &input.directives,
                self.location(input),
                TypeShape::InputObject {
                    fields: self.input_values(&input.fields),
                },
            ),
            _ => return None,
        };
        Some(TypeDefinition {
            name: name.clone(),
            description: None,
            directives: self.directives(directives),
            location,
            shape,
        })
    }
}
