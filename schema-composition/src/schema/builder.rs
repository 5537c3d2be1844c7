//! Compiles a [`MergedDocument`] into a [`Schema`].
//!
//! The build runs in two passes over a type arena. The first allocates one shell per type name, so
//! that every name has a [`TypeId`] before anything is resolved. The second populates the shells,
//! resolving each type reference through the name index; forward, recursive and mutually recursive
//! references need no special handling. Resolution problems are accumulated and the build fails
//! as a whole if there is any.

use apollo_compiler::Name;
use apollo_compiler::name;
use indexmap::IndexMap;
use indexmap::IndexSet;
use tracing::instrument;
use tracing::trace;

use crate::bail;
use crate::directive::DirectiveRegistry;
use crate::error::CompositionFailure;
use crate::error::SingleCompositionError;
use crate::error::reporter::ErrorReporter;
use crate::merger::MergedDocument;
use crate::options::CompositionOptions;
use crate::schema::Schema;
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
use crate::source::definition::FieldDefinition;
use crate::source::definition::InputValueDefinition;
use crate::source::definition::OperationKind;
use crate::source::definition::SourceLocation;
use crate::source::definition::TypeDefinition;
use crate::source::definition::TypeKind;
use crate::source::definition::TypeShape;

pub(crate) const BUILT_IN_SCALARS: [Name; 5] = [
    name!("Int"),
    name!("Float"),
    name!("String"),
    name!("Boolean"),
    name!("ID"),
];

/// What a type reference requires of the type it names.
#[derive(Debug, Clone, Copy)]
enum Expectation {
    Object,
    Interface,
    Output,
    Input,
}

impl Expectation {
    fn accepts(self, kind: TypeKind) -> bool {
        match self {
            Expectation::Object => kind == TypeKind::Object,
            Expectation::Interface => kind == TypeKind::Interface,
            Expectation::Output => kind.is_output(),
            Expectation::Input => kind.is_input(),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Expectation::Object => "an object type",
            Expectation::Interface => "an interface type",
            Expectation::Output => "an output type",
            Expectation::Input => "an input type",
        }
    }
}

struct SchemaBuilder {
    error_reporter: ErrorReporter,
    ids: IndexMap<Name, TypeId>,
    types: Vec<ExtendedType>,
}

impl Schema {
    /// Builds the runtime schema of a merged document.
    #[instrument(skip_all, fields(types = document.types.len()))]
    pub fn build(
        document: MergedDocument,
        options: &CompositionOptions,
    ) -> Result<Self, CompositionFailure> {
        let MergedDocument {
            types: mut definitions,
            root_operations,
            registry,
            field_origins,
            renames,
        } = document;
        for supporting_type in registry.supporting_types() {
            definitions
                .entry(supporting_type.name.clone())
                .or_insert_with(|| supporting_type.clone());
        }

        let mut builder = SchemaBuilder {
            error_reporter: ErrorReporter::new(),
            ids: IndexMap::new(),
            types: Vec::new(),
        };
        builder.allocate_shells(definitions.values());
        for definition in definitions.values() {
            if let Err(error) = builder.populate(definition) {
                builder.error_reporter.add_error(error, []);
            }
        }
        builder.check_directive_arguments(&registry);
        let root_operations = builder.resolve_roots(&root_operations, options);

        let SchemaBuilder {
            error_reporter,
            ids,
            types,
        } = builder;
        if error_reporter.has_errors() {
            return Err(error_reporter.into_failure());
        }
        let possible_types = possible_types(&types);
        trace!(
            types = types.len(),
            abstract_types = possible_types.len(),
            "built schema"
        );
        Ok(Schema {
            types,
            ids,
            root_operations,
            directives: registry,
            possible_types,
            field_origins,
            renames,
        })
    }
}

impl SchemaBuilder {
    /// First pass: one shell per type name, built-in scalars included.
    fn allocate_shells<'d>(&mut self, definitions: impl Iterator<Item = &'d TypeDefinition>) {
        for definition in definitions {
            let shell = shell(definition);
            self.push(shell);
        }
        for name in BUILT_IN_SCALARS {
            if !self.ids.contains_key(&name) {
                self.push(
                    ScalarType {
                        name,
                        description: None,
                        directives: Vec::new(),
                        built_in: true,
                    }
                    .into(),
                );
            }
        }
    }

    fn push(&mut self, ty: ExtendedType) {
        let id = TypeId(self.types.len());
        self.ids.insert(ty.name().clone(), id);
        self.types.push(ty);
    }

    /// Second pass: resolves the references of one definition into its shell.
    fn populate(&mut self, definition: &TypeDefinition) -> Result<(), SingleCompositionError> {
        let Some(&id) = self.ids.get(&definition.name) else {
            bail!("no shell was allocated for type \"{}\"", definition.name);
        };
        let name = definition.name.clone();
        let description = definition.description.clone();
        let directives = definition.directives.clone();
        let populated: ExtendedType = match &definition.shape {
            TypeShape::Object {
                implements_interfaces,
                fields,
            } => ObjectType {
                implements_interfaces: self.resolve_interfaces(definition, implements_interfaces),
                fields: self.resolve_fields(&name, fields),
                name,
                description,
                directives,
            }
            .into(),
            TypeShape::Interface {
                implements_interfaces,
                fields,
            } => InterfaceType {
                implements_interfaces: self.resolve_interfaces(definition, implements_interfaces),
                fields: self.resolve_fields(&name, fields),
                name,
                description,
                directives,
            }
            .into(),
            TypeShape::Union { members } => UnionType {
                members: members
                    .iter()
                    .filter_map(|member| {
                        self.resolve(
                            member,
                            Expectation::Object,
                            || format!("union \"{}\"", definition.name),
                            definition.location.as_ref(),
                        )
                    })
                    .collect(),
                name,
                description,
                directives,
            }
            .into(),
            TypeShape::Scalar => ScalarType {
                built_in: BUILT_IN_SCALARS.contains(&name),
                name,
                description,
                directives,
            }
            .into(),
            TypeShape::Enum { values } => EnumType {
                values: values.clone(),
                name,
                description,
                directives,
            }
            .into(),
            TypeShape::InputObject { fields } => InputObjectType {
                fields: self.resolve_input_values(fields, |field| {
                    format!("input field \"{}.{field}\"", definition.name)
                }),
                name,
                description,
                directives,
            }
            .into(),
        };
        if let Some(shell) = self.types.get_mut(id.0) {
            *shell = populated;
        }
        Ok(())
    }

    fn resolve_interfaces(
        &mut self,
        definition: &TypeDefinition,
        interfaces: &IndexSet<Name>,
    ) -> Vec<TypeId> {
        interfaces
            .iter()
            .filter_map(|interface| {
                self.resolve(
                    interface,
                    Expectation::Interface,
                    || format!("the implements clause of \"{}\"", definition.name),
                    definition.location.as_ref(),
                )
            })
            .collect()
    }

    fn resolve_fields(
        &mut self,
        type_name: &Name,
        fields: &IndexMap<Name, FieldDefinition>,
    ) -> IndexMap<Name, Field> {
        let mut resolved = IndexMap::with_capacity(fields.len());
        for field in fields.values() {
            let arguments = self.resolve_input_values(&field.arguments, |argument| {
                format!("argument \"{type_name}.{}({argument}:)\"", field.name)
            });
            let Some(type_id) = self.resolve(
                field.ty.inner_named_type(),
                Expectation::Output,
                || format!("field \"{type_name}.{}\"", field.name),
                field.location.as_ref(),
            ) else {
                continue;
            };
            resolved.insert(
                field.name.clone(),
                Field {
                    name: field.name.clone(),
                    description: field.description.clone(),
                    arguments,
                    ty: field.ty.clone(),
                    type_id,
                    directives: field.directives.clone(),
                },
            );
        }
        resolved
    }

    fn resolve_input_values(
        &mut self,
        values: &IndexMap<Name, InputValueDefinition>,
        referencer: impl Fn(&Name) -> String,
    ) -> IndexMap<Name, InputValue> {
        let mut resolved = IndexMap::with_capacity(values.len());
        for value in values.values() {
            let Some(type_id) = self.resolve(
                value.ty.inner_named_type(),
                Expectation::Input,
                || referencer(&value.name),
                value.location.as_ref(),
            ) else {
                continue;
            };
            resolved.insert(
                value.name.clone(),
                InputValue {
                    name: value.name.clone(),
                    description: value.description.clone(),
                    ty: value.ty.clone(),
                    type_id,
                    default_value: value.default_value.clone(),
                    directives: value.directives.clone(),
                },
            );
        }
        resolved
    }

    /// Directive arguments must name input types of the schema.
    fn check_directive_arguments(&mut self, registry: &DirectiveRegistry) {
        for directive in registry.iter() {
            for argument in &directive.arguments {
                self.resolve(
                    argument.ty.inner_named_type(),
                    Expectation::Input,
                    || format!("argument \"@{}({}:)\"", directive.name, argument.name),
                    None,
                );
            }
        }
    }

    fn resolve_roots(
        &mut self,
        root_operations: &IndexMap<OperationKind, Name>,
        options: &CompositionOptions,
    ) -> IndexMap<OperationKind, TypeId> {
        let roots: IndexMap<OperationKind, TypeId> = root_operations
            .iter()
            .filter_map(|(&operation, name)| {
                self.resolve(
                    name,
                    Expectation::Object,
                    || format!("the {operation} root operation"),
                    None,
                )
                .map(|id| (operation, id))
            })
            .collect();
        if options.require_query_root && !root_operations.contains_key(&OperationKind::Query) {
            self.error_reporter
                .add_error(SingleCompositionError::MissingQueryRoot, []);
        }
        roots
    }

    /// Looks a referenced name up and checks its kind, reporting any problem.
    fn resolve(
        &mut self,
        name: &Name,
        expectation: Expectation,
        referencer: impl FnOnce() -> String,
        location: Option<&SourceLocation>,
    ) -> Option<TypeId> {
        let Some(&id) = self.ids.get(name) else {
            self.error_reporter.add_error(
                SingleCompositionError::UnresolvedTypeReference {
                    name: name.clone(),
                    referencer: referencer(),
                },
                location.cloned(),
            );
            return None;
        };
        let kind = self.types.get(id.0)?.kind();
        if !expectation.accepts(kind) {
            self.error_reporter.add_error(
                SingleCompositionError::KindMismatch {
                    name: name.clone(),
                    expected: expectation.describe().to_string(),
                    actual: kind,
                    referencer: referencer(),
                },
                location.cloned(),
            );
            return None;
        }
        Some(id)
    }
}

/// An unpopulated type of the right kind.
fn shell(definition: &TypeDefinition) -> ExtendedType {
    let name = definition.name.clone();
    match definition.kind() {
        TypeKind::Object => ObjectType {
            name,
            description: None,
            directives: Vec::new(),
            implements_interfaces: Vec::new(),
            fields: IndexMap::new(),
        }
        .into(),
        TypeKind::Interface => InterfaceType {
            name,
            description: None,
            directives: Vec::new(),
            implements_interfaces: Vec::new(),
            fields: IndexMap::new(),
        }
        .into(),
        TypeKind::Union => UnionType {
            name,
            description: None,
            directives: Vec::new(),
            members: Vec::new(),
        }
        .into(),
        TypeKind::Scalar => ScalarType {
            built_in: BUILT_IN_SCALARS.contains(&name),
            name,
            description: None,
            directives: Vec::new(),
        }
        .into(),
        TypeKind::Enum => EnumType {
            name,
            description: None,
            directives: Vec::new(),
            values: IndexMap::new(),
        }
        .into(),
        TypeKind::InputObject => InputObjectType {
            name,
            description: None,
            directives: Vec::new(),
            fields: IndexMap::new(),
        }
        .into(),
    }
}

/// For every interface and union, the object types implementing it or belonging to it, in schema
/// order. Abstract types nothing implements get an empty list.
fn possible_types(types: &[ExtendedType]) -> IndexMap<TypeId, Vec<TypeId>> {
    let mut possible_types: IndexMap<TypeId, Vec<TypeId>> = types
        .iter()
        .enumerate()
        .filter(|(_, ty)| ty.kind().is_abstract())
        .map(|(index, _)| (TypeId(index), Vec::new()))
        .collect();
    for (index, ty) in types.iter().enumerate() {
        match ty {
            ExtendedType::Object(object) => {
                for interface in &object.implements_interfaces {
                    possible_types
                        .entry(*interface)
                        .or_default()
                        .push(TypeId(index));
                }
            }
            ExtendedType::Union(union) => {
                possible_types
                    .entry(TypeId(index))
                    .or_default()
                    .extend(union.members.iter().copied());
            }
            _ => {}
        }
    }
    for objects in possible_types.values_mut() {
        objects.sort();
        objects.dedup();
    }
    possible_types
}
