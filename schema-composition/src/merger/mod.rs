//! Merges the type definitions of several source documents into one document.
//!
//! Sources are processed in canonical order (sorted by name) so every output is independent of the
//! order the caller passed them in. Each type name is merged once, with a strategy picked by its
//! kind: object and interface types merge their fields and rename collisions, unions merge their
//! members, and scalars, enums and input objects must be identical across sources.
//!
//! Problems are reported to an [`ErrorReporter`] and merging continues with the next type, so one
//! attempt reports every conflict.

use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;

use apollo_compiler::Name;
use indexmap::IndexMap;
use itertools::Itertools;
use serde::Serialize;
use tracing::debug;
use tracing::instrument;
use tracing::trace;

use crate::directive::DirectiveRegistry;
use crate::error::CompositionFailure;
use crate::error::CompositionHint;
use crate::error::SingleCompositionError;
use crate::error::reporter::ErrorReporter;
use crate::options::CompositionOptions;
use crate::source::SourceDocument;
use crate::source::definition::OperationKind;
use crate::source::definition::SourceLocation;
use crate::source::definition::TypeDefinition;
use crate::source::definition::TypeKind;

mod merge_directives;
mod merge_fields;
mod merge_types;

/// `Type.field`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldCoordinate {
    pub type_name: Name,
    pub field_name: Name,
}

impl FieldCoordinate {
    pub fn new(type_name: Name, field_name: Name) -> Self {
        Self {
            type_name,
            field_name,
        }
    }

    /// `None` when either part is not a valid GraphQL name.
    pub fn from_names(type_name: &str, field_name: &str) -> Option<Self> {
        Some(Self::new(
            Name::new(type_name).ok()?,
            Name::new(field_name).ok()?,
        ))
    }
}

impl Display for FieldCoordinate {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.type_name, self.field_name)
    }
}

impl Serialize for FieldCoordinate {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The source a merged field comes from and its name there.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FieldOrigin {
    pub source: String,
    #[serde(serialize_with = "serialize_name")]
    pub field_name: Name,
}

/// A merged field whose name differs from the field it was declared as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldRename {
    pub coordinate: FieldCoordinate,
    pub origin: FieldOrigin,
}

fn serialize_name<S: serde::Serializer>(name: &Name, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(name.as_str())
}

/// One definition per type name, with collisions resolved and provenance recorded.
#[derive(Debug, Clone)]
pub struct MergedDocument {
    pub(crate) types: IndexMap<Name, TypeDefinition>,
    pub(crate) root_operations: IndexMap<OperationKind, Name>,
    pub(crate) registry: DirectiveRegistry,
    pub(crate) field_origins: IndexMap<FieldCoordinate, Vec<FieldOrigin>>,
    pub(crate) renames: Vec<FieldRename>,
}

impl MergedDocument {
    pub fn types(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.types.values()
    }

    pub fn get(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.get(name)
    }

    pub fn root_operations(&self) -> &IndexMap<OperationKind, Name> {
        &self.root_operations
    }

    /// The registry of this composition: the caller's definitions plus those the sources declare.
    pub fn registry(&self) -> &DirectiveRegistry {
        &self.registry
    }

    pub fn field_origins(&self, type_name: &str, field_name: &str) -> &[FieldOrigin] {
        FieldCoordinate::from_names(type_name, field_name)
            .and_then(|coordinate| self.field_origins.get(&coordinate))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn renames(&self) -> &[FieldRename] {
        &self.renames
    }
}

#[derive(Debug)]
pub struct MergeSuccess {
    pub document: MergedDocument,
    pub hints: Vec<CompositionHint>,
}

/// Merges `sources`, validating directive applications against `registry`.
#[instrument(skip_all, fields(sources = sources.len()))]
pub fn merge_sources(
    sources: &[SourceDocument],
    registry: &DirectiveRegistry,
    options: &CompositionOptions,
) -> Result<MergeSuccess, CompositionFailure> {
    let merger = Merger::new(sources, registry, options);
    merger.merge()
}

/// One declaration of a type name, and the source it comes from.
#[derive(Clone, Copy)]
pub(crate) struct Occurrence<'a> {
    pub(crate) source: &'a str,
    pub(crate) definition: &'a TypeDefinition,
}

pub(crate) struct Merger<'a> {
    pub(in crate::merger) sources: Vec<&'a SourceDocument>,
    pub(in crate::merger) options: &'a CompositionOptions,
    pub(in crate::merger) registry: DirectiveRegistry,
    pub(in crate::merger) error_reporter: ErrorReporter,
    pub(in crate::merger) types: IndexMap<Name, TypeDefinition>,
    pub(in crate::merger) root_operations: IndexMap<OperationKind, Name>,
    pub(in crate::merger) field_origins: IndexMap<FieldCoordinate, Vec<FieldOrigin>>,
    pub(in crate::merger) renames: Vec<FieldRename>,
}

impl<'a> Merger<'a> {
    pub(crate) fn new(
        sources: &'a [SourceDocument],
        registry: &DirectiveRegistry,
        options: &'a CompositionOptions,
    ) -> Self {
        let mut error_reporter = ErrorReporter::new();
        let sources: Vec<&SourceDocument> = sources
            .iter()
            .sorted_by(|a, b| a.name().cmp(b.name()))
            .collect();
        for (a, b) in sources.iter().tuple_windows() {
            if a.name() == b.name() {
                error_reporter.add_error(
                    SingleCompositionError::DuplicateSourceName {
                        source_name: a.name().to_string(),
                    },
                    [],
                );
            }
        }
        for source in &sources {
            if let Err(reason) = validate_source_name(source.name()) {
                error_reporter.add_error(
                    SingleCompositionError::InvalidSourceName {
                        source_name: source.name().to_string(),
                        reason,
                    },
                    [],
                );
            }
        }

        let mut registry = registry.clone();
        for source in &sources {
            for specification in source.directive_definitions() {
                if let Err(error) = registry.register_declared(specification.clone(), source.name())
                {
                    error_reporter.add_error(error, []);
                }
            }
        }

        Self {
            sources,
            options,
            registry,
            error_reporter,
            types: IndexMap::new(),
            root_operations: IndexMap::new(),
            field_origins: IndexMap::new(),
            renames: Vec::new(),
        }
    }

    pub(crate) fn merge(mut self) -> Result<MergeSuccess, CompositionFailure> {
        for operation in OperationKind::ALL {
            if self
                .sources
                .iter()
                .any(|source| source.root_operation(operation).is_some())
            {
                self.root_operations
                    .insert(operation, operation.default_type_name());
            }
        }

        for (name, occurrences) in self.occurrences_by_name() {
            self.merge_type(name, &occurrences);
        }

        debug!(
            types = self.types.len(),
            renames = self.renames.len(),
            errors = self.error_reporter.error_count(),
            "merged sources"
        );
        let document = MergedDocument {
            types: self.types,
            root_operations: self.root_operations,
            registry: self.registry,
            field_origins: self.field_origins,
            renames: self.renames,
        };
        let (document, hints) = self.error_reporter.into_result(document)?;
        Ok(MergeSuccess { document, hints })
    }

    /// Every declaration of every type name, in canonical order.
    fn occurrences_by_name(&self) -> IndexMap<Name, Vec<Occurrence<'a>>> {
        let mut occurrences: IndexMap<Name, Vec<Occurrence<'a>>> = IndexMap::new();
        for &source in &self.sources {
            for definition in source.definitions() {
                occurrences
                    .entry(definition.name.clone())
                    .or_default()
                    .push(Occurrence {
                        source: source.name(),
                        definition,
                    });
            }
        }
        occurrences
    }

    fn merge_type(&mut self, name: Name, occurrences: &[Occurrence<'a>]) {
        let Some(first) = occurrences.first() else {
            return;
        };
        let kind = first.definition.kind();
        if occurrences
            .iter()
            .any(|occurrence| occurrence.definition.kind() != kind)
        {
            let details = occurrences
                .iter()
                .map(|occurrence| {
                    format!(
                        "{} in \"{}\"",
                        occurrence.definition.kind(),
                        occurrence.source
                    )
                })
                .join(", ");
            self.error_reporter.add_error(
                SingleCompositionError::TypeKindMismatch { name, details },
                locations(occurrences),
            );
            return;
        }

        trace!(type_name = %name, %kind, occurrences = occurrences.len(), "merging type");
        let merged = match kind {
            TypeKind::Object | TypeKind::Interface => {
                let is_root = self.root_operations.values().any(|root| *root == name);
                self.merge_composite_type(&name, occurrences, is_root)
            }
            TypeKind::Union => self.merge_union_type(&name, occurrences),
            TypeKind::Scalar | TypeKind::Enum | TypeKind::InputObject => {
                self.merge_identical_type(&name, occurrences)
            }
        };
        self.types.insert(name, merged);
    }
}

pub(crate) fn locations(occurrences: &[Occurrence<'_>]) -> Vec<SourceLocation> {
    occurrences
        .iter()
        .filter_map(|occurrence| occurrence.definition.location.clone())
        .collect()
}

/// A source name must turn any field name into a valid GraphQL name when used as `{source}_`.
fn validate_source_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("it is empty".to_string());
    }
    Name::new(&format!("{name}_"))
        .map(|_| ())
        .map_err(|_| "it is not a valid GraphQL name".to_string())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn source(name: &str, sdl: &str) -> SourceDocument {
        SourceDocument::parse(name, sdl).unwrap()
    }

    #[test]
    fn validates_source_names() {
        assert!(validate_source_name("Schema_A").is_ok());
        assert!(validate_source_name("").is_err());
        assert!(validate_source_name("products-v2").is_err());
        assert!(validate_source_name("2fa").is_err());
    }

    #[test]
    fn rejects_duplicate_source_names() {
        let sources = [
            source("a", "type Query { x: Int }"),
            source("a", "type Query { y: Int }"),
        ];
        let failure = merge_sources(
            &sources,
            &DirectiveRegistry::new(),
            &CompositionOptions::default(),
        )
        .unwrap_err();
        assert_eq!(failure.codes(), ["DUPLICATE_SOURCE_NAME"]);
    }

    #[test]
    fn reports_kind_mismatch_with_every_declaration() {
        let sources = [
            source("a", "type Query { x: Thing } type Thing { id: ID }"),
            source("b", "union Thing = Query"),
        ];
        let failure = merge_sources(
            &sources,
            &DirectiveRegistry::new(),
            &CompositionOptions::default(),
        )
        .unwrap_err();
        assert_eq!(
            failure.diagnostics[0].error,
            SingleCompositionError::TypeKindMismatch {
                name: apollo_compiler::name!("Thing"),
                details: "Object in \"a\", Union in \"b\"".to_string(),
            }
        );
        assert_eq!(failure.diagnostics[0].locations.len(), 2);
    }

    #[test]
    fn records_roots_declared_by_any_source() {
        let sources = [
            source("a", "type Query { x: Int }"),
            source("b", "type Mutation { y: Int }"),
        ];
        let success = merge_sources(
            &sources,
            &DirectiveRegistry::new(),
            &CompositionOptions::default(),
        )
        .unwrap();
        assert_eq!(
            success
                .document
                .root_operations()
                .keys()
                .copied()
                .collect::<Vec<_>>(),
            [OperationKind::Query, OperationKind::Mutation]
        );
    }

    #[test]
    fn looks_up_field_origins_by_coordinate() {
        let sources = [source("a", "type Query { x: Int }")];
        let success = merge_sources(
            &sources,
            &DirectiveRegistry::new(),
            &CompositionOptions::default(),
        )
        .unwrap();
        assert_eq!(success.document.field_origins("Query", "x").len(), 1);
        assert!(success.document.field_origins("Query", "y").is_empty());
        assert!(success.document.field_origins("Query", "not a name").is_empty());
        assert_eq!(FieldCoordinate::from_names("Query", "x-y"), None);
    }

    #[test]
    #[tracing_test::traced_test]
    fn logs_renames_and_dropped_directives() {
        let sources = [
            source("a", "type Query { x: Int @external }"),
            source("b", "type Query { x: Int }"),
        ];
        let options = CompositionOptions {
            ignore_unknown_directives: true,
            ..Default::default()
        };
        merge_sources(&sources, &DirectiveRegistry::new(), &options).unwrap();
        assert!(logs_contain("renamed colliding field"));
        assert!(logs_contain("dropping unknown directive"));
        assert!(logs_contain("merged sources"));
    }
}
