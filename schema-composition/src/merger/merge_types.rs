use apollo_compiler::Name;
use indexmap::IndexSet;
use itertools::Itertools;

use crate::directive::DirectiveTarget;
use crate::error::HintCode;
use crate::error::SingleCompositionError;
use crate::merger::Merger;
use crate::merger::Occurrence;
use crate::merger::locations;
use crate::source::definition::SourceLocation;
use crate::source::definition::TypeDefinition;
use crate::source::definition::TypeShape;

impl<'a> Merger<'a> {
    /// Unions merge their member sets. Members are type references, so nothing is renamed.
    pub(in crate::merger) fn merge_union_type(
        &mut self,
        name: &Name,
        occurrences: &[Occurrence<'a>],
    ) -> TypeDefinition {
        let mut members = IndexSet::new();
        for occurrence in occurrences {
            if let TypeShape::Union { members: declared } = &occurrence.definition.shape {
                members.extend(declared.iter().cloned());
            }
        }
        let directives = self.merge_applied_directives(
            occurrences
                .iter()
                .flat_map(|occurrence| &occurrence.definition.directives),
            DirectiveTarget::Union,
            name,
        );
        let description = self.merge_type_descriptions(name, occurrences);
        TypeDefinition {
            name: name.clone(),
            description,
            directives,
            location: occurrences
                .first()
                .and_then(|occurrence| occurrence.definition.location.clone()),
            shape: TypeShape::Union { members },
        }
    }

    /// Scalars, enums and input objects have no merge semantics: every source must declare the
    /// same definition, and the first one in canonical order is kept.
    pub(in crate::merger) fn merge_identical_type(
        &mut self,
        name: &Name,
        occurrences: &[Occurrence<'a>],
    ) -> TypeDefinition {
        let Some(first) = occurrences.first() else {
            return TypeDefinition::new(name.clone(), TypeShape::Scalar);
        };
        let conflicting: Vec<Occurrence<'a>> = occurrences
            .iter()
            .filter(|occurrence| !occurrence.definition.same_structure(first.definition))
            .copied()
            .collect();
        if !conflicting.is_empty() {
            let details = format!(
                "source \"{}\" declares it differently from {}",
                first.source,
                conflicting
                    .iter()
                    .map(|occurrence| format!("\"{}\"", occurrence.source))
                    .join(", ")
            );
            let mut conflict_locations = first.definition.location.iter().cloned().collect_vec();
            conflict_locations.extend(locations(&conflicting));
            self.error_reporter.add_error(
                SingleCompositionError::ConflictingDefinition {
                    element: format!("{} \"{name}\"", first.definition.kind()),
                    details,
                },
                conflict_locations,
            );
        }

        // Conflicting declarations are already reported; only the kept one contributes directives.
        let contributing: Vec<&TypeDefinition> = if conflicting.is_empty() {
            occurrences
                .iter()
                .map(|occurrence| occurrence.definition)
                .collect()
        } else {
            vec![first.definition]
        };
        let mut merged = first.definition.clone();
        merged.description = self.merge_type_descriptions(name, occurrences);
        merged.directives = self.merge_applied_directives(
            contributing
                .iter()
                .flat_map(|definition| &definition.directives),
            first.definition.kind().directive_target(),
            name,
        );
        match &mut merged.shape {
            TypeShape::Enum { values } => {
                for value in values.values_mut() {
                    let value_name = value.value.clone();
                    value.directives = self.merge_applied_directives(
                        contributing
                            .iter()
                            .filter_map(|definition| match &definition.shape {
                                TypeShape::Enum { values } => values.get(&value_name),
                                _ => None,
                            })
                            .flat_map(|declared| &declared.directives),
                        DirectiveTarget::EnumValue,
                        &format!("{name}.{value_name}"),
                    );
                }
            }
            TypeShape::InputObject { fields } => {
                for field in fields.values_mut() {
                    let field_name = field.name.clone();
                    field.directives = self.merge_applied_directives(
                        contributing
                            .iter()
                            .filter_map(|definition| match &definition.shape {
                                TypeShape::InputObject { fields } => fields.get(&field_name),
                                _ => None,
                            })
                            .flat_map(|declared| &declared.directives),
                        DirectiveTarget::InputFieldDefinition,
                        &format!("{name}.{field_name}"),
                    );
                }
            }
            _ => {}
        }
        merged
    }

    fn merge_type_descriptions(
        &mut self,
        name: &Name,
        occurrences: &[Occurrence<'a>],
    ) -> Option<String> {
        self.merge_descriptions(
            &format!("Type \"{name}\""),
            occurrences.iter().map(|occurrence| {
                (
                    occurrence.source,
                    occurrence.definition.description.as_ref(),
                    occurrence.definition.location.as_ref(),
                )
            }),
        )
    }

    /// Keeps the first description; differing descriptions are a hint, not an error.
    pub(in crate::merger) fn merge_descriptions<'d>(
        &mut self,
        element: &str,
        descriptions: impl Iterator<Item = (&'d str, Option<&'d String>, Option<&'d SourceLocation>)>,
    ) -> Option<String> {
        let described: Vec<_> = descriptions
            .filter_map(|(source, description, location)| {
                description.map(|description| (source, description, location))
            })
            .collect();
        let (_, merged, _) = described.first()?;
        if described
            .iter()
            .any(|(_, description, _)| description != merged)
        {
            self.error_reporter.hint(
                HintCode::InconsistentDescription,
                format!(
                    "{element} has different descriptions in sources {}; the one from \"{}\" is kept",
                    described
                        .iter()
                        .map(|(source, _, _)| format!("\"{source}\""))
                        .join(", "),
                    described[0].0
                ),
                described
                    .iter()
                    .filter_map(|(_, _, location)| location.cloned()),
            );
        }
        Some(merged.to_string())
    }
}
