use apollo_compiler::Name;
use indexmap::IndexMap;
use indexmap::IndexSet;
use itertools::Itertools;
use tracing::debug;

use crate::directive::DirectiveTarget;
use crate::error::HintCode;
use crate::error::SingleCompositionError;
use crate::merger::FieldCoordinate;
use crate::merger::FieldOrigin;
use crate::merger::FieldRename;
use crate::merger::Merger;
use crate::merger::Occurrence;
use crate::options::FieldCollisionPolicy;
use crate::source::definition::FieldDefinition;
use crate::source::definition::TypeDefinition;
use crate::source::definition::TypeKind;
use crate::source::definition::TypeShape;

/// One declaration of a field, and the source it comes from.
#[derive(Clone, Copy)]
struct FieldOccurrence<'a> {
    source: &'a str,
    field: &'a FieldDefinition,
}

/// How the declarations of one field name end up in the merged type.
enum FieldPlan<'a> {
    /// Declared once, or shared by identical declarations.
    Kept(Vec<FieldOccurrence<'a>>),
    /// Colliding declarations, each renamed with its source as prefix.
    Renamed(Vec<FieldOccurrence<'a>>),
}

impl<'a> Merger<'a> {
    /// Merges object or interface types: interfaces are unioned, fields are merged by name.
    ///
    /// A field declared by a single source is kept as is. Same-named fields from several sources
    /// collide: on root types, and on other types unless the policy shares identical declarations,
    /// each colliding field is renamed `{source}_{field}` and the rename is recorded.
    pub(in crate::merger) fn merge_composite_type(
        &mut self,
        name: &Name,
        occurrences: &[Occurrence<'a>],
        is_root: bool,
    ) -> TypeDefinition {
        let kind = occurrences
            .first()
            .map(|occurrence| occurrence.definition.kind())
            .unwrap_or(TypeKind::Object);

        let mut implements_interfaces = IndexSet::new();
        let mut declarations: IndexMap<&Name, Vec<FieldOccurrence<'a>>> = IndexMap::new();
        for occurrence in occurrences {
            if let Some(interfaces) = occurrence.definition.implements_interfaces() {
                implements_interfaces.extend(interfaces.iter().cloned());
            }
            for (field_name, field) in occurrence.definition.fields().into_iter().flatten() {
                declarations
                    .entry(field_name)
                    .or_default()
                    .push(FieldOccurrence {
                        source: occurrence.source,
                        field,
                    });
            }
        }

        let plans: Vec<FieldPlan<'a>> = declarations
            .into_values()
            .map(|declarations| self.plan_field(declarations, is_root))
            .collect();

        // Names kept as declared are claimed first, so a renamed field can never shadow them.
        let mut taken: IndexSet<Name> = plans
            .iter()
            .filter_map(|plan| match plan {
                FieldPlan::Kept(declarations) => declarations.first().map(|d| d.field.name.clone()),
                FieldPlan::Renamed(_) => None,
            })
            .collect();

        let mut fields = IndexMap::new();
        for plan in plans {
            match plan {
                FieldPlan::Kept(declarations) => {
                    let Some(first) = declarations.first() else {
                        continue;
                    };
                    let field = self.merge_kept_field(name, &declarations);
                    self.field_origins.insert(
                        FieldCoordinate::new(name.clone(), field.name.clone()),
                        declarations
                            .iter()
                            .map(|declaration| FieldOrigin {
                                source: declaration.source.to_string(),
                                field_name: first.field.name.clone(),
                            })
                            .collect(),
                    );
                    fields.insert(field.name.clone(), field);
                }
                FieldPlan::Renamed(declarations) => {
                    for declaration in &declarations {
                        let Some(field) = self.renamed_field(name, declaration, &mut taken) else {
                            continue;
                        };
                        let coordinate = FieldCoordinate::new(name.clone(), field.name.clone());
                        let origin = FieldOrigin {
                            source: declaration.source.to_string(),
                            field_name: declaration.field.name.clone(),
                        };
                        debug!(from = %origin.field_name, to = %coordinate, source = %origin.source, "renamed colliding field");
                        self.field_origins
                            .insert(coordinate.clone(), vec![origin.clone()]);
                        self.renames.push(FieldRename { coordinate, origin });
                        fields.insert(field.name.clone(), field);
                    }
                }
            }
        }

        let directives = self.merge_applied_directives(
            occurrences
                .iter()
                .flat_map(|occurrence| &occurrence.definition.directives),
            kind.directive_target(),
            name,
        );
        let description = self.merge_descriptions(
            &format!("Type \"{name}\""),
            occurrences.iter().map(|occurrence| {
                (
                    occurrence.source,
                    occurrence.definition.description.as_ref(),
                    occurrence.definition.location.as_ref(),
                )
            }),
        );
        let shape = match kind {
            TypeKind::Interface => TypeShape::Interface {
                implements_interfaces,
                fields,
            },
            _ => TypeShape::Object {
                implements_interfaces,
                fields,
            },
        };
        TypeDefinition {
            name: name.clone(),
            description,
            directives,
            location: occurrences
                .first()
                .and_then(|occurrence| occurrence.definition.location.clone()),
            shape,
        }
    }

    fn plan_field(
        &mut self,
        declarations: Vec<FieldOccurrence<'a>>,
        is_root: bool,
    ) -> FieldPlan<'a> {
        let Some(&first) = declarations.first() else {
            return FieldPlan::Kept(declarations);
        };
        if declarations.len() == 1 {
            return FieldPlan::Kept(declarations);
        }
        let shareable = !is_root
            && self.options.field_collisions == FieldCollisionPolicy::ShareIdentical
            && declarations[1..]
                .iter()
                .all(|declaration| declaration.field.same_structure(first.field));
        let sources = declarations
            .iter()
            .map(|declaration| format!("\"{}\"", declaration.source))
            .join(", ");
        if shareable {
            self.error_reporter.hint(
                HintCode::SharedIdenticalField,
                format!(
                    "Field \"{}\" is declared identically by sources {sources} and is shared",
                    first.field.name
                ),
                declarations
                    .iter()
                    .filter_map(|declaration| declaration.field.location.clone()),
            );
            FieldPlan::Kept(declarations)
        } else {
            self.error_reporter.hint(
                HintCode::RenamedCollidingField,
                format!(
                    "Field \"{}\" is declared by sources {sources} and is renamed with each source as prefix",
                    first.field.name
                ),
                declarations
                    .iter()
                    .filter_map(|declaration| declaration.field.location.clone()),
            );
            FieldPlan::Renamed(declarations)
        }
    }

    fn merge_kept_field(
        &mut self,
        type_name: &Name,
        declarations: &[FieldOccurrence<'a>],
    ) -> FieldDefinition {
        let first = declarations[0].field;
        let coordinate = format!("{type_name}.{}", first.name);
        let mut field = first.clone();
        field.description = self.merge_descriptions(
            &format!("Field \"{coordinate}\""),
            declarations.iter().map(|declaration| {
                (
                    declaration.source,
                    declaration.field.description.as_ref(),
                    declaration.field.location.as_ref(),
                )
            }),
        );
        let declared: Vec<&FieldDefinition> = declarations
            .iter()
            .map(|declaration| declaration.field)
            .collect();
        self.merge_field_directives(&mut field, &declared, &coordinate);
        field
    }

    fn renamed_field(
        &mut self,
        type_name: &Name,
        declaration: &FieldOccurrence<'a>,
        taken: &mut IndexSet<Name>,
    ) -> Option<FieldDefinition> {
        let original = format!("{type_name}.{}", declaration.field.name);
        let renamed = format!("{}_{}", declaration.source, declaration.field.name);
        let new_name = match Name::new(&renamed) {
            Ok(new_name) if !taken.contains(&new_name) => new_name,
            _ => {
                self.error_reporter.add_error(
                    SingleCompositionError::UnresolvableCollision {
                        coordinate: original,
                        source_name: declaration.source.to_string(),
                        renamed,
                    },
                    declaration.field.location.clone(),
                );
                return None;
            }
        };
        taken.insert(new_name.clone());

        let mut field = declaration.field.clone();
        field.name = new_name;
        let coordinate = format!("{type_name}.{}", field.name);
        self.merge_field_directives(&mut field, &[declaration.field], &coordinate);
        Some(field)
    }

    /// Validates the directives of a field and of its arguments, as applied by every declaration
    /// the merged field stands for.
    fn merge_field_directives(
        &mut self,
        field: &mut FieldDefinition,
        declared: &[&FieldDefinition],
        coordinate: &str,
    ) {
        field.directives = self.merge_applied_directives(
            declared.iter().flat_map(|declaration| &declaration.directives),
            DirectiveTarget::FieldDefinition,
            coordinate,
        );
        for argument in field.arguments.values_mut() {
            let argument_name = argument.name.clone();
            argument.directives = self.merge_applied_directives(
                declared
                    .iter()
                    .filter_map(|declaration| declaration.arguments.get(&argument_name))
                    .flat_map(|declared_argument| &declared_argument.directives),
                DirectiveTarget::ArgumentDefinition,
                &format!("{coordinate}({argument_name}:)"),
            );
        }
    }
}
