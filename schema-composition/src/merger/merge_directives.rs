use apollo_compiler::Name;
use indexmap::IndexMap;
use tracing::warn;

use crate::directive::DirectiveTarget;
use crate::error::HintCode;
use crate::error::SingleCompositionError;
use crate::merger::Merger;
use crate::source::definition::AppliedDirective;
use crate::source::definition::SourceLocation;

impl Merger<'_> {
    /// Carries directive applications onto one merged element.
    ///
    /// `applications` are all the applications the element's occurrences carry, in canonical
    /// source order. Each one is validated against the registry and bound; a non-repeatable
    /// directive applied more than once is reported once for the element, pointing at every
    /// application.
    pub(in crate::merger) fn merge_applied_directives<'d>(
        &mut self,
        applications: impl IntoIterator<Item = &'d AppliedDirective>,
        target: DirectiveTarget,
        coordinate: &str,
    ) -> Vec<AppliedDirective> {
        let mut merged: Vec<AppliedDirective> = Vec::new();
        let mut duplicates: IndexMap<Name, Vec<SourceLocation>> = IndexMap::new();

        for application in applications {
            let attachment = self
                .registry
                .validate_attachment(application, target, coordinate, &merged)
                .map(|_| ());
            match attachment {
                Ok(()) => match self.registry.bind_arguments(application) {
                    Ok(bound) => merged.push(bound),
                    Err(error) => self
                        .error_reporter
                        .add_error(error, application.location.clone()),
                },
                Err(SingleCompositionError::UnknownDirective { name, coordinate })
                    if self.options.ignore_unknown_directives =>
                {
                    warn!(directive = %name, %coordinate, "dropping unknown directive");
                    self.error_reporter.hint(
                        HintCode::IgnoredUnknownDirective,
                        format!("Unknown directive \"@{name}\" on {coordinate} was dropped"),
                        application.location.clone(),
                    );
                }
                Err(SingleCompositionError::DuplicateAttachment { name, .. }) => {
                    duplicates
                        .entry(name)
                        .or_insert_with_key(|name| {
                            merged
                                .iter()
                                .filter(|accepted| accepted.name == *name)
                                .filter_map(|accepted| accepted.location.clone())
                                .collect()
                        })
                        .extend(application.location.clone());
                }
                Err(error) => self
                    .error_reporter
                    .add_error(error, application.location.clone()),
            }
        }

        for (name, locations) in duplicates {
            self.error_reporter.add_error(
                SingleCompositionError::DuplicateAttachment {
                    name,
                    coordinate: coordinate.to_string(),
                },
                locations,
            );
        }
        merged
    }
}
