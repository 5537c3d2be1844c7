use crate::error::CompositionFailure;
use crate::error::CompositionHint;
use crate::error::Diagnostic;
use crate::error::HintCode;
use crate::error::SingleCompositionError;
use crate::source::definition::SourceLocation;

/// Collects errors and hints for one construction attempt.
///
/// Stages report into the same reporter and keep going; the caller decides at the end whether the
/// attempt failed.
#[derive(Debug, Default)]
pub struct ErrorReporter {
    errors: Vec<Diagnostic>,
    hints: Vec<CompositionHint>,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(
        &mut self,
        error: SingleCompositionError,
        locations: impl IntoIterator<Item = SourceLocation>,
    ) {
        self.errors.push(Diagnostic::with_locations(error, locations));
    }

    pub fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.errors.push(diagnostic);
    }

    pub fn add_hint(&mut self, hint: CompositionHint) {
        self.hints.push(hint);
    }

    pub(crate) fn hint(
        &mut self,
        code: HintCode,
        message: String,
        locations: impl IntoIterator<Item = SourceLocation>,
    ) {
        self.add_hint(CompositionHint {
            code,
            message,
            locations: locations.into_iter().collect(),
        });
    }

    /// Absorbs everything another reporter collected, e.g. from an earlier stage.
    pub fn extend(&mut self, other: ErrorReporter) {
        self.errors.extend(other.errors);
        self.hints.extend(other.hints);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_hints(&self) -> bool {
        !self.hints.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn hints(&self) -> &[CompositionHint] {
        &self.hints
    }

    pub fn into_errors_and_hints(self) -> (Vec<Diagnostic>, Vec<CompositionHint>) {
        (self.errors, self.hints)
    }

    /// Returns `value` with the hints if nothing failed, and the aggregate failure otherwise.
    pub fn into_result<T>(
        self,
        value: T,
    ) -> Result<(T, Vec<CompositionHint>), CompositionFailure> {
        if self.errors.is_empty() {
            Ok((value, self.hints))
        } else {
            Err(self.into_failure())
        }
    }

    pub fn into_failure(self) -> CompositionFailure {
        CompositionFailure {
            diagnostics: self.errors,
            hints: self.hints,
        }
    }
}
