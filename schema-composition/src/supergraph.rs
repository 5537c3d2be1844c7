use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::debug;
use tracing::instrument;

use crate::directive::DirectiveRegistry;
use crate::error::CompositionFailure;
use crate::error::CompositionHint;
use crate::merger::MergeSuccess;
use crate::merger::MergedDocument;
use crate::merger::merge_sources;
use crate::options::CompositionOptions;
use crate::schema::Schema;
use crate::source::SourceDocument;

#[derive(Clone, Debug)]
pub struct Merged {
    document: MergedDocument,
    options: CompositionOptions,
}

#[derive(Clone, Debug)]
pub struct Ready {
    schema: Schema,
}

/// The composition of a set of source documents, encoding construction progress as a typestate.
///
/// ```text
///   (merge)      (resolve)
/// sources ──► Merged ──► Ready
///      │          │
///      └──────────┴──► CompositionFailure
/// ```
///
/// - `Merged`: one definition per type name, collisions renamed, directive applications bound.
///   Type references are not checked yet.
/// - `Ready`: every reference resolved into a [`Schema`]. Only this state gives access to type,
///   directive and possible-types lookups.
///
/// A failure at either step is final: there is no way to reach `Ready` from it.
#[derive(Clone, Debug)]
pub struct Supergraph<S> {
    state: S,
    hints: Vec<CompositionHint>,
}

impl<S> Supergraph<S> {
    /// Non-fatal findings of the steps run so far.
    pub fn hints(&self) -> &[CompositionHint] {
        &self.hints
    }
}

impl Supergraph<Merged> {
    #[instrument(skip_all, fields(sources = sources.len()))]
    pub fn merge(
        sources: &[SourceDocument],
        registry: &DirectiveRegistry,
        options: &CompositionOptions,
    ) -> Result<Self, CompositionFailure> {
        debug!(state = "merging", "composition started");
        let MergeSuccess { document, hints } = merge_sources(sources, registry, options)?;
        debug!(state = "merged", hints = hints.len());
        Ok(Self {
            state: Merged {
                document,
                options: options.clone(),
            },
            hints,
        })
    }

    pub fn document(&self) -> &MergedDocument {
        &self.state.document
    }

    /// Builds the runtime schema. Hints of the merge are carried into the result either way.
    #[instrument(skip_all)]
    pub fn resolve(self) -> Result<Supergraph<Ready>, CompositionFailure> {
        debug!(state = "resolving");
        let Merged { document, options } = self.state;
        let mut hints = self.hints;
        match Schema::build(document, &options) {
            Ok(schema) => {
                debug!(state = "ready", types = schema.types().count());
                Ok(Supergraph {
                    state: Ready { schema },
                    hints,
                })
            }
            Err(mut failure) => {
                debug!(
                    state = "failed",
                    errors = failure.diagnostics.len(),
                    "resolution failed"
                );
                hints.append(&mut failure.hints);
                failure.hints = hints;
                Err(failure)
            }
        }
    }
}

impl Supergraph<Ready> {
    pub fn schema(&self) -> &Schema {
        &self.state.schema
    }

    pub fn into_schema(self) -> Schema {
        self.state.schema
    }

    pub fn into_parts(self) -> (Schema, Vec<CompositionHint>) {
        (self.state.schema, self.hints)
    }
}

/// A schema that can be replaced while readers hold on to the previous one.
///
/// Readers get a cheap snapshot with [`SchemaHandle::load`]. A reload composes the new sources in
/// isolation and only replaces the current schema when composition succeeds.
pub struct SchemaHandle {
    current: ArcSwap<Schema>,
}

impl SchemaHandle {
    pub fn new(schema: Schema) -> Self {
        Self {
            current: ArcSwap::from_pointee(schema),
        }
    }

    pub fn load(&self) -> Arc<Schema> {
        self.current.load_full()
    }

    /// Composes `sources` and swaps the result in. On failure the current schema stays in place.
    #[instrument(skip_all, fields(sources = sources.len()))]
    pub fn reload(
        &self,
        sources: &[SourceDocument],
        registry: &DirectiveRegistry,
        options: &CompositionOptions,
    ) -> Result<Vec<CompositionHint>, CompositionFailure> {
        let (schema, hints) = Supergraph::merge(sources, registry, options)?
            .resolve()?
            .into_parts();
        self.current.store(Arc::new(schema));
        debug!("schema reloaded");
        Ok(hints)
    }
}
