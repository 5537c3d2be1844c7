//! ## Usage
//!
//! Composes independently authored GraphQL schema documents ("sources") into one runtime
//! [`Schema`]:
//!
//! 1. each source is parsed into a [`SourceDocument`],
//! 2. the sources are merged, renaming colliding fields after the source they come from and
//!    validating directive applications against a [`DirectiveRegistry`],
//! 3. the merged document is resolved into a closed type graph with lookups by name, kind and
//!    abstract type.
//!
//! Every step reports all of its problems at once as a [`CompositionFailure`]; a schema is only
//! handed out when there are none.
//!
//! ```
//! use schema_composition::CompositionOptions;
//! use schema_composition::DirectiveRegistry;
//! use schema_composition::SourceDocument;
//!
//! let sources = [
//!     SourceDocument::parse("accounts", "type Query { me: String }").unwrap(),
//!     SourceDocument::parse("reviews", "type Query { me: String }").unwrap(),
//! ];
//! let (schema, _hints) = schema_composition::compose(
//!     &sources,
//!     &DirectiveRegistry::new(),
//!     &CompositionOptions::default(),
//! )
//! .unwrap();
//! let query = schema.get_object("Query").unwrap();
//! assert!(query.fields.contains_key("accounts_me"));
//! assert!(query.fields.contains_key("reviews_me"));
//! ```

#![warn(
    rustdoc::broken_intra_doc_links,
    unreachable_pub,
    unreachable_patterns,
    unused,
    unused_qualifications,
    dead_code,
    while_true,
    unconditional_panic,
    clippy::all
)]

pub mod directive;
mod display_helpers;
pub mod error;
pub mod merger;
pub mod options;
pub mod schema;
pub mod source;
pub mod supergraph;

use tracing::instrument;

pub use crate::directive::DirectiveRegistry;
pub use crate::error::CompositionFailure;
pub use crate::error::CompositionHint;
pub use crate::error::SingleCompositionError;
pub use crate::options::CompositionOptions;
pub use crate::options::FieldCollisionPolicy;
pub use crate::schema::Schema;
pub use crate::source::SourceDocument;
use crate::supergraph::Supergraph;

/// Merges `sources` and builds the runtime schema, returning it with the non-fatal hints.
#[instrument(skip_all, fields(sources = sources.len()))]
pub fn compose(
    sources: &[SourceDocument],
    registry: &DirectiveRegistry,
    options: &CompositionOptions,
) -> Result<(Schema, Vec<CompositionHint>), CompositionFailure> {
    Ok(Supergraph::merge(sources, registry, options)?
        .resolve()?
        .into_parts())
}

const _: () = {
    const fn assert_thread_safe<T: Sync + Send>() {}

    assert_thread_safe::<Schema>();
    assert_thread_safe::<DirectiveRegistry>();
    assert_thread_safe::<supergraph::SchemaHandle>();
};
