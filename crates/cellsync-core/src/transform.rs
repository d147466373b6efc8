// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Port for embedded sub-language transformers and the ordered resolver that
//! picks one for a piece of cell source.
//!
//! The engine never looks at SQL or markdown syntax itself. It only calls the
//! four transformer operations and stores the metadata they return.

use crate::model::{MarkdownMetadata, QuotePrefix, SqlMetadata};
use std::sync::Arc;

/// Result of lifting wrapped source into a sub-language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformed<M> {
    /// Text in the sub-language's native syntax.
    pub code: String,
    /// Metadata needed to reconstruct the wrapping.
    pub metadata: M,
}

/// Adapter for one embedded mini-language.
pub trait Transformer: Send + Sync {
    /// Metadata produced by [`transform_in`](Transformer::transform_in).
    type Metadata;

    /// Whether `source` is a wrapped fragment of this sub-language.
    fn is_supported(&self, source: &str) -> bool;

    /// Unwrap `source` into native text plus metadata. Only called when
    /// [`is_supported`](Transformer::is_supported) returned `true`.
    fn transform_in(&self, source: &str) -> Transformed<Self::Metadata>;

    /// Re-wrap native text using `metadata`.
    fn transform_out(&self, code: &str, metadata: &Self::Metadata) -> String;

    /// Metadata used when a cell carries none.
    fn default_metadata(&self) -> Self::Metadata;
}

/// Shared markdown transformer handle.
pub type MarkdownTransformer = Arc<dyn Transformer<Metadata = MarkdownMetadata>>;
/// Shared SQL transformer handle.
pub type SqlTransformer = Arc<dyn Transformer<Metadata = SqlMetadata>>;

/// Outcome of classifying a cell's source, in precedence order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubLanguage {
    /// Editable markdown.
    Markdown(Transformed<MarkdownMetadata>),
    /// Editable SQL.
    Sql(Transformed<SqlMetadata>),
    /// Anything else; kept verbatim.
    Generic,
}

/// The installed transformers.
#[derive(Clone)]
pub struct Transformers {
    markdown: MarkdownTransformer,
    sql: SqlTransformer,
}

impl Transformers {
    /// Bundle a markdown and an SQL transformer.
    pub fn new(markdown: MarkdownTransformer, sql: SqlTransformer) -> Self {
        Self { markdown, sql }
    }

    /// Markdown transformer.
    pub fn markdown(&self) -> &dyn Transformer<Metadata = MarkdownMetadata> {
        self.markdown.as_ref()
    }

    /// SQL transformer.
    pub fn sql(&self) -> &dyn Transformer<Metadata = SqlMetadata> {
        self.sql.as_ref()
    }

    /// Resolve `code` to a sub-language: markdown, then SQL, then generic.
    ///
    /// Empty code is always generic. Markdown whose literal is interpolated
    /// (`f"""..."""`) falls through, since editing it as markup would drop
    /// the interpolation.
    pub fn classify(&self, code: &str) -> SubLanguage {
        if code.is_empty() {
            return SubLanguage::Generic;
        }
        if self.markdown.is_supported(code) {
            let lifted = self.markdown.transform_in(code);
            if !lifted.metadata.quote_prefix.is_interpolated() {
                return SubLanguage::Markdown(lifted);
            }
        }
        if self.sql.is_supported(code) {
            return SubLanguage::Sql(self.sql.transform_in(code));
        }
        SubLanguage::Generic
    }
}

impl std::fmt::Debug for Transformers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transformers").finish_non_exhaustive()
    }
}

/// Canonical "render as markdown" wrapping for markup cells that lost their
/// markdown metadata.
pub fn wrap_markdown_fallback(value: &str) -> String {
    format!(
        "mo.md({}\"\"\"\n{value}\n\"\"\")",
        QuotePrefix::Raw.as_str()
    )
}
