// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! cellsync core: pure data and algorithms for notebook cells.
//!
//! - [`structure`] converts flat IR cell definitions into structured,
//!   host-facing cells and back, dispatching embedded SQL/markdown through
//!   the [`transform`] port.
//! - [`matching`] carries stable ids across live cell-change events
//!   (prefix/suffix anchored, positional middle).
//! - [`cell_data`] carries ids and outputs across byte-level reloads
//!   (content-first middle).
//! - [`topo`] orders cells so variable declarers precede their users.
//!
//! Nothing in this crate performs I/O or holds process-wide state; the id
//! allocator is injected by the caller.
#![forbid(unsafe_code)]

pub mod cell_data;
pub mod ids;
pub mod ir;
pub mod matching;
pub mod model;
pub mod structure;
pub mod topo;
pub mod transform;

pub use cell_data::{enrich, match_cell_data, normalize_whitespace, CellDataMatch};
pub use ids::{CellName, DocumentId, IdAllocator, SequentialIds, StableId};
pub use ir::{AppInstantiation, CellDef, Header, NotebookIr, Violation};
pub use matching::{match_cells, match_indices, reconcile, CellMatches, IndexMatches, MatchedPair};
pub use model::{
    cells_equal, Cell, CellContent, CellKind, CellSnapshot, CellState, Document,
    DocumentMetadata, LanguageMetadata, LanguageTag, MarkdownMetadata, Options, OutputItem,
    QuotePrefix, SqlMetadata,
};
pub use structure::CellStructurer;
pub use topo::{topological_order, DependencyGraph, VariableEdge};
pub use transform::{
    wrap_markdown_fallback, MarkdownTransformer, SqlTransformer, SubLanguage, Transformed,
    Transformer, Transformers,
};
