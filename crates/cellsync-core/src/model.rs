// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Structured cell and document model handed to the host editor.

use crate::ids::{CellName, StableId};
use crate::ir::Violation;
use serde::{Deserialize, Serialize};

/// Opaque key/value bag preserved verbatim across round-trips.
pub type Options = serde_json::Map<String, serde_json::Value>;

/// How the host interprets a cell's `value`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    /// Executable code (generic or SQL).
    Code,
    /// Rendered markup (markdown).
    Markup,
}

/// Language label selecting the transformer that governs round-tripping.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum LanguageTag {
    /// Plain host-language code, stored verbatim.
    #[serde(rename = "generic-code")]
    GenericCode,
    /// Embedded SQL query.
    #[serde(rename = "sql")]
    Sql,
    /// Embedded markdown.
    #[serde(rename = "markdown")]
    Markdown,
}

impl LanguageTag {
    /// Wire label for the host editor.
    pub fn as_str(self) -> &'static str {
        match self {
            LanguageTag::GenericCode => "generic-code",
            LanguageTag::Sql => "sql",
            LanguageTag::Markdown => "markdown",
        }
    }
}

/// Execution/staleness tag. Ephemeral; never part of identity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CellState {
    /// Nothing pending.
    #[default]
    Idle,
    /// Waiting for the execution service.
    Queued,
    /// Currently executing.
    Running,
    /// Outputs no longer reflect the cell's code.
    Stale,
}

/// String-literal prefix used when wrapping an embedded fragment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum QuotePrefix {
    /// No prefix.
    #[default]
    #[serde(rename = "")]
    Plain,
    /// `r"""..."""`
    #[serde(rename = "r")]
    Raw,
    /// `f"""..."""`
    #[serde(rename = "f")]
    Format,
    /// `rf"""..."""`
    #[serde(rename = "rf")]
    RawFormat,
    /// `fr"""..."""`
    #[serde(rename = "fr")]
    FormatRaw,
}

impl QuotePrefix {
    /// Parse a prefix as written in source; `None` for anything unknown.
    pub fn parse(prefix: &str) -> Option<Self> {
        match prefix {
            "" => Some(QuotePrefix::Plain),
            "r" => Some(QuotePrefix::Raw),
            "f" => Some(QuotePrefix::Format),
            "rf" => Some(QuotePrefix::RawFormat),
            "fr" => Some(QuotePrefix::FormatRaw),
            _ => None,
        }
    }

    /// Source spelling of the prefix.
    pub fn as_str(self) -> &'static str {
        match self {
            QuotePrefix::Plain => "",
            QuotePrefix::Raw => "r",
            QuotePrefix::Format => "f",
            QuotePrefix::RawFormat => "rf",
            QuotePrefix::FormatRaw => "fr",
        }
    }

    /// Interpolating (f-string style) literals cannot be edited as plain
    /// markup without losing the interpolation.
    pub fn is_interpolated(self) -> bool {
        matches!(
            self,
            QuotePrefix::Format | QuotePrefix::RawFormat | QuotePrefix::FormatRaw
        )
    }
}

/// Metadata needed to re-wrap a markdown cell.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct MarkdownMetadata {
    /// Literal prefix of the wrapped string.
    pub quote_prefix: QuotePrefix,
}

/// Metadata needed to re-wrap an SQL cell.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SqlMetadata {
    /// Variable the query result is assigned to.
    pub dataframe_name: String,
    /// Literal prefix of the wrapped query string.
    pub quote_prefix: QuotePrefix,
    /// Whether the query result is rendered.
    pub show_output: bool,
    /// Connection/engine variable, when not the default engine.
    pub engine: Option<String>,
}

impl Default for SqlMetadata {
    fn default() -> Self {
        Self {
            dataframe_name: "_df".to_owned(),
            quote_prefix: QuotePrefix::Format,
            show_output: true,
            engine: None,
        }
    }
}

/// Per-sub-language metadata produced by `transform_in`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct LanguageMetadata {
    /// Present on markdown cells.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markdown: Option<MarkdownMetadata>,
    /// Present on SQL cells.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql: Option<SqlMetadata>,
}

impl LanguageMetadata {
    /// Returns `true` when neither sub-language contributed metadata.
    pub fn is_empty(&self) -> bool {
        self.markdown.is_none() && self.sql.is_none()
    }
}

/// One rendered result attached by the host. Opaque to the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutputItem {
    /// MIME type chosen by the renderer.
    pub mime: String,
    /// Raw payload bytes.
    pub data: Vec<u8>,
}

/// Read-only view over the parts of a cell that define its content.
///
/// Both matching engines compare through this trait so they work on full
/// [`Cell`]s as well as lightweight [`CellSnapshot`]s.
pub trait CellContent {
    /// Cell kind.
    fn kind(&self) -> CellKind;
    /// Language tag.
    fn language(&self) -> LanguageTag;
    /// Editable text.
    fn text(&self) -> &str;
}

/// Exact content equality: same kind, same language, byte-identical text.
pub fn cells_equal<A, B>(a: &A, b: &B) -> bool
where
    A: CellContent + ?Sized,
    B: CellContent + ?Sized,
{
    a.kind() == b.kind() && a.language() == b.language() && a.text() == b.text()
}

/// A structured, host-facing cell.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cell {
    /// Stable identity (see [`StableId`]).
    pub id: StableId,
    /// Code or markup.
    pub kind: CellKind,
    /// Governing sub-language.
    pub language: LanguageTag,
    /// Text shown to the user, already in the sub-language's native syntax.
    pub value: String,
    /// User-visible name.
    pub name: CellName,
    /// Opaque options bag.
    pub options: Options,
    /// Metadata required to reconstruct the wrapped source form.
    pub language_metadata: LanguageMetadata,
    /// Execution state.
    pub state: CellState,
    /// Host-attached results.
    pub outputs: Vec<OutputItem>,
}

impl Cell {
    /// Build an idle, unnamed cell with no options, metadata or outputs.
    pub fn new(id: StableId, kind: CellKind, language: LanguageTag, value: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            language,
            value: value.into(),
            name: CellName::default(),
            options: Options::new(),
            language_metadata: LanguageMetadata::default(),
            state: CellState::Idle,
            outputs: Vec::new(),
        }
    }

    /// Equality over everything except the stable id.
    pub fn same_content(&self, other: &Cell) -> bool {
        self.kind == other.kind
            && self.language == other.language
            && self.value == other.value
            && self.name == other.name
            && self.options == other.options
            && self.language_metadata == other.language_metadata
            && self.state == other.state
            && self.outputs == other.outputs
    }

    /// Drop the host-attached state down to a content snapshot.
    pub fn snapshot(&self) -> CellSnapshot {
        CellSnapshot {
            kind: self.kind,
            language: self.language,
            value: self.value.clone(),
        }
    }
}

impl CellContent for Cell {
    fn kind(&self) -> CellKind {
        self.kind
    }

    fn language(&self) -> LanguageTag {
        self.language
    }

    fn text(&self) -> &str {
        &self.value
    }
}

/// Content-only view of a cell, used where no live cell object exists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CellSnapshot {
    /// Cell kind.
    pub kind: CellKind,
    /// Language tag.
    pub language: LanguageTag,
    /// Editable text.
    pub value: String,
}

impl CellContent for CellSnapshot {
    fn kind(&self) -> CellKind {
        self.kind
    }

    fn language(&self) -> LanguageTag {
        self.language
    }

    fn text(&self) -> &str {
        &self.value
    }
}

/// Document-level metadata carried alongside the cells.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DocumentMetadata {
    /// App-level options bag.
    pub app: Options,
    /// Optional header blob (module docstring, license text, ...).
    pub header: Option<String>,
    /// Version stamp of the tool that last wrote the file.
    pub version: Option<String>,
    /// Structural violations reported by the codec.
    pub violations: Vec<Violation>,
    /// `false` when the source could not be fully parsed into cells.
    pub valid: bool,
}

/// Ordered cells plus document metadata. Order is significant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Document {
    /// Cells in document order.
    pub cells: Vec<Cell>,
    /// Document-level metadata.
    pub metadata: DocumentMetadata,
}

impl Document {
    /// Structural equality ignoring stable ids and the version stamp.
    pub fn same_content(&self, other: &Document) -> bool {
        let a = &self.metadata;
        let b = &other.metadata;
        a.app == b.app
            && a.header == b.header
            && a.violations == b.violations
            && a.valid == b.valid
            && self.cells.len() == other.cells.len()
            && self
                .cells
                .iter()
                .zip(&other.cells)
                .all(|(x, y)| x.same_content(y))
    }

    /// All stable ids in document order.
    pub fn ids(&self) -> impl Iterator<Item = &StableId> + '_ {
        self.cells.iter().map(|c| &c.id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn code(id: &str, value: &str) -> Cell {
        Cell::new(StableId::new(id), CellKind::Code, LanguageTag::GenericCode, value)
    }

    #[test]
    fn cells_equal_ignores_everything_but_kind_language_and_text() {
        let mut a = code("a", "x = 1");
        let b = code("b", "x = 1");
        a.name = CellName::new("named");
        assert!(cells_equal(&a, &b));
        assert!(cells_equal(&a, &b.snapshot()));

        let c = Cell::new(StableId::new("c"), CellKind::Code, LanguageTag::Sql, "x = 1");
        assert!(!cells_equal(&a, &c));
        assert!(!cells_equal(&a, &code("d", "x = 1 ")));
    }

    #[test]
    fn document_same_content_ignores_ids_and_version() {
        let mut left = Document {
            cells: vec![code("a", "x = 1"), code("b", "y = x")],
            metadata: DocumentMetadata {
                version: Some("0.1.0".into()),
                valid: true,
                ..DocumentMetadata::default()
            },
        };
        let mut right = left.clone();
        right.cells[0].id = StableId::new("other");
        right.metadata.version = Some("9.9.9".into());
        assert!(left.same_content(&right));

        left.cells[1].value.push('!');
        assert!(!left.same_content(&right));
    }

    #[test]
    fn quote_prefix_round_trips_spelling() {
        for p in ["", "r", "f", "rf", "fr"] {
            let parsed = QuotePrefix::parse(p).unwrap();
            assert_eq!(parsed.as_str(), p);
        }
        assert!(QuotePrefix::parse("b").is_none());
        assert!(QuotePrefix::Format.is_interpolated());
        assert!(QuotePrefix::FormatRaw.is_interpolated());
        assert!(!QuotePrefix::Raw.is_interpolated());
    }
}
