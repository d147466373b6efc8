// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Cell, document and structurer builders.

use crate::transformers::transformers;
use cellsync_core::{
    Cell, CellKind, CellStructurer, Document, DocumentMetadata, LanguageTag, MarkdownMetadata,
    OutputItem, SequentialIds, SqlMetadata, StableId,
};
use std::sync::Arc;

/// Generic code cell with id `id`.
pub fn code_cell(id: &str, value: &str) -> Cell {
    Cell::new(StableId::new(id), CellKind::Code, LanguageTag::GenericCode, value)
}

/// Markdown cell with plain quoting.
pub fn markdown_cell(id: &str, body: &str) -> Cell {
    let mut cell = Cell::new(StableId::new(id), CellKind::Markup, LanguageTag::Markdown, body);
    cell.language_metadata.markdown = Some(MarkdownMetadata::default());
    cell
}

/// SQL cell writing into `dataframe`.
pub fn sql_cell(id: &str, query: &str, dataframe: &str) -> Cell {
    let mut cell = Cell::new(StableId::new(id), CellKind::Code, LanguageTag::Sql, query);
    cell.language_metadata.sql = Some(SqlMetadata {
        dataframe_name: dataframe.to_owned(),
        ..SqlMetadata::default()
    });
    cell
}

/// `cell` with one `text/plain` output holding `text`.
pub fn with_output(mut cell: Cell, text: &str) -> Cell {
    cell.outputs.push(OutputItem {
        mime: "text/plain".to_owned(),
        data: text.as_bytes().to_vec(),
    });
    cell
}

/// Valid document over `cells` with empty metadata.
pub fn document(cells: Vec<Cell>) -> Document {
    Document {
        cells,
        metadata: DocumentMetadata {
            valid: true,
            ..DocumentMetadata::default()
        },
    }
}

/// Structurer over the fake transformers, minting `<prefix>-<n>` ids.
pub fn structurer(prefix: &str) -> CellStructurer {
    CellStructurer::new(transformers(), Arc::new(SequentialIds::new(prefix)))
}
