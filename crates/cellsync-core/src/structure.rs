// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Cell structuring layer: IR cell definitions ⇄ structured cells.

use crate::ids::{CellName, IdAllocator};
use crate::ir::{AppInstantiation, CellDef, Header, NotebookIr};
use crate::model::{Cell, CellKind, Document, DocumentMetadata, LanguageTag};
use crate::transform::{wrap_markdown_fallback, SubLanguage, Transformers};
use std::sync::Arc;

/// Converts between flat IR cell definitions and structured cells.
///
/// Holds no mutable state of its own; fresh ids come from the injected
/// allocator, so one structurer can serve many documents concurrently.
#[derive(Clone, Debug)]
pub struct CellStructurer {
    transformers: Transformers,
    ids: Arc<dyn IdAllocator>,
}

impl CellStructurer {
    /// Create a structurer over the given transformers and id source.
    pub fn new(transformers: Transformers, ids: Arc<dyn IdAllocator>) -> Self {
        Self { transformers, ids }
    }

    /// Installed transformers.
    pub fn transformers(&self) -> &Transformers {
        &self.transformers
    }

    /// Structure one cell definition, assigning a fresh stable id.
    pub fn structure(&self, def: &CellDef) -> Cell {
        let id = self.ids.next_id();
        let mut cell = match self.transformers.classify(&def.code) {
            SubLanguage::Markdown(lifted) => {
                let mut cell = Cell::new(id, CellKind::Markup, LanguageTag::Markdown, lifted.code);
                cell.language_metadata.markdown = Some(lifted.metadata);
                cell
            }
            SubLanguage::Sql(lifted) => {
                let mut cell = Cell::new(id, CellKind::Code, LanguageTag::Sql, lifted.code);
                cell.language_metadata.sql = Some(lifted.metadata);
                cell
            }
            SubLanguage::Generic => {
                Cell::new(id, CellKind::Code, LanguageTag::GenericCode, def.code.clone())
            }
        };
        cell.name = def
            .name
            .as_deref()
            .map_or_else(CellName::default, CellName::new);
        cell.options = def.options.clone().unwrap_or_default();
        cell
    }

    /// Strip a structured cell back to its IR definition.
    pub fn destructure(&self, cell: &Cell) -> CellDef {
        let code = match (cell.kind, cell.language) {
            (CellKind::Markup, LanguageTag::Markdown) => {
                let md = self.transformers.markdown();
                let meta = cell
                    .language_metadata
                    .markdown
                    .clone()
                    .unwrap_or_else(|| md.default_metadata());
                md.transform_out(&cell.value, &meta)
            }
            (CellKind::Markup, _) => wrap_markdown_fallback(&cell.value),
            (CellKind::Code, LanguageTag::Sql) => {
                let sql = self.transformers.sql();
                let meta = cell
                    .language_metadata
                    .sql
                    .clone()
                    .unwrap_or_else(|| sql.default_metadata());
                sql.transform_out(&cell.value, &meta)
            }
            (CellKind::Code, _) => cell.value.clone(),
        };
        CellDef {
            code,
            name: Some(cell.name.as_str().to_owned()),
            options: Some(cell.options.clone()),
        }
    }

    /// Structure a whole IR payload. Every cell gets a fresh id.
    pub fn document_from_ir(&self, ir: NotebookIr) -> Document {
        let cells = ir.cells.iter().map(|def| self.structure(def)).collect();
        Document {
            cells,
            metadata: DocumentMetadata {
                app: ir.app.options,
                header: ir.header.map(|h| h.value),
                version: ir.version,
                violations: ir.violations,
                valid: ir.valid,
            },
        }
    }

    /// Inverse of [`document_from_ir`](Self::document_from_ir).
    pub fn document_to_ir(&self, doc: &Document) -> NotebookIr {
        NotebookIr {
            app: AppInstantiation {
                options: doc.metadata.app.clone(),
            },
            header: doc
                .metadata
                .header
                .as_ref()
                .map(|value| Header { value: value.clone() }),
            version: doc.metadata.version.clone(),
            cells: doc.cells.iter().map(|c| self.destructure(c)).collect(),
            violations: doc.metadata.violations.clone(),
            valid: doc.metadata.valid,
        }
    }
}
