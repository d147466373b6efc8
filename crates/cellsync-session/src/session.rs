// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Serializer session: the host-facing entry point.
//!
//! `deserialize` and `serialize` are the only async operations. Every cache
//! write happens synchronously after their last `.await`, so dropping either
//! future (or losing the race in the `*_until` variants) commits nothing.

use crate::codec::{CodecError, SourceCodec};
use crate::reader::DocumentReader;
use crate::recency::{RecencyCache, RecencyPolicy};
use crate::registry::DocumentRegistry;
use cellsync_app_core::notice::{NoticeKind, NoticePort};
use cellsync_app_core::prefs::SessionPrefs;
use cellsync_core::{enrich, Cell, CellStructurer, Document, DocumentId, VariableEdge};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Which direction a session call was going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Cells to source bytes.
    Serialize,
    /// Source bytes to cells.
    Deserialize,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Serialize => "serialize",
            Operation::Deserialize => "deserialize",
        })
    }
}

/// Failure of a session call.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The external codec failed.
    #[error("failed to {op} notebook: {source}")]
    Codec {
        /// Direction of the failed call.
        op: Operation,
        /// Codec failure.
        #[source]
        source: CodecError,
    },
    /// Incoming bytes are not UTF-8 text.
    #[error("notebook source is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    /// The host cancelled the call.
    #[error("{op} cancelled")]
    Cancelled {
        /// Direction of the cancelled call.
        op: Operation,
    },
}

impl SessionError {
    /// Direction of the failed call.
    pub fn operation(&self) -> Operation {
        match self {
            SessionError::Codec { op, .. } | SessionError::Cancelled { op } => *op,
            SessionError::Utf8(_) => Operation::Deserialize,
        }
    }

    /// `true` for host cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SessionError::Cancelled { .. })
    }

    /// Short text suitable for the host's error surface.
    pub fn user_message(&self) -> String {
        match self {
            SessionError::Cancelled { op } => format!("{op} cancelled"),
            _ => format!("failed to {} notebook; see logs", self.operation()),
        }
    }
}

/// Notebook serializer session.
///
/// Owns the structurer, the open-document registry and the recency cache.
/// Share it behind an `Arc` when several host requests run concurrently.
pub struct NotebookSession<C, R> {
    codec: C,
    reader: R,
    structurer: CellStructurer,
    registry: DocumentRegistry,
    recency: RecencyCache,
    prefs: SessionPrefs,
    notices: Option<Arc<dyn NoticePort>>,
}

impl<C, R> fmt::Debug for NotebookSession<C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotebookSession")
            .field("structurer", &self.structurer)
            .field("registry", &self.registry)
            .field("recency", &self.recency)
            .field("prefs", &self.prefs)
            .finish_non_exhaustive()
    }
}

impl<C, R> NotebookSession<C, R>
where
    C: SourceCodec,
    R: DocumentReader,
{
    /// Session over `codec` and `reader` using `structurer` and `prefs`.
    pub fn new(codec: C, reader: R, structurer: CellStructurer, prefs: SessionPrefs) -> Self {
        Self {
            codec,
            reader,
            structurer,
            registry: DocumentRegistry::new(),
            recency: RecencyCache::new(RecencyPolicy::from_prefs(&prefs)),
            prefs,
            notices: None,
        }
    }

    /// Report codec failures through `port`.
    pub fn with_notices(mut self, port: Arc<dyn NoticePort>) -> Self {
        self.notices = Some(port);
        self
    }

    /// Open documents.
    pub fn registry(&self) -> &DocumentRegistry {
        &self.registry
    }

    /// Recency index and snapshot side cache.
    pub fn recency(&self) -> &RecencyCache {
        &self.recency
    }

    /// Active prefs.
    pub fn prefs(&self) -> &SessionPrefs {
        &self.prefs
    }

    /// Structuring layer in use.
    pub fn structurer(&self) -> &CellStructurer {
        &self.structurer
    }

    fn codec_failed(&self, op: Operation, source: CodecError) -> SessionError {
        warn!(%op, error = %source, "codec call failed");
        let err = SessionError::Codec { op, source };
        self.report(&err);
        err
    }

    fn report(&self, err: &SessionError) {
        if let Some(port) = &self.notices {
            let detail = err.to_string();
            port.notify(NoticeKind::Error, &err.user_message(), Some(&detail));
        }
    }

    /// Turn source bytes into a document.
    ///
    /// Cells get fresh ids. When the bytes match a recently seen document on
    /// disk, ids and outputs are carried over from that document's last
    /// serialized cells (or its open cells when no snapshot exists).
    pub async fn deserialize(&self, bytes: &[u8]) -> Result<Document, SessionError> {
        let text = std::str::from_utf8(bytes).map_err(|e| {
            let err = SessionError::from(e);
            warn!(error = %err, "rejecting notebook bytes");
            self.report(&err);
            err
        })?;
        let ir = self
            .codec
            .deserialize(text)
            .await
            .map_err(|e| self.codec_failed(Operation::Deserialize, e))?;
        let mut document = self.structurer.document_from_ir(ir);

        let matched = self.recency.match_by_content(bytes, &self.reader).await;

        // No awaits past this point.
        if let Some(id) = matched {
            let previous = self
                .recency
                .snapshot(&id)
                .or_else(|| self.registry.cells(&id));
            if let Some(previous) = previous {
                let fresh = std::mem::take(&mut document.cells);
                document.cells = enrich(&previous, fresh);
                let carried = document
                    .cells
                    .iter()
                    .filter(|c| previous.iter().any(|p| p.id == c.id))
                    .count();
                debug!(document = %id, cells = document.cells.len(), carried, "enriched from previous cells");
            }
            info!(document = %id, "deserialized bytes matched a recent document");
            self.recency.touch(&id);
        }
        Ok(document)
    }

    /// Turn a document into source bytes.
    ///
    /// On success, if the cells belong to a recent open document, they are
    /// remembered as that document's snapshot for the next reload.
    pub async fn serialize(&self, document: &Document) -> Result<Vec<u8>, SessionError> {
        let ir = self.structurer.document_to_ir(document);
        let text = self
            .codec
            .serialize(&ir)
            .await
            .map_err(|e| self.codec_failed(Operation::Serialize, e))?;

        if let Some(id) = self.recency.match_by_stable_ids(&document.cells, &self.registry) {
            debug!(document = %id, cells = document.cells.len(), "recording serialize snapshot");
            self.recency.record_snapshot(&id, document.cells.clone());
        }
        Ok(text.into_bytes())
    }

    /// [`deserialize`](Self::deserialize), abandoned as soon as `cancel` resolves.
    pub async fn deserialize_until<F>(&self, bytes: &[u8], cancel: F) -> Result<Document, SessionError>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            () = cancel => {
                debug!("deserialize cancelled");
                Err(SessionError::Cancelled { op: Operation::Deserialize })
            }
            result = self.deserialize(bytes) => result,
        }
    }

    /// [`serialize`](Self::serialize), abandoned as soon as `cancel` resolves.
    pub async fn serialize_until<F>(&self, document: &Document, cancel: F) -> Result<Vec<u8>, SessionError>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            () = cancel => {
                debug!("serialize cancelled");
                Err(SessionError::Cancelled { op: Operation::Serialize })
            }
            result = self.serialize(document) => result,
        }
    }

    /// Host opened (or re-opened) `id`.
    pub fn open_document(&self, id: DocumentId, document: Document) {
        self.recency.touch(&id);
        self.registry.open(id, document);
    }

    /// Live cell-change event for `id`. Returns the reconciled cells.
    pub fn cells_changed(&self, id: &DocumentId, cells: Vec<Cell>) -> Option<Vec<Cell>> {
        let merged = self.registry.cells_changed(id, cells)?;
        self.recency.touch(id);
        Some(merged)
    }

    /// Host closed `id`.
    pub fn close_document(&self, id: &DocumentId) -> Option<Document> {
        self.recency.forget(id);
        self.registry.close(id)
    }

    /// Rebuilt dependency edges reported by the execution service after a
    /// run. Replaces whatever graph `id` had.
    pub fn update_dependencies(&self, id: &DocumentId, edges: Vec<VariableEdge>) -> bool {
        self.registry.update_dependencies(id, edges)
    }

    /// Partial edge report; variables it does not mention keep their edges.
    pub fn merge_dependencies(&self, id: &DocumentId, edges: Vec<VariableEdge>) -> bool {
        self.registry.merge_dependencies(id, edges)
    }

    /// Forget the dependency graph of `id`, e.g. after a kernel restart.
    /// Ordering falls back to document order.
    pub fn clear_dependencies(&self, id: &DocumentId) {
        self.registry.clear_dependencies(id);
    }

    /// Cells of `id` in dependency order.
    pub fn ordered_cells(&self, id: &DocumentId) -> Option<Vec<Cell>> {
        self.registry.ordered_cells(id)
    }
}
