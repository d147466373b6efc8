// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Port for reading a known document's current on-disk bytes.

use cellsync_core::DocumentId;
use std::future::Future;
use std::io;
use std::path::PathBuf;

/// Reads the persisted bytes behind a document id.
pub trait DocumentReader: Send + Sync {
    /// Current bytes of `id`. May be slow; callers bound it with a timeout.
    fn read(&self, id: &DocumentId) -> impl Future<Output = io::Result<Vec<u8>>> + Send;
}

/// Reads documents whose id is a filesystem path or a `file://` URI.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsDocumentReader;

impl FsDocumentReader {
    /// Path a document id refers to.
    pub fn path_of(id: &DocumentId) -> PathBuf {
        let raw = id.as_str();
        PathBuf::from(raw.strip_prefix("file://").unwrap_or(raw))
    }
}

impl DocumentReader for FsDocumentReader {
    fn read(&self, id: &DocumentId) -> impl Future<Output = io::Result<Vec<u8>>> + Send {
        let path = Self::path_of(id);
        async move { tokio::fs::read(path).await }
    }
}
