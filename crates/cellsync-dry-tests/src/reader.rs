// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory document reader with failure and hang switches.

use cellsync_core::DocumentId;
use cellsync_session::reader::DocumentReader;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::io;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Inner {
    files: HashMap<DocumentId, Vec<u8>>,
    failing: HashSet<DocumentId>,
    hanging: HashSet<DocumentId>,
    reads: usize,
}

/// [`DocumentReader`] over an in-memory "disk". Clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentReader {
    inner: Arc<Mutex<Inner>>,
}

enum Probe {
    Bytes(Vec<u8>),
    Fail(io::Error),
    Hang,
}

impl InMemoryDocumentReader {
    /// Empty disk.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Put `bytes` on disk under `id`.
    pub fn write(&self, id: &DocumentId, bytes: impl Into<Vec<u8>>) {
        self.lock().files.insert(id.clone(), bytes.into());
    }

    /// Make reads of `id` fail with an I/O error.
    pub fn set_failing(&self, id: &DocumentId, fail: bool) {
        let mut inner = self.lock();
        if fail {
            inner.failing.insert(id.clone());
        } else {
            inner.failing.remove(id);
        }
    }

    /// Make reads of `id` never complete.
    pub fn set_hanging(&self, id: &DocumentId, hang: bool) {
        let mut inner = self.lock();
        if hang {
            inner.hanging.insert(id.clone());
        } else {
            inner.hanging.remove(id);
        }
    }

    /// Number of reads attempted.
    pub fn reads(&self) -> usize {
        self.lock().reads
    }

    fn probe(&self, id: &DocumentId) -> Probe {
        let mut inner = self.lock();
        inner.reads += 1;
        if inner.hanging.contains(id) {
            return Probe::Hang;
        }
        if inner.failing.contains(id) {
            return Probe::Fail(io::Error::other("simulated read failure"));
        }
        match inner.files.get(id) {
            Some(bytes) => Probe::Bytes(bytes.clone()),
            None => Probe::Fail(io::Error::from(io::ErrorKind::NotFound)),
        }
    }
}

impl DocumentReader for InMemoryDocumentReader {
    fn read(&self, id: &DocumentId) -> impl Future<Output = io::Result<Vec<u8>>> + Send {
        let probe = self.probe(id);
        async move {
            match probe {
                Probe::Bytes(bytes) => Ok(bytes),
                Probe::Fail(err) => Err(err),
                Probe::Hang => std::future::pending().await,
            }
        }
    }
}
