// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Source codec fakes.

use cellsync_core::NotebookIr;
use cellsync_session::codec::{CodecError, SourceCodec};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Notify};

/// Version stamp [`JsonCodec`] writes into every serialized notebook.
pub const PINNED_VERSION: &str = "0.0.0-test";

/// Codec whose "source text" is pretty-printed IR JSON.
///
/// Serialization is deterministic and stamps [`PINNED_VERSION`], so
/// re-serializing a deserialized notebook yields identical bytes.
#[derive(Debug, Clone, Default)]
pub struct JsonCodec {
    calls: Arc<AtomicUsize>,
}

impl JsonCodec {
    /// Fresh codec.
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls made through this codec and its clones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Synchronous serialize, for building fixtures.
    pub fn encode(ir: &NotebookIr) -> Result<String, CodecError> {
        let mut stamped = ir.clone();
        stamped.version = Some(PINNED_VERSION.to_owned());
        Ok(serde_json::to_string_pretty(&stamped)?)
    }

    /// Synchronous deserialize, for building fixtures.
    pub fn decode(source: &str) -> Result<NotebookIr, CodecError> {
        Ok(serde_json::from_str(source)?)
    }
}

impl SourceCodec for JsonCodec {
    fn serialize(&self, ir: &NotebookIr) -> impl Future<Output = Result<String, CodecError>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = Self::encode(ir);
        async move { result }
    }

    fn deserialize(&self, source: &str) -> impl Future<Output = Result<NotebookIr, CodecError>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = Self::decode(source);
        async move { result }
    }
}

/// Codec that rejects everything with a fixed message.
#[derive(Debug, Clone)]
pub struct FailingCodec {
    message: String,
}

impl FailingCodec {
    /// Codec failing with `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Default for FailingCodec {
    fn default() -> Self {
        Self::new("simulated codec failure")
    }
}

impl SourceCodec for FailingCodec {
    fn serialize(&self, _ir: &NotebookIr) -> impl Future<Output = Result<String, CodecError>> + Send {
        let err = CodecError::Rejected(self.message.clone());
        async move { Err(err) }
    }

    fn deserialize(&self, _source: &str) -> impl Future<Output = Result<NotebookIr, CodecError>> + Send {
        let err = CodecError::Rejected(self.message.clone());
        async move { Err(err) }
    }
}

/// [`JsonCodec`] that parks every call until [`release`](Self::release).
///
/// Lets tests cancel a session call while it is provably in flight.
#[derive(Debug, Clone)]
pub struct BlockingCodec {
    inner: JsonCodec,
    entered: Arc<Notify>,
    released: Arc<watch::Sender<bool>>,
}

impl Default for BlockingCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockingCodec {
    /// Codec that blocks until released.
    pub fn new() -> Self {
        let (released, _) = watch::channel(false);
        Self {
            inner: JsonCodec::new(),
            entered: Arc::new(Notify::new()),
            released: Arc::new(released),
        }
    }

    /// Resolves once some call is parked inside the codec.
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    /// Let parked and future calls through.
    pub fn release(&self) {
        self.released.send_replace(true);
    }

    async fn gate(&self) {
        self.entered.notify_one();
        let mut rx = self.released.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|open| *open).await;
    }
}

impl SourceCodec for BlockingCodec {
    fn serialize(&self, ir: &NotebookIr) -> impl Future<Output = Result<String, CodecError>> + Send {
        async move {
            self.gate().await;
            self.inner.serialize(ir).await
        }
    }

    fn deserialize(&self, source: &str) -> impl Future<Output = Result<NotebookIr, CodecError>> + Send {
        async move {
            self.gate().await;
            self.inner.deserialize(source).await
        }
    }
}
