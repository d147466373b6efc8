// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Port to the external source ⇄ IR codec.

use cellsync_core::NotebookIr;
use std::future::Future;
use thiserror::Error;

/// Converts between notebook source text and IR.
///
/// Both calls may be slow and are treated as cancellable: dropping the
/// returned future must abandon the work.
pub trait SourceCodec: Send + Sync {
    /// Assemble IR into source text.
    fn serialize(&self, ir: &NotebookIr) -> impl Future<Output = Result<String, CodecError>> + Send;

    /// Disassemble source text into IR.
    fn deserialize(&self, source: &str) -> impl Future<Output = Result<NotebookIr, CodecError>> + Send;
}

/// Failure at the codec boundary.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The codec process could not be started.
    #[error("failed to start codec `{program}`: {source}")]
    Spawn {
        /// Program that was spawned.
        program: String,
        /// Underlying spawn error.
        #[source]
        source: std::io::Error,
    },
    /// I/O error talking to the codec.
    #[error("codec io error: {0}")]
    Io(#[from] std::io::Error),
    /// Request or response was not valid JSON for the expected shape.
    #[error("malformed codec payload: {0}")]
    Payload(#[from] serde_json::Error),
    /// The codec process exited unsuccessfully.
    #[error("codec exited with {status}: {stderr}")]
    Exit {
        /// Exit status as reported by the OS.
        status: String,
        /// Captured stderr (trimmed).
        stderr: String,
    },
    /// The codec ran but rejected the input.
    #[error("codec rejected input: {0}")]
    Rejected(String),
    /// Catch-all error variant.
    #[error("other: {0}")]
    Other(String),
}
