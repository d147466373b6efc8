// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Async notebook serializer session for cellsync.
//!
//! Sits between a host notebook editor and the external source codec:
//! bytes come in through [`NotebookSession::deserialize`], cells go out
//! through [`NotebookSession::serialize`], and the recency cache carries
//! stable ids and outputs across the round-trip.
#![forbid(unsafe_code)]

pub mod codec;
pub mod process_codec;
pub mod reader;
pub mod recency;
pub mod registry;
pub mod session;
pub mod telemetry;

pub use codec::{CodecError, SourceCodec};
pub use process_codec::CommandCodec;
pub use reader::{DocumentReader, FsDocumentReader};
pub use recency::{RecencyCache, RecencyPolicy};
pub use registry::DocumentRegistry;
pub use session::{NotebookSession, Operation, SessionError};
pub use telemetry::{init_tracing, init_tracing_from_prefs};
