// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for cellsync crates.
//!
//! # Modules
//!
//! - [`cells`] - Cell, document and structurer builders
//! - [`codec`] - JSON, failing and blocking source codecs
//! - [`config`] - In-memory config store fake for testing without filesystem
//! - [`reader`] - In-memory document reader with failure/hang switches
//! - [`transformers`] - Markdown and SQL transformer fakes
#![forbid(unsafe_code)]

pub mod cells;
pub mod codec;
pub mod config;
pub mod reader;
pub mod transformers;

// Re-export commonly used items at crate root for convenience
pub use cells::{code_cell, document, markdown_cell, sql_cell, structurer, with_output};
pub use codec::{BlockingCodec, FailingCodec, JsonCodec, PINNED_VERSION};
pub use config::InMemoryConfigStore;
pub use reader::InMemoryDocumentReader;
pub use transformers::{transformers, FakeMarkdown, FakeSql};
