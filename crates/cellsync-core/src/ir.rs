// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Intermediate representation exchanged with the source codec.
//!
//! The IR is the flat `{code, name, options}` form of a notebook. It is what
//! the external language runtime assembles into (and disassembles from) the
//! source file, so every field here crosses a process boundary as JSON.

use crate::model::Options;
use serde::{Deserialize, Serialize};

/// App-level instantiation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppInstantiation {
    /// Opaque options passed to the app constructor.
    #[serde(default)]
    pub options: Options,
}

/// Free-form header preceding the app definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Header {
    /// Raw header text.
    pub value: String,
}

/// Source-level definition of one cell.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CellDef {
    /// Full source code of the cell, in its wrapped form.
    pub code: String,
    /// Cell name; `None` means unnamed.
    #[serde(default)]
    pub name: Option<String>,
    /// Cell options; `None` means empty.
    #[serde(default)]
    pub options: Option<Options>,
}

impl CellDef {
    /// Unnamed cell definition with no options.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: None,
            options: None,
        }
    }
}

/// Structural problem found while disassembling a source file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Violation {
    /// Human-readable description.
    pub description: String,
    /// 1-based line of the offending construct.
    #[serde(default)]
    pub lineno: u32,
    /// 0-based column of the offending construct.
    #[serde(default)]
    pub col_offset: u32,
}

/// Complete notebook in IR form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotebookIr {
    /// App instantiation settings.
    #[serde(default)]
    pub app: AppInstantiation,
    /// Optional header.
    #[serde(default)]
    pub header: Option<Header>,
    /// Version of the writing tool, if stamped.
    #[serde(default)]
    pub version: Option<String>,
    /// Ordered cell definitions.
    #[serde(default)]
    pub cells: Vec<CellDef>,
    /// Structural violations.
    #[serde(default)]
    pub violations: Vec<Violation>,
    /// Whether the source parsed into a well-formed app.
    #[serde(default = "default_valid")]
    pub valid: bool,
}

impl Default for NotebookIr {
    fn default() -> Self {
        Self {
            app: AppInstantiation::default(),
            header: None,
            version: None,
            cells: Vec::new(),
            violations: Vec::new(),
            valid: true,
        }
    }
}

fn default_valid() -> bool {
    true
}
