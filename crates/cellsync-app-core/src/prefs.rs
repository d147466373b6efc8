// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Saved session preferences (recency policy, probe timeout, logging, codec).

use crate::config::{ConfigError, ConfigService, ConfigStore};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Preferences for a notebook session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionPrefs {
    /// How many recent documents are probed when guessing a document.
    pub recency_window: usize,
    /// How many recent documents keep a cell snapshot.
    pub snapshot_capacity: usize,
    /// Per-candidate timeout for on-disk content probes, in milliseconds.
    pub probe_timeout_ms: u64,
    /// Fallback `tracing` filter directive when `RUST_LOG` is unset.
    pub log_filter: String,
    /// External codec command.
    pub codec: CodecPrefs,
}

impl SessionPrefs {
    /// Config key the prefs are stored under.
    pub const KEY: &'static str = "session";

    /// Probe timeout as a [`Duration`].
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Load prefs from `config`, falling back to defaults when none are saved.
    pub fn load<S: ConfigStore>(config: &ConfigService<S>) -> Result<Self, ConfigError> {
        config.load_or_default(Self::KEY)
    }

    /// Persist prefs to `config`.
    pub fn save<S: ConfigStore>(&self, config: &ConfigService<S>) -> Result<(), ConfigError> {
        config.save(Self::KEY, self)
    }
}

impl Default for SessionPrefs {
    fn default() -> Self {
        Self {
            recency_window: 5,
            snapshot_capacity: 5,
            probe_timeout_ms: 2_000,
            log_filter: "info".to_owned(),
            codec: CodecPrefs::default(),
        }
    }
}

/// Command line of the external source codec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecPrefs {
    /// Program to spawn.
    pub program: String,
    /// Arguments passed before the request is written to stdin.
    pub args: Vec<String>,
}

impl Default for CodecPrefs {
    fn default() -> Self {
        Self {
            program: "cellsync-codec".to_owned(),
            args: Vec::new(),
        }
    }
}
