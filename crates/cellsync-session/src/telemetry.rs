// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `tracing` subscriber setup for hosts embedding the session.

use cellsync_app_core::prefs::SessionPrefs;
use tracing_subscriber::EnvFilter;

/// Build the filter: `RUST_LOG` when set and valid, else `fallback`, else `info`.
pub fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install a global fmt subscriber. Returns `false` if one was already set.
pub fn init_tracing(fallback: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(fallback))
        .with_target(false)
        .try_init()
        .is_ok()
}

/// [`init_tracing`] with the saved `log_filter` as the fallback.
pub fn init_tracing_from_prefs(prefs: &SessionPrefs) -> bool {
    init_tracing(&prefs.log_filter)
}
