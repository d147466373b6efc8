// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared application services for cellsync (config, prefs, notices).
//! Keeps host adapters thin and editor-agnostic.

pub mod config;
pub mod notice;
pub mod prefs;
