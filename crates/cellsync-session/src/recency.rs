// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Most-recently-touched document index and cell snapshot side cache.
//!
//! Guesses which known document a bare byte blob belongs to. Touches are
//! serialized by a mutex; readers copy out and may miss a touch that lands
//! concurrently, but never see a half-updated entry. No lock is held across
//! an `.await`.

use crate::reader::DocumentReader;
use crate::registry::DocumentRegistry;
use cellsync_app_core::prefs::SessionPrefs;
use cellsync_core::{Cell, DocumentId, StableId};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

/// Probe and retention policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecencyPolicy {
    /// Documents considered by the match operations.
    pub window: usize,
    /// Documents allowed to keep a cell snapshot.
    pub snapshot_capacity: usize,
    /// Per-candidate bound on a content probe.
    pub probe_timeout: Duration,
}

impl RecencyPolicy {
    /// Policy taken from session prefs.
    pub fn from_prefs(prefs: &SessionPrefs) -> Self {
        Self {
            window: prefs.recency_window,
            snapshot_capacity: prefs.snapshot_capacity,
            probe_timeout: prefs.probe_timeout(),
        }
    }
}

impl Default for RecencyPolicy {
    fn default() -> Self {
        Self::from_prefs(&SessionPrefs::default())
    }
}

#[derive(Debug, Default)]
struct Inner {
    next_seq: u64,
    // seq -> document; the largest seq is the most recent touch.
    order: BTreeMap<u64, DocumentId>,
    seq_of: HashMap<DocumentId, u64>,
    snapshots: HashMap<DocumentId, Vec<Cell>>,
}

impl Inner {
    fn touch(&mut self, id: &DocumentId) {
        if let Some(old) = self.seq_of.remove(id) {
            self.order.remove(&old);
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.insert(seq, id.clone());
        self.seq_of.insert(id.clone(), seq);
    }

    fn take(&self, limit: usize) -> Vec<DocumentId> {
        self.order.values().rev().take(limit).cloned().collect()
    }

    fn evict_snapshots(&mut self, capacity: usize) {
        if self.snapshots.is_empty() {
            return;
        }
        let keep: HashSet<&DocumentId> = self.order.values().rev().take(capacity).collect();
        self.snapshots.retain(|id, _| keep.contains(id));
    }
}

/// Shared recency index plus the last serialized cells per document.
#[derive(Debug, Default)]
pub struct RecencyCache {
    inner: Mutex<Inner>,
    policy: RecencyPolicy,
}

impl RecencyCache {
    /// Empty cache governed by `policy`.
    pub fn new(policy: RecencyPolicy) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            policy,
        }
    }

    /// Active policy.
    pub fn policy(&self) -> RecencyPolicy {
        self.policy
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Move `id` to the most-recent position.
    pub fn touch(&self, id: &DocumentId) {
        let mut inner = self.lock();
        inner.touch(id);
        inner.evict_snapshots(self.policy.snapshot_capacity);
    }

    /// Up to `limit` documents, most recent first.
    pub fn take(&self, limit: usize) -> Vec<DocumentId> {
        self.lock().take(limit)
    }

    /// Drop `id` and its snapshot.
    pub fn forget(&self, id: &DocumentId) {
        let mut inner = self.lock();
        if let Some(seq) = inner.seq_of.remove(id) {
            inner.order.remove(&seq);
        }
        inner.snapshots.remove(id);
    }

    /// Number of tracked documents.
    pub fn len(&self) -> usize {
        self.lock().order.len()
    }

    /// `true` when nothing has been touched.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remember the cells last serialized for `id` and touch it.
    pub fn record_snapshot(&self, id: &DocumentId, cells: Vec<Cell>) {
        let mut inner = self.lock();
        inner.snapshots.insert(id.clone(), cells);
        inner.touch(id);
        inner.evict_snapshots(self.policy.snapshot_capacity);
    }

    /// Last serialized cells of `id`.
    pub fn snapshot(&self, id: &DocumentId) -> Option<Vec<Cell>> {
        self.lock().snapshots.get(id).cloned()
    }

    /// Number of retained snapshots.
    pub fn snapshot_count(&self) -> usize {
        self.lock().snapshots.len()
    }

    /// First recent document whose on-disk bytes equal `bytes`.
    ///
    /// Candidates whose read fails or outlasts the probe timeout simply do
    /// not match. Non-UTF-8 input never matches.
    pub async fn match_by_content<R: DocumentReader>(&self, bytes: &[u8], reader: &R) -> Option<DocumentId> {
        let text = std::str::from_utf8(bytes).ok()?;
        let candidates = self.take(self.policy.window);
        for id in candidates {
            match tokio::time::timeout(self.policy.probe_timeout, reader.read(&id)).await {
                Ok(Ok(on_disk)) if on_disk == text.as_bytes() => {
                    debug!(document = %id, "content probe matched");
                    return Some(id);
                }
                Ok(Ok(_)) => {}
                Ok(Err(err)) => warn!(document = %id, %err, "content probe read failed"),
                Err(_) => warn!(
                    document = %id,
                    timeout_ms = self.policy.probe_timeout.as_millis(),
                    "content probe timed out"
                ),
            }
        }
        None
    }

    /// First recent open document sharing any stable id with `cells`.
    pub fn match_by_stable_ids(&self, cells: &[Cell], registry: &DocumentRegistry) -> Option<DocumentId> {
        let ids: HashSet<&StableId> = cells.iter().map(|c| &c.id).collect();
        if ids.is_empty() {
            return None;
        }
        self.take(self.policy.window)
            .into_iter()
            .find(|doc| registry.shares_any_id(doc, &ids))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellsync_core::{CellKind, Document, LanguageTag};

    fn doc_id(n: usize) -> DocumentId {
        DocumentId::new(format!("doc-{n}"))
    }

    fn cell(id: &str) -> Cell {
        Cell::new(StableId::new(id), CellKind::Code, LanguageTag::GenericCode, id)
    }

    #[test]
    fn take_is_most_recent_first_and_bounded() {
        let cache = RecencyCache::default();
        for n in 0..10 {
            cache.touch(&doc_id(n));
        }
        assert_eq!(cache.take(5), (5..10).rev().map(doc_id).collect::<Vec<_>>());

        cache.touch(&doc_id(2));
        let top = cache.take(5);
        assert_eq!(top[0], doc_id(2));
        assert_eq!(top[1..], [doc_id(9), doc_id(8), doc_id(7), doc_id(6)]);
        assert_eq!(cache.len(), 10);
    }

    #[test]
    fn take_zero_and_empty_are_empty() {
        let cache = RecencyCache::default();
        assert!(cache.take(5).is_empty());
        cache.touch(&doc_id(0));
        assert!(cache.take(0).is_empty());
    }

    #[test]
    fn snapshots_are_evicted_outside_capacity() {
        let cache = RecencyCache::new(RecencyPolicy {
            snapshot_capacity: 2,
            ..RecencyPolicy::default()
        });
        for n in 0..3 {
            cache.record_snapshot(&doc_id(n), vec![cell("a")]);
        }
        assert_eq!(cache.snapshot_count(), 2);
        assert!(cache.snapshot(&doc_id(0)).is_none());
        assert!(cache.snapshot(&doc_id(2)).is_some());

        // Touching other documents pushes snapshots out too.
        cache.touch(&doc_id(7));
        cache.touch(&doc_id(8));
        assert_eq!(cache.snapshot_count(), 0);
    }

    #[test]
    fn evicted_snapshot_does_not_come_back_on_retouch() {
        let cache = RecencyCache::new(RecencyPolicy {
            snapshot_capacity: 2,
            ..RecencyPolicy::default()
        });
        cache.record_snapshot(&doc_id(1), vec![cell("a")]);
        assert_eq!(cache.snapshot_count(), 1);

        cache.touch(&doc_id(2));
        cache.touch(&doc_id(3));
        assert!(cache.snapshot(&doc_id(1)).is_none());

        cache.touch(&doc_id(1));
        assert!(cache.snapshot(&doc_id(1)).is_none());
    }

    #[test]
    fn forget_drops_order_and_snapshot() {
        let cache = RecencyCache::default();
        cache.record_snapshot(&doc_id(1), vec![cell("a")]);
        cache.forget(&doc_id(1));
        assert!(cache.is_empty());
        assert!(cache.snapshot(&doc_id(1)).is_none());
    }

    #[test]
    fn stable_id_match_requires_an_intersection() {
        let cache = RecencyCache::default();
        let reg = DocumentRegistry::new();
        reg.open(
            doc_id(1),
            Document {
                cells: vec![cell("a"), cell("b")],
                ..Document::default()
            },
        );
        cache.touch(&doc_id(1));
        cache.touch(&doc_id(2));

        assert_eq!(cache.match_by_stable_ids(&[cell("b")], &reg), Some(doc_id(1)));
        assert_eq!(cache.match_by_stable_ids(&[cell("zz")], &reg), None);
        assert_eq!(cache.match_by_stable_ids(&[], &reg), None);
    }
}
