// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! User-visible notices: a TTL + dedupe queue and the port that feeds it.
//!
//! The session never talks to a host UI directly. It reports through
//! [`NoticePort`]; [`NoticeBoard`] is the in-process implementation host
//! adapters drain on their own tick.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Notice severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// Informational note.
    Info,
    /// Something degraded but the operation went on.
    Warn,
    /// Operation failed; the user should know.
    Error,
}

/// Identifier for a queued notice.
pub type NoticeId = u64;

/// Queued notice.
#[derive(Debug, Clone)]
pub struct Notice {
    /// Stable identifier.
    pub id: NoticeId,
    /// Severity.
    pub kind: NoticeKind,
    /// Short title line.
    pub title: String,
    /// Optional detail text.
    pub body: Option<String>,
    /// Time-to-live.
    pub ttl: Duration,
    /// Creation (or last refresh) time.
    pub created: Instant,
}

/// In-memory notice queue with TTL and a dedupe window.
#[derive(Debug)]
pub struct NoticeQueue {
    queue: VecDeque<Notice>,
    max: usize,
    dedupe_window: Duration,
    next_id: NoticeId,
}

impl NoticeQueue {
    /// Create a queue holding at most `max` notices.
    pub fn new(max: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            max: max.max(1),
            dedupe_window: Duration::from_millis(500),
            next_id: 1,
        }
    }

    /// Push a notice. An identical notice pushed within the dedupe window is
    /// refreshed instead of duplicated.
    pub fn push<S, B>(&mut self, kind: NoticeKind, title: S, body: B, ttl: Duration, now: Instant) -> NoticeId
    where
        S: Into<String>,
        B: Into<Option<String>>,
    {
        let title = title.into();
        let body = body.into();

        if let Some(existing) = self.queue.iter_mut().find(|n| {
            n.kind == kind
                && n.title == title
                && n.body == body
                && now.saturating_duration_since(n.created) <= self.dedupe_window
        }) {
            existing.created = now;
            existing.ttl = ttl;
            return existing.id;
        }

        let id = self.next_id;
        self.next_id += 1;
        if self.queue.len() == self.max {
            self.queue.pop_front();
        }
        self.queue.push_back(Notice {
            id,
            kind,
            title,
            body,
            ttl,
            created: now,
        });
        id
    }

    /// Drop expired notices.
    pub fn retain_visible(&mut self, now: Instant) {
        self.queue
            .retain(|n| now.saturating_duration_since(n.created) < n.ttl);
    }

    /// Notices still within their TTL, oldest first.
    pub fn visible(&self, now: Instant) -> Vec<Notice> {
        self.queue
            .iter()
            .filter(|n| now.saturating_duration_since(n.created) < n.ttl)
            .cloned()
            .collect()
    }

    /// Number of queued notices, expired or not.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// `true` when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Port the session reports user-visible outcomes through.
pub trait NoticePort: Send + Sync {
    /// Report a notice. Best effort; must not block.
    fn notify(&self, kind: NoticeKind, title: &str, body: Option<&str>);
}

/// Shared, clonable [`NoticeQueue`] implementing [`NoticePort`].
#[derive(Debug, Clone)]
pub struct NoticeBoard {
    inner: Arc<Mutex<NoticeQueue>>,
    ttl: Duration,
}

impl NoticeBoard {
    /// Board holding at most `max` notices, each visible for `ttl`.
    pub fn new(max: usize, ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(NoticeQueue::new(max))),
            ttl,
        }
    }

    /// Visible notices as of `now`.
    pub fn visible(&self, now: Instant) -> Vec<Notice> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .visible(now)
    }

    /// Drop expired notices as of `now`.
    pub fn retain_visible(&self, now: Instant) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .retain_visible(now);
    }
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::new(16, Duration::from_secs(8))
    }
}

impl NoticePort for NoticeBoard {
    fn notify(&self, kind: NoticeKind, title: &str, body: Option<&str>) {
        let mut queue = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        queue.push(kind, title, body.map(str::to_owned), self.ttl, Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_notices_within_window_are_deduped() {
        let mut q = NoticeQueue::new(4);
        let t0 = Instant::now();
        let ttl = Duration::from_secs(5);
        let a = q.push(NoticeKind::Error, "save failed", None, ttl, t0);
        let b = q.push(NoticeKind::Error, "save failed", None, ttl, t0 + Duration::from_millis(100));
        assert_eq!(a, b);
        assert_eq!(q.len(), 1);

        let c = q.push(NoticeKind::Error, "save failed", None, ttl, t0 + Duration::from_secs(2));
        assert_ne!(a, c);
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn oldest_notice_is_dropped_at_capacity() {
        let mut q = NoticeQueue::new(2);
        let now = Instant::now();
        let ttl = Duration::from_secs(5);
        q.push(NoticeKind::Info, "one", None, ttl, now);
        q.push(NoticeKind::Info, "two", None, ttl, now);
        q.push(NoticeKind::Info, "three", None, ttl, now);
        let titles: Vec<_> = q.visible(now).into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["two", "three"]);
    }

    #[test]
    fn expired_notices_disappear() {
        let mut q = NoticeQueue::new(2);
        let now = Instant::now();
        q.push(NoticeKind::Warn, "w", Some("detail".to_owned()), Duration::from_millis(10), now);
        assert_eq!(q.visible(now).len(), 1);
        let later = now + Duration::from_millis(20);
        assert!(q.visible(later).is_empty());
        q.retain_visible(later);
        assert!(q.is_empty());
    }

    #[test]
    fn board_is_shared_between_clones() {
        let board = NoticeBoard::default();
        let port: Box<dyn NoticePort> = Box::new(board.clone());
        port.notify(NoticeKind::Error, "failed", Some("see logs"));
        let seen = board.visible(Instant::now());
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].kind, NoticeKind::Error);
        assert_eq!(seen[0].body.as_deref(), Some("see logs"));
    }
}
