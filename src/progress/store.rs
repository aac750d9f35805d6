//! In-memory progress store for polled sessions.
//!
//! A hosting layer opens one session per request, hands the run a
//! [`SessionSink`], and serves [`ProgressStore::status`] and
//! [`ProgressStore::outcome`] to pollers. Nothing is persisted.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::debug;

use crate::pipeline::RunOutcome;
use crate::progress::event::{ProgressEvent, ProgressSnapshot};
use crate::progress::session::{new_session_id, now_millis, PrunePolicy, SessionStatus};
use crate::progress::sink::ProgressSink;

#[derive(Debug, Clone, Serialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub topic: String,
    pub started_at_ms: u64,
    pub ended_at_ms: Option<u64>,
    pub status: SessionStatus,
    pub latest: ProgressSnapshot,
    pub events: Vec<ProgressEvent>,
    #[serde(skip)]
    pub outcome: Option<RunOutcome>,
}

#[derive(Default)]
pub struct ProgressStore {
    sessions: RwLock<HashMap<String, SessionRecord>>,
    retention: PrunePolicy,
}

impl ProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that applies `retention` every time a session finishes.
    pub fn with_retention(retention: PrunePolicy) -> Self {
        Self {
            sessions: RwLock::default(),
            retention,
        }
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register a new active session at 0% and return its id.
    pub fn open_session(&self, topic: &str) -> String {
        let session_id = new_session_id();
        let record = SessionRecord {
            session_id: session_id.clone(),
            topic: topic.to_string(),
            started_at_ms: now_millis(),
            ended_at_ms: None,
            status: SessionStatus::Active,
            latest: ProgressSnapshot::starting(),
            events: Vec::new(),
            outcome: None,
        };
        self.sessions.write().insert(session_id.clone(), record);
        session_id
    }

    /// Sink that records reports into `session_id`.
    pub fn sink(self: &Arc<Self>, session_id: &str) -> SessionSink {
        SessionSink {
            store: Arc::clone(self),
            session_id: session_id.to_string(),
        }
    }

    /// Reports for unknown sessions are dropped.
    pub fn record(&self, session_id: &str, event: ProgressEvent) {
        if let Some(record) = self.sessions.write().get_mut(session_id) {
            record.latest = ProgressSnapshot::from(&event);
            record.events.push(event);
        }
    }

    /// Store the terminal outcome without image bytes, then prune finished
    /// sessions by the store's retention. Returns `false` for unknown sessions.
    pub fn finish(&self, session_id: &str, mut outcome: RunOutcome) -> bool {
        outcome.release_image_data();
        {
            let mut sessions = self.sessions.write();
            let Some(record) = sessions.get_mut(session_id) else {
                return false;
            };
            record.status = if outcome.is_success() {
                SessionStatus::Completed
            } else {
                SessionStatus::Failed
            };
            record.ended_at_ms = Some(now_millis());
            record.outcome = Some(outcome);
        }
        let pruned = self.prune_finished(self.retention, now_millis());
        if pruned > 0 {
            debug!(pruned, "Pruned finished sessions");
        }
        true
    }

    /// Latest snapshot, or a "Session not found" snapshot at 0%.
    pub fn status(&self, session_id: &str) -> ProgressSnapshot {
        self.sessions
            .read()
            .get(session_id)
            .map(|record| record.latest.clone())
            .unwrap_or_else(ProgressSnapshot::not_found)
    }

    pub fn events(&self, session_id: &str) -> Vec<ProgressEvent> {
        self.events_after(session_id, 0)
    }

    /// Events past the first `seen` ones, for incremental polling.
    pub fn events_after(&self, session_id: &str, seen: usize) -> Vec<ProgressEvent> {
        self.sessions
            .read()
            .get(session_id)
            .map(|record| record.events.iter().skip(seen).cloned().collect())
            .unwrap_or_default()
    }

    /// Terminal outcome; `None` while the run is active or for unknown sessions.
    pub fn outcome(&self, session_id: &str) -> Option<RunOutcome> {
        self.sessions
            .read()
            .get(session_id)
            .and_then(|record| record.outcome.clone())
    }

    pub fn get_session(&self, session_id: &str) -> Option<SessionRecord> {
        self.sessions.read().get(session_id).cloned()
    }

    /// All sessions, newest first.
    pub fn list_sessions(&self) -> Vec<SessionRecord> {
        let mut out: Vec<SessionRecord> = self.sessions.read().values().cloned().collect();
        out.sort_by_key(|s| std::cmp::Reverse(s.started_at_ms));
        out
    }

    /// Drop finished sessions older than `max_age_ms`, then keep only the
    /// `max_completed` most recently finished ones. Active sessions are never pruned.
    pub fn prune_finished(&self, policy: PrunePolicy, now_ms: u64) -> usize {
        let mut sessions = self.sessions.write();
        let before = sessions.len();

        sessions.retain(|_, s| {
            if !s.status.is_finished() {
                return true;
            }
            let ended = s.ended_at_ms.unwrap_or(s.started_at_ms);
            now_ms.saturating_sub(ended) <= policy.max_age_ms
        });

        let mut finished: Vec<(String, u64)> = sessions
            .values()
            .filter(|s| s.status.is_finished())
            .map(|s| (s.session_id.clone(), s.ended_at_ms.unwrap_or(s.started_at_ms)))
            .collect();
        finished.sort_by_key(|(_, ended)| std::cmp::Reverse(*ended));
        for (session_id, _) in finished.into_iter().skip(policy.max_completed) {
            sessions.remove(&session_id);
        }

        before - sessions.len()
    }
}

/// [`ProgressSink`] bound to one session of a [`ProgressStore`].
#[derive(Clone)]
pub struct SessionSink {
    store: Arc<ProgressStore>,
    session_id: String,
}

impl SessionSink {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

impl ProgressSink for SessionSink {
    fn report(&self, percent: u8, message: &str) {
        self.store
            .record(&self.session_id, ProgressEvent::now(percent, message));
    }
}
