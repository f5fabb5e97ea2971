//! Timeline Recorder
//!
//! Case-scoped, append-only event log. Every transition, checklist change,
//! assignment change and status change lands here with actor and timestamp.
//! No update or delete exists; corrections are new compensating entries.
//! Entries are hash-chained per case so recorded history is tamper-evident.

use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use expropia_models::{timeline, TimelineEntry, TimelineEvent, Transition, TransitionKind};

#[derive(Clone)]
pub struct TimelineRecorder {
    entries: Arc<RwLock<HashMap<Uuid, Vec<TimelineEntry>>>>,
}

impl TimelineRecorder {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Append an event, assigning id, timestamp and chain hash.
    pub async fn append(
        &self,
        case_id: Uuid,
        actor_id: Uuid,
        event: TimelineEvent,
    ) -> TimelineEntry {
        let mut entries = self.entries.write().await;
        let case_entries = entries.entry(case_id).or_default();
        let previous_hash = case_entries.last().map(|e| e.hash.clone());

        let entry = TimelineEntry::new(case_id, actor_id, event, previous_hash);
        case_entries.push(entry.clone());
        entry
    }

    /// Full timeline, oldest first.
    pub async fn history(&self, case_id: Uuid) -> Vec<TimelineEntry> {
        let entries = self.entries.read().await;
        entries.get(&case_id).cloned().unwrap_or_default()
    }

    /// Transition records only, oldest first.
    pub async fn transitions(&self, case_id: Uuid) -> Vec<Transition> {
        self.history(case_id)
            .await
            .iter()
            .filter_map(|e| e.transition().cloned())
            .collect()
    }

    /// Backward transitions inside the window, oldest first. Surfaced to
    /// operators as a thrashing signal; never used to block.
    pub async fn recent_returns(&self, case_id: Uuid, within_days: i64) -> Vec<Transition> {
        let cutoff = Utc::now() - Duration::days(within_days);
        self.transitions(case_id)
            .await
            .into_iter()
            .filter(|t| t.kind == TransitionKind::Backward && t.created_at >= cutoff)
            .collect()
    }

    /// True when the case went backward more often than forward inside the
    /// window. The initial entry does not count as an advance.
    pub async fn thrash_warning(&self, case_id: Uuid, within_days: i64) -> bool {
        let cutoff = Utc::now() - Duration::days(within_days);
        let transitions = self.transitions(case_id).await;

        let mut forward = 0usize;
        let mut backward = 0usize;
        for t in transitions.iter().filter(|t| t.created_at >= cutoff) {
            match t.kind {
                TransitionKind::Forward if t.from_stage_code.is_some() => forward += 1,
                TransitionKind::Backward => backward += 1,
                _ => {}
            }
        }
        backward > forward
    }

    /// Verify the case's hash chain end to end.
    pub async fn verify_chain(&self, case_id: Uuid) -> bool {
        timeline::verify_chain(&self.history(case_id).await)
    }
}

impl Default for TimelineRecorder {
    fn default() -> Self {
        Self::new()
    }
}
