use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::case::CaseStatus;
use crate::transition::Transition;

/// One append-only entry on a case's timeline.
///
/// Entries form a per-case hash chain: each entry's `previous_hash` is the
/// `hash` of the entry before it, so any tampering with recorded history is
/// detectable after the fact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineEntry {
    pub id: Uuid,
    pub case_id: Uuid,
    pub actor_id: Uuid,
    pub event: TimelineEvent,
    pub recorded_at: DateTime<Utc>,
    pub hash: String,
    pub previous_hash: Option<String>,
}

/// What happened. Covers stage transitions, checklist changes, assignment
/// changes and case status changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimelineEvent {
    Transition(Transition),
    ChecklistChanged {
        stage_code: String,
        item_id: Uuid,
        label: String,
        completed: bool,
        completion_ratio: f64,
    },
    AssignmentChanged {
        from_department: String,
        to_department: String,
    },
    StatusChanged {
        from: CaseStatus,
        to: CaseStatus,
        reason: String,
    },
}

impl TimelineEntry {
    /// Build a new chained entry. `previous_hash` must be the hash of the
    /// case's latest entry, or None for the first one.
    pub fn new(
        case_id: Uuid,
        actor_id: Uuid,
        event: TimelineEvent,
        previous_hash: Option<String>,
    ) -> Self {
        let recorded_at = Utc::now();
        let hash = Self::calculate_hash(case_id, &event, &recorded_at, previous_hash.as_deref());

        Self {
            id: Uuid::new_v4(),
            case_id,
            actor_id,
            event,
            recorded_at,
            hash,
            previous_hash,
        }
    }

    fn calculate_hash(
        case_id: Uuid,
        event: &TimelineEvent,
        recorded_at: &DateTime<Utc>,
        previous_hash: Option<&str>,
    ) -> String {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        hasher.update(case_id.as_bytes());
        hasher.update(serde_json::to_string(event).unwrap_or_default());
        hasher.update(recorded_at.to_rfc3339());
        if let Some(prev) = previous_hash {
            hasher.update(prev);
        }

        hex::encode(hasher.finalize())
    }

    /// Recompute the hash and compare against the stored one.
    pub fn verify_integrity(&self) -> bool {
        let calculated = Self::calculate_hash(
            self.case_id,
            &self.event,
            &self.recorded_at,
            self.previous_hash.as_deref(),
        );
        calculated == self.hash
    }

    pub fn transition(&self) -> Option<&Transition> {
        match &self.event {
            TimelineEvent::Transition(t) => Some(t),
            _ => None,
        }
    }
}

/// Verify a case's full chain: every entry's own hash plus the linkage to
/// the previous entry. Entries must be ordered oldest first.
pub fn verify_chain(entries: &[TimelineEntry]) -> bool {
    let mut previous: Option<&str> = None;
    for entry in entries {
        if !entry.verify_integrity() {
            return false;
        }
        if entry.previous_hash.as_deref() != previous {
            return false;
        }
        previous = Some(&entry.hash);
    }
    true
}
