//! Case workflow state
//!
//! The mutable projection of a case's position in the workflow. Owned
//! exclusively by the engine's write path; never mutated directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaseStatus {
    /// Case is progressing through the workflow
    Active,
    /// Case is on hold; no transitions permitted until resumed
    Suspended,
    /// Case was cancelled before completion
    Cancelled,
    /// Case reached the terminal stage
    Completed,
}

impl CaseStatus {
    /// Check if a status change is valid
    pub fn can_transition_to(&self, target: CaseStatus) -> bool {
        use CaseStatus::*;

        match (self, target) {
            (Active, Suspended) => true,
            (Active, Cancelled) => true,
            (Active, Completed) => true,

            (Suspended, Active) => true,
            (Suspended, Cancelled) => true,

            // Terminal statuses cannot change
            (Completed, _) => false,
            (Cancelled, _) => false,

            _ => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CaseStatus::Completed | CaseStatus::Cancelled)
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(Self::Active),
            "suspended" => Some(Self::Suspended),
            "cancelled" | "canceled" => Some(Self::Cancelled),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

impl std::fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Suspended => write!(f, "suspended"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// One per case. Reconstructible at any time by folding the case's
/// transition history, but maintained incrementally by the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseWorkflowState {
    pub case_id: Uuid,
    pub current_stage_code: String,
    pub status: CaseStatus,
    /// 0..=100. Non-decreasing while only forward transitions occur;
    /// a backward transition may lower it.
    pub progress_percentage: f64,
    /// Department responsible for the current stage.
    pub department_id: String,
    pub started_at: DateTime<Utc>,
    /// When the case entered the current stage; basis for per-stage
    /// duration on the next transition out.
    pub entered_stage_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl CaseWorkflowState {
    /// Initial state for a case entering the catalog's first stage.
    pub fn new(case_id: Uuid, first_stage_code: impl Into<String>, department_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            case_id,
            current_stage_code: first_stage_code.into(),
            status: CaseStatus::Active,
            progress_percentage: 0.0,
            department_id: department_id.into(),
            started_at: now,
            entered_stage_at: now,
            completed_at: None,
            updated_at: now,
        }
    }

    pub fn days_in_current_stage(&self, now: DateTime<Utc>) -> i64 {
        (now - self.entered_stage_at).num_days()
    }

    pub fn days_in_process(&self, now: DateTime<Utc>) -> i64 {
        (now - self.started_at).num_days()
    }
}
