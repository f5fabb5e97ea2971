//! Transition records
//!
//! Every move of a case between stages is recorded as an immutable,
//! append-only `Transition`. The chain of `to_stage_code` values folded
//! left reconstructs the case's current stage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of a stage transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionKind {
    /// To the next stage in catalog order
    Forward,
    /// To an earlier stage, undoing forward progress
    Backward,
    /// Administrative override to an arbitrary stage
    Jump,
}

impl std::fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Forward => write!(f, "forward"),
            Self::Backward => write!(f, "backward"),
            Self::Jump => write!(f, "jump"),
        }
    }
}

/// One recorded move of a case. Never updated or deleted; corrections are
/// modeled as new compensating transitions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transition {
    pub id: Uuid,
    pub case_id: Uuid,
    /// None for the initial entry into the first stage.
    pub from_stage_code: Option<String>,
    pub to_stage_code: String,
    pub kind: TransitionKind,
    pub reason: String,
    /// Required for backward transitions.
    pub observations: Option<String>,
    pub actor_id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Days the case spent in `from_stage_code` before this transition.
    pub duration_in_prior_stage_days: Option<i64>,
}

/// Replay a case's transition history to its current stage code.
///
/// Transitions must be ordered oldest first. Returns `None` for an empty
/// history (a case that was never created).
pub fn fold_current_stage(transitions: &[Transition]) -> Option<&str> {
    transitions
        .iter()
        .fold(None, |_, t| Some(t.to_stage_code.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transition(to: &str, kind: TransitionKind) -> Transition {
        Transition {
            id: Uuid::new_v4(),
            case_id: Uuid::new_v4(),
            from_stage_code: None,
            to_stage_code: to.to_string(),
            kind,
            reason: "test".to_string(),
            observations: None,
            actor_id: Uuid::new_v4(),
            created_at: Utc::now(),
            duration_in_prior_stage_days: None,
        }
    }

    #[test]
    fn test_fold_empty_history() {
        assert_eq!(fold_current_stage(&[]), None);
    }

    #[test]
    fn test_fold_follows_last_transition() {
        let history = vec![
            transition("REVIEW", TransitionKind::Forward),
            transition("LEGAL", TransitionKind::Forward),
            transition("REVIEW", TransitionKind::Backward),
        ];
        assert_eq!(fold_current_stage(&history), Some("REVIEW"));
    }
}
