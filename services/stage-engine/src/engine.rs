//! Transition Engine
//!
//! The state machine core. Validates a requested move against the stage
//! catalog, the case's current state and the checklist gate, and produces
//! the transition record plus the successor state. Evaluation is pure: all
//! stores are read before, and written after, by the service's single write
//! path. A failed evaluation therefore has no side effects.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use expropia_models::{CaseStatus, CaseWorkflowState, Stage, Transition, TransitionKind};
use expropia_utils::{
    validate_observations, validate_reason, validate_reason_present, ExpropiaError,
    ExpropiaResult, WorkflowPolicyConfig,
};

use crate::catalog::StageCatalog;
use crate::progress::compute_progress;

/// A requested move. Each variant carries exactly the fields it needs:
/// FORWARD's target is implied by catalog order, BACKWARD and JUMP name
/// theirs explicitly.
#[derive(Debug, Clone)]
pub enum TransitionRequest {
    Forward {
        reason: String,
    },
    Backward {
        to_stage_code: String,
        reason: String,
        observations: String,
    },
    Jump {
        to_stage_code: String,
        reason: String,
    },
}

impl TransitionRequest {
    pub fn kind(&self) -> TransitionKind {
        match self {
            Self::Forward { .. } => TransitionKind::Forward,
            Self::Backward { .. } => TransitionKind::Backward,
            Self::Jump { .. } => TransitionKind::Jump,
        }
    }
}

/// Read-only view of the checklist gate for the case's current stage,
/// captured under the case lock before evaluation.
#[derive(Debug, Clone, Copy)]
pub struct GateSnapshot {
    pub may_advance: bool,
    pub pending_required: usize,
}

/// The two effects of a successful evaluation, to be applied atomically.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub transition: Transition,
    pub new_state: CaseWorkflowState,
}

pub struct TransitionEngine {
    catalog: Arc<StageCatalog>,
    policy: WorkflowPolicyConfig,
}

impl TransitionEngine {
    pub fn new(catalog: Arc<StageCatalog>, policy: WorkflowPolicyConfig) -> Self {
        Self { catalog, policy }
    }

    /// The initial entry of a freshly created case into the catalog's first
    /// stage. `from_stage_code` is None by construction.
    pub fn initial_entry(&self, case_id: Uuid, actor_id: Uuid) -> TransitionOutcome {
        let first = self.catalog.first_stage();
        let now = Utc::now();

        let transition = Transition {
            id: Uuid::new_v4(),
            case_id,
            from_stage_code: None,
            to_stage_code: first.code.clone(),
            kind: TransitionKind::Forward,
            reason: "Case created; entered initial stage".to_string(),
            observations: None,
            actor_id,
            created_at: now,
            duration_in_prior_stage_days: None,
        };

        let new_state =
            CaseWorkflowState::new(case_id, &first.code, &first.responsible_department);

        TransitionOutcome {
            transition,
            new_state,
        }
    }

    /// Resolve the stage a request targets without executing it. The
    /// service uses this to capture the target's checklist ratio before
    /// calling [`evaluate`](Self::evaluate). Rejects non-ACTIVE cases up
    /// front so a terminal case reports its status, not a sequencing error.
    pub fn target_stage_code(
        &self,
        state: &CaseWorkflowState,
        request: &TransitionRequest,
    ) -> ExpropiaResult<String> {
        if state.status != CaseStatus::Active {
            return Err(ExpropiaError::invalid_case_status(
                CaseStatus::Active.to_string(),
                state.status.to_string(),
            ));
        }

        match request {
            TransitionRequest::Forward { .. } => self
                .catalog
                .next_stage(&state.current_stage_code)?
                .map(|s| s.code.clone())
                .ok_or_else(|| {
                    ExpropiaError::sequence_violation(format!(
                        "Case is already at terminal stage '{}'",
                        state.current_stage_code
                    ))
                }),
            TransitionRequest::Backward { to_stage_code, .. }
            | TransitionRequest::Jump { to_stage_code, .. } => {
                self.catalog.stage_by_code(to_stage_code)?;
                Ok(to_stage_code.clone())
            }
        }
    }

    /// Validate a request against the current state and produce the
    /// transition record plus the successor state. No stores are touched.
    pub fn evaluate(
        &self,
        state: &CaseWorkflowState,
        request: &TransitionRequest,
        actor_id: Uuid,
        gate: GateSnapshot,
        target_stage_ratio: f64,
        now: DateTime<Utc>,
    ) -> ExpropiaResult<TransitionOutcome> {
        if state.status != CaseStatus::Active {
            return Err(ExpropiaError::invalid_case_status(
                CaseStatus::Active.to_string(),
                state.status.to_string(),
            ));
        }

        let current = self.catalog.stage_by_code(&state.current_stage_code)?;

        let (target, reason, observations) = match request {
            TransitionRequest::Forward { reason } => {
                validate_reason_present(reason)?;

                let next = self
                    .catalog
                    .next_stage(&current.code)?
                    .ok_or_else(|| {
                        ExpropiaError::sequence_violation(format!(
                            "Case is already at terminal stage '{}'",
                            current.code
                        ))
                    })?;

                if !gate.may_advance {
                    return Err(ExpropiaError::checklist_incomplete(
                        &current.code,
                        gate.pending_required,
                    ));
                }

                (next, reason.clone(), None)
            }
            TransitionRequest::Backward {
                to_stage_code,
                reason,
                observations,
            } => {
                validate_reason(reason, &self.policy)?;
                validate_observations(Some(observations.as_str()), &self.policy)?;

                let target = self.catalog.stage_by_code(to_stage_code)?;
                if target.sequence_order >= current.sequence_order {
                    return Err(ExpropiaError::sequence_violation(format!(
                        "Backward target '{}' (order {}) is not before current stage '{}' (order {})",
                        target.code, target.sequence_order, current.code, current.sequence_order
                    )));
                }

                (target, reason.clone(), Some(observations.clone()))
            }
            TransitionRequest::Jump {
                to_stage_code,
                reason,
            } => {
                validate_reason_present(reason)?;

                let target = self.catalog.stage_by_code(to_stage_code)?;
                if target.code == current.code {
                    return Err(ExpropiaError::sequence_violation(format!(
                        "Jump target '{}' is the current stage",
                        target.code
                    )));
                }

                (target, reason.clone(), None)
            }
        };

        Ok(self.build_outcome(
            state,
            current,
            target,
            request.kind(),
            reason,
            observations,
            actor_id,
            target_stage_ratio,
            now,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    fn build_outcome(
        &self,
        state: &CaseWorkflowState,
        current: &Stage,
        target: &Stage,
        kind: TransitionKind,
        reason: String,
        observations: Option<String>,
        actor_id: Uuid,
        target_stage_ratio: f64,
        now: DateTime<Utc>,
    ) -> TransitionOutcome {
        let duration_days = (now - state.entered_stage_at).num_days();

        let transition = Transition {
            id: Uuid::new_v4(),
            case_id: state.case_id,
            from_stage_code: Some(current.code.clone()),
            to_stage_code: target.code.clone(),
            kind,
            reason,
            observations,
            actor_id,
            created_at: now,
            duration_in_prior_stage_days: Some(duration_days),
        };

        let mut new_state = state.clone();
        new_state.current_stage_code = target.code.clone();
        new_state.department_id = target.responsible_department.clone();
        new_state.entered_stage_at = now;
        new_state.updated_at = now;

        // Only a FORWARD arrival at the terminal stage completes the case;
        // an administrative JUMP parks it there without closing it.
        if kind == TransitionKind::Forward && self.catalog.is_terminal(&target.code) {
            new_state.status = CaseStatus::Completed;
            new_state.completed_at = Some(now);
            new_state.progress_percentage = 100.0;
        } else {
            new_state.progress_percentage = compute_progress(
                target.sequence_order - 1,
                self.catalog.total_stages(),
                target_stage_ratio,
            );
        }

        TransitionOutcome {
            transition,
            new_state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use expropia_models::Stage;

    fn catalog() -> Arc<StageCatalog> {
        Arc::new(
            StageCatalog::new(vec![
                Stage::new("A", "Stage A", 1, "DEPT_A", 5),
                Stage::new("B", "Stage B", 2, "DEPT_B", 5),
                Stage::new("C", "Stage C", 3, "DEPT_C", 5),
            ])
            .unwrap(),
        )
    }

    fn engine() -> TransitionEngine {
        TransitionEngine::new(catalog(), WorkflowPolicyConfig::default())
    }

    fn open_gate() -> GateSnapshot {
        GateSnapshot {
            may_advance: true,
            pending_required: 0,
        }
    }

    fn active_state() -> CaseWorkflowState {
        CaseWorkflowState::new(Uuid::new_v4(), "A", "DEPT_A")
    }

    #[test]
    fn test_initial_entry() {
        let outcome = engine().initial_entry(Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(outcome.transition.from_stage_code, None);
        assert_eq!(outcome.transition.to_stage_code, "A");
        assert_eq!(outcome.new_state.progress_percentage, 0.0);
        assert_eq!(outcome.new_state.status, CaseStatus::Active);
    }

    #[test]
    fn test_forward_to_next_stage() {
        let state = active_state();
        let request = TransitionRequest::Forward {
            reason: "review complete".to_string(),
        };
        let outcome = engine()
            .evaluate(&state, &request, Uuid::new_v4(), open_gate(), 0.0, Utc::now())
            .unwrap();

        assert_eq!(outcome.transition.to_stage_code, "B");
        assert_eq!(outcome.transition.kind, TransitionKind::Forward);
        assert_eq!(outcome.new_state.current_stage_code, "B");
        assert_eq!(outcome.new_state.department_id, "DEPT_B");
        assert_eq!(outcome.new_state.status, CaseStatus::Active);
        assert!((outcome.new_state.progress_percentage - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_forward_blocked_by_checklist() {
        let state = active_state();
        let request = TransitionRequest::Forward {
            reason: "trying to advance".to_string(),
        };
        let gate = GateSnapshot {
            may_advance: false,
            pending_required: 2,
        };
        let err = engine()
            .evaluate(&state, &request, Uuid::new_v4(), gate, 0.0, Utc::now())
            .unwrap_err();
        assert_eq!(err.error_code(), "CHECKLIST_INCOMPLETE");
    }

    #[test]
    fn test_forward_requires_reason() {
        let state = active_state();
        let request = TransitionRequest::Forward {
            reason: "  ".to_string(),
        };
        let err = engine()
            .evaluate(&state, &request, Uuid::new_v4(), open_gate(), 0.0, Utc::now())
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_forward_into_terminal_completes_case() {
        let mut state = active_state();
        state.current_stage_code = "B".to_string();
        let request = TransitionRequest::Forward {
            reason: "final approval".to_string(),
        };
        let outcome = engine()
            .evaluate(&state, &request, Uuid::new_v4(), open_gate(), 0.0, Utc::now())
            .unwrap();

        assert_eq!(outcome.new_state.status, CaseStatus::Completed);
        assert_eq!(outcome.new_state.progress_percentage, 100.0);
        assert!(outcome.new_state.completed_at.is_some());
    }

    #[test]
    fn test_forward_at_terminal_stage_fails() {
        let mut state = active_state();
        state.current_stage_code = "C".to_string();
        let request = TransitionRequest::Forward {
            reason: "cannot go further".to_string(),
        };
        let err = engine()
            .evaluate(&state, &request, Uuid::new_v4(), open_gate(), 0.0, Utc::now())
            .unwrap_err();
        assert_eq!(err.error_code(), "SEQUENCE_VIOLATION");
    }

    #[test]
    fn test_non_active_case_rejected() {
        let mut state = active_state();
        state.status = CaseStatus::Completed;
        let request = TransitionRequest::Forward {
            reason: "should not matter".to_string(),
        };
        let err = engine()
            .evaluate(&state, &request, Uuid::new_v4(), open_gate(), 0.0, Utc::now())
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CASE_STATUS");
    }

    #[test]
    fn test_backward_requires_minimum_lengths() {
        let mut state = active_state();
        state.current_stage_code = "C".to_string();

        let short_reason = TransitionRequest::Backward {
            to_stage_code: "A".to_string(),
            reason: "short".to_string(),
            observations: "long enough observations here".to_string(),
        };
        let err = engine()
            .evaluate(&state, &short_reason, Uuid::new_v4(), open_gate(), 0.0, Utc::now())
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");

        let short_observations = TransitionRequest::Backward {
            to_stage_code: "A".to_string(),
            reason: "a valid ten char reason".to_string(),
            observations: "too short".to_string(),
        };
        let err = engine()
            .evaluate(
                &state,
                &short_observations,
                Uuid::new_v4(),
                open_gate(),
                0.0,
                Utc::now(),
            )
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_backward_to_earlier_stage() {
        let mut state = active_state();
        state.current_stage_code = "C".to_string();
        let request = TransitionRequest::Backward {
            to_stage_code: "A".to_string(),
            reason: "appraisal data was stale".to_string(),
            observations: "property boundaries changed since review".to_string(),
        };

        // Checklist never blocks a backward move
        let gate = GateSnapshot {
            may_advance: false,
            pending_required: 3,
        };
        let outcome = engine()
            .evaluate(&state, &request, Uuid::new_v4(), gate, 0.0, Utc::now())
            .unwrap();

        assert_eq!(outcome.transition.kind, TransitionKind::Backward);
        assert_eq!(outcome.new_state.current_stage_code, "A");
        assert_eq!(outcome.new_state.status, CaseStatus::Active);
        assert_eq!(outcome.new_state.progress_percentage, 0.0);
    }

    #[test]
    fn test_backward_to_later_stage_rejected() {
        let state = active_state();
        let request = TransitionRequest::Backward {
            to_stage_code: "C".to_string(),
            reason: "a valid ten char reason".to_string(),
            observations: "observations with the required length".to_string(),
        };
        let err = engine()
            .evaluate(&state, &request, Uuid::new_v4(), open_gate(), 0.0, Utc::now())
            .unwrap_err();
        assert_eq!(err.error_code(), "SEQUENCE_VIOLATION");
    }

    #[test]
    fn test_jump_ignores_ordering() {
        let state = active_state();
        let request = TransitionRequest::Jump {
            to_stage_code: "B".to_string(),
            reason: "administrative override".to_string(),
        };
        let outcome = engine()
            .evaluate(&state, &request, Uuid::new_v4(), open_gate(), 0.5, Utc::now())
            .unwrap();
        assert_eq!(outcome.transition.kind, TransitionKind::Jump);
        assert_eq!(outcome.new_state.current_stage_code, "B");
    }

    #[test]
    fn test_jump_into_terminal_does_not_complete() {
        let state = active_state();
        let request = TransitionRequest::Jump {
            to_stage_code: "C".to_string(),
            reason: "administrative override".to_string(),
        };
        let outcome = engine()
            .evaluate(&state, &request, Uuid::new_v4(), open_gate(), 0.0, Utc::now())
            .unwrap();
        assert_eq!(outcome.new_state.status, CaseStatus::Active);
        assert_eq!(outcome.new_state.current_stage_code, "C");
        assert!(outcome.new_state.completed_at.is_none());
    }

    #[test]
    fn test_jump_to_current_stage_rejected() {
        let state = active_state();
        let request = TransitionRequest::Jump {
            to_stage_code: "A".to_string(),
            reason: "no-op jump".to_string(),
        };
        let err = engine()
            .evaluate(&state, &request, Uuid::new_v4(), open_gate(), 0.0, Utc::now())
            .unwrap_err();
        assert_eq!(err.error_code(), "SEQUENCE_VIOLATION");
    }

    #[test]
    fn test_unknown_target_stage() {
        let mut state = active_state();
        state.current_stage_code = "B".to_string();
        let request = TransitionRequest::Backward {
            to_stage_code: "MISSING".to_string(),
            reason: "a valid ten char reason".to_string(),
            observations: "observations with the required length".to_string(),
        };
        let err = engine()
            .evaluate(&state, &request, Uuid::new_v4(), open_gate(), 0.0, Utc::now())
            .unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
    }

    #[test]
    fn test_duration_in_prior_stage() {
        let mut state = active_state();
        state.entered_stage_at = Utc::now() - chrono::Duration::days(12);
        let request = TransitionRequest::Forward {
            reason: "review complete".to_string(),
        };
        let outcome = engine()
            .evaluate(&state, &request, Uuid::new_v4(), open_gate(), 0.0, Utc::now())
            .unwrap();
        assert_eq!(outcome.transition.duration_in_prior_stage_days, Some(12));
    }
}
