//! Case Workflow Service
//!
//! Orchestrates the engine components behind a single write path. All
//! mutations for one case happen under that case's mutex: validate, append
//! to the timeline, swap the state projection, recompute progress - then
//! release the lock and dispatch the notification. Requests for different
//! cases run fully in parallel. Reads never take a case lock.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

use expropia_models::{
    CaseStatus, CaseWorkflowState, ChecklistItem, TimelineEntry, TimelineEvent, Transition,
    TransitionNotification,
};
use expropia_utils::{
    validate_reason_present, ExpropiaError, ExpropiaResult, WorkflowPolicyConfig,
};

use crate::catalog::StageCatalog;
use crate::checklist::ChecklistGate;
use crate::engine::{TransitionEngine, TransitionOutcome, TransitionRequest};
use crate::notifier::NotificationDispatcher;
use crate::timeline::TimelineRecorder;

/// Timeline plus the operational signals derived from it.
#[derive(Debug, Clone)]
pub struct HistoryView {
    pub entries: Vec<TimelineEntry>,
    pub thrash_warning: bool,
    pub chain_verified: bool,
}

#[derive(Clone)]
pub struct CaseWorkflowService {
    catalog: Arc<StageCatalog>,
    engine: Arc<TransitionEngine>,
    gate: ChecklistGate,
    timeline: TimelineRecorder,
    states: Arc<RwLock<HashMap<Uuid, CaseWorkflowState>>>,
    case_locks: Arc<RwLock<HashMap<Uuid, Arc<Mutex<()>>>>>,
    notifier: NotificationDispatcher,
    policy: WorkflowPolicyConfig,
}

impl CaseWorkflowService {
    pub fn new(
        catalog: Arc<StageCatalog>,
        policy: WorkflowPolicyConfig,
        notifier: NotificationDispatcher,
    ) -> Self {
        let engine = Arc::new(TransitionEngine::new(catalog.clone(), policy.clone()));
        let gate = ChecklistGate::new(catalog.clone());

        Self {
            catalog,
            engine,
            gate,
            timeline: TimelineRecorder::new(),
            states: Arc::new(RwLock::new(HashMap::new())),
            case_locks: Arc::new(RwLock::new(HashMap::new())),
            notifier,
            policy,
        }
    }

    pub fn catalog(&self) -> &StageCatalog {
        &self.catalog
    }

    async fn case_lock(&self, case_id: Uuid) -> Arc<Mutex<()>> {
        let mut locks = self.case_locks.write().await;
        locks
            .entry(case_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Create the workflow state for a new case: records the initial
    /// transition into the catalog's first stage.
    pub async fn create_case(
        &self,
        case_id: Uuid,
        actor_id: Uuid,
    ) -> ExpropiaResult<CaseWorkflowState> {
        let lock = self.case_lock(case_id).await;
        let _guard = lock.lock().await;

        if self.states.read().await.contains_key(&case_id) {
            return Err(ExpropiaError::concurrency_conflict(format!(
                "Case {} already has a workflow state",
                case_id
            )));
        }

        let outcome = self.engine.initial_entry(case_id, actor_id);
        self.apply_outcome(&outcome, actor_id, None).await;
        drop(_guard);

        info!(case_id = %case_id, stage = %outcome.new_state.current_stage_code, "Case workflow created");
        self.dispatch_notification(&outcome);
        Ok(outcome.new_state)
    }

    /// Execute a transition request. The atomic triad - transition record,
    /// state mutation, progress recompute - is applied under the case lock
    /// or not at all.
    pub async fn request_transition(
        &self,
        case_id: Uuid,
        request: TransitionRequest,
        actor_id: Uuid,
    ) -> ExpropiaResult<TransitionOutcome> {
        let lock = self.case_lock(case_id).await;
        let _guard = lock.lock().await;

        let state = self.state_snapshot(case_id).await?;
        let gate = self
            .gate
            .snapshot(case_id, &state.current_stage_code)
            .await?;
        let target_code = self.engine.target_stage_code(&state, &request)?;
        let target_ratio = self.gate.completion_ratio(case_id, &target_code).await?;

        let outcome = self
            .engine
            .evaluate(&state, &request, actor_id, gate, target_ratio, Utc::now())?;

        let previous_department = state.department_id.clone();
        self.apply_outcome(&outcome, actor_id, Some(previous_department))
            .await;
        drop(_guard);

        info!(
            case_id = %case_id,
            from = ?outcome.transition.from_stage_code,
            to = %outcome.transition.to_stage_code,
            kind = %outcome.transition.kind,
            "Transition executed"
        );
        self.dispatch_notification(&outcome);
        Ok(outcome)
    }

    /// Append the transition to the timeline and swap the state projection.
    /// Holds no locks of its own; callers hold the case lock.
    async fn apply_outcome(
        &self,
        outcome: &TransitionOutcome,
        actor_id: Uuid,
        previous_department: Option<String>,
    ) {
        let case_id = outcome.new_state.case_id;

        self.timeline
            .append(
                case_id,
                actor_id,
                TimelineEvent::Transition(outcome.transition.clone()),
            )
            .await;

        if let Some(from_department) = previous_department {
            if from_department != outcome.new_state.department_id {
                self.timeline
                    .append(
                        case_id,
                        actor_id,
                        TimelineEvent::AssignmentChanged {
                            from_department,
                            to_department: outcome.new_state.department_id.clone(),
                        },
                    )
                    .await;
            }
        }

        self.states
            .write()
            .await
            .insert(case_id, outcome.new_state.clone());
    }

    fn dispatch_notification(&self, outcome: &TransitionOutcome) {
        self.notifier.dispatch(TransitionNotification {
            case_id: outcome.new_state.case_id,
            from_stage: outcome.transition.from_stage_code.clone(),
            to_stage: outcome.transition.to_stage_code.clone(),
            kind: outcome.transition.kind,
            reason: outcome.transition.reason.clone(),
            actor_id: outcome.transition.actor_id,
            timestamp: outcome.transition.created_at,
            target_department: outcome.new_state.department_id.clone(),
        });
    }

    /// Explicit case-status action shared by cancel, suspend and resume.
    async fn change_status(
        &self,
        case_id: Uuid,
        target: CaseStatus,
        reason: String,
        actor_id: Uuid,
    ) -> ExpropiaResult<CaseWorkflowState> {
        validate_reason_present(&reason)?;

        let lock = self.case_lock(case_id).await;
        let _guard = lock.lock().await;

        let mut state = self.state_snapshot(case_id).await?;
        if !state.status.can_transition_to(target) {
            return Err(ExpropiaError::invalid_case_status(
                format!("a status that permits {}", target),
                state.status.to_string(),
            ));
        }

        let previous = state.status;
        state.status = target;
        state.updated_at = Utc::now();

        self.timeline
            .append(
                case_id,
                actor_id,
                TimelineEvent::StatusChanged {
                    from: previous,
                    to: target,
                    reason,
                },
            )
            .await;
        self.states.write().await.insert(case_id, state.clone());

        info!(case_id = %case_id, from = %previous, to = %target, "Case status changed");
        Ok(state)
    }

    pub async fn cancel_case(
        &self,
        case_id: Uuid,
        reason: String,
        actor_id: Uuid,
    ) -> ExpropiaResult<CaseWorkflowState> {
        self.change_status(case_id, CaseStatus::Cancelled, reason, actor_id)
            .await
    }

    pub async fn suspend_case(
        &self,
        case_id: Uuid,
        reason: String,
        actor_id: Uuid,
    ) -> ExpropiaResult<CaseWorkflowState> {
        self.change_status(case_id, CaseStatus::Suspended, reason, actor_id)
            .await
    }

    pub async fn resume_case(
        &self,
        case_id: Uuid,
        reason: String,
        actor_id: Uuid,
    ) -> ExpropiaResult<CaseWorkflowState> {
        self.change_status(case_id, CaseStatus::Active, reason, actor_id)
            .await
    }

    // ===== Read side =====

    async fn state_snapshot(&self, case_id: Uuid) -> ExpropiaResult<CaseWorkflowState> {
        self.states
            .read()
            .await
            .get(&case_id)
            .cloned()
            .ok_or_else(|| ExpropiaError::not_found(format!("case {}", case_id)))
    }

    pub async fn current_state(&self, case_id: Uuid) -> ExpropiaResult<CaseWorkflowState> {
        self.state_snapshot(case_id).await
    }

    pub async fn list_cases(&self) -> Vec<CaseWorkflowState> {
        let states = self.states.read().await;
        let mut cases: Vec<_> = states.values().cloned().collect();
        cases.sort_by_key(|s| s.started_at);
        cases
    }

    pub async fn history(&self, case_id: Uuid) -> ExpropiaResult<HistoryView> {
        self.state_snapshot(case_id).await?;

        let entries = self.timeline.history(case_id).await;
        let thrash_warning = self
            .timeline
            .thrash_warning(case_id, self.policy.recent_returns_window_days)
            .await;
        let chain_verified = self.timeline.verify_chain(case_id).await;

        Ok(HistoryView {
            entries,
            thrash_warning,
            chain_verified,
        })
    }

    pub async fn recent_returns(
        &self,
        case_id: Uuid,
        within_days: Option<i64>,
    ) -> ExpropiaResult<Vec<Transition>> {
        self.state_snapshot(case_id).await?;
        let window = within_days.unwrap_or(self.policy.recent_returns_window_days);
        Ok(self.timeline.recent_returns(case_id, window).await)
    }

    pub async fn get_checklist(
        &self,
        case_id: Uuid,
        stage_code: &str,
    ) -> ExpropiaResult<(Vec<ChecklistItem>, bool)> {
        self.state_snapshot(case_id).await?;
        let items = self.gate.items_for_stage(case_id, stage_code).await?;
        let may_advance = self.gate.may_advance(case_id, stage_code).await?;
        Ok((items, may_advance))
    }

    /// Toggle one checklist item. Requires an ACTIVE case; records a
    /// checklist-changed timeline event.
    pub async fn toggle_checklist_item(
        &self,
        case_id: Uuid,
        item_id: Uuid,
        completed: bool,
        actor_id: Uuid,
    ) -> ExpropiaResult<(ChecklistItem, f64)> {
        let lock = self.case_lock(case_id).await;
        let _guard = lock.lock().await;

        let state = self.state_snapshot(case_id).await?;
        if state.status != CaseStatus::Active {
            return Err(ExpropiaError::invalid_case_status(
                CaseStatus::Active.to_string(),
                state.status.to_string(),
            ));
        }

        let (item, ratio) = self
            .gate
            .toggle_item(case_id, item_id, completed, actor_id)
            .await?;

        self.timeline
            .append(
                case_id,
                actor_id,
                TimelineEvent::ChecklistChanged {
                    stage_code: item.stage_code.clone(),
                    item_id: item.id,
                    label: item.label.clone(),
                    completed: item.completed,
                    completion_ratio: ratio,
                },
            )
            .await;

        Ok((item, ratio))
    }
}
