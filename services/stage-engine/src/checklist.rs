//! Checklist Gate
//!
//! Per-stage, per-case completion conditions. Items are instantiated from
//! the catalog stage's template the first time a case's checklist for that
//! stage is touched, then owned by the case. The gate answers two
//! questions: how far along is the stage (completion ratio) and may the
//! case advance out of it (all required items completed).

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use expropia_models::{checklist, ChecklistItem};
use expropia_utils::{ExpropiaError, ExpropiaResult};

use crate::catalog::StageCatalog;
use crate::engine::GateSnapshot;

type StageKey = (Uuid, String);

#[derive(Clone)]
pub struct ChecklistGate {
    catalog: Arc<StageCatalog>,
    items: Arc<RwLock<HashMap<StageKey, Vec<ChecklistItem>>>>,
}

impl ChecklistGate {
    pub fn new(catalog: Arc<StageCatalog>) -> Self {
        Self {
            catalog,
            items: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// The case's items for a stage, seeding from the catalog template on
    /// first access.
    pub async fn items_for_stage(
        &self,
        case_id: Uuid,
        stage_code: &str,
    ) -> ExpropiaResult<Vec<ChecklistItem>> {
        let stage = self.catalog.stage_by_code(stage_code)?;

        let key = (case_id, stage_code.to_string());
        {
            let items = self.items.read().await;
            if let Some(existing) = items.get(&key) {
                return Ok(existing.clone());
            }
        }

        let mut items = self.items.write().await;
        // Re-check after the lock upgrade; another task may have seeded
        let entry = items.entry(key).or_insert_with(|| {
            stage
                .checklist_template
                .iter()
                .map(|t| ChecklistItem::from_template(case_id, stage_code, t))
                .collect()
        });
        Ok(entry.clone())
    }

    pub async fn completion_ratio(&self, case_id: Uuid, stage_code: &str) -> ExpropiaResult<f64> {
        let items = self.items_for_stage(case_id, stage_code).await?;
        Ok(checklist::completion_ratio(&items))
    }

    pub async fn may_advance(&self, case_id: Uuid, stage_code: &str) -> ExpropiaResult<bool> {
        let items = self.items_for_stage(case_id, stage_code).await?;
        Ok(checklist::may_advance(&items))
    }

    /// Gate view for the transition engine: advance eligibility plus the
    /// count of required items still pending.
    pub async fn snapshot(&self, case_id: Uuid, stage_code: &str) -> ExpropiaResult<GateSnapshot> {
        let items = self.items_for_stage(case_id, stage_code).await?;
        let pending_required = items.iter().filter(|i| i.required && !i.completed).count();
        Ok(GateSnapshot {
            may_advance: pending_required == 0,
            pending_required,
        })
    }

    /// Flip one item and return it together with the stage's new ratio.
    /// Case-status enforcement is the service's concern; the gate only
    /// knows items.
    pub async fn toggle_item(
        &self,
        case_id: Uuid,
        item_id: Uuid,
        completed: bool,
        actor_id: Uuid,
    ) -> ExpropiaResult<(ChecklistItem, f64)> {
        let mut items = self.items.write().await;

        for ((owner, _), stage_items) in items.iter_mut() {
            if *owner != case_id {
                continue;
            }
            if let Some(item) = stage_items.iter_mut().find(|i| i.id == item_id) {
                item.set_completed(completed, actor_id);
                let updated = item.clone();
                let ratio = checklist::completion_ratio(stage_items);
                return Ok((updated, ratio));
            }
        }

        Err(ExpropiaError::not_found(format!(
            "checklist item {} for case {}",
            item_id, case_id
        )))
    }
}
