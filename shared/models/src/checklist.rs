//! Per-case checklist items
//!
//! Each stage of the catalog defines a checklist template; a case gets its
//! own instance of those items for each stage it passes through. A stage
//! with at least one required item blocks forward transitions until every
//! required item is completed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::stage::ChecklistItemTemplate;

/// Case-scoped instance of a catalog checklist item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChecklistItem {
    pub id: Uuid,
    pub case_id: Uuid,
    pub stage_code: String,
    pub label: String,
    pub required: bool,
    pub completed: bool,
    pub completed_by: Option<Uuid>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ChecklistItem {
    pub fn from_template(case_id: Uuid, stage_code: &str, template: &ChecklistItemTemplate) -> Self {
        Self {
            id: Uuid::new_v4(),
            case_id,
            stage_code: stage_code.to_string(),
            label: template.label.clone(),
            required: template.required,
            completed: false,
            completed_by: None,
            completed_at: None,
        }
    }

    pub fn set_completed(&mut self, completed: bool, actor_id: Uuid) {
        self.completed = completed;
        if completed {
            self.completed_by = Some(actor_id);
            self.completed_at = Some(Utc::now());
        } else {
            self.completed_by = None;
            self.completed_at = None;
        }
    }
}

/// Fraction of items completed for one stage of one case.
///
/// An empty checklist scores 0.0: nothing has been done in the stage yet.
/// Advance eligibility is a separate question answered by [`may_advance`],
/// which treats an empty checklist as passable.
pub fn completion_ratio(items: &[ChecklistItem]) -> f64 {
    if items.is_empty() {
        return 0.0;
    }
    let completed = items.iter().filter(|i| i.completed).count();
    completed as f64 / items.len() as f64
}

/// True iff every required item is completed. A stage with zero required
/// items is always advance-eligible.
pub fn may_advance(items: &[ChecklistItem]) -> bool {
    items.iter().filter(|i| i.required).all(|i| i.completed)
}
