//! Stage catalog domain models for the Expropia expropriation workflow.
//!
//! A stage is one ordered step of the expropriation process, owned by a
//! responsible department. Stages are catalog-defined and immutable at
//! runtime; cases reference them by `code`, never by sequence number, so
//! reordering the catalog can never change the meaning of recorded history.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// One ordered step of the expropriation workflow.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct Stage {
    /// Stable unique key, e.g. `"APPRAISAL"`. Identifies the stage in all
    /// recorded transitions.
    #[validate(length(min = 1, max = 50, message = "Stage code is required"))]
    pub code: String,
    #[validate(length(min = 1, max = 255, message = "Stage name is required"))]
    pub name: String,
    /// Strictly increasing, unique and contiguous across an active catalog.
    pub sequence_order: u32,
    pub responsible_department: String,
    pub estimated_duration_days: u32,
    pub is_active: bool,
    /// Catalog-defined checklist items instantiated per case when the
    /// checklist for this stage is first touched.
    pub checklist_template: Vec<ChecklistItemTemplate>,
}

/// Catalog-level definition of a checklist item for a stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChecklistItemTemplate {
    pub label: String,
    pub required: bool,
}

impl Stage {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        sequence_order: u32,
        responsible_department: impl Into<String>,
        estimated_duration_days: u32,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            sequence_order,
            responsible_department: responsible_department.into(),
            estimated_duration_days,
            is_active: true,
            checklist_template: Vec::new(),
        }
    }

    pub fn with_checklist(mut self, items: Vec<ChecklistItemTemplate>) -> Self {
        self.checklist_template = items;
        self
    }
}

impl ChecklistItemTemplate {
    pub fn required(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            required: true,
        }
    }

    pub fn optional(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            required: false,
        }
    }
}
