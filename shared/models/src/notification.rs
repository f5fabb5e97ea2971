use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::transition::TransitionKind;

/// Event handed to the external notification dispatcher after a successful
/// transition. Fire-and-forget: delivery failures never reach the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransitionNotification {
    pub case_id: Uuid,
    pub from_stage: Option<String>,
    pub to_stage: String,
    pub kind: TransitionKind,
    pub reason: String,
    pub actor_id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Department that should be told about the new work.
    pub target_department: String,
}
