//! Expropia Stage-Progression Engine
//!
//! Tracks an expropriation case's position in the departmental workflow,
//! validates and executes forward/backward/jump transitions, enforces
//! per-stage checklist gates, keeps an append-only hash-chained timeline,
//! and derives progress metrics for reporting and escalation.

pub mod catalog;
pub mod checklist;
pub mod engine;
pub mod notifier;
pub mod progress;
pub mod service;
pub mod timeline;

pub use catalog::StageCatalog;
pub use checklist::ChecklistGate;
pub use engine::{GateSnapshot, TransitionEngine, TransitionOutcome, TransitionRequest};
pub use notifier::NotificationDispatcher;
pub use progress::compute_progress;
pub use service::{CaseWorkflowService, HistoryView};
pub use timeline::TimelineRecorder;
