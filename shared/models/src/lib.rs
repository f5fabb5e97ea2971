//! # Expropia Core Domain Models
//!
//! Core domain models for the Expropia expropriation case workflow system.
//! All models implement serialization with serde; catalog types carry
//! validation rules from the validator crate.
//!
//! ## Key Models
//!
//! - **Stage**: one catalog-defined step of the expropriation workflow
//! - **ChecklistItem**: a case-scoped completion condition for a stage
//! - **CaseWorkflowState**: a case's current position, status and progress
//! - **Transition**: an immutable record of a move between stages
//! - **TimelineEntry**: hash-chained append-only audit event
//!
//! The transition history is the source of truth: `fold_current_stage`
//! replays it to the state the engine maintains incrementally.

pub mod case;
pub mod checklist;
pub mod notification;
pub mod stage;
pub mod timeline;
pub mod transition;

#[cfg(test)]
pub mod property_tests;

pub use case::{CaseStatus, CaseWorkflowState};
pub use checklist::{completion_ratio, may_advance, ChecklistItem};
pub use notification::TransitionNotification;
pub use stage::{ChecklistItemTemplate, Stage};
pub use timeline::{verify_chain, TimelineEntry, TimelineEvent};
pub use transition::{fold_current_stage, Transition, TransitionKind};
