//! Progress Calculator
//!
//! Pure derivation of the 0-100% completion figure. Every stage carries
//! equal weight (`100 / total`); a case that has fully completed N stages
//! and is partway through stage N+1 scores the completed share plus the
//! checklist ratio's share of the current stage.

/// Deterministic, side-effect free. `completed_stage_count >= total_stages`
/// saturates at 100.
pub fn compute_progress(
    completed_stage_count: u32,
    total_stages: u32,
    current_stage_checklist_ratio: f64,
) -> f64 {
    if total_stages == 0 {
        return 0.0;
    }
    if completed_stage_count >= total_stages {
        return 100.0;
    }

    let stage_weight = 100.0 / total_stages as f64;
    let ratio = current_stage_checklist_ratio.clamp(0.0, 1.0);
    let progress = completed_stage_count as f64 * stage_weight + ratio * stage_weight;

    progress.clamp(0.0, 100.0)
}
