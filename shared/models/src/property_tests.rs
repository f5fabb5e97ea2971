//! Property-based tests for Expropia core domain models
//!
//! Validates universal properties across the domain models: serialization
//! round-trip consistency, timeline hash-chain integrity, and the
//! fold-reconstruction guarantee for transition history.

use chrono::{DateTime, TimeZone, Utc};
use proptest::option;
use proptest::prelude::*;
use uuid::Uuid;

use crate::case::{CaseStatus, CaseWorkflowState};
use crate::checklist::{completion_ratio, may_advance, ChecklistItem};
use crate::timeline::{verify_chain, TimelineEntry, TimelineEvent};
use crate::transition::{fold_current_stage, Transition, TransitionKind};

prop_compose! {
    fn arb_datetime()(timestamp in 0i64..2147483647i64) -> DateTime<Utc> {
        Utc.timestamp_opt(timestamp, 0).unwrap()
    }
}

prop_compose! {
    fn arb_uuid()(bytes in prop::array::uniform16(0u8..)) -> Uuid {
        Uuid::from_bytes(bytes)
    }
}

prop_compose! {
    fn arb_stage_code()(code in "[A-Z]{4,12}") -> String {
        code
    }
}

fn arb_kind() -> impl Strategy<Value = TransitionKind> {
    prop_oneof![
        Just(TransitionKind::Forward),
        Just(TransitionKind::Backward),
        Just(TransitionKind::Jump),
    ]
}

fn arb_status() -> impl Strategy<Value = CaseStatus> {
    prop_oneof![
        Just(CaseStatus::Active),
        Just(CaseStatus::Suspended),
        Just(CaseStatus::Cancelled),
        Just(CaseStatus::Completed),
    ]
}

prop_compose! {
    fn arb_transition()(
        id in arb_uuid(),
        case_id in arb_uuid(),
        from_stage_code in option::of(arb_stage_code()),
        to_stage_code in arb_stage_code(),
        kind in arb_kind(),
        reason in "[a-zA-Z ]{10,60}",
        observations in option::of("[a-zA-Z ]{20,80}"),
        actor_id in arb_uuid(),
        created_at in arb_datetime(),
        duration in option::of(0i64..3650)
    ) -> Transition {
        Transition {
            id,
            case_id,
            from_stage_code,
            to_stage_code,
            kind,
            reason,
            observations,
            actor_id,
            created_at,
            duration_in_prior_stage_days: duration,
        }
    }
}

prop_compose! {
    fn arb_checklist_item()(
        id in arb_uuid(),
        case_id in arb_uuid(),
        stage_code in arb_stage_code(),
        label in "[a-zA-Z ]{5,40}",
        required in any::<bool>(),
        completed in any::<bool>(),
        completed_by in option::of(arb_uuid()),
        completed_at in option::of(arb_datetime())
    ) -> ChecklistItem {
        ChecklistItem {
            id,
            case_id,
            stage_code,
            label,
            required,
            completed,
            completed_by,
            completed_at,
        }
    }
}

prop_compose! {
    fn arb_case_state()(
        case_id in arb_uuid(),
        current_stage_code in arb_stage_code(),
        status in arb_status(),
        progress in 0.0..=100.0f64,
        department in "[A-Z]{4,10}",
        started_at in arb_datetime(),
        entered_stage_at in arb_datetime(),
        completed_at in option::of(arb_datetime()),
        updated_at in arb_datetime()
    ) -> CaseWorkflowState {
        CaseWorkflowState {
            case_id,
            current_stage_code,
            status,
            progress_percentage: progress,
            department_id: department,
            started_at,
            entered_stage_at,
            completed_at,
            updated_at,
        }
    }
}

proptest! {
    #[test]
    fn transition_serde_round_trip(transition in arb_transition()) {
        let json = serde_json::to_string(&transition).unwrap();
        let back: Transition = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(transition, back);
    }

    #[test]
    fn case_state_serde_round_trip(state in arb_case_state()) {
        let json = serde_json::to_string(&state).unwrap();
        let back: CaseWorkflowState = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(state, back);
    }

    #[test]
    fn checklist_item_serde_round_trip(item in arb_checklist_item()) {
        let json = serde_json::to_string(&item).unwrap();
        let back: ChecklistItem = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(item, back);
    }

    /// Folding any non-empty history yields the last transition's target.
    #[test]
    fn fold_reconstructs_last_target(history in prop::collection::vec(arb_transition(), 1..20)) {
        let expected = history.last().unwrap().to_stage_code.clone();
        prop_assert_eq!(fold_current_stage(&history), Some(expected.as_str()));
    }

    /// A checklist with no required items never blocks advancement.
    #[test]
    fn no_required_items_always_advances(
        mut items in prop::collection::vec(arb_checklist_item(), 0..10)
    ) {
        for item in &mut items {
            item.required = false;
        }
        prop_assert!(may_advance(&items));
    }

    /// Completing every item drives the ratio to exactly 1.0 and opens the gate.
    #[test]
    fn all_completed_means_full_ratio(
        mut items in prop::collection::vec(arb_checklist_item(), 1..10)
    ) {
        for item in &mut items {
            item.completed = true;
        }
        prop_assert_eq!(completion_ratio(&items), 1.0);
        prop_assert!(may_advance(&items));
    }

    /// The completion ratio is always inside [0, 1].
    #[test]
    fn ratio_is_bounded(items in prop::collection::vec(arb_checklist_item(), 0..15)) {
        let ratio = completion_ratio(&items);
        prop_assert!((0.0..=1.0).contains(&ratio));
    }

    /// A chain built link by link always verifies; truncating its tail
    /// still verifies (append-only prefixes are valid chains).
    #[test]
    fn hash_chain_prefixes_verify(
        case_id in arb_uuid(),
        actor_id in arb_uuid(),
        transitions in prop::collection::vec(arb_transition(), 1..8),
        cut in 0usize..8
    ) {
        let mut entries: Vec<TimelineEntry> = Vec::new();
        for t in transitions {
            let previous_hash = entries.last().map(|e: &TimelineEntry| e.hash.clone());
            entries.push(TimelineEntry::new(
                case_id,
                actor_id,
                TimelineEvent::Transition(t),
                previous_hash,
            ));
        }
        prop_assert!(verify_chain(&entries));

        let cut = cut.min(entries.len());
        prop_assert!(verify_chain(&entries[..cut]));
    }
}
