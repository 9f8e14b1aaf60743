//! Property-based tests for the basic admission policy.
//!
//! Random add / modify / remove sequences are replayed against the policy
//! and the following are checked after every step:
//! - reservations stay packed, ordered and inside the interval
//! - a rejected or failed request changes nothing
//! - the trailing filler reserve (minimum filler plus its guard) is never
//!   breached
//! - whatever was accepted, finalization succeeds and tiles the interval

use airtime_core::allocation::AllocationKind;
use airtime_core::policy::{AdmissionPolicy, BasicPolicy};
use airtime_core::request::{AllocationInfo, StatusCode, Tspec};
use airtime_core::SchedulerConfig;
use proptest::prelude::*;

const INTERVAL: u32 = 20_000;
const GUARD: u32 = 10;
const MIN_FILLER: u32 = 1_000;

fn config(distance: u32) -> SchedulerConfig {
    SchedulerConfig {
        interval_length: INTERVAL,
        guard_time: GUARD,
        min_filler_budget: MIN_FILLER,
        inter_allocation_distance: distance,
        ..SchedulerConfig::default()
    }
}

#[derive(Debug, Clone)]
enum Op {
    Add(u8, Tspec, AllocationInfo),
    Modify(u8, Tspec, AllocationInfo),
    Remove(u8, AllocationInfo),
}

fn kind() -> impl Strategy<Value = AllocationKind> {
    prop_oneof![
        Just(AllocationKind::Isochronous),
        Just(AllocationKind::Asynchronous),
    ]
}

fn info() -> impl Strategy<Value = AllocationInfo> {
    (1u8..4, kind(), 1u8..3, any::<bool>()).prop_map(|(id, kind, destination_id, persistent)| {
        AllocationInfo {
            id,
            kind,
            destination_id,
            persistent,
        }
    })
}

fn tspec() -> impl Strategy<Value = Tspec> {
    (0u32..6_000, 0u32..8_000).prop_map(|(min, max)| Tspec::new(min, max))
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (1u8..4, tspec(), info()).prop_map(|(s, t, i)| Op::Add(s, t, i)),
        2 => (1u8..4, tspec(), info()).prop_map(|(s, t, i)| Op::Modify(s, t, i)),
        1 => (1u8..4, info()).prop_map(|(s, i)| Op::Remove(s, i)),
    ]
}

fn apply(policy: &mut BasicPolicy, op: &Op) -> Result<StatusCode, airtime_core::SchedulerError> {
    match op {
        Op::Add(s, t, i) => policy.add_new_allocation(*s, t, i),
        Op::Modify(s, t, i) => policy.modify_existing_allocation(*s, t, i),
        Op::Remove(s, i) => policy.remove_allocation(*s, i),
    }
}

fn assert_packed(policy: &BasicPolicy) -> Result<(), TestCaseError> {
    let mut expected_start = 0u32;
    for r in policy.allocations() {
        prop_assert_eq!(r.start, expected_start);
        prop_assert!(r.end() <= INTERVAL);
        expected_start = r.end() + GUARD;
    }
    let budget = policy.budget();
    prop_assert_eq!(budget.cursor(), expected_start);
    prop_assert_eq!(budget.remaining(), INTERVAL.saturating_sub(expected_start));
    Ok(())
}

proptest! {
    #[test]
    fn reservations_stay_packed(ops in prop::collection::vec(op(), 1..40)) {
        let mut policy = BasicPolicy::new(config(0)).unwrap();
        for op in &ops {
            let _ = apply(&mut policy, op);
            assert_packed(&policy)?;
            prop_assert!(policy.budget().remaining() >= MIN_FILLER + GUARD);
        }
    }

    #[test]
    fn rejection_changes_nothing(ops in prop::collection::vec(op(), 1..40)) {
        let mut policy = BasicPolicy::new(config(0)).unwrap();
        for op in &ops {
            let list = policy.allocations().clone();
            let budget = policy.budget();
            match apply(&mut policy, op) {
                Ok(StatusCode::Success) => {}
                Ok(StatusCode::Failure) | Err(_) => {
                    prop_assert_eq!(policy.allocations(), &list);
                    prop_assert_eq!(policy.budget(), budget);
                }
            }
        }
    }

    #[test]
    fn finalized_schedule_tiles_interval(
        ops in prop::collection::vec(op(), 1..40),
        distance in prop_oneof![Just(0u32), 10u32..400],
    ) {
        let mut policy = BasicPolicy::new(config(distance)).unwrap();
        for op in &ops {
            let _ = apply(&mut policy, op);
        }

        let finalized = policy.finalize_interval();
        prop_assert!(finalized.is_ok(), "finalize failed: {:?}", finalized);
        let schedule = finalized.unwrap();
        prop_assert_eq!(schedule.covered_time(), u64::from(INTERVAL));
        prop_assert!(schedule.is_contiguous());
        prop_assert!(schedule.filler_time() >= u64::from(MIN_FILLER));
        let reserved: Vec<_> = schedule
            .reserved()
            .map(|r| (r.id, r.source_id, r.duration))
            .collect();
        let requested: Vec<_> = policy
            .allocations()
            .iter()
            .map(|r| (r.id, r.source_id, r.duration))
            .collect();
        prop_assert_eq!(reserved, requested);
    }

    #[test]
    fn shrink_always_succeeds(
        durations in prop::collection::vec(1u32..2_000, 1..8),
        pick in any::<prop::sample::Index>(),
        shrink_by in 0u32..2_000,
    ) {
        let mut policy = BasicPolicy::new(config(0)).unwrap();
        for (idx, d) in durations.iter().enumerate() {
            let info = AllocationInfo {
                id: idx as u8 + 1,
                kind: AllocationKind::Asynchronous,
                destination_id: 1,
                persistent: false,
            };
            let _ = policy.add_new_allocation(1, &Tspec::minimum(*d), &info);
        }
        prop_assume!(!policy.allocations().is_empty());

        let index = pick.index(policy.allocations().len());
        let target = *policy.allocations().get(index).unwrap();
        let new_duration = target.duration.saturating_sub(shrink_by);
        let delta = target.duration - new_duration;
        let before: Vec<u32> = policy.allocations().iter().map(|r| r.start).collect();

        let info = AllocationInfo {
            id: target.id,
            kind: AllocationKind::Asynchronous,
            destination_id: target.destination_id,
            persistent: target.persistent,
        };
        let status = policy
            .modify_existing_allocation(target.source_id, &Tspec::minimum(new_duration), &info)
            .unwrap();
        prop_assert_eq!(status, StatusCode::Success);

        for (i, r) in policy.allocations().iter().enumerate() {
            if i <= index {
                prop_assert_eq!(r.start, before[i]);
            } else {
                prop_assert_eq!(r.start, before[i] - delta);
            }
        }
        prop_assert_eq!(policy.allocations().get(index).unwrap().duration, new_duration);
    }

    #[test]
    fn isochronous_grant_is_floor_of_midpoint(min in 0u32..5_000, extra in 0u32..5_000) {
        let mut policy = BasicPolicy::new(config(0)).unwrap();
        let info = AllocationInfo {
            id: 1,
            kind: AllocationKind::Isochronous,
            destination_id: 1,
            persistent: false,
        };
        let status = policy
            .add_new_allocation(1, &Tspec::new(min, min + extra), &info)
            .unwrap();
        prop_assert_eq!(status, StatusCode::Success);
        prop_assert_eq!(policy.allocations().get(0).unwrap().duration, (2 * min + extra) / 2);
    }
}
