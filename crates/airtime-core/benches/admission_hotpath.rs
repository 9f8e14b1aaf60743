//! Admission and finalization cost of the basic policy.
//!
//! - add_new_allocation() filling an interval with 64 reservations
//! - modify_existing_allocation() growing/shrinking the first reservation
//!   (worst case: every later slice shifts)
//! - finalize_interval() with and without inter-allocation fillers
//!
//! Run with: cargo bench --package airtime-core

use airtime_core::allocation::AllocationKind;
use airtime_core::policy::{AdmissionPolicy, BasicPolicy};
use airtime_core::request::{AllocationInfo, Tspec};
use airtime_core::SchedulerConfig;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn config(distance: u32) -> SchedulerConfig {
    SchedulerConfig {
        interval_length: 100_000,
        guard_time: 10,
        min_filler_budget: 4096,
        inter_allocation_distance: distance,
        ..SchedulerConfig::default()
    }
}

fn info(id: u8) -> AllocationInfo {
    AllocationInfo {
        id,
        kind: AllocationKind::Isochronous,
        destination_id: 1,
        persistent: false,
    }
}

fn filled(distance: u32) -> BasicPolicy {
    let mut policy = BasicPolicy::new(config(distance)).unwrap();
    for id in 0..64u8 {
        let _ = policy.add_new_allocation(id % 8, &Tspec::new(800, 1200), &info(id));
    }
    policy
}

fn bench_add(c: &mut Criterion) {
    c.bench_function("add_64_allocations", |b| {
        b.iter(|| black_box(filled(0)));
    });
}

fn bench_modify(c: &mut Criterion) {
    let mut policy = filled(0);
    let mut grow = true;
    c.bench_function("modify_first_allocation", |b| {
        b.iter(|| {
            let tspec = if grow {
                Tspec::new(900, 1300)
            } else {
                Tspec::new(800, 1200)
            };
            grow = !grow;
            black_box(policy.modify_existing_allocation(0, &tspec, &info(0)))
        });
    });
}

fn bench_finalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("finalize_interval");
    let plain = filled(0);
    group.bench_function("trailing_only", |b| {
        b.iter(|| black_box(plain.finalize_interval()));
    });
    let gapped = filled(20);
    group.bench_function("inter_allocation_20us", |b| {
        b.iter(|| black_box(gapped.finalize_interval()));
    });
    group.finish();
}

criterion_group!(benches, bench_add, bench_modify, bench_finalize);
criterion_main!(benches);
