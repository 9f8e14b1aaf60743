use std::collections::HashSet;

use airtime_core::allocation::{AllocationKind, AllocationList};
use airtime_core::request::{AllocationInfo, Tspec};
use rand::rngs::StdRng;
use rand::RngExt as _;
use rand::SeedableRng;

use crate::event::{RequestAction, RequestEvent};

/// Allocation ids handed out per (source, destination) pair.
const MAX_ALLOCATION_ID: u8 = 7;

/// Bounds for random request generation.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub seed: u64,
    /// Stations are numbered 1..=stations.
    pub stations: u8,
    pub requests_per_interval: u32,
    pub min_duration_us: u32,
    pub max_duration_us: u32,
    /// Share of new allocations that survive rollover.
    pub persistent_ratio: f64,
    /// Share of requests that modify an existing allocation.
    pub modify_ratio: f64,
    /// Share of requests that remove an existing allocation.
    pub remove_ratio: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            stations: 8,
            requests_per_interval: 6,
            min_duration_us: 1_000,
            max_duration_us: 12_000,
            persistent_ratio: 0.5,
            modify_ratio: 0.25,
            remove_ratio: 0.1,
        }
    }
}

/// Deterministic request stream.
///
/// Given a seed, produces reproducible batches of requests. Modify and
/// remove requests only target allocations present when the batch is
/// planned, each at most once per batch, and new allocations never reuse a
/// live (id, source, destination) key, so a batch never trips the
/// scheduler's contract checks.
#[derive(Debug)]
pub struct RequestGenerator {
    cfg: GeneratorConfig,
    rng: StdRng,
}

impl RequestGenerator {
    pub fn new(cfg: GeneratorConfig) -> Self {
        let rng = StdRng::seed_from_u64(cfg.seed);
        Self { cfg, rng }
    }

    /// Requests to deliver during the interval starting at `start_us`.
    pub fn plan(
        &mut self,
        current: &AllocationList,
        start_us: u64,
        beacon_interval_us: u64,
    ) -> Vec<(u64, RequestEvent)> {
        let mut live: HashSet<(u8, u8, u8)> = current
            .iter()
            .map(|r| (r.id, r.source_id, r.destination_id))
            .collect();
        let mut touched = HashSet::new();
        let mut batch = Vec::new();

        for _ in 0..self.cfg.requests_per_interval {
            let at = start_us + self.below(beacon_interval_us.max(1));
            let candidates: Vec<_> = current
                .iter()
                .filter(|r| !r.kind.is_filler())
                .filter(|r| !touched.contains(&(r.id, r.source_id, r.destination_id)))
                .copied()
                .collect();

            let roll = self.rng.random::<f64>();
            let event = if roll < self.cfg.remove_ratio && !candidates.is_empty() {
                let target = candidates[self.below(candidates.len() as u64) as usize];
                touched.insert((target.id, target.source_id, target.destination_id));
                RequestEvent {
                    action: RequestAction::Remove,
                    source_id: target.source_id,
                    tspec: Tspec::default(),
                    info: info_of(target.id, target.kind, target.destination_id, target.persistent),
                }
            } else if roll < self.cfg.remove_ratio + self.cfg.modify_ratio && !candidates.is_empty() {
                let target = candidates[self.below(candidates.len() as u64) as usize];
                touched.insert((target.id, target.source_id, target.destination_id));
                RequestEvent {
                    action: RequestAction::Modify,
                    source_id: target.source_id,
                    tspec: self.tspec(),
                    info: info_of(target.id, target.kind, target.destination_id, target.persistent),
                }
            } else {
                let source_id = 1 + self.below(u64::from(self.cfg.stations.max(1))) as u8;
                let destination_id = if self.cfg.stations > 1 {
                    source_id % self.cfg.stations + 1
                } else {
                    0
                };
                let Some(id) = (1..=MAX_ALLOCATION_ID)
                    .find(|id| !live.contains(&(*id, source_id, destination_id)))
                else {
                    continue;
                };
                live.insert((id, source_id, destination_id));
                let kind = if self.rng.random::<bool>() {
                    AllocationKind::Isochronous
                } else {
                    AllocationKind::Asynchronous
                };
                let persistent = self.rng.random::<f64>() < self.cfg.persistent_ratio;
                RequestEvent {
                    action: RequestAction::Add,
                    source_id,
                    tspec: self.tspec(),
                    info: info_of(id, kind, destination_id, persistent),
                }
            };
            batch.push((at, event));
        }

        batch.sort_by_key(|(at, _)| *at);
        batch
    }

    fn tspec(&mut self) -> Tspec {
        let lo = self.cfg.min_duration_us;
        let span = self.cfg.max_duration_us.saturating_sub(lo);
        let min = lo + self.below(u64::from(span) + 1) as u32;
        let max = min + self.below(u64::from(span) + 1) as u32;
        Tspec::new(min, max)
    }

    fn below(&mut self, bound: u64) -> u64 {
        self.rng.random::<u64>() % bound
    }
}

fn info_of(id: u8, kind: AllocationKind, destination_id: u8, persistent: bool) -> AllocationInfo {
    AllocationInfo {
        id,
        kind,
        destination_id,
        persistent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airtime_core::allocation::AllocationRecord;

    fn cfg(seed: u64) -> GeneratorConfig {
        GeneratorConfig {
            seed,
            requests_per_interval: 20,
            ..GeneratorConfig::default()
        }
    }

    #[test]
    fn generator_is_deterministic_for_seed() {
        let list = AllocationList::new(100_000);
        let a = RequestGenerator::new(cfg(42)).plan(&list, 0, 102_400);
        let b = RequestGenerator::new(cfg(42)).plan(&list, 0, 102_400);
        assert_eq!(a, b);
        let c = RequestGenerator::new(cfg(43)).plan(&list, 0, 102_400);
        assert_ne!(a, c);
    }

    #[test]
    fn empty_list_yields_adds_only_within_interval() {
        let list = AllocationList::new(100_000);
        let batch = RequestGenerator::new(cfg(7)).plan(&list, 204_800, 102_400);
        assert!(!batch.is_empty());
        for (at, event) in &batch {
            assert!((204_800..307_200).contains(at));
            assert_eq!(event.action, RequestAction::Add);
            assert!((1..=8).contains(&event.source_id));
            assert_ne!(event.source_id, event.info.destination_id);
        }
        assert!(batch.windows(2).all(|w| w[0].0 <= w[1].0));
    }

    #[test]
    fn existing_allocations_are_targeted_at_most_once() {
        let mut list = AllocationList::new(100_000);
        list.append(AllocationRecord {
            id: 1,
            kind: AllocationKind::Isochronous,
            persistent: true,
            source_id: 3,
            destination_id: 4,
            start: 0,
            duration: 1000,
        })
        .unwrap();
        let mut generator = RequestGenerator::new(GeneratorConfig {
            modify_ratio: 0.5,
            remove_ratio: 0.5,
            ..cfg(9)
        });
        let batch = generator.plan(&list, 0, 102_400);
        let targeting: Vec<_> = batch
            .iter()
            .filter(|(_, e)| e.action != RequestAction::Add)
            .collect();
        assert_eq!(targeting.len(), 1);
        let adds_reusing_key = batch.iter().filter(|(_, e)| {
            e.action == RequestAction::Add
                && e.source_id == 3
                && e.info.id == 1
                && e.info.destination_id == 4
        });
        assert_eq!(adds_reusing_key.count(), 0);
    }
}
