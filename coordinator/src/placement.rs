/// Rack-aware shard placement (SPEC_FULL.md §4.2) and the placement index
/// that remembers, for every `(filename, shard_index)`, which renters hold
/// a copy. Placement descriptors own the renter id by value: if the renter
/// later disappears from membership, lookups simply come back empty rather
/// than dereferencing a stale pointer.
use dashmap::DashMap;
use log::info;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::collections::HashMap;

use crate::error::CoordinatorError;
use crate::membership::RenterRecord;

#[derive(Clone, Debug, Serialize)]
pub struct ShardPlacement {
    pub shard_index: usize,
    pub renter_ids: Vec<String>,
}

/// `(filename, shard_index) -> renter ids`, keyed flat for O(1) lookup
/// without nesting a second map per file.
pub struct PlacementIndex {
    table: DashMap<(String, usize), Vec<String>>,
    shard_counts: DashMap<String, usize>,
    payments: DashMap<String, f64>,
}

impl PlacementIndex {
    pub fn new() -> Self {
        Self {
            table: DashMap::new(),
            shard_counts: DashMap::new(),
            payments: DashMap::new(),
        }
    }

    /// Records the payment collected at upload time so it can be split
    /// among renters once retrieval is verified.
    pub fn set_payment(&self, filename: &str, payment: f64) {
        self.payments.insert(filename.to_string(), payment);
    }

    pub fn payment(&self, filename: &str) -> Option<f64> {
        self.payments.get(filename).map(|v| *v)
    }

    pub fn record(&self, filename: &str, shard_index: usize, renter_ids: Vec<String>) {
        self.table
            .insert((filename.to_string(), shard_index), renter_ids);
    }

    pub fn set_shard_count(&self, filename: &str, count: usize) {
        self.shard_counts.insert(filename.to_string(), count);
    }

    pub fn shard_count(&self, filename: &str) -> Option<usize> {
        self.shard_counts.get(filename).map(|v| *v)
    }

    pub fn renters_for(&self, filename: &str, shard_index: usize) -> Option<Vec<String>> {
        self.table
            .get(&(filename.to_string(), shard_index))
            .map(|v| v.clone())
    }

    pub fn remove_file(&self, filename: &str) {
        if let Some(count) = self.shard_counts.remove(filename).map(|(_, c)| c) {
            for i in 0..count {
                self.table.remove(&(filename.to_string(), i));
            }
        }
        self.payments.remove(filename);
    }

    pub fn all_renters_for_file(&self, filename: &str) -> Vec<String> {
        let mut ids = Vec::new();
        if let Some(count) = self.shard_count(filename) {
            for i in 0..count {
                if let Some(renters) = self.renters_for(filename, i) {
                    ids.extend(renters);
                }
            }
        }
        ids.sort();
        ids.dedup();
        ids
    }
}

/// Chooses `replication_factor` renters for one shard, following the
/// five-step algorithm: group live renters by rack, prefer one renter per
/// distinct rack (shuffled within each rack for even wear), then fill any
/// remaining slots at random from whatever renters are left.
pub fn select_renters_for_shard(
    live: &[RenterRecord],
    replication_factor: usize,
    rng: &mut impl Rng,
) -> Result<Vec<String>, CoordinatorError> {
    if live.is_empty() {
        return Err(CoordinatorError::NoRenters);
    }

    let mut by_rack: HashMap<u32, Vec<&RenterRecord>> = HashMap::new();
    for renter in live {
        by_rack.entry(renter.rack).or_default().push(renter);
    }

    let mut rack_ids: Vec<u32> = by_rack.keys().copied().collect();
    rack_ids.shuffle(rng);

    let mut chosen: Vec<String> = Vec::new();
    let mut used: std::collections::HashSet<String> = std::collections::HashSet::new();

    for rack in &rack_ids {
        if chosen.len() >= replication_factor {
            break;
        }
        let renters = by_rack.get_mut(rack).unwrap();
        renters.shuffle(rng);
        if let Some(pick) = renters.first() {
            chosen.push(pick.renter_id.clone());
            used.insert(pick.renter_id.clone());
        }
    }

    if chosen.len() < replication_factor {
        let mut remaining: Vec<&RenterRecord> = live
            .iter()
            .filter(|r| !used.contains(&r.renter_id))
            .collect();
        remaining.shuffle(rng);
        for renter in remaining {
            if chosen.len() >= replication_factor {
                break;
            }
            chosen.push(renter.renter_id.clone());
            used.insert(renter.renter_id.clone());
        }
    }

    info!(
        "Selected {} renter(s) for shard replication (wanted {})",
        chosen.len(),
        replication_factor
    );
    Ok(chosen)
}

/// Splits `total_bytes` into shard sizes close to `shard_target_bytes`,
/// clamped to `[min_shards, max_shards]`.
pub fn shard_count_for(total_bytes: u64, shard_target_bytes: u64, min_shards: usize, max_shards: usize) -> usize {
    if total_bytes == 0 {
        return min_shards;
    }
    let target = shard_target_bytes.max(1);
    let estimated = ((total_bytes + target - 1) / target) as usize;
    estimated.clamp(min_shards, max_shards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn record(id: &str, rack: u32) -> RenterRecord {
        RenterRecord {
            renter_id: id.to_string(),
            url: format!("http://{}", id),
            storage_available: 1_000_000,
            last_heartbeat: 0,
            rack,
            ledger_address: None,
        }
    }

    #[test]
    fn prefers_distinct_racks_before_filling_randomly() {
        let live = vec![
            record("a", 0),
            record("b", 1),
            record("c", 2),
            record("d", 0),
        ];
        let mut rng = StdRng::seed_from_u64(42);
        let chosen = select_renters_for_shard(&live, 3, &mut rng).unwrap();
        assert_eq!(chosen.len(), 3);
        let racks: std::collections::HashSet<u32> = chosen
            .iter()
            .map(|id| live.iter().find(|r| &r.renter_id == id).unwrap().rack)
            .collect();
        assert_eq!(racks.len(), 3, "expected one renter per rack when enough racks exist");
    }

    #[test]
    fn errors_when_no_renters_available() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = select_renters_for_shard(&[], 3, &mut rng).unwrap_err();
        assert!(matches!(err, CoordinatorError::NoRenters));
    }

    #[test]
    fn falls_back_to_fewer_than_replication_factor_when_short_on_renters() {
        let live = vec![record("a", 0)];
        let mut rng = StdRng::seed_from_u64(7);
        let chosen = select_renters_for_shard(&live, 3, &mut rng).unwrap();
        assert_eq!(chosen, vec!["a".to_string()]);
    }

    #[test]
    fn shard_count_respects_bounds() {
        assert_eq!(shard_count_for(0, 1024, 3, 10), 3);
        assert_eq!(shard_count_for(500, 1024, 3, 10), 3);
        assert_eq!(shard_count_for(1024 * 1024 * 50, 1024 * 1024, 3, 10), 10);
    }
}
