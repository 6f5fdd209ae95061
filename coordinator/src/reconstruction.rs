/// File <-> shard transcoding (SPEC_FULL.md §4.3-4.4): splitting an upload
/// into equal-size shards at distribution time, and reconstructing a file
/// from whichever replica answers first at download time.
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::CoordinatorError;
use crate::membership::Membership;
use crate::placement::{select_renters_for_shard, shard_count_for, PlacementIndex};
use crate::renter_client::RenterClient;

/// Splits `data` into `shard_count` contiguous, roughly-equal pieces. The
/// last shard absorbs the remainder so `shard_count` is exact even when
/// `data.len()` isn't evenly divisible.
pub fn split_into_shards(data: &[u8], shard_count: usize) -> Vec<Vec<u8>> {
    if shard_count == 0 {
        return Vec::new();
    }
    let base = data.len() / shard_count;
    let remainder = data.len() % shard_count;
    let mut shards = Vec::with_capacity(shard_count);
    let mut offset = 0;
    for i in 0..shard_count {
        let extra = if i < remainder { 1 } else { 0 };
        let len = base + extra;
        shards.push(data[offset..offset + len].to_vec());
        offset += len;
    }
    shards
}

/// Outcome of a single `distribute_file` call.
pub struct Distribution {
    pub shard_count: usize,
    /// The effective replication factor actually achieved, i.e.
    /// `min(replication_factor, live renter count)` as selected per shard.
    /// Reported back to the uploader instead of the static configured value,
    /// since a short renter pool silently caps how many copies exist.
    pub replication_factor: usize,
}

/// Computes the shard count for `total_bytes`, splits the file, picks
/// placements, and pushes every replica to its renter. Returns the number
/// of shards distributed and the effective replication factor achieved.
pub async fn distribute_file(
    data: &[u8],
    filename: &str,
    membership: &Membership,
    placement_index: &PlacementIndex,
    renter_client: &RenterClient,
    shard_target_bytes: u64,
    min_shards: usize,
    max_shards: usize,
    replication_factor: usize,
) -> Result<Distribution, CoordinatorError> {
    let shard_count = shard_count_for(data.len() as u64, shard_target_bytes, min_shards, max_shards);
    let shards = split_into_shards(data, shard_count);
    let live = membership.live_snapshot().await;
    if live.is_empty() {
        return Err(CoordinatorError::NoRenters);
    }

    let mut rng = StdRng::from_entropy();
    let mut effective_replication_factor = replication_factor;

    for (index, shard) in shards.iter().enumerate() {
        let renter_ids = select_renters_for_shard(&live, replication_factor, &mut rng)?;
        effective_replication_factor = effective_replication_factor.min(renter_ids.len());
        let shard_name = format!("{}.shard{}", filename, index);

        let mut stored_on = Vec::new();
        for renter_id in &renter_ids {
            let renter = live.iter().find(|r| &r.renter_id == renter_id);
            let Some(renter) = renter else { continue };
            match renter_client
                .store_shard(&renter.url, &shard_name, shard.clone())
                .await
            {
                Ok(()) => stored_on.push(renter_id.clone()),
                Err(e) => warn!(
                    "Failed to store shard {} on renter {}: {}",
                    shard_name, renter_id, e
                ),
            }
        }

        if stored_on.is_empty() {
            return Err(CoordinatorError::UpstreamFail(format!(
                "no renter accepted shard {}",
                index
            )));
        }

        placement_index.record(filename, index, stored_on);
    }

    placement_index.set_shard_count(filename, shard_count);
    info!("Distributed {} into {} shard(s)", filename, shard_count);
    Ok(Distribution {
        shard_count,
        replication_factor: effective_replication_factor,
    })
}

/// Reassembles `filename` by fetching each shard from its first live,
/// responsive replica, in order. Fails if any shard has zero responsive
/// replicas.
pub async fn reconstruct_file(
    filename: &str,
    membership: &Membership,
    placement_index: &PlacementIndex,
    renter_client: &RenterClient,
) -> Result<Vec<u8>, CoordinatorError> {
    let shard_count = placement_index
        .shard_count(filename)
        .ok_or_else(|| CoordinatorError::NotFound(filename.to_string()))?;

    let mut assembled = Vec::new();
    for index in 0..shard_count {
        let renter_ids = placement_index
            .renters_for(filename, index)
            .ok_or_else(|| CoordinatorError::PartialRetrieval(format!("shard {} has no placement", index)))?;
        let shard_name = format!("{}.shard{}", filename, index);

        let mut retrieved = None;
        for renter_id in &renter_ids {
            let Some(renter) = membership.get(renter_id).await else {
                continue;
            };
            match renter_client.retrieve_shard(&renter.url, &shard_name).await {
                Ok(Some(bytes)) => {
                    retrieved = Some(bytes);
                    break;
                }
                Ok(None) => continue,
                Err(e) => {
                    warn!(
                        "Transport error fetching shard {} from renter {}: {}",
                        shard_name, renter_id, e
                    );
                    continue;
                }
            }
        }

        match retrieved {
            Some(bytes) => assembled.extend_from_slice(&bytes),
            None => {
                return Err(CoordinatorError::PartialRetrieval(format!(
                    "shard {} unavailable on every replica",
                    index
                )))
            }
        }
    }

    Ok(assembled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_covers_every_byte_exactly_once() {
        let data: Vec<u8> = (0..100u8).collect();
        let shards = split_into_shards(&data, 7);
        assert_eq!(shards.len(), 7);
        let reassembled: Vec<u8> = shards.into_iter().flatten().collect();
        assert_eq!(reassembled, data);
    }

    #[test]
    fn split_into_zero_shards_is_empty() {
        assert!(split_into_shards(b"anything", 0).is_empty());
    }
}
