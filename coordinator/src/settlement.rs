/// Renter payment on confirmed retrieval (SPEC_FULL.md §4.6). Mirrors the
/// reference server's post-verification payout loop, but pays each unique
/// renter id exactly once even if it holds replicas of more than one shard,
/// using the first ledger address recorded for that renter (Open Question
/// resolution, see SPEC_FULL.md §9).
use log::{info, warn};
use std::collections::HashMap;

use crate::placement::PlacementIndex;
use ledger::client::LedgerClient;

/// Splits `payment` evenly across every distinct renter that stored a
/// replica of `filename`, and sends each their share exactly once. Caller
/// supplies the renter id -> ledger address map up front since membership
/// lookups are async and this runs after the async reconstruction phase.
pub async fn settle_payment(
    filename: &str,
    payment: f64,
    placement_index: &PlacementIndex,
    ledger_addresses: &HashMap<String, String>,
    ledger: &LedgerClient,
    coordinator_address: &str,
) {
    let renter_ids = placement_index.all_renters_for_file(filename);
    if renter_ids.is_empty() {
        warn!("No renters recorded for {}, nothing to settle", filename);
        return;
    }

    let share = payment / renter_ids.len() as f64;
    for renter_id in &renter_ids {
        let Some(address) = ledger_addresses.get(renter_id) else {
            warn!("Renter {} has no known ledger address, skipping payout", renter_id);
            continue;
        };
        match ledger
            .send_money(coordinator_address, address, share)
            .await
        {
            Ok(_) => info!("Paid renter {} ({}) {:.6}", renter_id, address, share),
            Err(e) => warn!("Failed to pay renter {} ({}): {}", renter_id, address, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::PlacementIndex;
    use std::collections::HashMap;

    #[test]
    fn splits_evenly_across_unique_renters() {
        let index = PlacementIndex::new();
        index.record("f.txt", 0, vec!["r1".to_string(), "r2".to_string()]);
        index.record("f.txt", 1, vec!["r1".to_string()]);
        index.set_shard_count("f.txt", 2);

        let ids = index.all_renters_for_file("f.txt");
        assert_eq!(ids, vec!["r1".to_string(), "r2".to_string()]);

        let share = 9.0 / ids.len() as f64;
        assert_eq!(share, 4.5);
    }

    #[test]
    fn address_lookup_skips_unknown_renters() {
        let addresses: HashMap<String, String> =
            [("r1".to_string(), "addr1".to_string())].into_iter().collect();
        let lookup = |id: &str| addresses.get(id).cloned();
        assert_eq!(lookup("r1"), Some("addr1".to_string()));
        assert_eq!(lookup("r2"), None);
    }
}
