/// The membership / liveness layer (SPEC_FULL.md §4.1). Tracks renters via
/// heartbeats, performs rack-aware grouping, and evicts stale members. The
/// sweep runs lazily, immediately before any placement or retrieval
/// decision, so no background timer is required for correctness.
use async_std::sync::Mutex as AsyncMutex;
use chrono::Utc;
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct RenterRecord {
    pub renter_id: String,
    pub url: String,
    pub storage_available: u64,
    pub last_heartbeat: i64,
    pub rack: u32,
    pub ledger_address: Option<String>,
}

struct Inner {
    renters: HashMap<String, RenterRecord>,
    racks: HashMap<u32, HashSet<String>>,
}

/// Owns the renter table and its derived rack index behind a single
/// exclusive section, per SPEC_FULL.md §5's "Single exclusive section
/// around each mutating operation; snapshot-for-read during placement"
/// discipline.
pub struct Membership {
    inner: AsyncMutex<Inner>,
    rack_count: u32,
    renter_timeout_secs: i64,
}

impl Membership {
    pub fn new(rack_count: u32, renter_timeout_secs: u64) -> Self {
        Self {
            inner: AsyncMutex::new(Inner {
                renters: HashMap::new(),
                racks: HashMap::new(),
            }),
            rack_count: rack_count.max(1),
            renter_timeout_secs: renter_timeout_secs as i64,
        }
    }

    /// Registers (or re-registers) a renter. Re-registration with an
    /// existing id is idempotent and refreshes the record in place,
    /// keeping any placement records referencing that id valid.
    pub async fn register(
        &self,
        renter_id: Option<String>,
        url: String,
        storage_available: u64,
        ledger_address: Option<String>,
    ) -> String {
        let mut inner = self.inner.lock().await;
        let now = Utc::now().timestamp();

        if let Some(id) = renter_id {
            if let Some(existing) = inner.renters.get_mut(&id) {
                existing.url = url;
                existing.storage_available = storage_available;
                existing.last_heartbeat = now;
                if ledger_address.is_some() {
                    existing.ledger_address = ledger_address;
                }
                info!("Re-registered renter {} (rack {})", id, existing.rack);
                return id;
            }
            let rack = Self::assign_rack(inner.renters.len(), self.rack_count);
            inner.racks.entry(rack).or_default().insert(id.clone());
            inner.renters.insert(
                id.clone(),
                RenterRecord {
                    renter_id: id.clone(),
                    url,
                    storage_available,
                    last_heartbeat: now,
                    rack,
                    ledger_address,
                },
            );
            info!("Registered renter {} (rack {})", id, rack);
            return id;
        }

        let id = Uuid::new_v4().to_string();
        let rack = Self::assign_rack(inner.renters.len(), self.rack_count);
        inner.racks.entry(rack).or_default().insert(id.clone());
        inner.renters.insert(
            id.clone(),
            RenterRecord {
                renter_id: id.clone(),
                url,
                storage_available,
                last_heartbeat: now,
                rack,
                ledger_address,
            },
        );
        info!("Registered new renter {} (rack {})", id, rack);
        id
    }

    fn assign_rack(current_size: usize, rack_count: u32) -> u32 {
        (current_size as u32) % rack_count
    }

    /// Updates `last_heartbeat`; returns `false` if the renter is unknown so
    /// the caller can surface a not-found response (peer should re-register).
    pub async fn heartbeat(&self, renter_id: &str, ledger_address: Option<String>) -> bool {
        let mut inner = self.inner.lock().await;
        match inner.renters.get_mut(renter_id) {
            Some(renter) => {
                renter.last_heartbeat = Utc::now().timestamp();
                if ledger_address.is_some() {
                    renter.ledger_address = ledger_address;
                }
                debug!("Heartbeat received from renter {}", renter_id);
                true
            }
            None => {
                warn!("Heartbeat from unknown renter {}", renter_id);
                false
            }
        }
    }

    /// Removes every renter whose heartbeat is older than
    /// `RENTER_TIMEOUT`, unlinking it from its rack set too.
    pub async fn sweep(&self) {
        let mut inner = self.inner.lock().await;
        let now = Utc::now().timestamp();
        let timeout = self.renter_timeout_secs;

        let stale: Vec<String> = inner
            .renters
            .values()
            .filter(|r| now - r.last_heartbeat > timeout)
            .map(|r| r.renter_id.clone())
            .collect();

        for renter_id in stale {
            if let Some(renter) = inner.renters.remove(&renter_id) {
                if let Some(set) = inner.racks.get_mut(&renter.rack) {
                    set.remove(&renter_id);
                }
                info!("Swept stale renter {} (rack {})", renter_id, renter.rack);
            }
        }
    }

    /// Sweeps, then returns an immutable snapshot for the placement engine.
    pub async fn live_snapshot(&self) -> Vec<RenterRecord> {
        self.sweep().await;
        let inner = self.inner.lock().await;
        inner.renters.values().cloned().collect()
    }

    pub async fn get(&self, renter_id: &str) -> Option<RenterRecord> {
        let inner = self.inner.lock().await;
        inner.renters.get(renter_id).cloned()
    }

    pub async fn all(&self) -> Vec<RenterRecord> {
        let inner = self.inner.lock().await;
        inner.renters.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn register_assigns_racks_round_robin() {
        let membership = Membership::new(3, 60);
        let a = membership
            .register(None, "http://a".to_string(), 100, None)
            .await;
        let b = membership
            .register(None, "http://b".to_string(), 100, None)
            .await;
        let c = membership
            .register(None, "http://c".to_string(), 100, None)
            .await;
        let d = membership
            .register(None, "http://d".to_string(), 100, None)
            .await;

        assert_eq!(membership.get(&a).await.unwrap().rack, 0);
        assert_eq!(membership.get(&b).await.unwrap().rack, 1);
        assert_eq!(membership.get(&c).await.unwrap().rack, 2);
        assert_eq!(membership.get(&d).await.unwrap().rack, 0);
    }

    #[tokio::test]
    async fn reregistration_keeps_identity_valid() {
        let membership = Membership::new(3, 60);
        let id = membership
            .register(None, "http://a".to_string(), 100, None)
            .await;
        let again = membership
            .register(Some(id.clone()), "http://a-new".to_string(), 200, None)
            .await;
        assert_eq!(id, again);
        assert_eq!(membership.get(&id).await.unwrap().url, "http://a-new");
    }

    #[tokio::test]
    async fn heartbeat_on_unknown_renter_fails() {
        let membership = Membership::new(3, 60);
        assert!(!membership.heartbeat("ghost", None).await);
    }

    #[tokio::test]
    async fn sweep_evicts_stale_renters() {
        let membership = Membership::new(3, 0);
        let id = membership
            .register(None, "http://a".to_string(), 100, None)
            .await;
        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
        let live = membership.live_snapshot().await;
        assert!(live.is_empty());
        assert!(membership.get(&id).await.is_none());
    }
}
