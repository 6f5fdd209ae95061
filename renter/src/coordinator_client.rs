/// HTTP client the renter uses to register and heartbeat with the
/// coordinator. Mirrors the reference renter's `register_with_server` /
/// `send_heartbeat` pair.
use log::{debug, error, info, warn};
use std::time::Duration;

use crate::models::{HeartbeatRequest, RegisterRenterRequest, RegisterRenterResponse};

const SMALL_RPC_TIMEOUT: Duration = Duration::from_secs(30);

pub struct CoordinatorClient {
    http: reqwest::Client,
    coordinator_url: String,
}

impl CoordinatorClient {
    pub fn new(coordinator_url: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(SMALL_RPC_TIMEOUT)
            .build()
            .expect("valid reqwest client configuration");
        Self {
            http,
            coordinator_url,
        }
    }

    pub async fn register(
        &self,
        renter_id: Option<String>,
        public_url: &str,
        storage_available: u64,
        ledger_address: Option<String>,
    ) -> anyhow::Result<String> {
        let body = RegisterRenterRequest {
            renter_id,
            url: public_url.to_string(),
            storage_available,
            blockchain_address: ledger_address,
        };
        debug!("Registering with coordinator at {}", self.coordinator_url);
        let response = self
            .http
            .post(format!("{}/register-renter/", self.coordinator_url))
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<RegisterRenterResponse>()
            .await?;
        info!(
            "Registered with coordinator, assigned renter_id={}",
            response.renter_id
        );
        Ok(response.renter_id)
    }

    pub async fn heartbeat(&self, renter_id: &str, ledger_address: Option<String>) -> bool {
        let body = HeartbeatRequest {
            renter_id: renter_id.to_string(),
            blockchain_address: ledger_address,
        };
        match self
            .http
            .post(format!("{}/heartbeat/", self.coordinator_url))
            .json(&body)
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => {
                debug!("Heartbeat acknowledged for renter_id={}", renter_id);
                true
            }
            Ok(resp) if resp.status().as_u16() == 404 => {
                warn!(
                    "Coordinator no longer knows renter_id={}, re-registration required",
                    renter_id
                );
                false
            }
            Ok(resp) => {
                warn!("Unexpected heartbeat status: {}", resp.status());
                false
            }
            Err(e) => {
                error!("Failed to send heartbeat: {}", e);
                false
            }
        }
    }
}
