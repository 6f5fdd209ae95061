/// Environment-driven configuration for the renter binary, following the
/// teacher's environment-variable-first convention (`dotenv` + typed
/// defaults rather than a config file).
use std::env;

#[derive(Clone, Debug)]
pub struct RenterConfig {
    pub bind_addr: String,
    pub public_url: String,
    pub coordinator_url: String,
    pub storage_dir: String,
    pub storage_available_bytes: u64,
    pub heartbeat_interval_secs: u64,
    pub ledger_addr: Option<String>,
}

impl RenterConfig {
    pub fn from_env() -> Self {
        let bind_addr =
            env::var("RENTER_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8001".to_string());
        let public_url = env::var("RENTER_PUBLIC_URL")
            .unwrap_or_else(|_| format!("http://{}", bind_addr));
        let coordinator_url = env::var("COORDINATOR_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8080".to_string());
        let storage_dir = env::var("RENTER_STORAGE_DIR").unwrap_or_else(|_| "./storage".to_string());
        let storage_available_mb: u64 = env::var("RENTER_STORAGE_MB")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(64);
        let heartbeat_interval_secs: u64 = env::var("RENTER_HEARTBEAT_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);
        let ledger_addr = env::var("LEDGER_BIND_ADDR").ok();

        Self {
            bind_addr,
            public_url,
            coordinator_url,
            storage_dir,
            storage_available_bytes: storage_available_mb * 1024 * 1024,
            heartbeat_interval_secs,
            ledger_addr,
        }
    }
}
