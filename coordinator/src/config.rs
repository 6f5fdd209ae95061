/// Environment-driven configuration for the coordinator binary, following
/// the teacher's environment-variable-first convention (`dotenv` + typed
/// defaults) for every reference value named in SPEC_FULL.md §§3-5.
use std::env;

#[derive(Clone, Debug)]
pub struct CoordinatorConfig {
    pub bind_addr: String,
    pub ledger_addr: String,
    pub renter_timeout_secs: u64,
    pub replication_factor: usize,
    pub rack_count: u32,
    pub min_shards: usize,
    pub max_shards: usize,
    pub shard_target_bytes: u64,
    pub renter_rpc_timeout_secs: u64,
    pub staged_artifact_ttl_secs: u64,
    pub challenge_ttl_secs: u64,
    pub scratch_dir: String,
    pub pubkey_registry_path: String,
}

impl CoordinatorConfig {
    pub fn from_env() -> Self {
        Self {
            bind_addr: env::var("COORDINATOR_BIND_ADDR")
                .unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
            ledger_addr: env::var("LEDGER_BIND_ADDR")
                .unwrap_or_else(|_| "127.0.0.1:7575".to_string()),
            renter_timeout_secs: env_u64("RENTER_TIMEOUT_SECS", 60),
            replication_factor: env_u64("COORDINATOR_REPLICATION_FACTOR", 3) as usize,
            rack_count: env_u64("COORDINATOR_RACK_COUNT", 3) as u32,
            min_shards: env_u64("COORDINATOR_MIN_SHARDS", 3) as usize,
            max_shards: env_u64("COORDINATOR_MAX_SHARDS", 10) as usize,
            shard_target_bytes: env_u64("COORDINATOR_SHARD_TARGET_BYTES", 1024 * 1024),
            renter_rpc_timeout_secs: env_u64("COORDINATOR_RENTER_RPC_TIMEOUT_SECS", 300),
            staged_artifact_ttl_secs: env_u64("COORDINATOR_STAGED_ARTIFACT_TTL_SECS", 30),
            challenge_ttl_secs: env_u64("COORDINATOR_CHALLENGE_TTL_SECS", 30),
            scratch_dir: env::var("COORDINATOR_SCRATCH_DIR")
                .unwrap_or_else(|_| "./scratch".to_string()),
            pubkey_registry_path: env::var("COORDINATOR_PUBKEY_REGISTRY_PATH")
                .unwrap_or_else(|_| "./client_public_keys.json".to_string()),
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
