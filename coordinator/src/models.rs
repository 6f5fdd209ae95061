/// Request/response payload shapes for the coordinator's HTTP surface
/// (SPEC_FULL.md §6), with `validator` rules enforcing the bad-request
/// checks from §7 at the deserialization boundary.
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRenterPayload {
    pub renter_id: Option<String>,
    #[validate(length(min = 1, message = "url cannot be empty"))]
    pub url: String,
    #[validate(range(min = 1, message = "storage_available must be greater than 0"))]
    pub storage_available: u64,
    pub blockchain_address: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterRenterResponse {
    pub renter_id: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct HeartbeatPayload {
    pub renter_id: String,
    pub blockchain_address: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HeartbeatResponse {
    pub message: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterPublicKeyPayload {
    #[validate(length(min = 1, message = "username cannot be empty"))]
    pub username: String,
    #[validate(length(min = 1, message = "public_key cannot be empty"))]
    pub public_key: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterPublicKeyResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub filename: String,
    pub num_shards: usize,
    pub replication_factor: usize,
    pub shard_size: u64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct DownloadChallengeResponse {
    pub challenge: String,
    pub filename: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyChallengeQuery {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyChallengePayload {
    pub response: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct RenterSummary {
    pub renter_id: String,
    pub url: String,
    pub storage_available: u64,
    pub blockchain_address: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub ledger_connected: bool,
}
