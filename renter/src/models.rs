/// Payload shapes for the renter's own HTTP surface and for the requests it
/// sends to the coordinator. Kept separate from the coordinator crate's
/// `models.rs` since the two processes are deployed independently.
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct RetrieveQuery {
    pub filename: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    pub filename: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterRenterRequest {
    pub renter_id: Option<String>,
    pub url: String,
    pub storage_available: u64,
    pub blockchain_address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRenterResponse {
    pub renter_id: String,
    #[allow(dead_code)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HeartbeatRequest {
    pub renter_id: String,
    pub blockchain_address: Option<String>,
}
