/// HTTP endpoints for the coordinator (SPEC_FULL.md §6): renter lifecycle,
/// public-key registration, upload/download, challenge verification, and
/// delete. Each shared component is injected as its own `web::Data<T>`,
/// following the reference node's handler style.
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures_util::StreamExt;
use log::{error, info, warn};
use std::collections::HashMap;
use validator::Validate;

use crate::challenge::ChallengeTable;
use crate::config::CoordinatorConfig;
use crate::error::CoordinatorError;
use crate::membership::Membership;
use crate::models::{
    DeleteResponse, DownloadChallengeResponse, DownloadQuery, HealthResponse, HeartbeatPayload,
    HeartbeatResponse, RegisterPublicKeyPayload, RegisterPublicKeyResponse, RegisterRenterPayload,
    RegisterRenterResponse, RenterSummary, UploadResponse, VerifyChallengePayload,
    VerifyChallengeQuery,
};
use crate::placement::PlacementIndex;
use crate::pubkey_registry::PublicKeyRegistry;
use crate::reconstruction::{distribute_file, reconstruct_file};
use crate::renter_client::RenterClient;
use crate::scratch::ScratchArea;
use crate::settlement::settle_payment;
use ledger::LedgerClient;

/// Ledger connection and the coordinator's own settlement address, shared
/// as a single optional pair since neither is meaningful without the other.
pub struct LedgerContext {
    pub client: LedgerClient,
    pub coordinator_address: String,
}

pub async fn health(ledger: web::Data<Option<LedgerContext>>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        message: "coordinator is serving".to_string(),
        ledger_connected: ledger.as_ref().is_some(),
    })
}

pub async fn register_renter(
    payload: web::Json<RegisterRenterPayload>,
    membership: web::Data<Membership>,
) -> Result<HttpResponse, CoordinatorError> {
    payload
        .validate()
        .map_err(|e| CoordinatorError::BadRequest(e.to_string()))?;

    let renter_id = membership
        .register(
            payload.renter_id.clone(),
            payload.url.clone(),
            payload.storage_available,
            payload.blockchain_address.clone(),
        )
        .await;

    Ok(HttpResponse::Ok().json(RegisterRenterResponse {
        renter_id,
        message: "registered".to_string(),
    }))
}

pub async fn heartbeat(
    payload: web::Json<HeartbeatPayload>,
    membership: web::Data<Membership>,
) -> Result<HttpResponse, CoordinatorError> {
    let ok = membership
        .heartbeat(&payload.renter_id, payload.blockchain_address.clone())
        .await;
    if !ok {
        return Err(CoordinatorError::NotFound(format!(
            "unknown renter {}",
            payload.renter_id
        )));
    }
    Ok(HttpResponse::Ok().json(HeartbeatResponse {
        message: "ok".to_string(),
    }))
}

pub async fn get_renters(membership: web::Data<Membership>) -> HttpResponse {
    let renters: Vec<RenterSummary> = membership
        .all()
        .await
        .into_iter()
        .map(|r| RenterSummary {
            renter_id: r.renter_id,
            url: r.url,
            storage_available: r.storage_available,
            blockchain_address: r.ledger_address,
        })
        .collect();
    HttpResponse::Ok().json(renters)
}

pub async fn register_public_key(
    payload: web::Json<RegisterPublicKeyPayload>,
    registry: web::Data<PublicKeyRegistry>,
) -> Result<HttpResponse, CoordinatorError> {
    payload
        .validate()
        .map_err(|e| CoordinatorError::BadRequest(e.to_string()))?;

    registry
        .register(&payload.username, &payload.public_key)
        .await
        .map_err(CoordinatorError::BadRequest)?;

    Ok(HttpResponse::Ok().json(RegisterPublicKeyResponse {
        status: "registered".to_string(),
    }))
}

/// Upload accepts `file` and `payment` as multipart form parts (SPEC_FULL
/// §6) rather than a query string, so both are pulled out of the same
/// stream of fields regardless of which part arrives first.
pub async fn upload(
    mut multipart: Multipart,
    membership: web::Data<Membership>,
    placement_index: web::Data<PlacementIndex>,
    renter_client: web::Data<RenterClient>,
    config: web::Data<CoordinatorConfig>,
) -> Result<HttpResponse, CoordinatorError> {
    let mut filename = None;
    let mut data = Vec::new();
    let mut payment = None;

    while let Some(field) = multipart.next().await {
        let mut field = field.map_err(|e| CoordinatorError::BadRequest(e.to_string()))?;
        let field_name = field.content_disposition().get_name().unwrap_or("").to_string();
        match field_name.as_str() {
            "file" => {
                if filename.is_none() {
                    filename = field
                        .content_disposition()
                        .get_filename()
                        .map(|s| s.to_string());
                }
                while let Some(chunk) = field.next().await {
                    let chunk = chunk.map_err(|e| CoordinatorError::BadRequest(e.to_string()))?;
                    data.extend_from_slice(&chunk);
                }
            }
            "payment" => {
                let mut raw = Vec::new();
                while let Some(chunk) = field.next().await {
                    let chunk = chunk.map_err(|e| CoordinatorError::BadRequest(e.to_string()))?;
                    raw.extend_from_slice(&chunk);
                }
                let text = String::from_utf8(raw)
                    .map_err(|_| CoordinatorError::BadRequest("payment is not valid UTF-8".to_string()))?;
                payment = Some(text.trim().parse::<f64>().map_err(|_| {
                    CoordinatorError::BadRequest("payment must be a number".to_string())
                })?);
            }
            _ => {
                while field.next().await.is_some() {}
            }
        }
    }

    let filename =
        filename.ok_or_else(|| CoordinatorError::BadRequest("no file provided".to_string()))?;
    if data.is_empty() {
        return Err(CoordinatorError::BadRequest("uploaded file is empty".to_string()));
    }
    let payment =
        payment.ok_or_else(|| CoordinatorError::BadRequest("no payment provided".to_string()))?;
    if payment <= 0.0 {
        return Err(CoordinatorError::BadRequest(
            "payment must be greater than zero".to_string(),
        ));
    }

    let distribution = distribute_file(
        &data,
        &filename,
        membership.get_ref(),
        placement_index.get_ref(),
        renter_client.get_ref(),
        config.shard_target_bytes,
        config.min_shards,
        config.max_shards,
        config.replication_factor,
    )
    .await?;
    placement_index.set_payment(&filename, payment);

    info!(
        "Upload complete: {} ({} shard(s), replication {})",
        filename, distribution.shard_count, distribution.replication_factor
    );
    Ok(HttpResponse::Ok().json(UploadResponse {
        filename,
        num_shards: distribution.shard_count,
        replication_factor: distribution.replication_factor,
        shard_size: config.shard_target_bytes,
        message: "upload accepted".to_string(),
    }))
}

/// Reconstructs `filename` and only then issues a download challenge
/// (SPEC_FULL §4.4 step 2): a file that cannot be reassembled from its live
/// replicas must fail here with a server error, before any nonce exists,
/// rather than handing out a challenge for content the coordinator cannot
/// actually serve.
pub async fn download(
    path: web::Path<String>,
    query: web::Query<DownloadQuery>,
    pubkey_registry: web::Data<PublicKeyRegistry>,
    membership: web::Data<Membership>,
    placement_index: web::Data<PlacementIndex>,
    renter_client: web::Data<RenterClient>,
    challenges: web::Data<ChallengeTable>,
    scratch: web::Data<ScratchArea>,
) -> Result<HttpResponse, CoordinatorError> {
    let filename = path.into_inner();

    if placement_index.shard_count(&filename).is_none() {
        return Err(CoordinatorError::NotFound(filename));
    }

    let public_key = pubkey_registry.get(&query.username).await.ok_or_else(|| {
        CoordinatorError::Unauthorized(format!("no public key for {}", query.username))
    })?;

    let data = reconstruct_file(
        &filename,
        membership.get_ref(),
        placement_index.get_ref(),
        renter_client.get_ref(),
    )
    .await?;

    // Staged now so verify_challenge can serve it without reconstructing a
    // second time; left in place for the janitor's TTL (or an explicit
    // discard once verify_challenge consumes it).
    scratch.stage(&filename, &data).await?.disarm();

    let challenge = challenges.issue(&query.username, &filename, &public_key)?;

    Ok(HttpResponse::Ok().json(DownloadChallengeResponse { challenge, filename }))
}

pub async fn verify_challenge(
    path: web::Path<String>,
    query: web::Query<VerifyChallengeQuery>,
    payload: web::Json<VerifyChallengePayload>,
    pubkey_registry: web::Data<PublicKeyRegistry>,
    membership: web::Data<Membership>,
    placement_index: web::Data<PlacementIndex>,
    challenges: web::Data<ChallengeTable>,
    scratch: web::Data<ScratchArea>,
    ledger: web::Data<Option<LedgerContext>>,
) -> Result<HttpResponse, CoordinatorError> {
    let filename = path.into_inner();

    if pubkey_registry.get(&query.username).await.is_none() {
        return Err(CoordinatorError::Unauthorized(format!(
            "no public key for {}",
            query.username
        )));
    }

    let verified = challenges.verify(&query.username, &filename, &payload.response)?;
    if !verified {
        return Err(CoordinatorError::Unauthorized(
            "challenge response mismatch".to_string(),
        ));
    }

    let data = tokio::fs::read(scratch.path_for(&filename))
        .await
        .map_err(|e| {
            CoordinatorError::PartialRetrieval(format!(
                "staged file for {} is no longer available: {}",
                filename, e
            ))
        })?;

    if let Some(ledger_ctx) = ledger.as_ref() {
        let payment = placement_index.payment(&filename).unwrap_or(0.0);
        let renter_ids = placement_index.all_renters_for_file(&filename);
        let mut addresses = HashMap::new();
        for renter_id in &renter_ids {
            if let Some(renter) = membership.get(renter_id).await {
                if let Some(address) = renter.ledger_address {
                    addresses.insert(renter_id.clone(), address);
                }
            }
        }
        settle_payment(
            &filename,
            payment,
            placement_index.get_ref(),
            &addresses,
            &ledger_ctx.client,
            &ledger_ctx.coordinator_address,
        )
        .await;
    } else {
        warn!("No ledger configured, skipping renter payout for {}", filename);
    }

    scratch.discard(&filename).await;

    Ok(HttpResponse::Ok()
        .content_type("application/octet-stream")
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", filename),
        ))
        .body(data))
}

pub async fn delete_file(
    path: web::Path<String>,
    membership: web::Data<Membership>,
    placement_index: web::Data<PlacementIndex>,
    renter_client: web::Data<RenterClient>,
) -> Result<HttpResponse, CoordinatorError> {
    let filename = path.into_inner();
    let shard_count = placement_index
        .shard_count(&filename)
        .ok_or_else(|| CoordinatorError::NotFound(filename.clone()))?;

    for index in 0..shard_count {
        let shard_name = format!("{}.shard{}", filename, index);
        if let Some(renter_ids) = placement_index.renters_for(&filename, index) {
            for renter_id in renter_ids {
                if let Some(renter) = membership.get(&renter_id).await {
                    if !renter_client.delete_shard(&renter.url, &shard_name).await {
                        error!(
                            "Best-effort delete failed for shard {} on {}",
                            shard_name, renter.url
                        );
                    }
                }
            }
        }
    }

    placement_index.remove_file(&filename);
    Ok(HttpResponse::Ok().json(DeleteResponse {
        message: format!("file '{}' deleted", filename),
    }))
}
