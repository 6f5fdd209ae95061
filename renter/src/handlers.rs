/// HTTP endpoints exposed by the renter: opaque shard store/retrieve/delete
/// plus a health check, matching SPEC_FULL.md §4.7 / §6.
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures_util::StreamExt;
use log::{trace, warn};
use serde_json::json;

use crate::error::RenterError;
use crate::models::{DeleteQuery, RetrieveQuery};
use crate::storage::ShardStorage;

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({"status": "healthy"}))
}

/// Stores a shard under the blob name carried by the multipart field's
/// filename. Overwrite is permitted — renters deduplicate by name.
pub async fn store_shard(
    storage: web::Data<ShardStorage>,
    mut payload: Multipart,
) -> Result<HttpResponse, RenterError> {
    while let Some(field) = payload.next().await {
        let mut field = field.map_err(|e| RenterError::Internal(e.to_string()))?;
        let blob_name = field
            .content_disposition()
            .get_filename()
            .map(|s| s.to_string())
            .ok_or_else(|| RenterError::Internal("multipart field missing filename".into()))?;

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| RenterError::Internal(e.to_string()))?;
            bytes.extend_from_slice(&chunk);
        }

        trace!("Received shard upload: {} ({} bytes)", blob_name, bytes.len());
        storage.store(&blob_name, &bytes).await?;
        return Ok(HttpResponse::Ok().json(json!({
            "message": "Shard stored successfully",
            "filename": blob_name,
        })));
    }

    Err(RenterError::Internal("no file field in multipart body".into()))
}

pub async fn retrieve_shard(
    storage: web::Data<ShardStorage>,
    query: web::Query<RetrieveQuery>,
) -> Result<HttpResponse, RenterError> {
    match storage.retrieve(&query.filename).await? {
        Some(bytes) => Ok(HttpResponse::Ok()
            .content_type("application/octet-stream")
            .body(bytes)),
        None => {
            warn!("Shard not found: {}", query.filename);
            Err(RenterError::NotFound)
        }
    }
}

pub async fn delete_shard(
    storage: web::Data<ShardStorage>,
    query: web::Query<DeleteQuery>,
) -> Result<HttpResponse, RenterError> {
    storage.delete(&query.filename).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": format!("Shard '{}' deleted successfully", query.filename),
    })))
}
