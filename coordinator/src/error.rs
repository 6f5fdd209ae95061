/// Custom error type for the coordinator API, mapping each failure mode from
/// SPEC_FULL.md §7 to an HTTP status code for Actix-web.
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoordinatorError {
    /// Membership empty after sweep; caller retries later.
    #[error("no renters available")]
    NoRenters,

    /// Non-positive payment, empty filename, or missing/invalid fields.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Unknown renter on heartbeat, unknown filename, or missing placement.
    #[error("not found: {0}")]
    NotFound(String),

    /// Unknown public key, no active challenge, or wrong challenge response.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// At least one shard has zero live replicas.
    #[error("incomplete retrieval: {0}")]
    PartialRetrieval(String),

    /// Renter or ledger transport error.
    #[error("upstream failure: {0}")]
    UpstreamFail(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for CoordinatorError {
    fn from(err: reqwest::Error) -> Self {
        CoordinatorError::UpstreamFail(err.to_string())
    }
}

impl ResponseError for CoordinatorError {
    fn status_code(&self) -> StatusCode {
        match self {
            CoordinatorError::NoRenters => StatusCode::SERVICE_UNAVAILABLE,
            CoordinatorError::BadRequest(_) => StatusCode::BAD_REQUEST,
            CoordinatorError::NotFound(_) => StatusCode::NOT_FOUND,
            CoordinatorError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            CoordinatorError::PartialRetrieval(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CoordinatorError::UpstreamFail(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CoordinatorError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CoordinatorError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).body(self.to_string())
    }
}
