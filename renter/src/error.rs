/// Error type for the renter's HTTP surface, mapped to HTTP status codes for
/// Actix-web the same way the coordinator's `ApiError` is.
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenterError {
    #[error("shard not found")]
    NotFound,

    #[error("storage I/O error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("registration with coordinator failed: {0}")]
    RegistrationFailed(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ResponseError for RenterError {
    fn status_code(&self) -> StatusCode {
        match self {
            RenterError::NotFound => StatusCode::NOT_FOUND,
            RenterError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RenterError::RegistrationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RenterError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).body(self.to_string())
    }
}
