use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use keyrev_bucket::BucketError;
use keyrev_store::StoreError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Bucket(#[from] BucketError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Bucket(e) => {
                StatusCode::from_u16(e.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short machine-readable problem type.
    pub fn problem_type(&self) -> &'static str {
        match self {
            Self::Bucket(BucketError::Store(StoreError::NotFound { .. })) => "not_found",
            Self::Bucket(BucketError::Store(StoreError::InvalidUri { .. })) => "invalid_uri",
            Self::Bucket(BucketError::Store(_)) => "storage_error",
            Self::Bucket(BucketError::PartialWrite { .. }) => "partial_write",
            Self::Bucket(BucketError::InvalidConfig(_)) => "invalid_config",
            Self::Bucket(BucketError::MissingParam(_)) => "missing_parameter",
            Self::Bucket(BucketError::UnknownOperation(_)) => "unknown_operation",
            Self::Bucket(BucketError::Compression(_))
            | Self::Config(_)
            | Self::Io(_)
            | Self::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        // Anything not produced by a bucket operation reports a generic message.
        let detail = match &self {
            Self::Bucket(e) => e.to_string(),
            _ => "internal error".to_string(),
        };
        let body = json!({
            "type": self.problem_type(),
            "status": status.as_u16(),
            "detail": detail,
        });
        (status, Json(body)).into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;
