use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Stored bytes that no longer decode into the expected record shape.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("corrupt record: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("malformed cache key: {0}")]
    MalformedKey(String),
}

/// Failures reaching the compute service or the cell router.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("rpc transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("rpc endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("remote error {code}: {message}")]
    Remote { code: i64, message: String },

    #[error("rpc reply answers call {got:?}, expected {expected}")]
    IdMismatch { expected: u64, got: Option<u64> },

    #[error("invalid rpc result: {0}")]
    InvalidResult(String),

    #[error("rpc timed out after {0:?}")]
    Timeout(std::time::Duration),
}

#[derive(Debug, Error)]
pub enum ConsoleAuthError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("cache backend error: {0}")]
    Backend(String),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("rpc setup failed: {0}")]
    Rpc(#[from] RpcError),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("token not found")]
    TokenNotFound,
}

impl IntoResponse for ConsoleAuthError {
    fn into_response(self) -> Response {
        let (status, error_type, code, msg) = match &self {
            ConsoleAuthError::TokenNotFound => (
                StatusCode::NOT_FOUND,
                "authentication_error",
                "token_not_found",
                "invalid or expired console token".to_string(),
            ),
            ConsoleAuthError::InvalidInput(reason) => (
                StatusCode::BAD_REQUEST,
                "invalid_request_error",
                "invalid_input",
                reason.clone(),
            ),
            ConsoleAuthError::Redis(e) => {
                tracing::error!("Redis error: {}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "backend_error",
                    "cache_unavailable",
                    "token cache unavailable".to_string(),
                )
            }
            ConsoleAuthError::Backend(e) => {
                tracing::error!("Cache backend error: {}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "backend_error",
                    "cache_unavailable",
                    "token cache unavailable".to_string(),
                )
            }
            ConsoleAuthError::Rpc(e) => {
                tracing::error!("RPC error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal_server_error",
                    "internal server error".to_string(),
                )
            }
            ConsoleAuthError::Codec(e) => {
                tracing::error!("Codec error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal_server_error",
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "message": msg,
                "type": error_type,
                "code": code,
            }
        }));

        (status, body).into_response()
    }
}
