use axum::response::{IntoResponse, Response};
use http::StatusCode;
use shared::http::error_response;
use thiserror::Error;

pub type Result<T, E = TodoError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum TodoError {
    #[error("{operation} failed: {message}")]
    Store {
        operation: &'static str,
        message: String,
    },

    #[error("Invalid stored item: {0}")]
    InvalidItem(String),

    #[error("Invalid JSON body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    #[error("ttl_seconds out of range: {0}")]
    InvalidTtl(i64),
}

impl IntoResponse for TodoError {
    fn into_response(self) -> Response {
        let status = match self {
            TodoError::InvalidBody(_) | TodoError::InvalidTtl(_) => StatusCode::BAD_REQUEST,
            TodoError::Store { .. } | TodoError::InvalidItem(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        tracing::error!(error = %self, status = status.as_u16(), "Todo request failed");
        error_response(status, &self.to_string())
    }
}
