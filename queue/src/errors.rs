use axum::response::{IntoResponse, Response};
use http::StatusCode;
use shared::http::error_response;
use thiserror::Error;

pub type Result<T, E = QueueError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("{operation} failed: {message}")]
    Queue {
        operation: &'static str,
        message: String,
    },

    #[error("Queue accepted the message without an id")]
    MissingMessageId,

    #[error("Invalid receipt handle: {0}")]
    InvalidReceipt(String),

    #[error("Invalid JSON body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    #[error("visibilityTimeout must be an integer, got {0}")]
    InvalidVisibilityTimeout(String),
}

impl IntoResponse for QueueError {
    fn into_response(self) -> Response {
        let status = match self {
            QueueError::Queue { .. } | QueueError::MissingMessageId => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            QueueError::InvalidReceipt(_)
            | QueueError::InvalidBody(_)
            | QueueError::InvalidVisibilityTimeout(_) => StatusCode::BAD_REQUEST,
        };
        tracing::error!(error = %self, status = status.as_u16(), "Queue request failed");
        error_response(status, &self.to_string())
    }
}
