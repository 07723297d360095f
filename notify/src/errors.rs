use axum::response::{IntoResponse, Response};
use http::StatusCode;
use shared::http::error_response;
use thiserror::Error;

pub type Result<T, E = NotifyError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("{operation} failed: {message}")]
    Topic {
        operation: &'static str,
        message: String,
    },

    #[error("Subscription not found: {0}")]
    UnknownSubscription(String),
}

impl IntoResponse for NotifyError {
    fn into_response(self) -> Response {
        let status = match self {
            NotifyError::Topic { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            NotifyError::UnknownSubscription(_) => StatusCode::NOT_FOUND,
        };
        tracing::error!(error = %self, status = status.as_u16(), "Notify request failed");
        error_response(status, &self.to_string())
    }
}
