use crate::backend::MessageQueue;
use crate::config::{Config, ReceiveOptions};
use crate::errors::{QueueError, Result};
use crate::metrics_defs::{MESSAGES_RECEIVED, OPERATIONS};
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::counter;
use shared::http::{error_response, json_response, parse_json_body};
use std::sync::Arc;

pub const QUEUE_PATH: &str = "/api-queue";

const DEFAULT_MESSAGE: &str = "no message";

#[derive(Clone)]
pub struct QueueState {
    queue: Arc<dyn MessageQueue>,
    receive: ReceiveOptions,
    default_visibility_timeout_secs: i32,
}

impl QueueState {
    pub fn new(queue: Arc<dyn MessageQueue>, config: &Config) -> Self {
        QueueState {
            queue,
            receive: config.receive.clone(),
            default_visibility_timeout_secs: config.default_visibility_timeout_secs,
        }
    }
}

pub fn routes(state: QueueState) -> Router {
    Router::new()
        .route(
            QUEUE_PATH,
            get(receive)
                .post(send)
                .put(change_visibility)
                .delete(delete)
                .head(unsupported)
                .fallback(unsupported),
        )
        .with_state(state)
}

#[derive(Deserialize, Default, Debug)]
#[serde(default, rename_all = "camelCase")]
struct QueueRequest {
    message: Option<String>,
    receipt_handle: Option<String>,
    visibility_timeout: Option<Value>,
}

impl QueueRequest {
    fn receipt_handle(&self) -> Option<&str> {
        self.receipt_handle.as_deref().filter(|h| !h.is_empty())
    }

    /// Accepts a whole number or a string holding one. Fractions are
    /// truncated.
    fn visibility_timeout(&self, default: i32) -> Result<i32> {
        let Some(value) = &self.visibility_timeout else {
            return Ok(default);
        };
        let parsed = match value {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        parsed
            .and_then(|secs| i32::try_from(secs).ok())
            .ok_or_else(|| QueueError::InvalidVisibilityTimeout(value.to_string()))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Sent {
    message_id: String,
}

#[derive(Serialize)]
struct Deleted {
    deleted: bool,
}

#[derive(Serialize)]
struct Updated {
    updated: bool,
}

/// First characters of a receipt handle, for logging.
fn handle_prefix(handle: &str) -> &str {
    handle
        .char_indices()
        .nth(20)
        .map_or(handle, |(end, _)| &handle[..end])
}

async fn send(State(state): State<QueueState>, body: Bytes) -> Result<Response> {
    let request: QueueRequest = parse_json_body(&body)?;
    let message = request.message.as_deref().unwrap_or(DEFAULT_MESSAGE);
    let message_id = state.queue.send(message).await?;

    counter!(OPERATIONS, "operation" => "send").increment(1);
    tracing::info!(%message_id, queue = state.queue.name(), "Message sent");
    Ok(json_response(StatusCode::OK, &Sent { message_id }))
}

async fn receive(State(state): State<QueueState>) -> Result<Response> {
    let messages = state.queue.receive(&state.receive).await?;

    counter!(OPERATIONS, "operation" => "receive").increment(1);
    counter!(MESSAGES_RECEIVED).increment(messages.len() as u64);
    tracing::info!(count = messages.len(), "Received messages");
    Ok(json_response(StatusCode::OK, &messages))
}

async fn delete(State(state): State<QueueState>, body: Bytes) -> Result<Response> {
    let request: QueueRequest = parse_json_body(&body)?;
    let Some(handle) = request.receipt_handle() else {
        tracing::warn!("Delete without receiptHandle");
        return Ok(error_response(StatusCode::BAD_REQUEST, "receiptHandle required"));
    };

    state.queue.delete(handle).await?;

    counter!(OPERATIONS, "operation" => "delete").increment(1);
    tracing::info!(handle = handle_prefix(handle), "Message deleted");
    Ok(json_response(StatusCode::OK, &Deleted { deleted: true }))
}

/// The timeout is checked before the receipt handle.
async fn change_visibility(State(state): State<QueueState>, body: Bytes) -> Result<Response> {
    let request: QueueRequest = parse_json_body(&body)?;
    let timeout = request.visibility_timeout(state.default_visibility_timeout_secs)?;
    let Some(handle) = request.receipt_handle() else {
        tracing::warn!("Visibility change without receiptHandle");
        return Ok(error_response(StatusCode::BAD_REQUEST, "receiptHandle required"));
    };

    state.queue.change_visibility(handle, timeout).await?;

    counter!(OPERATIONS, "operation" => "change_visibility").increment(1);
    tracing::info!(
        timeout,
        handle = handle_prefix(handle),
        "Visibility timeout updated"
    );
    Ok(json_response(StatusCode::OK, &Updated { updated: true }))
}

async fn unsupported(method: Method) -> Response {
    tracing::warn!(%method, "Unsupported method");
    error_response(
        StatusCode::METHOD_NOT_ALLOWED,
        &format!("method {method} not allowed"),
    )
}
