use crate::errors::Result;
use crate::metrics_defs::{MESSAGES_PUBLISHED, SUBSCRIPTION_CHANGES};
use crate::topic::{NotificationTopic, Subscription};
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::middleware::map_response;
use axum::response::Response;
use axum::routing::get;
use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use shared::counter;
use shared::http::{cors_headers, error_response, json_response, parse_json_body};
use std::sync::Arc;

pub const NOTIFY_PATH: &str = "/api-notify";

const ALLOWED_METHODS: &str = "GET,POST,PUT,DELETE,OPTIONS";
const DEFAULT_MESSAGE: &str = "Hello from API-NOTIFY!";
const DEFAULT_PROTOCOL: &str = "email";
const PENDING_CONFIRMATION: &str = "PENDING_CONFIRMATION";

#[derive(Clone)]
pub struct NotifyState {
    topic: Arc<dyn NotificationTopic>,
}

impl NotifyState {
    pub fn new(topic: Arc<dyn NotificationTopic>) -> Self {
        NotifyState { topic }
    }
}

pub fn routes(state: NotifyState) -> Router {
    Router::new()
        .route(
            NOTIFY_PATH,
            get(list)
                .post(publish)
                .put(subscribe)
                .delete(unsubscribe)
                .options(|| async { StatusCode::OK })
                .head(unsupported)
                .fallback(unsupported),
        )
        .route_layer(map_response(with_cors))
        .with_state(state)
}

#[derive(Deserialize, Default, Debug)]
#[serde(default)]
struct NotifyRequest {
    message: Option<String>,
    protocol: Option<String>,
    endpoint: Option<String>,
    subscription_arn: Option<String>,
}

impl NotifyRequest {
    /// A body that does not parse is treated as empty.
    fn from_body(body: &[u8]) -> Self {
        parse_json_body(body).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Invalid JSON body");
            NotifyRequest::default()
        })
    }
}

#[derive(Serialize)]
struct Published {
    status: &'static str,
    message_id: Option<String>,
    message: String,
}

#[derive(Serialize)]
struct Subscriptions {
    count: usize,
    subscriptions: Vec<Subscription>,
}

#[derive(Serialize)]
struct SubscriptionChange {
    status: &'static str,
    subscription_arn: String,
}

async fn publish(State(state): State<NotifyState>, body: Bytes) -> Result<Response> {
    let message = NotifyRequest::from_body(&body)
        .message
        .unwrap_or_else(|| DEFAULT_MESSAGE.to_string());
    let message_id = state.topic.publish(&message).await?;

    counter!(MESSAGES_PUBLISHED).increment(1);
    tracing::info!(topic = state.topic.name(), ?message_id, "Published message");
    let published = Published {
        status: "published",
        message_id,
        message,
    };
    Ok(json_response(StatusCode::OK, &published))
}

async fn list(State(state): State<NotifyState>) -> Result<Response> {
    let subscriptions = state.topic.list_subscriptions().await?;
    let listed = Subscriptions {
        count: subscriptions.len(),
        subscriptions,
    };
    Ok(json_response(StatusCode::OK, &listed))
}

async fn subscribe(State(state): State<NotifyState>, body: Bytes) -> Result<Response> {
    let request = NotifyRequest::from_body(&body);
    let Some(endpoint) = request.endpoint.filter(|e| !e.is_empty()) else {
        return Ok(error_response(StatusCode::BAD_REQUEST, "Missing 'endpoint'"));
    };
    let protocol = request
        .protocol
        .unwrap_or_else(|| DEFAULT_PROTOCOL.to_string());

    let arn = state.topic.subscribe(&protocol, &endpoint).await?;

    counter!(SUBSCRIPTION_CHANGES, "action" => "subscribe").increment(1);
    tracing::info!(%protocol, %endpoint, "Subscribed endpoint");
    let change = SubscriptionChange {
        status: "subscribed",
        subscription_arn: arn.unwrap_or_else(|| PENDING_CONFIRMATION.to_string()),
    };
    Ok(json_response(StatusCode::OK, &change))
}

async fn unsubscribe(State(state): State<NotifyState>, body: Bytes) -> Result<Response> {
    let request = NotifyRequest::from_body(&body);
    let Some(arn) = request.subscription_arn.filter(|a| !a.is_empty()) else {
        return Ok(error_response(StatusCode::BAD_REQUEST, "Missing 'subscription_arn'"));
    };

    state.topic.unsubscribe(&arn).await?;

    counter!(SUBSCRIPTION_CHANGES, "action" => "unsubscribe").increment(1);
    tracing::info!(subscription_arn = %arn, "Unsubscribed");
    let change = SubscriptionChange {
        status: "unsubscribed",
        subscription_arn: arn,
    };
    Ok(json_response(StatusCode::OK, &change))
}

async fn unsupported(method: Method) -> Response {
    error_response(
        StatusCode::METHOD_NOT_ALLOWED,
        &format!("Method {method} not allowed"),
    )
}

async fn with_cors(mut response: Response) -> Response {
    response.headers_mut().extend(cors_headers(ALLOWED_METHODS));
    response
}
