use crate::backend::MemoryBackend;
use crate::metrics_defs::ENTRIES_WRITTEN;
use crate::pipeline::LogPipeline;
use crate::writer::{ClientInfo, LogEntry};
use axum::Router;
use axum::body::Bytes;
use axum::extract::{ConnectInfo, FromRequestParts, State};
use axum::response::Response;
use axum::routing::get;
use chrono::Utc;
use http::header::{AsHeaderName, REFERER, USER_AGENT};
use http::request::Parts;
use http::{HeaderMap, StatusCode};
use lambda_http::request::RequestContext;
use serde::Serialize;
use shared::counter;
use shared::http::{error_response, json_response, method_not_allowed, pretty_json_response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

pub const LOG_PATH: &str = "/api-log";

const REDACTED_ERROR: &str = "Internal server error";

#[derive(Clone)]
pub struct LogApiState {
    pipeline: Arc<LogPipeline>,
    capture: Option<Arc<MemoryBackend>>,
    expose_backend_errors: bool,
}

impl LogApiState {
    pub fn new(pipeline: LogPipeline, expose_backend_errors: bool) -> Self {
        LogApiState {
            pipeline: Arc::new(pipeline),
            capture: None,
            expose_backend_errors,
        }
    }

    /// Also store written entries in `backend`, so they can be queried back
    /// without a real log stream.
    pub fn with_capture(mut self, backend: Arc<MemoryBackend>) -> Self {
        self.capture = Some(backend);
        self
    }
}

pub fn routes(state: LogApiState) -> Router {
    Router::new()
        .route(
            LOG_PATH,
            get(read_logs)
                .post(write_log)
                .head(|| async { method_not_allowed() })
                .fallback(|| async { method_not_allowed() }),
        )
        .with_state(state)
}

#[derive(Serialize)]
struct WriteResponse {
    status: &'static str,
}

async fn read_logs(State(state): State<LogApiState>) -> Response {
    match state.pipeline.run(Utc::now()).await {
        Ok(records) => pretty_json_response(StatusCode::OK, &records),
        Err(e) => {
            tracing::error!(
                error = %e,
                backend = state.pipeline.backend_name(),
                "Error running log query"
            );
            let message = match state.expose_backend_errors {
                true => e.to_string(),
                false => REDACTED_ERROR.to_string(),
            };
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &message)
        }
    }
}

/// Always answers 200: a broken body is written as an empty payload.
async fn write_log(State(state): State<LogApiState>, client: ClientInfo, body: Bytes) -> Response {
    let now = Utc::now();
    let entry = LogEntry::from_body(&body, client, now);

    match entry.emit() {
        Ok(line) => {
            counter!(ENTRIES_WRITTEN).increment(1);
            if let Some(capture) = &state.capture {
                capture.record(now, line);
            }
        }
        Err(e) => tracing::error!(error = %e, "Failed to serialize access log entry"),
    }

    json_response(StatusCode::OK, &WriteResponse { status: "ok" })
}

impl<S: Send + Sync> FromRequestParts<S> for ClientInfo {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientInfo {
            source_ip: source_ip(parts),
            user_agent: header_value(&parts.headers, USER_AGENT),
            referer: header_value(&parts.headers, REFERER),
        })
    }
}

/// Caller address, from the API Gateway request context when running under
/// Lambda, then the first `x-forwarded-for` hop, then the socket peer.
fn source_ip(parts: &Parts) -> Option<String> {
    if let Some(ip) = parts
        .extensions
        .get::<RequestContext>()
        .and_then(gateway_source_ip)
    {
        return Some(ip);
    }

    if let Some(forwarded) = header_value(&parts.headers, "x-forwarded-for")
        && let Some(first_hop) = forwarded.split(',').map(str::trim).find(|h| !h.is_empty())
    {
        return Some(first_hop.to_string());
    }

    parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
}

fn gateway_source_ip(context: &RequestContext) -> Option<String> {
    match context {
        RequestContext::ApiGatewayV2(ctx) => ctx.http.source_ip.clone(),
        RequestContext::ApiGatewayV1(ctx) => ctx.identity.source_ip.clone(),
        _ => None,
    }
}

fn header_value(headers: &HeaderMap, name: impl AsHeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{QueryStatus, ResultField};
    use crate::config::Config;
    use crate::testutils::{ScriptedBackend, fast_policy};
    use axum::body::{Body, to_bytes};
    use http::header::CONTENT_TYPE;
    use http::{Method, Request};
    use lambda_http::aws_lambda_events::apigw::ApiGatewayV2httpRequestContext;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn config() -> Config {
        Config {
            poll: fast_policy(None),
            ..Config::default()
        }
    }

    fn scripted_router(backend: ScriptedBackend, expose: bool) -> Router {
        let pipeline = LogPipeline::new(Arc::new(backend), &config());
        routes(LogApiState::new(pipeline, expose))
    }

    fn memory_router() -> Router {
        let backend = Arc::new(MemoryBackend::default());
        let pipeline = LogPipeline::new(backend.clone(), &config());
        routes(LogApiState::new(pipeline, true).with_capture(backend))
    }

    fn request(method: Method, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(LOG_PATH)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, String) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_get_returns_pretty_sorted_records() {
        let backend = ScriptedBackend::new(
            vec![
                QueryStatus::Pending("Running".into()),
                QueryStatus::Complete,
            ],
            vec![
                vec![
                    ResultField::new("@timestamp", "2025-01-01 00:00:00.000"),
                    ResultField::new("ip", "5.6.7.8"),
                ],
                vec![
                    ResultField::new("@timestamp", "2025-01-03 00:00:00.000"),
                    ResultField::new("ip", "1.2.3.4"),
                ],
            ],
        );
        let router = scripted_router(backend, true);

        let response = router.clone().oneshot(request(Method::GET, "")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();

        let first_record = "[\n  {\n    \"@timestamp\": \"2025-01-03 00:00:00.000\"";
        assert!(body.starts_with(first_record));
        let parsed: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed[0]["ip"], "1.2.3.4");
        assert_eq!(parsed[1]["ip"], "5.6.7.8");
    }

    #[tokio::test]
    async fn test_get_backend_failure_is_500_with_message() {
        let router = scripted_router(ScriptedBackend::failing_submit("boom"), true);
        let (status, body) = send(&router, request(Method::GET, "")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            serde_json::from_str::<Value>(&body).unwrap(),
            json!({"error": "Failed to submit query: boom"})
        );
    }

    #[tokio::test]
    async fn test_get_backend_failure_can_be_redacted() {
        let router = scripted_router(ScriptedBackend::failing_fetch("secret detail"), false);
        let (status, body) = send(&router, request(Method::GET, "")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, r#"{"error":"Internal server error"}"#);
    }

    #[tokio::test]
    async fn test_get_poll_timeout_is_500() {
        let backend = ScriptedBackend::new(vec![QueryStatus::Pending("Running".into()); 5], vec![]);
        let pipeline = LogPipeline::new(
            Arc::new(backend),
            &Config {
                poll: fast_policy(Some(2)),
                ..Config::default()
            },
        );
        let router = routes(LogApiState::new(pipeline, true));

        let (status, body) = send(&router, request(Method::GET, "")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("timed out after 2 polls"));
    }

    #[tokio::test]
    async fn test_unsupported_method() {
        let router = scripted_router(ScriptedBackend::completing_with(vec![]), true);
        for method in [Method::PUT, Method::DELETE, Method::PATCH] {
            let (status, body) = send(&router, request(method, "{}")).await;
            assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
            assert_eq!(body, r#"{"error":"Method not allowed"}"#);
        }
    }

    #[tokio::test]
    async fn test_head_does_not_run_a_query() {
        let backend = Arc::new(ScriptedBackend::completing_with(vec![]));
        let pipeline = LogPipeline::new(backend.clone(), &config());
        let router = routes(LogApiState::new(pipeline, true));

        let (status, _) = send(&router, request(Method::HEAD, "")).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert!(backend.submitted().is_empty());
    }

    #[tokio::test]
    async fn test_post_with_malformed_body_is_ok() {
        let router = scripted_router(ScriptedBackend::completing_with(vec![]), true);
        let (status, body) = send(&router, request(Method::POST, "{not json")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"status":"ok"}"#);
    }

    #[tokio::test]
    async fn test_written_entries_are_queryable() {
        let router = memory_router();

        let write = Request::builder()
            .method(Method::POST)
            .uri(LOG_PATH)
            .header("x-forwarded-for", "9.9.9.9, 10.0.0.1")
            .header(USER_AGENT, "TestClient/1.0")
            .header(REFERER, "https://example.com/dash/")
            .body(Body::from(r#"{"event": "page_load_rds", "page": "/rds/"}"#))
            .unwrap();
        let (status, _) = send(&router, write).await;
        assert_eq!(status, StatusCode::OK);

        // Unknown callers are filtered out by the query
        let (status, _) = send(&router, request(Method::POST, r#"{"event": "x"}"#)).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&router, request(Method::GET, "")).await;
        assert_eq!(status, StatusCode::OK);
        let records: Vec<Value> = serde_json::from_str(&body).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["ip"], "9.9.9.9");
        assert_eq!(records[0]["event"], "page_load_rds");
        assert_eq!(records[0]["page"], "/rds/");
        assert_eq!(records[0]["user_agent"], "TestClient/1.0");
        assert_eq!(records[0]["referer"], "https://example.com/dash/");
    }

    #[tokio::test]
    async fn test_client_info_prefers_gateway_context() {
        let mut context = ApiGatewayV2httpRequestContext::default();
        context.http.source_ip = Some("203.0.113.7".to_string());

        let request = Request::builder()
            .header("x-forwarded-for", "9.9.9.9")
            .extension(RequestContext::ApiGatewayV2(context))
            .extension(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))))
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();

        let client = ClientInfo::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(client.source_ip.as_deref(), Some("203.0.113.7"));
        assert_eq!(client.user_agent, None);
    }

    #[tokio::test]
    async fn test_client_info_falls_back_to_peer_address() {
        let request = Request::builder()
            .extension(ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 4000))))
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();

        let client = ClientInfo::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(client.source_ip.as_deref(), Some("192.0.2.1"));
    }
}
