use crate::config::Config;
use crate::errors::Result;
use crate::item::{CreateTodo, DEFAULT_TASK, TodoItem, UpdateTodo};
use crate::metrics_defs::ITEMS_WRITTEN;
use crate::store::TodoStore;
use axum::Router;
use axum::body::Bytes;
use axum::extract::{FromRequestParts, Path, Query, State};
use axum::response::Response;
use axum::routing::{MethodRouter, get};
use chrono::Utc;
use http::request::Parts;
use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use shared::counter;
use shared::http::{error_response, json_response, parse_json_body};
use std::convert::Infallible;
use std::sync::Arc;

pub const TODO_PATH: &str = "/api-todo";
pub const TODO_ITEM_PATH: &str = "/api-todo/{id}";

#[derive(Clone)]
pub struct TodoState {
    store: Arc<dyn TodoStore>,
    default_ttl_seconds: i64,
}

impl TodoState {
    pub fn new(store: Arc<dyn TodoStore>, config: &Config) -> Self {
        TodoState {
            store,
            default_ttl_seconds: config.default_ttl_seconds,
        }
    }
}

pub fn routes(state: TodoState) -> Router {
    Router::new()
        .route(TODO_PATH, item_methods())
        .route(TODO_ITEM_PATH, item_methods())
        .with_state(state)
}

fn item_methods() -> MethodRouter<TodoState> {
    get(read)
        .post(create)
        .put(update)
        .delete(remove)
        .head(unsupported)
        .fallback(unsupported)
}

#[derive(Serialize)]
struct Created<'a> {
    item: &'a TodoItem,
}

#[derive(Serialize)]
struct Message {
    message: &'static str,
}

/// Item id from the `{id}` path segment, else the `id` query parameter.
/// Empty ids count as missing.
struct ItemId(Option<String>);

#[derive(Deserialize)]
struct IdParam {
    id: Option<String>,
}

impl<S: Send + Sync> FromRequestParts<S> for ItemId {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let from_path = Path::<String>::from_request_parts(parts, state)
            .await
            .ok()
            .map(|Path(id)| id);
        let id = from_path.filter(|id| !id.is_empty()).or_else(|| {
            Query::<IdParam>::try_from_uri(&parts.uri)
                .ok()
                .and_then(|Query(param)| param.id)
        });
        Ok(ItemId(id.filter(|id| !id.is_empty())))
    }
}

async fn read(State(state): State<TodoState>, ItemId(id): ItemId) -> Result<Response> {
    let Some(id) = id else {
        let items = state.store.scan().await?;
        tracing::info!(
            count = items.len(),
            store = state.store.name(),
            "Scanned items"
        );
        return Ok(json_response(StatusCode::OK, &items));
    };

    match state.store.get(&id).await? {
        Some(item) => Ok(json_response(StatusCode::OK, &item)),
        None => Ok(error_response(StatusCode::NOT_FOUND, "Not found")),
    }
}

async fn create(State(state): State<TodoState>, body: Bytes) -> Result<Response> {
    let request: CreateTodo = parse_json_body(&body)?;
    let item = TodoItem::create(request, Utc::now(), state.default_ttl_seconds)?;
    state.store.put(&item).await?;

    counter!(ITEMS_WRITTEN, "operation" => "create").increment(1);
    tracing::info!(id = %item.id, "Created item");
    Ok(json_response(StatusCode::CREATED, &Created { item: &item }))
}

/// Missing `task` and `done` fall back to their defaults rather than
/// keeping the stored values.
async fn update(
    State(state): State<TodoState>,
    ItemId(path_id): ItemId,
    body: Bytes,
) -> Result<Response> {
    let request: UpdateTodo = parse_json_body(&body)?;
    let Some(id) = path_id.or(request.id.filter(|id| !id.is_empty())) else {
        tracing::warn!("Missing id in update request");
        return Ok(error_response(StatusCode::BAD_REQUEST, "Missing id"));
    };

    let task = request.task.as_deref().unwrap_or(DEFAULT_TASK);
    let done = request.done.unwrap_or(false);
    state.store.update(&id, task, done).await?;

    counter!(ITEMS_WRITTEN, "operation" => "update").increment(1);
    tracing::info!(%id, done, "Updated item");
    Ok(json_response(StatusCode::OK, &Message { message: "Updated" }))
}

async fn remove(State(state): State<TodoState>, ItemId(id): ItemId) -> Result<Response> {
    let Some(id) = id else {
        tracing::warn!("Missing id in delete request");
        return Ok(error_response(StatusCode::BAD_REQUEST, "Missing id"));
    };
    state.store.delete(&id).await?;

    counter!(ITEMS_WRITTEN, "operation" => "delete").increment(1);
    tracing::info!(%id, "Deleted item");
    Ok(json_response(StatusCode::OK, &Message { message: "Deleted" }))
}

async fn unsupported(method: Method) -> Response {
    tracing::warn!(%method, "Unsupported method");
    error_response(
        StatusCode::METHOD_NOT_ALLOWED,
        &format!("Method {method} not allowed"),
    )
}
