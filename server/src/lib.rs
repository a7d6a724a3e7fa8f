use axum::{body::Bytes, extract::{DefaultBodyLimit, Query, State}, http::{header, HeaderValue, StatusCode}, response::IntoResponse, routing::{get, post}, Json, Router};
use revindex::{IndexError, IndexRegistry, TokenizerConfig};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod metrics;

use metrics::Metrics;

#[derive(Deserialize)]
pub struct LoadParams {
    #[serde(default)]
    pub index: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub index: String,
    #[serde(default)]
    pub q: String,
}

#[derive(Deserialize)]
pub struct CollectionParams {
    #[serde(default)]
    pub index: String,
}

#[derive(Deserialize)]
pub struct HealthzParams {
    pub format: Option<String>,
}

/// Largest `/load` body accepted unless overridden.
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<IndexRegistry>,
    pub metrics: Arc<Metrics>,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(config: TokenizerConfig) -> Result<Self, prometheus::Error> {
        Ok(Self {
            registry: Arc::new(IndexRegistry::with_config(config)),
            metrics: Arc::new(Metrics::new()?),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        })
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            registry: Arc::new(IndexRegistry::new()),
            metrics: Arc::new(Metrics::default()),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

type ApiError = (StatusCode, Json<Value>);
type ApiResult = Result<Json<Value>, ApiError>;

/// Routes serving collections: load, search, list and dump.
pub fn build_app(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.max_body_bytes);
    Router::new()
        .route("/load", post(load_handler).layer(body_limit))
        .route("/search", get(search_handler))
        .route("/documents", get(documents_handler))
        .route("/dump", get(dump_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
}

/// Routes for the separate metrics listener.
pub fn build_metrics_app(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

// CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
fn cors_layer() -> CorsLayer {
    let origins: Vec<HeaderValue> = std::env::var("CORS_ALLOW_ORIGIN")
        .map(|val| val.split(',').filter_map(|s| s.trim().parse().ok()).collect())
        .unwrap_or_default();
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

fn status_body(code: StatusCode) -> Value {
    json!({ "status": code.canonical_reason().unwrap_or_default() })
}

fn reject(code: StatusCode, error: impl Into<String>) -> ApiError {
    let error = error.into();
    tracing::warn!(status = code.as_u16(), %error, "request rejected");
    let mut body = status_body(code);
    body["error"] = Value::String(error);
    (code, Json(body))
}

// Unknown collection and unknown word share a status; the message tells them apart.
fn reject_index(err: IndexError) -> ApiError {
    let code = if err.is_not_found() { StatusCode::NOT_FOUND } else { StatusCode::INTERNAL_SERVER_ERROR };
    reject(code, err.to_string())
}

fn require(value: &str, param: &str) -> Result<(), ApiError> {
    if value.is_empty() {
        return Err(reject(StatusCode::BAD_REQUEST, format!("missing {param} parameter")));
    }
    Ok(())
}

fn with_data(data: Value) -> Json<Value> {
    let mut body = status_body(StatusCode::OK);
    body["data"] = data;
    Json(body)
}

pub async fn load_handler(State(state): State<AppState>, Query(params): Query<LoadParams>, body: Bytes) -> ApiResult {
    let start = Instant::now();
    require(&params.index, "index")?;
    require(&params.name, "name")?;
    // Reject before touching the registry so a bad body leaves no trace.
    let text = std::str::from_utf8(&body)
        .map_err(|_| reject(StatusCode::BAD_REQUEST, "document body is not valid UTF-8"))?;

    let index = state.registry.get_or_create(&params.index);
    index.ingest(&params.name, text).map_err(reject_index)?;

    tracing::info!(collection = %params.index, document = %params.name, bytes = body.len(), "document loaded");
    state.metrics.record("load", start.elapsed());
    Ok(Json(status_body(StatusCode::OK)))
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> ApiResult {
    let start = Instant::now();
    require(&params.index, "index")?;
    require(&params.q, "q")?;

    let index = state.registry.get(&params.index).map_err(reject_index)?;
    let postings = index.lookup(&params.q).map_err(reject_index)?;
    let buckets = postings.len();
    let data = serde_json::to_value(postings)
        .map_err(|e| reject(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    tracing::info!(collection = %params.index, word = %params.q, buckets, "search");
    state.metrics.record("search", start.elapsed());
    Ok(with_data(data))
}

pub async fn documents_handler(State(state): State<AppState>, Query(params): Query<CollectionParams>) -> ApiResult {
    require(&params.index, "index")?;
    let index = state.registry.get(&params.index).map_err(reject_index)?;
    Ok(with_data(json!(index.list_document_names())))
}

pub async fn dump_handler(State(state): State<AppState>, Query(params): Query<CollectionParams>) -> ApiResult {
    require(&params.index, "index")?;
    let index = state.registry.get(&params.index).map_err(reject_index)?;
    Ok(with_data(json!(index.dump_documents())))
}

pub async fn healthz_handler(State(state): State<AppState>, Query(params): Query<HealthzParams>) -> ApiResult {
    let start = Instant::now();
    let format = params.format.as_deref().filter(|f| !f.is_empty()).unwrap_or("json");
    if format != "json" {
        return Err(reject(StatusCode::BAD_REQUEST, format!("unsupported format {format}")));
    }
    let snapshot = serde_json::to_value(state.metrics.snapshot())
        .map_err(|e| reject(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    state.metrics.record("healthz", start.elapsed());
    Ok(Json(snapshot))
}

/// Prometheus text exposition of the same latency histograms.
pub async fn metrics_handler(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let text = state
        .metrics
        .encode()
        .map_err(|e| reject(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], text))
}
