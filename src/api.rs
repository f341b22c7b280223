use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::error::{PipelineError, StoreError};
use crate::ingest::config::load_sources_default;
use crate::ingest::scheduler::CatalogueSource;
use crate::model::{ItemFilter, Journey, SourceScore, Stats, StoredItem, Vote, VoteTally};
use crate::pipeline::{Pipeline, RunReport};

const DEFAULT_TOP_SOURCES: u32 = 10;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub catalogue: Arc<CatalogueSource>,
}

impl AppState {
    pub fn new(pipeline: Arc<Pipeline>, catalogue: CatalogueSource) -> Self {
        Self {
            pipeline,
            catalogue: Arc::new(catalogue),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/fetch", post(trigger_fetch))
        .route("/api/items", get(list_items))
        .route("/api/items/{id}/toggle", post(toggle_item))
        .route("/api/items/{id}/vote/{kind}", post(vote_item))
        .route("/api/stats", get(stats))
        .route("/api/top-sources", get(top_sources))
        .route("/api/journey", get(journey))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Handler failure mapped onto a status code and `{"error": ...}` body.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m),
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        tracing::error!(target: "api", error = %e, "store error");
        ApiError::Internal(e.to_string())
    }
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

async fn trigger_fetch(State(state): State<AppState>) -> ApiResult<RunReport> {
    let cfg = match state.catalogue.as_ref() {
        CatalogueSource::Fixed(cfg) => cfg.clone(),
        CatalogueSource::Reload => load_sources_default()
            .map_err(|e| ApiError::Internal(format!("loading sources: {e:#}")))?,
    };
    let report = state.pipeline.run_ingestion(&cfg).await?;
    Ok(Json(report))
}

async fn list_items(
    State(state): State<AppState>,
    Query(filter): Query<ItemFilter>,
) -> ApiResult<Vec<StoredItem>> {
    Ok(Json(state.pipeline.store().list(&filter).await?))
}

#[derive(Serialize)]
struct ToggleOut {
    id: i64,
    checked: bool,
}

async fn toggle_item(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<ToggleOut> {
    match state.pipeline.store().toggle_checked(id).await? {
        Some(checked) => Ok(Json(ToggleOut { id, checked })),
        None => Err(ApiError::NotFound(format!("item {id} not found"))),
    }
}

async fn vote_item(
    State(state): State<AppState>,
    Path((id, kind)): Path<(i64, String)>,
) -> ApiResult<VoteTally> {
    let vote: Vote = kind
        .parse()
        .map_err(|e: anyhow::Error| ApiError::BadRequest(e.to_string()))?;
    state
        .pipeline
        .store()
        .vote(id, vote)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("item {id} not found")))
}

async fn stats(State(state): State<AppState>) -> ApiResult<Stats> {
    Ok(Json(state.pipeline.store().stats().await?))
}

#[derive(Deserialize)]
struct TopSourcesQuery {
    limit: Option<u32>,
}

async fn top_sources(
    State(state): State<AppState>,
    Query(q): Query<TopSourcesQuery>,
) -> ApiResult<Vec<SourceScore>> {
    let limit = q.limit.unwrap_or(DEFAULT_TOP_SOURCES);
    Ok(Json(state.pipeline.store().top_sources(limit).await?))
}

async fn journey(State(state): State<AppState>) -> ApiResult<Journey> {
    Ok(Json(state.pipeline.store().journey().await?))
}
