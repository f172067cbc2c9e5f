//! Request Handlers
//!
//! Validates query parameters, runs lookups against the loaded store and
//! records per-endpoint metrics.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use super::response::{
    AnalogyResponse, ApiError, LoadingStatusResponse, NeighborsResponse, ReadyResponse,
    RootResponse, SimilarityResponse, VocabularyResponse,
};
use super::AppState;
use crate::loading::LoadingCoordinator;
use crate::metrics::MetricsSnapshot;
use crate::observability::HealthReport;
use crate::vector::{AnalogyQuery, AnalogySolver, VectorStore};

pub const DEFAULT_NEIGHBORS_TOPN: usize = 10;
pub const DEFAULT_ANALOGY_TOPN: usize = 5;
pub const SAMPLE_WORDS: usize = 20;

const ENDPOINTS: &[&str] = &[
    "/health",
    "/ready",
    "/loading-status",
    "/similarity",
    "/neighbors",
    "/analogy",
    "/vocabulary",
    "/stats",
];

#[derive(Debug, Deserialize)]
pub struct SimilarityParams {
    pub word1: String,
    pub word2: String,
}

#[derive(Debug, Deserialize)]
pub struct NeighborsParams {
    pub word: String,
    pub topn: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AnalogyParams {
    pub a: String,
    pub b: String,
    pub c: String,
    pub topn: Option<i64>,
}

/// Lowercase a query word after checking length and charset
pub(crate) fn validate_word(name: &str, value: &str, max_len: usize) -> Result<String, ApiError> {
    let len = value.chars().count();
    if len == 0 || len > max_len {
        return Err(ApiError::InvalidParameter(format!(
            "'{}' must be between 1 and {} characters",
            name, max_len
        )));
    }
    if !value.chars().all(|c| c.is_ascii_alphabetic() || c == '-') {
        return Err(ApiError::InvalidParameter(format!(
            "'{}' may only contain letters and hyphens",
            name
        )));
    }
    Ok(value.to_lowercase())
}

/// Resolve `topn` against its default and the configured ceiling
pub(crate) fn validate_topn(value: Option<i64>, default: usize, max: usize) -> Result<usize, ApiError> {
    let topn = match value {
        Some(n) => n,
        None => return Ok(default.min(max)),
    };
    if topn < 1 || topn > max as i64 {
        return Err(ApiError::InvalidParameter(format!(
            "'topn' must be between 1 and {}",
            max
        )));
    }
    Ok(topn as usize)
}

fn rejection(err: QueryRejection) -> ApiError {
    ApiError::InvalidParameter(err.body_text())
}

/// Run a vocabulary scan off the async executor.
///
/// Fails fast with `NotReady` before anything is scheduled.
async fn scan<T, F>(coordinator: &Arc<LoadingCoordinator>, query: F) -> Result<T, ApiError>
where
    F: FnOnce(&VectorStore) -> crate::error::Result<T> + Send + 'static,
    T: Send + 'static,
{
    coordinator.store()?;

    let coordinator = Arc::clone(coordinator);
    tokio::task::spawn_blocking(move || query(coordinator.store()?))
        .await
        .map_err(|e| ApiError::Internal(format!("query task failed: {}", e)))?
        .map_err(ApiError::from)
}

fn finish<T>(
    state: &AppState,
    endpoint: &str,
    started: Instant,
    result: Result<T, ApiError>,
) -> Result<Json<T>, ApiError> {
    let elapsed = started.elapsed();
    state.metrics.record_query(endpoint, elapsed, result.is_ok());
    match &result {
        Ok(_) => debug!(endpoint, latency = ?elapsed, "Query served"),
        Err(e) => debug!(endpoint, latency = ?elapsed, error = %e, "Query rejected"),
    }
    result.map(Json)
}

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        name: crate::observability::SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        status: "running",
        endpoints: ENDPOINTS,
    })
}

pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(state.health.check())
}

pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    if state.health.readiness() {
        (StatusCode::OK, Json(ReadyResponse { ready: true }))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyResponse { ready: false }),
        )
    }
}

pub async fn loading_status(State(state): State<AppState>) -> Json<LoadingStatusResponse> {
    let status = state.coordinator.status();
    Json(LoadingStatusResponse {
        model_loaded: status.is_ready(),
        loading_progress: status.progress(),
        loading_status: status.message(),
        vocabulary_size: status.vocabulary_size(),
    })
}

pub async fn similarity(
    State(state): State<AppState>,
    params: Result<Query<SimilarityParams>, QueryRejection>,
) -> Result<Json<SimilarityResponse>, ApiError> {
    let started = Instant::now();
    let result = similarity_query(&state, params);
    finish(&state, "similarity", started, result)
}

fn similarity_query(
    state: &AppState,
    params: Result<Query<SimilarityParams>, QueryRejection>,
) -> Result<SimilarityResponse, ApiError> {
    let Query(params) = params.map_err(rejection)?;
    let word1 = validate_word("word1", &params.word1, state.limits.max_word_len)?;
    let word2 = validate_word("word2", &params.word2, state.limits.max_word_len)?;

    let similarity = state.coordinator.store()?.similarity(&word1, &word2)?;
    Ok(SimilarityResponse {
        word1,
        word2,
        similarity,
    })
}

pub async fn neighbors(
    State(state): State<AppState>,
    params: Result<Query<NeighborsParams>, QueryRejection>,
) -> Result<Json<NeighborsResponse>, ApiError> {
    let started = Instant::now();
    let result = neighbors_query(&state, params).await;
    finish(&state, "neighbors", started, result)
}

async fn neighbors_query(
    state: &AppState,
    params: Result<Query<NeighborsParams>, QueryRejection>,
) -> Result<NeighborsResponse, ApiError> {
    let Query(params) = params.map_err(rejection)?;
    let word = validate_word("word", &params.word, state.limits.max_word_len)?;
    let topn = validate_topn(params.topn, DEFAULT_NEIGHBORS_TOPN, state.limits.max_topn)?;

    let query_word = word.clone();
    let neighbors = scan(&state.coordinator, move |store| {
        let topn = topn.min(store.len().saturating_sub(1));
        store.neighbors(&query_word, topn)
    })
    .await?;

    Ok(NeighborsResponse { word, neighbors })
}

pub async fn analogy(
    State(state): State<AppState>,
    params: Result<Query<AnalogyParams>, QueryRejection>,
) -> Result<Json<AnalogyResponse>, ApiError> {
    let started = Instant::now();
    let result = analogy_query(&state, params).await;
    finish(&state, "analogy", started, result)
}

async fn analogy_query(
    state: &AppState,
    params: Result<Query<AnalogyParams>, QueryRejection>,
) -> Result<AnalogyResponse, ApiError> {
    let Query(params) = params.map_err(rejection)?;
    let max_len = state.limits.max_word_len;
    let query = AnalogyQuery::new(
        validate_word("a", &params.a, max_len)?,
        validate_word("b", &params.b, max_len)?,
        validate_word("c", &params.c, max_len)?,
    );
    let topn = validate_topn(params.topn, DEFAULT_ANALOGY_TOPN, state.limits.max_topn)?;

    let analogy = query.to_string();
    let results = scan(&state.coordinator, move |store| {
        AnalogySolver::new(store).solve_query(&query, topn)
    })
    .await?;

    Ok(AnalogyResponse { analogy, results })
}

pub async fn vocabulary(State(state): State<AppState>) -> Result<Json<VocabularyResponse>, ApiError> {
    let store = state.coordinator.store()?;
    Ok(Json(VocabularyResponse {
        vocabulary_size: store.len(),
        vector_dimensions: store.dimension(),
        sample_words: store
            .sample_words(SAMPLE_WORDS)
            .into_iter()
            .map(str::to_string)
            .collect(),
    }))
}

pub async fn stats(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}
