//! HTTP Responses
//!
//! JSON bodies for each endpoint and the error mapping shared by handlers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use crate::error::WordVecError;
use crate::vector::Neighbor;

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub status: &'static str,
    pub endpoints: &'static [&'static str],
}

#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
}

#[derive(Debug, Serialize)]
pub struct LoadingStatusResponse {
    pub model_loaded: bool,
    pub loading_progress: u8,
    pub loading_status: String,
    pub vocabulary_size: usize,
}

#[derive(Debug, Serialize)]
pub struct SimilarityResponse {
    pub word1: String,
    pub word2: String,
    pub similarity: f32,
}

#[derive(Debug, Serialize)]
pub struct NeighborsResponse {
    pub word: String,
    pub neighbors: Vec<Neighbor>,
}

#[derive(Debug, Serialize)]
pub struct AnalogyResponse {
    pub analogy: String,
    pub results: Vec<Neighbor>,
}

#[derive(Debug, Serialize)]
pub struct VocabularyResponse {
    pub vocabulary_size: usize,
    pub vector_dimensions: usize,
    pub sample_words: Vec<String>,
}

/// Error returned by query handlers, rendered as `{"detail": ...}`
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Model not loaded")]
    NotReady,

    #[error("Word '{0}' not found in vocabulary")]
    WordNotFound(String),

    #[error("{0}")]
    InvalidParameter(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::WordNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidParameter(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<WordVecError> for ApiError {
    fn from(err: WordVecError) -> Self {
        match err {
            WordVecError::NotReady => ApiError::NotReady,
            WordVecError::WordNotFound(word) => ApiError::WordNotFound(word),
            WordVecError::Load(e) => ApiError::Internal(e.to_string()),
            WordVecError::Transition(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "detail": self.to_string() }));
        (self.status(), body).into_response()
    }
}
