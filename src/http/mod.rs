
use crate::db::Database;
use crate::pipeline::IngestionPipeline;
use crate::query::{QueryError, QueryFilters, QueryService};
use crate::s3::Storage;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};

pub const PROCESSED_MESSAGE: &str = "Data has been processed!";

/// Shared handles for the request handlers
pub struct AppState<S: Storage, D: Database> {
    pub pipeline: Arc<IngestionPipeline<S, D>>,
    pub query: Arc<QueryService<D>>,
}

// Derived Clone would require S: Clone and D: Clone
impl<S: Storage, D: Database> Clone for AppState<S, D> {
    fn clone(&self) -> Self {
        Self {
            pipeline: self.pipeline.clone(),
            query: self.query.clone(),
        }
    }
}

pub fn router<S: Storage, D: Database>(state: AppState<S, D>) -> Router {
    Router::new()
        .route("/data", get(get_data::<S, D>).post(process_data::<S, D>))
        .route("/health", get(health))
        .with_state(state)
}

/// Errors a handler turns into a JSON error response
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::InvalidFilter { .. } => ApiError::BadRequest(err.to_string()),
            QueryError::Database(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Internal(message) => {
                error!("Request failed: {}", message);
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// `POST /data`: run one ingestion pass. The outcome is only logged.
async fn process_data<S: Storage, D: Database>(
    State(state): State<AppState<S, D>>,
) -> Json<&'static str> {
    info!("Processing triggered over HTTP");
    state.pipeline.process_and_log().await;
    Json(PROCESSED_MESSAGE)
}

/// `GET /data`: users matching the query parameters, keyed by user id
async fn get_data<S: Storage, D: Database>(
    State(state): State<AppState<S, D>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let filters = QueryFilters::from_params(&params)?;
    let users = state.query.query(&filters).await?;
    Ok(Json(users).into_response())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
