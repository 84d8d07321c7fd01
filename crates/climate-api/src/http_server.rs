//! HTTP REST API for the climate dataset.
//!
//! Five read-only JSON routes plus a human-readable index. All dataset
//! work runs on the blocking pool; handlers never touch SQLite directly.

use crate::store::{ClimateStore, StoreError, TempStats};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};

/// Shared state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ClimateStore>,
}

/// JSON error body
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Errors surfaced at the request boundary.
#[derive(Debug)]
pub enum ApiError {
    /// The dataset cannot be reached or queried
    Unavailable(String),
    /// The requested resource does not exist (e.g. no observations to
    /// anchor the trailing-year window)
    NotFound(String),
    /// Task execution failure
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Unavailable(err.to_string())
    }
}

/// Run a store query on the blocking pool.
async fn run_query<T, F>(store: Arc<ClimateStore>, query: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&ClimateStore) -> Result<T, StoreError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || query(&store))
        .await
        .map_err(|e| ApiError::Internal(format!("query task failed: {e}")))?
        .map_err(ApiError::from)
}

/// JSON record for the temperature aggregate endpoints.
#[derive(Debug, Serialize)]
pub struct TempSummaryResponse {
    pub start: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(rename = "TMIN")]
    pub tmin: Option<f64>,
    #[serde(rename = "TAVG")]
    pub tavg: Option<f64>,
    #[serde(rename = "TMAX")]
    pub tmax: Option<f64>,
}

impl TempSummaryResponse {
    fn new(start: String, end: Option<String>, stats: TempStats) -> Self {
        Self {
            start,
            end,
            tmin: stats.tmin,
            tavg: stats.tavg,
            tmax: stats.tmax,
        }
    }
}

/// GET / - Human-readable index of the API routes
async fn index() -> Html<&'static str> {
    Html(
        "<h1>Climate API</h1>\
         <ul>\
         <li><a href='/api/v1.0/precipitation'>/api/v1.0/precipitation</a></li>\
         <li><a href='/api/v1.0/stations'>/api/v1.0/stations</a></li>\
         <li><a href='/api/v1.0/tobs'>/api/v1.0/tobs</a></li>\
         <li>/api/v1.0/&lt;start&gt;</li>\
         <li>/api/v1.0/&lt;start&gt;/&lt;end&gt;</li>\
         </ul>",
    )
}

/// GET /health - Dataset reachability check
async fn health_check(State(state): State<AppState>) -> Result<&'static str, ApiError> {
    run_query(state.store, |store| store.ping()).await?;
    Ok("ok")
}

/// GET /api/v1.0/precipitation - All precipitation readings, duplicate
/// dates preserved as separate entries
async fn precipitation(State(state): State<AppState>) -> Result<Response, ApiError> {
    let readings = run_query(state.store, |store| store.precipitation()).await?;
    Ok(Json(readings).into_response())
}

/// GET /api/v1.0/stations - Station id → display name
async fn stations(State(state): State<AppState>) -> Result<Response, ApiError> {
    let stations = run_query(state.store, |store| store.stations()).await?;
    Ok(Json(stations).into_response())
}

/// GET /api/v1.0/tobs - Temperature observations in the trailing-year
/// window
async fn tobs(State(state): State<AppState>) -> Result<Response, ApiError> {
    let window = run_query(state.store, |store| store.recent_year_tobs())
        .await?
        .ok_or_else(|| {
            ApiError::NotFound("dataset contains no observations".to_string())
        })?;
    log::debug!(
        "trailing-year window: {} rows after {}",
        window.rows.len(),
        window.cutoff
    );
    Ok(Json(window.rows).into_response())
}

/// GET /api/v1.0/{start} - Open-ended temperature aggregate for
/// date >= start
async fn temp_from_start(
    State(state): State<AppState>,
    Path(start): Path<String>,
) -> Result<Response, ApiError> {
    let query_start = start.clone();
    let stats = run_query(state.store, move |store| {
        store.temp_stats(&query_start, None)
    })
    .await?;
    Ok(Json(vec![TempSummaryResponse::new(start, None, stats)]).into_response())
}

/// GET /api/v1.0/{start}/{end} - Temperature aggregate for
/// start <= date <= end
async fn temp_range(
    State(state): State<AppState>,
    Path((start, end)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let (query_start, query_end) = (start.clone(), end.clone());
    let stats = run_query(state.store, move |store| {
        store.temp_stats(&query_start, Some(&query_end))
    })
    .await?;
    Ok(Json(vec![TempSummaryResponse::new(start, Some(end), stats)]).into_response())
}

/// Create the HTTP router
pub fn create_router(store: Arc<ClimateStore>) -> Router {
    let state = AppState { store };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/api/v1.0/precipitation", get(precipitation))
        .route("/api/v1.0/stations", get(stations))
        .route("/api/v1.0/tobs", get(tobs))
        .route("/api/v1.0/{start}", get(temp_from_start))
        .route("/api/v1.0/{start}/{end}", get(temp_range))
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP server until the shutdown channel fires.
pub async fn run_http_server(
    store: Arc<ClimateStore>,
    port: u16,
    mut shutdown: watch::Receiver<()>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = create_router(store);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    log::info!("HTTP server listening on port {}", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.changed().await.ok();
        })
        .await?;

    Ok(())
}
