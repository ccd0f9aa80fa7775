//! HTTP API server.
//!
//! Serves the local catalog's CRUD surface and the combined search surface
//! over JSON.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/api/recipes` | All internal recipes |
//! | `POST` | `/api/recipes` | Create an internal recipe (201) |
//! | `GET`  | `/api/recipes/{id}` | One recipe; `ext_` ids go to TheMealDB |
//! | `PUT`  | `/api/recipes/{id}` | Replace an internal recipe |
//! | `DELETE` | `/api/recipes/{id}` | Delete an internal recipe |
//! | `GET`  | `/api/recipes/search/{query}?limit=N` | Combined search |
//! | `GET`  | `/api/recipes/search/internal/{query}` | Local catalog only |
//! | `GET`  | `/api/recipes/search/external/{query}` | TheMealDB only |
//! | `GET`  | `/api/recipes/external/{id}` | TheMealDB lookup |
//! | `GET`  | `/api/recipes/random?count=N` | Random TheMealDB recipes |
//! | `GET`  | `/health` | Liveness and version |
//!
//! # Error Contract
//!
//! Every error response has the same envelope:
//!
//! ```json
//! { "error": true, "message": "Recipe with ID 'x' not found", "details": {}, "status_code": 404 }
//! ```
//!
//! Unknown routes answer 404 and unsupported methods 405 in the same shape.
//! Validation failures (422) carry per-field messages in `details`, keyed by
//! field path (`"ingredients -> 2"`). Unexpected faults (500) never leak
//! their cause; it goes to the log instead.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use recipe_catalog_core::catalog::CatalogError;
use recipe_catalog_core::models::{Recipe, RecipeDraft, RecipeSource, SearchResult};

use crate::config::{Config, SearchConfig};
use crate::services::Services;

/// Shortest accepted search query, in characters, after trimming.
pub const MIN_QUERY_LENGTH: usize = 2;
pub const DEFAULT_RANDOM_COUNT: i64 = 5;
pub const MAX_RANDOM_COUNT: i64 = 20;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    services: Services,
}

impl AppState {
    pub fn new(config: Config, services: Services) -> Self {
        Self {
            config: Arc::new(config),
            services,
        }
    }
}

/// Builds the router with CORS and request tracing applied.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/api/recipes", get(handle_list).post(handle_create))
        .route("/api/recipes/random", get(handle_random))
        .route("/api/recipes/search/{query}", get(handle_search))
        .route(
            "/api/recipes/search/internal/{query}",
            get(handle_search_internal),
        )
        .route(
            "/api/recipes/search/external/{query}",
            get(handle_search_external),
        )
        .route("/api/recipes/external/{id}", get(handle_get_external))
        .route(
            "/api/recipes/{id}",
            get(handle_get).put(handle_update).delete(handle_delete),
        )
        .fallback(handle_unknown_route)
        .method_not_allowed_fallback(handle_method_not_allowed)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Starts the HTTP server on `[server].bind`.
///
/// Runs until Ctrl+C or SIGTERM, drains in-flight requests, then closes the
/// provider client.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let services = Services::from_config(config).await?;
    let provider = services.provider.clone();
    let app = build_router(AppState::new(config.clone(), services));

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind))?;
    info!(bind = %config.server.bind, "recipe server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    provider.close().await;
    info!("recipe server stopped");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}

// ============ Error response ============

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    MethodNotAllowed(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{message}")]
    Validation {
        message: String,
        details: BTreeMap<String, String>,
    },

    #[error("Internal server error occurred")]
    Internal(anyhow::Error),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error envelope shared by every failing endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: bool,
    pub message: String,
    pub details: BTreeMap<String, String>,
    pub status_code: u16,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();
        let details = match self {
            ApiError::Validation { details, .. } => details,
            ApiError::Internal(e) => {
                error!(error = ?e, "request failed");
                BTreeMap::new()
            }
            _ => BTreeMap::new(),
        };
        let body = ErrorBody {
            error: true,
            message,
            details,
            status_code: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(_) => ApiError::NotFound(err.to_string()),
            CatalogError::Validation(errors) => ApiError::Validation {
                message: "Validation failed".to_string(),
                details: errors.fields,
            },
            CatalogError::DuplicateTitle(_) => ApiError::Conflict(err.to_string()),
            CatalogError::ReadOnly(_) => ApiError::BadRequest(err.to_string()),
            CatalogError::Store(e) => ApiError::Internal(e),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let mut details = BTreeMap::new();
        details.insert("body".to_string(), rejection.body_text());
        ApiError::Validation {
            message: "Invalid request body".to_string(),
            details,
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

type ApiResult<T> = Result<T, ApiError>;

// ============ Request validation ============

#[derive(Debug, Deserialize)]
struct SearchParams {
    limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RandomParams {
    count: Option<i64>,
}

/// Trims and checks a search query.
fn validate_query(raw: &str) -> ApiResult<String> {
    let query = raw.trim();
    if query.is_empty() {
        return Err(ApiError::BadRequest("Search query cannot be empty".to_string()));
    }
    if query.chars().count() < MIN_QUERY_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Search query must be at least {} characters long",
            MIN_QUERY_LENGTH
        )));
    }
    Ok(query.to_string())
}

/// Applies the default, rejects non-positive values, clamps to the maximum.
fn resolve_limit(limit: Option<i64>, config: &SearchConfig) -> ApiResult<usize> {
    match limit {
        None => Ok(config.default_limit),
        Some(n) if n < 1 => Err(ApiError::BadRequest("limit must be at least 1".to_string())),
        Some(n) => Ok(usize::try_from(n)
            .unwrap_or(usize::MAX)
            .min(config.max_limit)),
    }
}

fn resolve_random_count(count: Option<i64>) -> ApiResult<usize> {
    let count = count.unwrap_or(DEFAULT_RANDOM_COUNT);
    if !(1..=MAX_RANDOM_COUNT).contains(&count) {
        return Err(ApiError::BadRequest(format!(
            "count must be between 1 and {}",
            MAX_RANDOM_COUNT
        )));
    }
    Ok(count as usize)
}

fn require_id(raw: &str) -> ApiResult<&str> {
    let id = raw.trim();
    if id.is_empty() {
        return Err(ApiError::BadRequest("Recipe ID cannot be empty".to_string()));
    }
    Ok(id)
}

// ============ Handlers ============

async fn handle_health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[derive(Serialize)]
struct RecipeList {
    recipes: Vec<Recipe>,
}

async fn handle_unknown_route(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("Route '{}' not found", uri.path()))
}

async fn handle_method_not_allowed(method: Method, uri: Uri) -> ApiError {
    ApiError::MethodNotAllowed(format!(
        "Method {} is not allowed on '{}'",
        method,
        uri.path()
    ))
}

async fn handle_list(State(state): State<AppState>) -> ApiResult<Json<RecipeList>> {
    let recipes = state.services.catalog.get_all().await?;
    Ok(Json(RecipeList { recipes }))
}

async fn handle_get(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<Recipe>> {
    let Path(id) = id?;
    let id = require_id(&id)?;
    match RecipeSource::from_id(id) {
        RecipeSource::External => fetch_external(&state, id).await.map(Json),
        RecipeSource::Internal => Ok(Json(state.services.catalog.get(id).await?)),
    }
}

async fn handle_get_external(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<Recipe>> {
    let Path(id) = id?;
    let id = require_id(&id)?;
    fetch_external(&state, id).await.map(Json)
}

async fn fetch_external(state: &AppState, id: &str) -> ApiResult<Recipe> {
    state
        .services
        .provider
        .get_by_id(id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::NotFound(format!("External recipe with ID '{}' not found", id)))
}

async fn handle_create(
    State(state): State<AppState>,
    payload: Result<Json<RecipeDraft>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Recipe>)> {
    let Json(draft) = payload?;
    let recipe = state.services.catalog.create(draft).await?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

async fn handle_update(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
    payload: Result<Json<RecipeDraft>, JsonRejection>,
) -> ApiResult<Json<Recipe>> {
    let Path(id) = id?;
    let id = require_id(&id)?;
    let Json(draft) = payload?;
    Ok(Json(state.services.catalog.update(id, draft).await?))
}

async fn handle_delete(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    let Path(id) = id?;
    let id = require_id(&id)?;
    state.services.catalog.delete(id).await?;
    Ok(Json(json!({
        "message": "Recipe deleted successfully",
        "id": id,
    })))
}

#[derive(Serialize)]
struct SourceCounts {
    internal: usize,
    external: usize,
}

#[derive(Serialize)]
struct CombinedSearchResponse {
    #[serde(flatten)]
    result: SearchResult,
    sources: SourceCounts,
}

async fn handle_search(
    State(state): State<AppState>,
    query: Result<Path<String>, PathRejection>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult<Json<CombinedSearchResponse>> {
    let Path(query) = query?;
    let query = validate_query(&query)?;
    let Query(params) = params?;
    let limit = resolve_limit(params.limit, &state.config.search)?;

    let result = state.services.search.combined_search(&query, limit).await;
    let sources = SourceCounts {
        internal: result.internal_count,
        external: result.external_count,
    };
    Ok(Json(CombinedSearchResponse { result, sources }))
}

#[derive(Serialize)]
struct ScopedSearchResponse {
    recipes: Vec<Recipe>,
    count: usize,
    query: String,
    source: &'static str,
}

async fn handle_search_internal(
    State(state): State<AppState>,
    query: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<ScopedSearchResponse>> {
    let Path(query) = query?;
    let query = validate_query(&query)?;
    let recipes = state.services.search.internal_search(&query).await;
    Ok(Json(ScopedSearchResponse {
        count: recipes.len(),
        recipes,
        query,
        source: RecipeSource::Internal.as_str(),
    }))
}

async fn handle_search_external(
    State(state): State<AppState>,
    query: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<ScopedSearchResponse>> {
    let Path(query) = query?;
    let query = validate_query(&query)?;
    let recipes = state.services.search.external_search(&query).await;
    Ok(Json(ScopedSearchResponse {
        count: recipes.len(),
        recipes,
        query,
        source: RecipeSource::External.as_str(),
    }))
}

async fn handle_random(
    State(state): State<AppState>,
    params: Result<Query<RandomParams>, QueryRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    let Query(params) = params?;
    let requested = resolve_random_count(params.count)?;
    let recipes = state
        .services
        .provider
        .get_random(requested)
        .await
        .map_err(ApiError::Internal)?;
    Ok(Json(json!({
        "count": recipes.len(),
        "recipes": recipes,
        "requested": requested,
    })))
}
