use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bridge_solver::api::{AnalysisKind, AnalysisRequest, DetailedResult};
use bridge_solver::catalog::Catalog;
use bridge_solver::error::{BridgeError, ErrorKind};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::executor::{ExecutorError, JobStore};
use crate::models::{JobHandle, JobView, ProgressPage, ProgressQuery, VehicleSummary};

/// Application state
pub struct AppState {
    store: Arc<JobStore>,
    workers: usize,
}

impl AppState {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            store: JobStore::new(Catalog::standard(), config),
            workers: config.workers,
        }
    }
}

/// Build the API router
pub fn create_router(config: &ServiceConfig) -> Router {
    let state = AppState::new(config);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check))
        .route("/api/v1/version", get(version_handler))
        .route("/api/v1/catalog/vehicles", get(vehicles_handler))
        .route("/api/v1/analyses", post(submit_handler))
        .route("/api/v1/analyses/:id", get(status_handler))
        .route("/api/v1/analyses/:id/progress", get(progress_handler))
        .route("/api/v1/analyses/:id/detail", get(detail_handler))
        .route("/api/v1/analyses/:id/cancel", post(cancel_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

/// Root endpoint
async fn root_handler() -> Json<serde_json::Value> {
    Json(json!({
        "service": "Bridge Rating Service",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "description": "Girder-line analysis, construction staging and load rating",
        "analysis_kinds": ["influence_lines", "moving_load", "time_dependent", "load_rating"]
    }))
}

/// Health check endpoint
async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let (pending, running, finished) = state.store.counts();
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "plan": state.store.plan(),
        "workers": state.workers,
        "jobs": { "pending": pending, "running": running, "finished": finished }
    }))
}

/// Version endpoint
async fn version_handler() -> Json<serde_json::Value> {
    Json(json!({
        "service": "Bridge Rating Service",
        "version": env!("CARGO_PKG_VERSION"),
        "api_version": "v1",
        "solver": "bridge-solver"
    }))
}

async fn vehicles_handler(State(state): State<Arc<AppState>>) -> Json<Vec<VehicleSummary>> {
    Json(state.store.catalog().vehicles.values().map(VehicleSummary::from).collect())
}

/// Queue an analysis
async fn submit_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalysisRequest>,
) -> Result<(StatusCode, Json<JobHandle>), ApiError> {
    tracing::info!(
        "Received {:?} request: {} spans, {} vehicles",
        request.kind,
        request.girder.spans.len(),
        request.vehicles.len()
    );

    validate_request(&request, state.store.catalog())?;
    let handle = state.store.submit(request)?;
    Ok((StatusCode::ACCEPTED, Json(handle)))
}

async fn status_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobView>, ApiError> {
    Ok(Json(state.store.view(id)?))
}

async fn progress_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<ProgressQuery>,
) -> Result<Json<ProgressPage>, ApiError> {
    Ok(Json(state.store.progress(id, query.since)?))
}

async fn detail_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<DetailedResult>, ApiError> {
    Ok(Json(state.store.detail(id)?))
}

async fn cancel_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobView>, ApiError> {
    Ok(Json(state.store.cancel(id)?))
}

fn validate_request(request: &AnalysisRequest, catalog: &Catalog) -> Result<(), ApiError> {
    let girder = &request.girder;
    if girder.spans.is_empty() {
        return Err(ApiError::ValidationError("Girder must have at least one span".to_string()));
    }
    if girder.spans.iter().any(|&l| !l.is_finite() || l <= 0.0) {
        return Err(ApiError::ValidationError("Span lengths must be positive".to_string()));
    }
    if girder.elements_per_span == 0 {
        return Err(ApiError::ValidationError("elements_per_span must be at least 1".to_string()));
    }
    catalog.shape(&girder.shape)?;
    if matches!(request.kind, AnalysisKind::MovingLoad | AnalysisKind::LoadRating) {
        if request.vehicles.is_empty() {
            return Err(ApiError::ValidationError("Select at least one vehicle".to_string()));
        }
        catalog.vehicles(&request.vehicles)?;
    }
    Ok(())
}

/// API Errors
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Plan limit: {0}")]
    PlanLimit(String),
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<BridgeError> for ApiError {
    fn from(err: BridgeError) -> Self {
        match err.kind() {
            ErrorKind::PlanLimit => ApiError::PlanLimit(err.to_string()),
            ErrorKind::InvalidGeometry | ErrorKind::InvalidInput | ErrorKind::NotFound => {
                ApiError::ValidationError(err.to_string())
            }
            ErrorKind::Singularity | ErrorKind::Cancelled => ApiError::InternalError(err.to_string()),
        }
    }
}

impl From<ExecutorError> for ApiError {
    fn from(err: ExecutorError) -> Self {
        match err {
            ExecutorError::NotFound(_) => ApiError::NotFound(err.to_string()),
            ExecutorError::Conflict(msg) => ApiError::Conflict(msg),
            ExecutorError::Rejected(e) => ApiError::from(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::PlanLimit(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_solver::api::{ExecutionTier, TierLimits};
    use bridge_solver::girder::GirderDefinition;

    fn request(spans: &[f64], vehicles: &[&str]) -> AnalysisRequest {
        let girder = GirderDefinition {
            spans: spans.to_vec(),
            ..GirderDefinition::default()
        };
        AnalysisRequest::new(girder, AnalysisKind::LoadRating).with_vehicles(vehicles)
    }

    #[test]
    fn test_validation() {
        let catalog = Catalog::standard();
        assert!(validate_request(&request(&[80.0], &["HL93"]), &catalog).is_ok());
        assert!(matches!(
            validate_request(&request(&[], &["HL93"]), &catalog),
            Err(ApiError::ValidationError(_))
        ));
        assert!(matches!(
            validate_request(&request(&[80.0, -5.0], &["HL93"]), &catalog),
            Err(ApiError::ValidationError(_))
        ));
        assert!(matches!(
            validate_request(&request(&[80.0], &[]), &catalog),
            Err(ApiError::ValidationError(_))
        ));
        assert!(matches!(
            validate_request(&request(&[80.0], &["NOPE"]), &catalog),
            Err(ApiError::ValidationError(_))
        ));
    }

    #[test]
    fn test_error_status_codes() {
        let plan = BridgeError::PlanLimit {
            requested: ExecutionTier::Unbounded,
            allowed: ExecutionTier::Bounded,
            reason: format!("{:?}", TierLimits::default()),
        };
        let cases = [
            (ApiError::from(plan), StatusCode::UNPROCESSABLE_ENTITY),
            (ApiError::from(ExecutorError::NotFound(Uuid::nil())), StatusCode::NOT_FOUND),
            (ApiError::from(ExecutorError::Conflict("done".into())), StatusCode::CONFLICT),
            (
                ApiError::from(BridgeError::VehicleNotFound("X".into())),
                StatusCode::BAD_REQUEST,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
