//! services/api/src/web/rest.rs
//!
//! Assembles the REST router, the health endpoint and the master definition
//! for the OpenAPI specification.

use crate::error::ErrorBody;
use crate::web::{
    analysis::{self, analyze_summary_handler, analyze_zip_handler, AnalysisResponse, AnalyzeRequest, InsightResponse},
    auth::{self, login_handler, register_handler, LoginRequest, RegisterRequest},
    state::AppState,
    symptoms::{self, get_symptoms_handler, post_symptoms_handler, MessageResponse},
};
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        symptoms::get_symptoms_handler,
        symptoms::post_symptoms_handler,
        analysis::analyze_summary_handler,
        analysis::analyze_zip_handler,
        auth::register_handler,
        auth::login_handler,
        health_handler,
    ),
    components(
        schemas(
            MessageResponse,
            ErrorBody,
            AnalyzeRequest,
            InsightResponse,
            AnalysisResponse,
            RegisterRequest,
            LoginRequest,
            HealthResponse,
        )
    ),
    tags(
        (name = "Outbreak Watch API", description = "Per-ZIP symptom reports and outbreak analysis.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Router
//=========================================================================================

/// Every API route, bound to the shared state.
pub fn api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/symptoms/{zip}", get(get_symptoms_handler))
        .route("/postSymptoms", post(post_symptoms_handler))
        .route("/analyze", post(analyze_summary_handler))
        .route("/analyze/{zip}", get(analyze_zip_handler))
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

//=========================================================================================
// Health
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

/// Reports whether the database answers.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service and database are up", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse)
    )
)]
pub async fn health_handler(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let (status_code, status) = match state.db.ping().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            error!("Health check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    };

    (
        status_code,
        Json(HealthResponse {
            status,
            service: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}
