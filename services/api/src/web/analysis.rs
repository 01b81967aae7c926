//! services/api/src/web/analysis.rs
//!
//! Handlers that forward text to the language model: a raw passthrough and the
//! per-ZIP outbreak analysis.

use crate::error::{ApiError, ErrorBody};
use crate::web::extract::ApiJson;
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use outbreak_core::{
    build_outbreak_prompt, summarize_window, OutbreakContext, ANALYST_SYSTEM_PROMPT,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct AnalyzeRequest {
    pub summary: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct InsightResponse {
    pub insight: String,
}

#[derive(Serialize, ToSchema)]
pub struct AnalysisResponse {
    /// The model's reply, unmodified.
    pub analysis: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /analyze - Send a free-form summary to the language model
#[utoipa::path(
    post,
    path = "/analyze",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "The model's answer", body = InsightResponse),
        (status = 400, description = "Missing summary", body = ErrorBody),
        (status = 500, description = "Language model failure", body = ErrorBody)
    )
)]
pub async fn analyze_summary_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<AnalyzeRequest>,
) -> Result<Json<InsightResponse>, ApiError> {
    let summary = req
        .summary
        .filter(|summary| !summary.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("summary is required".to_string()))?;

    let insight = state
        .text_generator
        .generate(ANALYST_SYSTEM_PROMPT, &summary)
        .await?;

    Ok(Json(InsightResponse {
        insight: insight.trim().to_string(),
    }))
}

/// GET /analyze/{zip} - Outbreak analysis over the ZIP's recent reports
#[utoipa::path(
    get,
    path = "/analyze/{zip}",
    params(("zip" = String, Path, description = "The ZIP code.")),
    responses(
        (status = 200, description = "The model's analysis", body = AnalysisResponse),
        (status = 400, description = "Population missing for this ZIP", body = ErrorBody),
        (status = 404, description = "Unknown ZIP or no metadata row", body = ErrorBody),
        (status = 500, description = "Language model or database failure", body = ErrorBody)
    )
)]
pub async fn analyze_zip_handler(
    State(state): State<Arc<AppState>>,
    Path(zip): Path<String>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let record = state.db.get_zip_record(&zip).await?;

    let population = record
        .population
        .filter(|population| *population > 0)
        .map(|population| population as u64)
        .ok_or_else(|| ApiError::Validation("Population data missing for this ZIP".to_string()))?;

    let zip_metadata = state.zip_metadata.describe_zip(&zip).await?;
    let summary = summarize_window(&record.entries, state.config.analysis_window_days);

    let prompt = build_outbreak_prompt(&OutbreakContext {
        zip: &zip,
        population,
        summary: &summary,
        zip_metadata: &zip_metadata,
    });

    info!(
        zip = %zip,
        entries_included = summary.entries_included,
        "Requesting outbreak analysis"
    );
    let analysis = state
        .text_generator
        .generate(ANALYST_SYSTEM_PROMPT, &prompt)
        .await?;

    Ok(Json(AnalysisResponse { analysis }))
}
