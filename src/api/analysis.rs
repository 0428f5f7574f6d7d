use axum::{extract::State, Json};

use super::AppState;
use crate::domain::models::{AnalysisReport, AnalysisRequest};
use crate::error::{ApiError, ErrorBody};

/// Analyze a single web page.
///
/// Fetches the page, scores its on-page SEO and content, measures performance
/// and summarises the findings. Performance and insights degrade to fallback
/// data instead of failing the request.
#[utoipa::path(
    post,
    path = "/api/analyze",
    tag = "analysis",
    request_body = AnalysisRequest,
    responses(
        (status = 200, description = "Analysis report", body = AnalysisReport),
        (status = 400, description = "Malformed URL", body = ErrorBody),
        (status = 502, description = "Target page could not be fetched", body = ErrorBody),
        (status = 500, description = "Analysis failed unexpectedly", body = ErrorBody)
    )
)]
pub async fn analyze_website(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<AnalysisReport>, ApiError> {
    let report = state.analyzer.analyze(request).await.map_err(|e| {
        log::warn!("[ANALYZE] Request failed: {}", e);
        ApiError::from(e)
    })?;
    Ok(Json(report))
}
