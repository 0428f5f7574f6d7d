//! HTTP surface: router, shared state and the OpenAPI document.

pub mod analysis;
pub mod health;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

use crate::domain::models::{
    AnalysisReport, AnalysisRequest, ContentFindings, ContentGaps, Device, DevicePerformance,
    DevicePreference, HeadingCounts, InsightResult, KeywordFrequency, PerformanceMetrics,
    PerformanceResult, SeoCheck, SeoFindings, Source,
};
use crate::error::ErrorBody;
use crate::service::website_analyzer::WebsiteAnalyzer;

pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<WebsiteAnalyzer>,
}

impl AppState {
    pub fn new(analyzer: WebsiteAnalyzer) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Website Analyzer API",
        description = "Single-page SEO, content, performance and insight analysis"
    ),
    paths(analysis::analyze_website, health::health_check),
    components(schemas(
        AnalysisRequest,
        AnalysisReport,
        DevicePreference,
        Device,
        Source,
        SeoFindings,
        SeoCheck,
        HeadingCounts,
        ContentFindings,
        ContentGaps,
        KeywordFrequency,
        PerformanceResult,
        DevicePerformance,
        PerformanceMetrics,
        InsightResult,
        ErrorBody,
        health::HealthResponse,
    )),
    tags(
        (name = "analysis", description = "Website analysis"),
        (name = "system", description = "Service health")
    )
)]
pub struct ApiDoc;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/analyze", post(analysis::analyze_website))
        .with_state(state.clone());

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api_routes)
        .merge(RapiDoc::with_openapi(OPENAPI_PATH, ApiDoc::openapi()).path("/docs"))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
