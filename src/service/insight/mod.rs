//! Narrative insight providers.
//!
//! - **Gemini**: asks the Gemini API for a JSON insight document
//! - **Fallback**: deterministic summary templated from the findings
//!
//! Like the performance providers, these never fail. The live provider falls
//! back to the templated summary on any error.

mod fallback;
mod gemini;

pub use fallback::FallbackInsights;
pub use gemini::GeminiInsights;

use async_trait::async_trait;

use crate::domain::models::{ContentFindings, InsightResult, PerformanceResult, SeoFindings};

/// Everything the insight step gets to see about a page.
#[derive(Debug, Clone, Copy)]
pub struct InsightInput<'a> {
    pub url: &'a str,
    pub overall_score: f64,
    pub seo: &'a SeoFindings,
    pub content: &'a ContentFindings,
    pub performance: &'a PerformanceResult,
}

#[async_trait]
pub trait InsightProvider: Send + Sync {
    async fn generate(&self, input: &InsightInput<'_>) -> InsightResult;

    /// Human-readable name for this provider.
    fn name(&self) -> &'static str;
}
