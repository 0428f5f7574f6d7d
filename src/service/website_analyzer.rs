//! WebsiteAnalyzer - runs one analysis request end to end.
//!
//! Order of work:
//! 1. validate the URL (no network before this succeeds)
//! 2. fetch the page
//! 3. SEO + content analysis on a blocking worker, joined with the
//!    performance measurements
//! 4. insights over everything gathered
//! 5. assemble the report

use std::sync::Arc;

use chrono::Utc;
use url::Url;
use uuid::Uuid;

use crate::config::{ScoringConfig, Settings};
use crate::domain::models::{AnalysisReport, AnalysisRequest, PerformanceResult, SeoFindings};
use crate::error::{AppError, Result};
use crate::service::analyzer::analyze_document;
use crate::service::fetcher::{HttpFetcher, PageFetcher};
use crate::service::insight::{FallbackInsights, GeminiInsights, InsightInput, InsightProvider};
use crate::service::performance::{
    measure_all, FallbackPerformance, PageSpeedProvider, PerformanceProvider,
};

/// Parse and check a user-supplied URL: absolute, http(s), with a host.
pub fn validate_url(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AppError::invalid_url("URL must not be empty"));
    }

    let url = Url::parse(raw).map_err(|e| AppError::invalid_url(format!("{}: {}", raw, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::invalid_url(format!(
            "{}: only http and https URLs can be analyzed",
            raw
        )));
    }
    if url.host_str().map(str::is_empty).unwrap_or(true) {
        return Err(AppError::invalid_url(format!("{}: URL has no host", raw)));
    }
    Ok(url)
}

/// Mean of the SEO score and every live performance score, 1 decimal.
pub fn overall_score(seo: &SeoFindings, performance: &PerformanceResult) -> f64 {
    let mut scores = performance.live_scores();
    scores.push(seo.score);
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    (mean * 10.0).round() / 10.0
}

pub struct WebsiteAnalyzer {
    fetcher: Arc<dyn PageFetcher>,
    performance: Arc<dyn PerformanceProvider>,
    insights: Arc<dyn InsightProvider>,
    scoring: Arc<ScoringConfig>,
}

impl WebsiteAnalyzer {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        performance: Arc<dyn PerformanceProvider>,
        insights: Arc<dyn InsightProvider>,
        scoring: ScoringConfig,
    ) -> Self {
        Self {
            fetcher,
            performance,
            insights,
            scoring: Arc::new(scoring),
        }
    }

    /// Wire up live or fallback providers depending on which keys are set.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpFetcher::new(settings.fetch_timeout)?);

        let performance: Arc<dyn PerformanceProvider> = match &settings.pagespeed_api_key {
            Some(key) => Arc::new(PageSpeedProvider::new(
                key.clone(),
                settings.pagespeed_api_base.clone(),
                settings.pagespeed_timeout,
            )?),
            None => {
                log::warn!("PAGESPEED_API_KEY not configured. Performance results will be placeholders.");
                Arc::new(FallbackPerformance::missing_key())
            }
        };

        let insights: Arc<dyn InsightProvider> = match &settings.gemini_api_key {
            Some(key) => Arc::new(GeminiInsights::new(
                key.clone(),
                settings.gemini_model.clone(),
                settings.gemini_api_base.clone(),
                settings.ai_timeout,
            )?),
            None => {
                log::warn!("GEMINI_API_KEY not configured. Insights will be templated from the findings.");
                Arc::new(FallbackInsights)
            }
        };

        log::info!(
            "Analyzer ready (performance: {}, insights: {})",
            performance.name(),
            insights.name()
        );

        Ok(Self::new(fetcher, performance, insights, settings.scoring.clone()))
    }

    pub async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisReport> {
        let url = validate_url(&request.url)?;
        log::info!("[ANALYZE] Starting analysis of {} ({:?})", url, request.device);

        let page = self.fetcher.fetch(&url).await?;
        let final_url = page.final_url;

        // scraper's Html is !Send, so parsing stays on its own thread
        let scoring = Arc::clone(&self.scoring);
        let html = page.html;
        let page_url = final_url.clone();
        let analysis =
            tokio::task::spawn_blocking(move || analyze_document(&html, &page_url, &scoring));
        let measurement = measure_all(self.performance.as_ref(), &final_url, request.device);

        let (analysis, performance) = tokio::join!(analysis, measurement);
        let (seo, content) = analysis.map_err(|e| {
            log::error!("[ANALYZE] Analysis worker failed for {}: {}", final_url, e);
            AppError::internal(format!("Analysis worker failed: {}", e))
        })?;

        let overall_score = overall_score(&seo, &performance);
        let insights = self
            .insights
            .generate(&InsightInput {
                url: final_url.as_str(),
                overall_score,
                seo: &seo,
                content: &content,
                performance: &performance,
            })
            .await;

        log::info!(
            "[ANALYZE] Finished {} - overall {:.1}, seo {:.1}, performance {:?}, insights {:?}",
            final_url,
            overall_score,
            seo.score,
            performance.source,
            insights.source
        );

        Ok(AnalysisReport {
            id: Uuid::new_v4().to_string(),
            url: request.url.trim().to_string(),
            final_url: final_url.to_string(),
            device: request.device,
            analyzed_at: Utc::now(),
            overall_score,
            seo,
            content,
            performance,
            insights,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{
        Device, DevicePerformance, DevicePreference, PerformanceMetrics, Source,
    };
    use crate::test_utils::{findings, fixtures, mocks};

    fn request(url: &str, device: DevicePreference) -> AnalysisRequest {
        AnalysisRequest {
            url: url.to_string(),
            device,
        }
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.com").is_ok());
        assert!(validate_url("  http://example.com/path?q=1 ").is_ok());
        assert!(matches!(validate_url("not a url"), Err(AppError::InvalidUrl(_))));
        assert!(matches!(validate_url(""), Err(AppError::InvalidUrl(_))));
        assert!(matches!(validate_url("ftp://example.com"), Err(AppError::InvalidUrl(_))));
        assert!(matches!(validate_url("mailto:me@example.com"), Err(AppError::InvalidUrl(_))));
    }

    #[test]
    fn test_overall_score_ignores_fallback_devices() {
        let seo = findings::seo_with_failures(&[("title", 15.0)]);
        let performance = PerformanceResult::from_devices(vec![
            DevicePerformance::live(Device::Mobile, 65.0, PerformanceMetrics::default()),
            DevicePerformance::fallback(Device::Desktop, "timeout"),
        ]);
        assert_eq!(overall_score(&seo, &performance), 75.0);

        let performance = PerformanceResult::from_devices(vec![DevicePerformance::fallback(
            Device::Mobile,
            "no key",
        )]);
        assert_eq!(overall_score(&seo, &performance), 85.0);
    }

    #[tokio::test]
    async fn test_invalid_url_makes_no_calls() {
        let fetcher = Arc::new(mocks::StubFetcher::ok(fixtures::well_optimized_page()));
        let performance = Arc::new(mocks::CountingPerformance::live(90.0));
        let insights = Arc::new(mocks::CountingInsights::default());
        let analyzer = WebsiteAnalyzer::new(
            fetcher.clone(),
            performance.clone(),
            insights.clone(),
            ScoringConfig::default(),
        );

        let err = analyzer
            .analyze(request("not a url", DevicePreference::Both))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidUrl(_)));
        assert_eq!(fetcher.calls(), 0);
        assert_eq!(performance.calls(), 0);
        assert_eq!(insights.calls(), 0);
    }

    #[tokio::test]
    async fn test_fetch_failure_stops_pipeline() {
        let fetcher = Arc::new(mocks::StubFetcher::unreachable());
        let performance = Arc::new(mocks::CountingPerformance::live(90.0));
        let insights = Arc::new(mocks::CountingInsights::default());
        let analyzer = WebsiteAnalyzer::new(
            fetcher.clone(),
            performance.clone(),
            insights.clone(),
            ScoringConfig::default(),
        );

        let err = analyzer
            .analyze(request("https://example.com", DevicePreference::Both))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Fetch(_)));
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(performance.calls(), 0);
        assert_eq!(insights.calls(), 0);
    }

    #[tokio::test]
    async fn test_full_pipeline_with_live_performance() {
        let fetcher = Arc::new(
            mocks::StubFetcher::ok(fixtures::well_optimized_page())
                .redirecting_to("https://www.example.com/"),
        );
        let performance = Arc::new(mocks::CountingPerformance::live(80.0));
        let insights = Arc::new(mocks::CountingInsights::default());
        let analyzer = WebsiteAnalyzer::new(
            fetcher.clone(),
            performance.clone(),
            insights.clone(),
            ScoringConfig::default(),
        );

        let report = analyzer
            .analyze(request("https://example.com", DevicePreference::Both))
            .await
            .unwrap();

        assert_eq!(report.url, "https://example.com");
        assert_eq!(report.final_url, "https://www.example.com/");
        assert_eq!(report.seo.score, 100.0);
        assert_eq!(report.performance.source, Source::Live);
        // (100 + 80 + 80) / 3
        assert_eq!(report.overall_score, 86.7);
        assert_eq!(performance.calls(), 2);
        assert_eq!(performance.urls(), vec!["https://www.example.com/"; 2]);
        assert_eq!(insights.calls(), 1);
        assert!(!report.id.is_empty());
    }

    #[tokio::test]
    async fn test_single_device_request() {
        let analyzer = WebsiteAnalyzer::new(
            Arc::new(mocks::StubFetcher::ok(fixtures::well_optimized_page())),
            Arc::new(FallbackPerformance::missing_key()),
            Arc::new(FallbackInsights),
            ScoringConfig::default(),
        );

        let report = analyzer
            .analyze(request("https://example.com/", DevicePreference::Mobile))
            .await
            .unwrap();

        assert!(report.performance.desktop.is_none());
        assert_eq!(
            report.performance.mobile.as_ref().map(|d| d.source),
            Some(Source::Fallback)
        );
        assert_eq!(report.overall_score, report.seo.score);
        assert_eq!(report.insights.source, Source::Fallback);
    }
}
