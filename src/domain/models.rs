//! Rich domain entities - behavior lives WITH data

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ====== Enums ======

/// Which devices the performance service should measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference {
    Mobile,
    Desktop,
    #[default]
    Both,
}

impl DevicePreference {
    /// Devices to measure, mobile first.
    pub fn devices(&self) -> Vec<Device> {
        match self {
            DevicePreference::Mobile => vec![Device::Mobile],
            DevicePreference::Desktop => vec![Device::Desktop],
            DevicePreference::Both => vec![Device::Mobile, Device::Desktop],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Mobile,
    Desktop,
}

impl Device {
    pub fn as_str(&self) -> &'static str {
        match self {
            Device::Mobile => "mobile",
            Device::Desktop => "desktop",
        }
    }
}

/// Where an externally-sourced value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Live,
    Fallback,
}

// ====== Request ======

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({"url": "https://www.example.com", "device": "both"}))]
pub struct AnalysisRequest {
    /// Absolute http(s) URL of the page to analyze
    pub url: String,
    #[serde(default)]
    pub device: DevicePreference,
}

// ====== SEO ======

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HeadingCounts {
    pub h1: usize,
    pub h2: usize,
    pub h3: usize,
    pub h4: usize,
    pub h5: usize,
    pub h6: usize,
}

impl HeadingCounts {
    pub fn increment(&mut self, level: u8) {
        match level {
            1 => self.h1 += 1,
            2 => self.h2 += 1,
            3 => self.h3 += 1,
            4 => self.h4 += 1,
            5 => self.h5 += 1,
            6 => self.h6 += 1,
            _ => {}
        }
    }
}

/// Outcome of a single SEO rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SeoCheck {
    pub key: String,
    pub label: String,
    pub passed: bool,
    /// Points removed from the score (0 when passed)
    pub deduction: f64,
    pub message: String,
    pub recommendation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SeoFindings {
    /// 0-100
    pub score: f64,
    pub title: Option<String>,
    pub title_length: Option<usize>,
    pub meta_description: Option<String>,
    pub meta_description_length: Option<usize>,
    pub headings: HeadingCounts,
    pub h1_tags: Vec<String>,
    pub h2_tags: Vec<String>,
    pub canonical_url: Option<String>,
    pub meta_robots: Option<String>,
    pub open_graph_tags: BTreeMap<String, String>,
    pub structured_data: bool,
    pub total_images: usize,
    pub images_missing_alt: usize,
    /// Share of images carrying alt text (1.0 when there are no images)
    pub alt_coverage: f64,
    pub checks: Vec<SeoCheck>,
}

impl SeoFindings {
    /// Failing checks, largest deduction first. Ties keep rule order.
    pub fn failing_checks(&self) -> Vec<&SeoCheck> {
        let mut failing: Vec<&SeoCheck> = self.checks.iter().filter(|c| !c.passed).collect();
        failing.sort_by(|a, b| b.deduction.total_cmp(&a.deduction));
        failing
    }

    pub fn passing_checks(&self) -> impl Iterator<Item = &SeoCheck> {
        self.checks.iter().filter(|c| c.passed)
    }
}

// ====== Content ======

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct KeywordFrequency {
    pub keyword: String,
    pub count: usize,
    /// count / total words, 4 decimals
    pub density: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ContentGaps {
    pub thin_content: bool,
    pub missing_subheadings: bool,
    pub missing_lists: bool,
}

impl ContentGaps {
    pub fn any(&self) -> bool {
        self.thin_content || self.missing_subheadings || self.missing_lists
    }

    pub fn descriptions(&self, thin_threshold: usize) -> Vec<String> {
        let mut out = Vec::new();
        if self.thin_content {
            out.push(format!("Content length is low (<{} words)", thin_threshold));
        }
        if self.missing_subheadings {
            out.push("No H2 subheadings found".to_string());
        }
        if self.missing_lists {
            out.push("No bullet or numbered lists found".to_string());
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ContentFindings {
    pub word_count: usize,
    pub paragraph_count: usize,
    pub sentence_count: usize,
    /// Flesch Reading Ease
    pub readability_score: f64,
    pub reading_level: String,
    pub heading_structure_score: f64,
    pub keywords: Vec<KeywordFrequency>,
    pub internal_links: usize,
    pub external_links: usize,
    /// mailto:, tel:, javascript: and other non-http targets
    pub other_links: usize,
    pub thin_content_threshold: usize,
    pub gaps: ContentGaps,
}

// ====== Performance ======

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PerformanceMetrics {
    /// seconds
    pub first_contentful_paint: Option<f64>,
    /// seconds
    pub largest_contentful_paint: Option<f64>,
    /// seconds
    pub speed_index: Option<f64>,
    /// seconds
    pub time_to_interactive: Option<f64>,
    /// milliseconds
    pub total_blocking_time: Option<f64>,
    pub cumulative_layout_shift: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DevicePerformance {
    pub device: Device,
    /// 0-100, null when measured by the fallback
    pub score: Option<f64>,
    pub metrics: Option<PerformanceMetrics>,
    pub source: Source,
    /// Why the fallback was used
    pub reason: Option<String>,
}

impl DevicePerformance {
    pub fn live(device: Device, score: f64, metrics: PerformanceMetrics) -> Self {
        Self {
            device,
            score: Some(score),
            metrics: Some(metrics),
            source: Source::Live,
            reason: None,
        }
    }

    pub fn fallback(device: Device, reason: impl Into<String>) -> Self {
        Self {
            device,
            score: None,
            metrics: None,
            source: Source::Fallback,
            reason: Some(reason.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PerformanceResult {
    /// `live` only when every requested device was measured live
    pub source: Source,
    pub mobile: Option<DevicePerformance>,
    pub desktop: Option<DevicePerformance>,
}

impl PerformanceResult {
    pub fn from_devices(results: Vec<DevicePerformance>) -> Self {
        let source = if !results.is_empty() && results.iter().all(|r| r.source == Source::Live) {
            Source::Live
        } else {
            Source::Fallback
        };

        let mut mobile = None;
        let mut desktop = None;
        for result in results {
            match result.device {
                Device::Mobile => mobile = Some(result),
                Device::Desktop => desktop = Some(result),
            }
        }

        Self { source, mobile, desktop }
    }

    pub fn devices(&self) -> impl Iterator<Item = &DevicePerformance> {
        self.mobile.iter().chain(self.desktop.iter())
    }

    pub fn live_scores(&self) -> Vec<f64> {
        self.devices()
            .filter(|d| d.source == Source::Live)
            .filter_map(|d| d.score)
            .collect()
    }
}

// ====== Insights ======

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InsightResult {
    pub summary: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub quick_wins: Vec<String>,
    pub strategic_recommendations: String,
    pub source: Source,
}

// ====== Report ======

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnalysisReport {
    pub id: String,
    /// URL as requested
    pub url: String,
    /// URL after redirects
    pub final_url: String,
    pub device: DevicePreference,
    pub analyzed_at: DateTime<Utc>,
    /// Mean of the SEO score and every live performance score
    pub overall_score: f64,
    pub seo: SeoFindings,
    pub content: ContentFindings,
    pub performance: PerformanceResult,
    pub insights: InsightResult,
}
