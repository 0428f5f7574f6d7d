//! Runtime configuration.
//!
//! Everything is read from the process environment (optionally seeded from a
//! `.env` file). Both external-service credentials are optional: without them
//! the service still answers with fallback performance and insight data.

use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGESPEED_API_BASE: &str =
    "https://www.googleapis.com/pagespeedonline/v5/runPagespeed";
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_api_base: String,
    pub pagespeed_api_key: Option<String>,
    pub pagespeed_api_base: String,
    pub fetch_timeout: Duration,
    pub pagespeed_timeout: Duration,
    pub ai_timeout: Duration,
    pub scoring: ScoringConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_api_base: DEFAULT_GEMINI_API_BASE.to_string(),
            pagespeed_api_key: None,
            pagespeed_api_base: DEFAULT_PAGESPEED_API_BASE.to_string(),
            fetch_timeout: Duration::from_secs(30),
            pagespeed_timeout: Duration::from_secs(60),
            ai_timeout: Duration::from_secs(45),
            scoring: ScoringConfig::default(),
        }
    }
}

impl Settings {
    /// Load settings from the process environment. `main` loads `.env` into it first.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Split out so tests don't
    /// have to mutate the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let text = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let scoring = match text("SCORING_CONFIG") {
            Some(path) => ScoringConfig::from_file(Path::new(&path))?,
            None => ScoringConfig::default(),
        };

        Ok(Self {
            host: text("HOST").unwrap_or(defaults.host),
            port: parse_or(text("PORT"), "PORT", defaults.port)?,
            gemini_api_key: text("GEMINI_API_KEY"),
            gemini_model: text("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            gemini_api_base: text("GEMINI_API_BASE").unwrap_or(defaults.gemini_api_base),
            pagespeed_api_key: text("PAGESPEED_API_KEY"),
            pagespeed_api_base: text("PAGESPEED_API_BASE").unwrap_or(defaults.pagespeed_api_base),
            fetch_timeout: secs_or(text("FETCH_TIMEOUT_SECS"), "FETCH_TIMEOUT_SECS", defaults.fetch_timeout)?,
            pagespeed_timeout: secs_or(
                text("PAGESPEED_TIMEOUT_SECS"),
                "PAGESPEED_TIMEOUT_SECS",
                defaults.pagespeed_timeout,
            )?,
            ai_timeout: secs_or(text("AI_TIMEOUT_SECS"), "AI_TIMEOUT_SECS", defaults.ai_timeout)?,
            scoring,
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid bind address {}:{}", self.host, self.port))
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(v) => v
            .parse::<T>()
            .with_context(|| format!("{} has an invalid value: {}", key, v)),
        None => Ok(default),
    }
}

fn secs_or(value: Option<String>, key: &str, default: Duration) -> Result<Duration> {
    let secs = parse_or::<u64>(value, key, default.as_secs())?;
    Ok(Duration::from_secs(secs))
}

// ============================================================================
// SCORING CONFIGURATION
// ============================================================================

/// Inclusive character-length window for a text element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LengthRange {
    pub min: usize,
    pub max: usize,
}

impl LengthRange {
    pub fn contains(&self, len: usize) -> bool {
        len >= self.min && len <= self.max
    }
}

/// Points removed from the 100-point SEO score when a check fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeoWeights {
    pub title_missing: f64,
    pub title_length: f64,
    pub meta_description_missing: f64,
    pub meta_description_length: f64,
    pub h1_missing: f64,
    pub h1_multiple: f64,
    pub canonical_missing: f64,
    pub open_graph_missing: f64,
    pub structured_data_missing: f64,
    pub viewport_missing: f64,
    pub noindex: f64,
    pub alt_coverage_poor: f64,
    pub alt_coverage_partial: f64,
}

impl Default for SeoWeights {
    fn default() -> Self {
        Self {
            title_missing: 15.0,
            title_length: 5.0,
            meta_description_missing: 15.0,
            meta_description_length: 5.0,
            h1_missing: 15.0,
            h1_multiple: 5.0,
            canonical_missing: 5.0,
            open_graph_missing: 5.0,
            structured_data_missing: 5.0,
            viewport_missing: 5.0,
            noindex: 10.0,
            alt_coverage_poor: 10.0,
            alt_coverage_partial: 5.0,
        }
    }
}

/// Thresholds and weights used by the SEO and content analyzers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub title_length: LengthRange,
    pub meta_description_length: LengthRange,
    /// Alt coverage below this ratio takes the `alt_coverage_poor` deduction
    pub alt_coverage_poor_below: f64,
    /// Alt coverage below this ratio takes the `alt_coverage_partial` deduction
    pub alt_coverage_partial_below: f64,
    pub weights: SeoWeights,
    /// Pages with fewer words are flagged as thin content
    pub thin_content_words: usize,
    pub keyword_top_n: usize,
    pub keyword_min_length: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            title_length: LengthRange { min: 10, max: 60 },
            meta_description_length: LengthRange { min: 50, max: 160 },
            alt_coverage_poor_below: 0.5,
            alt_coverage_partial_below: 0.8,
            weights: SeoWeights::default(),
            thin_content_words: 300,
            keyword_top_n: 10,
            keyword_min_length: 3,
        }
    }
}

impl ScoringConfig {
    /// Load a scoring override from a JSON file. Missing fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scoring config {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse scoring config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings.port, 8000);
        assert!(settings.gemini_api_key.is_none());
        assert!(settings.pagespeed_api_key.is_none());
        assert_eq!(settings.fetch_timeout, Duration::from_secs(30));
        assert_eq!(settings.scoring, ScoringConfig::default());
    }

    #[test]
    fn blank_keys_are_treated_as_absent() {
        let settings = Settings::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "   "),
            ("PAGESPEED_API_KEY", "psi-key"),
        ]))
        .unwrap();
        assert!(settings.gemini_api_key.is_none());
        assert_eq!(settings.pagespeed_api_key.as_deref(), Some("psi-key"));
    }

    #[test]
    fn malformed_port_is_rejected() {
        let err = Settings::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn timeouts_are_read_in_seconds() {
        let settings = Settings::from_lookup(lookup(&[("AI_TIMEOUT_SECS", "5")])).unwrap();
        assert_eq!(settings.ai_timeout, Duration::from_secs(5));
    }

    #[test]
    fn scoring_file_overrides_only_given_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"thin_content_words": 500, "weights": {{"canonical_missing": 8.0}}}}"#
        )
        .unwrap();

        let path = file.path().to_string_lossy().to_string();
        let settings = Settings::from_lookup(lookup(&[("SCORING_CONFIG", path.as_str())])).unwrap();

        assert_eq!(settings.scoring.thin_content_words, 500);
        assert_eq!(settings.scoring.weights.canonical_missing, 8.0);
        assert_eq!(settings.scoring.weights.title_missing, 15.0);
        assert_eq!(settings.scoring.title_length, LengthRange { min: 10, max: 60 });
    }
}
