//! Google PageSpeed Insights v5 client.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use super::PerformanceProvider;
use crate::domain::models::{Device, DevicePerformance, PerformanceMetrics};
use crate::service::http::{create_client, ClientType, API_KEY_HEADER};

/// Raw response from the runPagespeed endpoint (only the fields we read).
#[derive(Debug, Deserialize)]
struct PageSpeedResponse {
    #[serde(rename = "lighthouseResult")]
    lighthouse_result: LighthouseResult,
}

#[derive(Debug, Deserialize)]
struct LighthouseResult {
    categories: Categories,
    #[serde(default)]
    audits: HashMap<String, Audit>,
}

#[derive(Debug, Deserialize)]
struct Categories {
    performance: Category,
}

#[derive(Debug, Deserialize)]
struct Category {
    score: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Audit {
    #[serde(rename = "numericValue")]
    numeric_value: Option<f64>,
}

/// Why a live measurement failed. The text ends up in the public report as
/// the fallback reason, so it never carries the request URL or the API key.
#[derive(Debug, Error)]
enum PageSpeedError {
    #[error("PageSpeed request timed out")]
    Timeout,

    #[error("PageSpeed request failed: {0}")]
    Transport(reqwest::Error),

    #[error("PageSpeed API returned {0}")]
    Status(StatusCode),

    #[error("PageSpeed response could not be parsed: {0}")]
    Decode(reqwest::Error),

    #[error("PageSpeed response has no performance score")]
    MissingScore,
}

impl PageSpeedError {
    fn transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err.without_url())
        }
    }

    fn decode(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Decode(err.without_url())
        }
    }
}

pub struct PageSpeedProvider {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl PageSpeedProvider {
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: create_client(ClientType::Api, timeout)?,
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        })
    }

    async fn run(&self, url: &Url, device: Device) -> Result<DevicePerformance, PageSpeedError> {
        let response = self
            .client
            .get(&self.endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .query(&[
                ("url", url.as_str()),
                ("strategy", device.as_str()),
                ("category", "performance"),
            ])
            .send()
            .await
            .map_err(PageSpeedError::transport)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            log::debug!("[PAGESPEED] {} body: {}", status, truncate(&error_text, 200));
            return Err(PageSpeedError::Status(status));
        }

        let body: PageSpeedResponse = response.json().await.map_err(PageSpeedError::decode)?;

        parse_result(body, device)
    }
}

fn parse_result(body: PageSpeedResponse, device: Device) -> Result<DevicePerformance, PageSpeedError> {
    let lighthouse = body.lighthouse_result;
    let score = lighthouse
        .categories
        .performance
        .score
        .ok_or(PageSpeedError::MissingScore)?;

    let audit = |key: &str| lighthouse.audits.get(key).and_then(|a| a.numeric_value);
    let seconds = |key: &str| audit(key).map(|ms| round(ms / 1000.0, 2));

    let metrics = PerformanceMetrics {
        first_contentful_paint: seconds("first-contentful-paint"),
        largest_contentful_paint: seconds("largest-contentful-paint"),
        speed_index: seconds("speed-index"),
        time_to_interactive: seconds("interactive"),
        total_blocking_time: audit("total-blocking-time").map(|v| round(v, 0)),
        cumulative_layout_shift: audit("cumulative-layout-shift").map(|v| round(v, 3)),
    };

    Ok(DevicePerformance::live(device, round(score * 100.0, 1), metrics))
}

fn round(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[async_trait]
impl PerformanceProvider for PageSpeedProvider {
    async fn measure(&self, url: &Url, device: Device) -> DevicePerformance {
        match self.run(url, device).await {
            Ok(result) => {
                log::info!(
                    "[PAGESPEED] {} ({}) score={:?}",
                    url,
                    device.as_str(),
                    result.score
                );
                result
            }
            Err(e) => {
                log::warn!(
                    "[PAGESPEED] {} ({}) failed, using fallback: {}",
                    url,
                    device.as_str(),
                    e
                );
                DevicePerformance::fallback(device, e.to_string())
            }
        }
    }

    fn name(&self) -> &'static str {
        "pagespeed"
    }
}
