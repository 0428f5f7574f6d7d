//! Target page retrieval.

use async_trait::async_trait;
use reqwest::{header, Client};
use std::time::{Duration, Instant};
use url::Url;

use crate::error::FetchError;
use crate::service::http::{create_client, ClientType};

/// Largest document accepted for analysis.
pub const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

/// A successfully downloaded HTML document.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub html: String,
    /// URL after following redirects
    pub final_url: Url,
    pub status: u16,
    pub content_type: Option<String>,
    pub elapsed_ms: u64,
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Download `url`. Any failure here is fatal for the analysis.
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError>;
}

pub struct HttpFetcher {
    client: Client,
    max_body_bytes: usize,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            client: create_client(ClientType::Page, timeout)?,
            max_body_bytes: MAX_BODY_BYTES,
        })
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}

fn too_large(url: &Url, limit: usize) -> FetchError {
    FetchError::Body {
        url: url.to_string(),
        message: format!("document exceeds {} bytes", limit),
    }
}

fn body_error(url: &Url, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout { url: url.to_string() }
    } else {
        FetchError::Body {
            url: url.to_string(),
            message: err.without_url().to_string(),
        }
    }
}

/// Decode with the charset named in the Content-Type, defaulting to UTF-8.
fn decode(bytes: &[u8], content_type: Option<&str>) -> String {
    let encoding = content_type
        .and_then(|ct| {
            ct.split(';')
                .filter_map(|param| param.trim().split_once('='))
                .find(|(name, _)| name.trim().eq_ignore_ascii_case("charset"))
                .map(|(_, value)| value.trim().trim_matches('"').to_string())
        })
        .and_then(|label| encoding_rs::Encoding::for_label(label.as_bytes()))
        .unwrap_or(encoding_rs::UTF_8);

    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}

fn is_html(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    mime == "text/html" || mime == "application/xhtml+xml"
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        log::info!("[FETCH] GET {}", url);
        let started = Instant::now();

        let mut response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| FetchError::from_transport(url.as_str(), e))?;

        let status = response.status();
        let final_url = response.url().clone();
        if !status.is_success() {
            log::warn!("[FETCH] {} responded with {}", final_url, status);
            return Err(FetchError::Status {
                url: final_url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        // No Content-Type header is treated as HTML.
        if let Some(ct) = content_type.as_deref() {
            if !is_html(ct) {
                return Err(FetchError::NotHtml {
                    url: final_url.to_string(),
                    content_type: ct.to_string(),
                });
            }
        }

        if response
            .content_length()
            .is_some_and(|len| len > self.max_body_bytes as u64)
        {
            log::warn!("[FETCH] {} declares an oversized body", final_url);
            return Err(too_large(&final_url, self.max_body_bytes));
        }

        // Content-Length may be absent or wrong, so the stream is capped too.
        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| body_error(&final_url, e))?
        {
            if body.len() + chunk.len() > self.max_body_bytes {
                log::warn!("[FETCH] {} body exceeded {} bytes", final_url, self.max_body_bytes);
                return Err(too_large(&final_url, self.max_body_bytes));
            }
            body.extend_from_slice(&chunk);
        }
        let html = decode(&body, content_type.as_deref());

        let elapsed_ms = started.elapsed().as_millis() as u64;
        log::info!(
            "[FETCH] {} - {} bytes in {}ms",
            final_url,
            html.len(),
            elapsed_ms
        );

        Ok(FetchedPage {
            html,
            final_url,
            status: status.as_u16(),
            content_type,
            elapsed_ms,
        })
    }
}
