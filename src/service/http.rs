use anyhow::{Context, Result};
use reqwest::{header, redirect, Client};
use std::time::Duration;

const PAGE_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; SiteAnalyzer/0.4; +https://github.com/site-analyzer)";

/// Google APIs accept the key as a header, which keeps it out of request URLs
/// and therefore out of error messages.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Clone, Copy)]
pub enum ClientType {
    /// Fetches target pages: browser-like headers, follows up to 10 redirects.
    Page,
    /// Talks to JSON APIs (PageSpeed, Gemini).
    Api,
}

/// Factory for creating an HTTP client with a per-request timeout.
pub fn create_client(client_type: ClientType, timeout: Duration) -> Result<Client> {
    let builder = Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)));

    match client_type {
        ClientType::Page => {
            let mut headers = header::HeaderMap::new();
            headers.insert(
                header::ACCEPT,
                header::HeaderValue::from_static(
                    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
                ),
            );
            builder
                .user_agent(PAGE_USER_AGENT)
                .default_headers(headers)
                .redirect(redirect::Policy::limited(10))
                .build()
                .context("Failed to build page fetch client")
        }
        ClientType::Api => builder
            .user_agent(concat!("site-analyzer/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build API client"),
    }
}
