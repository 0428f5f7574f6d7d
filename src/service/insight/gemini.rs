//! Google Gemini insight generation.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::{FallbackInsights, InsightInput, InsightProvider};
use crate::domain::models::{InsightResult, Source};
use crate::service::http::{create_client, ClientType, API_KEY_HEADER};

/// The JSON document the model is asked to produce.
#[derive(Debug, Deserialize)]
struct InsightPayload {
    summary: String,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    weaknesses: Vec<String>,
    #[serde(default)]
    quick_wins: Vec<String>,
    #[serde(default)]
    strategic_recommendations: String,
}

pub struct GeminiInsights {
    client: Client,
    api_key: String,
    model: String,
    api_base: String,
}

impl GeminiInsights {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        api_base: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: create_client(ClientType::Api, timeout)?,
            api_key: api_key.into(),
            model: model.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }

    async fn request(&self, prompt: &str) -> Result<String> {
        let api_url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base, self.model
        );

        let request_body = json!({
            "contents": [{
                "parts": [{
                    "text": prompt
                }]
            }]
        });

        let response = self
            .client
            .post(&api_url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .context("Failed to send request to Gemini API")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            bail!("Gemini API error {}: {}", status, error_text.chars().take(200).collect::<String>());
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(reqwest::Error::without_url)
            .context("Failed to parse Gemini API response")?;

        let text = response_json["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .context("Failed to extract text from Gemini response")?
            .to_string();

        Ok(text)
    }

    async fn generate_live(&self, input: &InsightInput<'_>) -> Result<InsightResult> {
        let prompt = build_prompt(input);
        let text = self.request(&prompt).await?;
        parse_insights(&text)
    }
}

fn build_prompt(input: &InsightInput<'_>) -> String {
    let seo = input.seo;
    let content = input.content;

    let failing_checks = {
        let lines: Vec<String> = seo
            .failing_checks()
            .iter()
            .map(|c| format!("  - {} (-{:.0})", c.message, c.deduction))
            .collect();
        if lines.is_empty() {
            "  - none".to_string()
        } else {
            lines.join("\n")
        }
    };

    let keywords = content
        .keywords
        .iter()
        .take(5)
        .map(|k| format!("{} ({})", k.keyword, k.count))
        .collect::<Vec<_>>()
        .join(", ");

    let gaps = content.gaps.descriptions(content.thin_content_threshold);
    let gaps = if gaps.is_empty() { "none".to_string() } else { gaps.join("; ") };

    let performance = input
        .performance
        .devices()
        .map(|d| match (d.score, &d.metrics) {
            (Some(score), Some(m)) => format!(
                "- {}: score {:.0}/100, FCP {}s, LCP {}s, CLS {}, TBT {}ms",
                d.device.as_str(),
                score,
                fmt_opt(m.first_contentful_paint),
                fmt_opt(m.largest_contentful_paint),
                fmt_opt(m.cumulative_layout_shift),
                fmt_opt(m.total_blocking_time),
            ),
            _ => format!("- {}: not measured", d.device.as_str()),
        })
        .collect::<Vec<_>>()
        .join("\n");

    let keywords = if keywords.is_empty() { "none".to_string() } else { keywords };

    // Single pass: page text containing `{...}` is never re-substituted.
    format!(
        r#"You are an expert website analyst. Your tone is professional, encouraging, and data-driven.

Website: {url}
Overall Score: {overall_score:.1}/100

SEO (score {seo_score:.0}/100):
- Title: {title}
- Meta description: {meta_description}
- H1 headings: {h1_count}
- Images missing alt text: {images_missing_alt}/{total_images}
- Failing checks:
{failing_checks}

CONTENT:
- Word count: {word_count}
- Readability: {readability:.1} ({reading_level})
- Internal / external links: {internal_links} / {external_links}
- Top keywords: {keywords}
- Gaps: {gaps}

PERFORMANCE:
{performance}

Provide:
1. A 2-3 sentence executive summary
2. Top 3 strengths
3. Top 3 weaknesses
4. 3-5 quick wins
5. One-paragraph strategic recommendation

Respond ONLY as valid JSON with this structure:
{{
  "summary": "...",
  "strengths": ["..."],
  "weaknesses": ["..."],
  "quick_wins": ["..."],
  "strategic_recommendations": "..."
}}"#,
        url = input.url,
        overall_score = input.overall_score,
        seo_score = seo.score,
        title = seo.title.as_deref().unwrap_or("(missing)"),
        meta_description = seo.meta_description.as_deref().unwrap_or("(missing)"),
        h1_count = seo.headings.h1,
        images_missing_alt = seo.images_missing_alt,
        total_images = seo.total_images,
        failing_checks = failing_checks,
        word_count = content.word_count,
        readability = content.readability_score,
        reading_level = content.reading_level,
        internal_links = content.internal_links,
        external_links = content.external_links,
        keywords = keywords,
        gaps = gaps,
        performance = performance,
    )
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "n/a".to_string())
}

/// Pull the JSON object out of a model reply that may carry code fences or prose.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn parse_insights(text: &str) -> Result<InsightResult> {
    let json = extract_json_object(text).context("Gemini reply contains no JSON object")?;
    let payload: InsightPayload =
        serde_json::from_str(json).context("Gemini reply is not valid insight JSON")?;

    if payload.summary.trim().is_empty() {
        bail!("Gemini reply has an empty summary");
    }

    Ok(InsightResult {
        summary: payload.summary.trim().to_string(),
        strengths: payload.strengths,
        weaknesses: payload.weaknesses,
        quick_wins: payload.quick_wins,
        strategic_recommendations: payload.strategic_recommendations,
        source: Source::Live,
    })
}

#[async_trait]
impl InsightProvider for GeminiInsights {
    async fn generate(&self, input: &InsightInput<'_>) -> InsightResult {
        log::info!("[INSIGHT] Requesting Gemini insights ({}) for {}", self.model, input.url);
        match self.generate_live(input).await {
            Ok(insights) => insights,
            Err(e) => {
                log::warn!("[INSIGHT] Gemini failed, using templated insights: {:#}", e);
                FallbackInsights::build(input)
            }
        }
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Device, DevicePerformance, PerformanceResult};
    use crate::test_utils::findings;
    use crate::test_utils::mocks::silent_server;
    use mockito::Matcher;

    const MODEL_PATH: &str = "/v1beta/models/gemini-2.0-flash:generateContent";

    fn gemini_reply(text: &str) -> String {
        json!({
            "candidates": [{ "content": { "parts": [{ "text": text }] } }]
        })
        .to_string()
    }

    fn provider(server: &mockito::Server) -> GeminiInsights {
        GeminiInsights::new("test-key", "gemini-2.0-flash", server.url(), Duration::from_secs(5))
            .unwrap()
    }

    #[test]
    fn test_parse_fenced_reply() {
        let text = "Here you go:\n```json\n{\"summary\": \"Solid page.\", \"strengths\": [\"Fast\"], \"weaknesses\": [], \"quick_wins\": [\"Add alt text\"], \"strategic_recommendations\": \"Keep going.\"}\n```";
        let insights = parse_insights(text).unwrap();
        assert_eq!(insights.summary, "Solid page.");
        assert_eq!(insights.strengths, vec!["Fast"]);
        assert_eq!(insights.source, Source::Live);
    }

    #[test]
    fn test_parse_rejects_prose_and_empty_summary() {
        assert!(parse_insights("I cannot help with that.").is_err());
        assert!(parse_insights(r#"{"summary": "  "}"#).is_err());
    }

    #[test]
    fn test_prompt_contains_findings() {
        let seo = findings::seo_with_failures(&[("title", 15.0)]);
        let content = findings::content(800);
        let performance = PerformanceResult::from_devices(vec![DevicePerformance::fallback(
            Device::Mobile,
            "no key",
        )]);
        let input = InsightInput {
            url: "https://example.com/",
            overall_score: 85.0,
            seo: &seo,
            content: &content,
            performance: &performance,
        };

        let prompt = build_prompt(&input);
        assert!(prompt.contains("Website: https://example.com/"));
        assert!(prompt.contains("title failed (-15)"));
        assert!(prompt.contains("Word count: 800"));
        assert!(prompt.contains("- mobile: not measured"));
        assert!(!prompt.contains("{url}"));
    }

    #[test]
    fn test_page_text_with_braces_is_not_substituted() {
        let mut seo = findings::seo_with_failures(&[]);
        seo.title = Some("Deals {performance} and {gaps}".to_string());
        seo.meta_description = Some("Literal {url}".to_string());
        let content = findings::content(500);
        let performance = PerformanceResult::from_devices(vec![DevicePerformance::fallback(
            Device::Desktop,
            "no key",
        )]);
        let input = InsightInput {
            url: "https://example.com/",
            overall_score: 90.0,
            seo: &seo,
            content: &content,
            performance: &performance,
        };

        let prompt = build_prompt(&input);
        assert!(prompt.contains("- Title: Deals {performance} and {gaps}"));
        assert!(prompt.contains("- Meta description: Literal {url}"));
        assert_eq!(prompt.matches("- desktop: not measured").count(), 1);
        assert!(prompt.contains("\n{\n  \"summary\": \"...\","));
    }

    #[tokio::test]
    async fn test_timeout_falls_back() {
        let addr = silent_server().await;
        let provider = GeminiInsights::new(
            "test-key",
            "gemini-2.0-flash",
            format!("http://{}", addr),
            Duration::from_secs(1),
        )
        .unwrap();

        let seo = findings::seo_with_failures(&[("h1", 10.0)]);
        let content = findings::content(500);
        let performance = PerformanceResult::from_devices(vec![]);
        let input = InsightInput {
            url: "https://example.com/",
            overall_score: 90.0,
            seo: &seo,
            content: &content,
            performance: &performance,
        };

        let insights = provider.generate(&input).await;
        assert_eq!(insights.source, Source::Fallback);
        assert_eq!(insights.weaknesses[0], "h1 failed");
    }

    #[tokio::test]
    async fn test_live_insights() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", MODEL_PATH)
            .match_header(API_KEY_HEADER, "test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(gemini_reply(
                r#"{"summary": "Good.", "strengths": [], "weaknesses": ["Slow"], "quick_wins": [], "strategic_recommendations": "Cache."}"#,
            ))
            .create_async()
            .await;

        let seo = findings::seo_with_failures(&[]);
        let content = findings::content(500);
        let performance = PerformanceResult::from_devices(vec![]);
        let input = InsightInput {
            url: "https://example.com/",
            overall_score: 100.0,
            seo: &seo,
            content: &content,
            performance: &performance,
        };

        let insights = provider(&server).generate(&input).await;
        mock.assert_async().await;
        assert_eq!(insights.source, Source::Live);
        assert_eq!(insights.weaknesses, vec!["Slow"]);
    }

    #[tokio::test]
    async fn test_api_error_falls_back() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", MODEL_PATH)
            .match_query(Matcher::Any)
            .with_status(429)
            .with_body(r#"{"error": {"message": "quota"}}"#)
            .create_async()
            .await;

        let seo = findings::seo_with_failures(&[("meta_description", 15.0)]);
        let content = findings::content(500);
        let performance = PerformanceResult::from_devices(vec![]);
        let input = InsightInput {
            url: "https://example.com/",
            overall_score: 85.0,
            seo: &seo,
            content: &content,
            performance: &performance,
        };

        let insights = provider(&server).generate(&input).await;
        assert_eq!(insights.source, Source::Fallback);
        assert_eq!(insights.weaknesses[0], "meta_description failed");
    }

    #[tokio::test]
    async fn test_unparseable_reply_falls_back() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", MODEL_PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(gemini_reply("Sorry, I can't produce JSON today."))
            .create_async()
            .await;

        let seo = findings::seo_with_failures(&[]);
        let content = findings::content(500);
        let performance = PerformanceResult::from_devices(vec![]);
        let input = InsightInput {
            url: "https://example.com/",
            overall_score: 100.0,
            seo: &seo,
            content: &content,
            performance: &performance,
        };

        let insights = provider(&server).generate(&input).await;
        assert_eq!(insights.source, Source::Fallback);
        assert!(!insights.summary.is_empty());
    }
}
