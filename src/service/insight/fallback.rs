use async_trait::async_trait;

use super::{InsightInput, InsightProvider};
use crate::domain::models::{InsightResult, Source};

/// Builds insights from the findings alone, with no network access.
#[derive(Debug, Default, Clone, Copy)]
pub struct FallbackInsights;

impl FallbackInsights {
    pub fn build(input: &InsightInput<'_>) -> InsightResult {
        let failing = input.seo.failing_checks();

        // ====== Weaknesses ======
        let mut weaknesses: Vec<String> = failing.iter().map(|c| c.message.clone()).collect();
        weaknesses.extend(
            input
                .content
                .gaps
                .descriptions(input.content.thin_content_threshold),
        );
        for device in input.performance.devices() {
            if let Some(score) = device.score {
                if score < 50.0 {
                    weaknesses.push(format!(
                        "Poor {} performance score ({:.0}/100)",
                        device.device.as_str(),
                        score
                    ));
                } else if score < 90.0 {
                    weaknesses.push(format!(
                        "{} performance needs improvement ({:.0}/100)",
                        capitalize(device.device.as_str()),
                        score
                    ));
                }
            }
        }

        // ====== Strengths ======
        let mut strengths: Vec<String> = input.seo.passing_checks().map(|c| c.message.clone()).collect();
        if input.content.word_count > 0 && input.content.readability_score >= 60.0 {
            strengths.push(format!(
                "Content is easy to read ({}, Flesch {:.1})",
                input.content.reading_level, input.content.readability_score
            ));
        }
        for device in input.performance.devices() {
            if let Some(score) = device.score.filter(|s| *s >= 90.0) {
                strengths.push(format!(
                    "Fast {} performance ({:.0}/100)",
                    device.device.as_str(),
                    score
                ));
            }
        }

        // ====== Quick wins ======
        let mut quick_wins: Vec<String> = failing
            .iter()
            .filter_map(|c| c.recommendation.clone())
            .collect();
        if input.content.gaps.missing_subheadings {
            quick_wins.push("Break the content up with descriptive H2 subheadings".to_string());
        }
        if input.content.gaps.missing_lists {
            quick_wins.push("Use bullet or numbered lists for scannable content".to_string());
        }

        let summary = match failing.first() {
            Some(weakest) => format!(
                "{} scored {:.0}/100 overall with an SEO score of {:.0}/100 and {} failing check{}. The most significant issue: {}.",
                input.url,
                input.overall_score,
                input.seo.score,
                failing.len(),
                if failing.len() == 1 { "" } else { "s" },
                weakest.message
            ),
            None => format!(
                "{} scored {:.0}/100 overall and passes all {} on-page SEO checks.",
                input.url,
                input.overall_score,
                input.seo.checks.len()
            ),
        };

        InsightResult {
            summary,
            strengths,
            weaknesses,
            quick_wins,
            strategic_recommendations: strategic_recommendation(input),
            source: Source::Fallback,
        }
    }
}

fn strategic_recommendation(input: &InsightInput<'_>) -> String {
    let mut parts = Vec::new();
    if input.seo.score < 80.0 {
        parts.push("Prioritise the on-page SEO fixes above, starting with the largest deductions.".to_string());
    } else {
        parts.push("On-page SEO fundamentals are in good shape; focus on keeping them consistent across the site.".to_string());
    }
    if input.content.gaps.thin_content {
        parts.push(format!(
            "Expand the page beyond {} words with content that answers your audience's questions.",
            input.content.thin_content_threshold
        ));
    }
    if input.performance.devices().any(|d| d.score.is_none()) {
        parts.push("Performance could not be measured for every device; configure PAGESPEED_API_KEY for Lighthouse data.".to_string());
    } else if !input.performance.live_scores().iter().all(|s| *s >= 90.0) {
        parts.push("Improve loading speed by reducing render-blocking resources and optimising images.".to_string());
    }
    parts.join(" ")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[async_trait]
impl InsightProvider for FallbackInsights {
    async fn generate(&self, input: &InsightInput<'_>) -> InsightResult {
        Self::build(input)
    }

    fn name(&self) -> &'static str {
        "fallback"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Device, DevicePerformance, PerformanceMetrics, PerformanceResult};
    use crate::test_utils::findings;

    #[test]
    fn test_weakest_check_leads_weaknesses_and_summary() {
        let seo = findings::seo_with_failures(&[("canonical", 5.0), ("title", 15.0)]);
        let content = findings::content(450);
        let performance = PerformanceResult::from_devices(vec![
            DevicePerformance::fallback(Device::Mobile, "no key"),
            DevicePerformance::fallback(Device::Desktop, "no key"),
        ]);
        let input = InsightInput {
            url: "https://example.com/",
            overall_score: 80.0,
            seo: &seo,
            content: &content,
            performance: &performance,
        };

        let insights = FallbackInsights::build(&input);
        assert_eq!(insights.source, Source::Fallback);
        assert_eq!(insights.weaknesses[0], "title failed");
        assert_eq!(insights.weaknesses[1], "canonical failed");
        assert!(insights.summary.contains("title failed"));
        assert_eq!(insights.quick_wins[0], "fix title");
        assert!(insights.strengths.contains(&"h1 passed".to_string()));
        assert!(insights.strategic_recommendations.contains("PAGESPEED_API_KEY"));
    }

    #[test]
    fn test_gaps_and_slow_pages_become_weaknesses() {
        let seo = findings::seo_with_failures(&[]);
        let mut content = findings::content(120);
        content.gaps.thin_content = true;
        let performance = PerformanceResult::from_devices(vec![DevicePerformance::live(
            Device::Mobile,
            42.0,
            PerformanceMetrics::default(),
        )]);
        let input = InsightInput {
            url: "https://example.com/",
            overall_score: 71.0,
            seo: &seo,
            content: &content,
            performance: &performance,
        };

        let insights = FallbackInsights::build(&input);
        assert_eq!(
            insights.weaknesses,
            vec![
                "Content length is low (<300 words)".to_string(),
                "Poor mobile performance score (42/100)".to_string(),
            ]
        );
        assert!(insights.summary.contains("passes all"));
        assert!(!insights.summary.is_empty());
    }
}
