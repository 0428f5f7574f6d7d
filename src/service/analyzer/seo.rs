//! SEO Analyzer - deterministic on-page checks with a deduction-based score.
//!
//! Every rule produces a `SeoCheck`. A failed check removes its configured
//! weight from a 100-point budget; the final score is clamped to 0-100.

use scraper::Html;
use url::Url;

use crate::config::ScoringConfig;
use crate::domain::models::{HeadingCounts, SeoCheck, SeoFindings};
use crate::extractor::page_extractor::{ExtractedImage, PageExtractor};

pub struct SeoAnalyzer<'a> {
    config: &'a ScoringConfig,
}

impl<'a> SeoAnalyzer<'a> {
    pub fn new(config: &'a ScoringConfig) -> Self {
        Self { config }
    }

    pub fn analyze(&self, document: &Html, page_url: &Url) -> SeoFindings {
        let title = PageExtractor::extract_title(document);
        let meta_description = PageExtractor::extract_meta_description(document);
        let meta_robots = PageExtractor::extract_meta_robots(document);
        let viewport = PageExtractor::extract_viewport(document);
        let canonical_url = PageExtractor::extract_canonical(document, page_url);
        let open_graph_tags = PageExtractor::extract_open_graph(document);
        let structured_data = PageExtractor::has_structured_data(document);
        let images = PageExtractor::extract_images(document, page_url);

        let mut headings = HeadingCounts::default();
        let mut h1_tags = Vec::new();
        let mut h2_tags = Vec::new();
        for heading in PageExtractor::extract_headings(document) {
            headings.increment(heading.level);
            match heading.level {
                1 => h1_tags.push(heading.text),
                2 => h2_tags.push(heading.text),
                _ => {}
            }
        }

        let total_images = images.len();
        let images_missing_alt = images.iter().filter(|i| !i.has_alt()).count();
        let alt_coverage = alt_coverage(&images);

        let checks = vec![
            self.check_title(title.as_deref()),
            self.check_meta_description(meta_description.as_deref()),
            self.check_h1(headings.h1),
            self.check_canonical(canonical_url.as_deref()),
            self.check_open_graph(open_graph_tags.len()),
            self.check_structured_data(structured_data),
            self.check_viewport(viewport.as_deref()),
            self.check_indexable(meta_robots.as_deref()),
            self.check_image_alt(total_images, images_missing_alt, alt_coverage),
        ];

        let score = calculate_score(&checks);
        log::debug!(
            "[SEO] {} - score {:.1}, {} of {} checks failing",
            page_url,
            score,
            checks.iter().filter(|c| !c.passed).count(),
            checks.len()
        );

        SeoFindings {
            score,
            title_length: title.as_ref().map(|t| t.chars().count()),
            title,
            meta_description_length: meta_description.as_ref().map(|d| d.chars().count()),
            meta_description,
            headings,
            h1_tags,
            h2_tags,
            canonical_url,
            meta_robots,
            open_graph_tags,
            structured_data,
            total_images,
            images_missing_alt,
            alt_coverage,
            checks,
        }
    }

    fn check_title(&self, title: Option<&str>) -> SeoCheck {
        let range = self.config.title_length;
        match title {
            Some(t) => {
                let len = t.chars().count();
                if range.contains(len) {
                    pass("title", "Document Title", format!("Title length is good ({} chars)", len))
                } else {
                    let direction = if len < range.min { "short" } else { "long" };
                    fail(
                        "title",
                        "Document Title",
                        self.config.weights.title_length,
                        format!(
                            "Title too {} ({} chars, recommend {}-{})",
                            direction, len, range.min, range.max
                        ),
                        format!(
                            "Rewrite the title to between {} and {} characters",
                            range.min, range.max
                        ),
                    )
                }
            }
            None => fail(
                "title",
                "Document Title",
                self.config.weights.title_missing,
                "Missing document title",
                "Add a descriptive <title> element to the page head",
            ),
        }
    }

    fn check_meta_description(&self, description: Option<&str>) -> SeoCheck {
        let range = self.config.meta_description_length;
        match description {
            Some(d) => {
                let len = d.chars().count();
                if range.contains(len) {
                    pass(
                        "meta_description",
                        "Meta Description",
                        format!("Description length is good ({} chars)", len),
                    )
                } else {
                    let direction = if len < range.min { "short" } else { "long" };
                    fail(
                        "meta_description",
                        "Meta Description",
                        self.config.weights.meta_description_length,
                        format!(
                            "Description too {} ({} chars, recommend {}-{})",
                            direction, len, range.min, range.max
                        ),
                        format!(
                            "Adjust the meta description to between {} and {} characters",
                            range.min, range.max
                        ),
                    )
                }
            }
            None => fail(
                "meta_description",
                "Meta Description",
                self.config.weights.meta_description_missing,
                "Missing meta description",
                "Add a meta description summarising the page for search results",
            ),
        }
    }

    fn check_h1(&self, count: usize) -> SeoCheck {
        match count {
            0 => fail(
                "h1",
                "Primary Heading",
                self.config.weights.h1_missing,
                "No H1 heading found",
                "Add a single H1 heading that states the page topic",
            ),
            1 => pass("h1", "Primary Heading", "Page has a single H1 heading"),
            n => fail(
                "h1",
                "Primary Heading",
                self.config.weights.h1_multiple,
                format!("Multiple H1 headings found ({})", n),
                "Keep one H1 and demote the others to H2",
            ),
        }
    }

    fn check_canonical(&self, canonical: Option<&str>) -> SeoCheck {
        match canonical {
            Some(c) => pass("canonical", "Canonical URL", format!("Canonical URL set to {}", c)),
            None => fail(
                "canonical",
                "Canonical URL",
                self.config.weights.canonical_missing,
                "Missing canonical URL",
                "Add a <link rel=\"canonical\"> pointing at the preferred URL",
            ),
        }
    }

    fn check_open_graph(&self, tag_count: usize) -> SeoCheck {
        if tag_count > 0 {
            pass(
                "open_graph",
                "Open Graph Tags",
                format!("Found {} Open Graph tags", tag_count),
            )
        } else {
            fail(
                "open_graph",
                "Open Graph Tags",
                self.config.weights.open_graph_missing,
                "No Open Graph tags found",
                "Add og:title, og:description and og:image for social previews",
            )
        }
    }

    fn check_structured_data(&self, present: bool) -> SeoCheck {
        if present {
            pass("structured_data", "Structured Data", "JSON-LD structured data present")
        } else {
            fail(
                "structured_data",
                "Structured Data",
                self.config.weights.structured_data_missing,
                "No structured data (JSON-LD) found",
                "Describe the page with schema.org JSON-LD markup",
            )
        }
    }

    fn check_viewport(&self, viewport: Option<&str>) -> SeoCheck {
        match viewport {
            Some(v) if v.contains("width=device-width") => {
                pass("viewport", "Viewport Meta Tag", "Viewport is properly configured")
            }
            Some(_) => fail(
                "viewport",
                "Viewport Meta Tag",
                self.config.weights.viewport_missing,
                "Viewport missing width=device-width",
                "Set the viewport content to width=device-width, initial-scale=1",
            ),
            None => fail(
                "viewport",
                "Viewport Meta Tag",
                self.config.weights.viewport_missing,
                "Missing viewport meta tag",
                "Add <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">",
            ),
        }
    }

    fn check_indexable(&self, robots: Option<&str>) -> SeoCheck {
        match robots.map(|r| r.to_lowercase()) {
            Some(r) if r.contains("noindex") => fail(
                "indexable",
                "Page is Indexable",
                self.config.weights.noindex,
                "Page has noindex directive",
                "Remove noindex from the robots meta tag if the page should rank",
            ),
            _ => pass("indexable", "Page is Indexable", "Page is indexable"),
        }
    }

    fn check_image_alt(&self, total: usize, missing: usize, coverage: f64) -> SeoCheck {
        if total == 0 {
            return pass("image_alt", "Image Alt Attributes", "No images found on page");
        }

        let weight = if coverage < self.config.alt_coverage_poor_below {
            self.config.weights.alt_coverage_poor
        } else if coverage < self.config.alt_coverage_partial_below {
            self.config.weights.alt_coverage_partial
        } else {
            0.0
        };

        if weight > 0.0 {
            fail(
                "image_alt",
                "Image Alt Attributes",
                weight,
                format!("{} of {} images missing alt attribute", missing, total),
                "Describe every meaningful image with alt text",
            )
        } else {
            let message = if missing == 0 {
                "All images have alt attributes".to_string()
            } else {
                format!("{}/{} images have alt text", total - missing, total)
            };
            pass("image_alt", "Image Alt Attributes", message)
        }
    }
}

/// Share of images that carry alt text; 1.0 when the page has none.
fn alt_coverage(images: &[ExtractedImage]) -> f64 {
    if images.is_empty() {
        return 1.0;
    }
    let with_alt = images.iter().filter(|i| i.has_alt()).count();
    round_to(with_alt as f64 / images.len() as f64, 4)
}

/// 100 minus every deduction, clamped to 0-100.
pub fn calculate_score(checks: &[SeoCheck]) -> f64 {
    let deducted: f64 = checks.iter().filter(|c| !c.passed).map(|c| c.deduction).sum();
    (100.0 - deducted).clamp(0.0, 100.0)
}

fn pass(key: &str, label: &str, message: impl Into<String>) -> SeoCheck {
    SeoCheck {
        key: key.to_string(),
        label: label.to_string(),
        passed: true,
        deduction: 0.0,
        message: message.into(),
        recommendation: None,
    }
}

fn fail(
    key: &str,
    label: &str,
    deduction: f64,
    message: impl Into<String>,
    recommendation: impl Into<String>,
) -> SeoCheck {
    SeoCheck {
        key: key.to_string(),
        label: label.to_string(),
        passed: false,
        deduction,
        message: message.into(),
        recommendation: Some(recommendation.into()),
    }
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
