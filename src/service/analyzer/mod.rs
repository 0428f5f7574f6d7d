//! Static page analysis.
//!
//! Both analyzers are pure functions over a parsed document:
//! - **SEO**: rule checks with a deduction-based score
//! - **Content**: readability, keywords, links and content gaps
//!
//! `scraper::Html` is not `Send`, so callers on the async runtime should run
//! `analyze_document` on a blocking worker.

mod content;
mod readability;
mod seo;

pub use content::ContentAnalyzer;
pub use seo::{calculate_score, SeoAnalyzer};

use scraper::Html;
use url::Url;

use crate::config::ScoringConfig;
use crate::domain::models::{ContentFindings, SeoFindings};

/// Parse `html` once and run both analyzers against it.
pub fn analyze_document(
    html: &str,
    page_url: &Url,
    config: &ScoringConfig,
) -> (SeoFindings, ContentFindings) {
    let document = Html::parse_document(html);
    let seo = SeoAnalyzer::new(config).analyze(&document, page_url);
    let content = ContentAnalyzer::new(config).analyze(&document, page_url);
    (seo, content)
}
