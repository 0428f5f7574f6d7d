//! Content Analyzer - readability, keyword density, links and content gaps.

use scraper::Html;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;
use url::Url;

use super::readability;
use super::seo::round_to;
use crate::config::ScoringConfig;
use crate::domain::models::{ContentFindings, ContentGaps, HeadingCounts, KeywordFrequency};
use crate::extractor::page_extractor::{LinkKind, PageExtractor};

const STOPWORDS: &[&str] = &[
    "about", "above", "after", "again", "against", "all", "also", "and", "any", "are", "aren't",
    "because", "been", "before", "being", "below", "between", "both", "but", "can", "can't",
    "cannot", "could", "did", "didn't", "does", "doesn't", "doing", "don't", "down", "during",
    "each", "few", "for", "from", "further", "had", "has", "have", "having", "her", "here",
    "hers", "herself", "him", "himself", "his", "how", "i'm", "into", "isn't", "it's", "its",
    "itself", "just", "let's", "more", "most", "much", "must", "myself", "nor", "not", "now",
    "off", "once", "only", "other", "our", "ours", "ourselves", "out", "over", "own", "same",
    "she", "should", "some", "such", "than", "that", "that's", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through", "too", "under",
    "until", "very", "was", "wasn't", "were", "what", "when", "where", "which", "while", "who",
    "whom", "why", "will", "with", "won't", "would", "you", "you're", "your", "yours",
    "yourself", "yourselves",
];

fn stopwords() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOPWORDS.iter().copied().collect())
}

pub struct ContentAnalyzer<'a> {
    config: &'a ScoringConfig,
}

impl<'a> ContentAnalyzer<'a> {
    pub fn new(config: &'a ScoringConfig) -> Self {
        Self { config }
    }

    pub fn analyze(&self, document: &Html, page_url: &Url) -> ContentFindings {
        let text = PageExtractor::extract_visible_text(document);
        let words = readability::tokenize(&text);
        let sentence_count = readability::count_sentences(&text);
        let readability_score = readability::flesch_reading_ease(&words, sentence_count);

        let mut headings = HeadingCounts::default();
        for heading in PageExtractor::extract_headings(document) {
            headings.increment(heading.level);
        }

        let (mut internal_links, mut external_links, mut other_links) = (0, 0, 0);
        for link in PageExtractor::extract_links(document, page_url) {
            match link.kind {
                LinkKind::Internal => internal_links += 1,
                LinkKind::External => external_links += 1,
                LinkKind::Other => other_links += 1,
            }
        }

        let threshold = self.config.thin_content_words;
        let gaps = ContentGaps {
            thin_content: words.len() < threshold,
            missing_subheadings: headings.h2 == 0,
            missing_lists: !PageExtractor::has_lists(document),
        };

        log::debug!(
            "[CONTENT] {} - {} words, flesch {:.2}, {} internal / {} external links",
            page_url,
            words.len(),
            readability_score,
            internal_links,
            external_links
        );

        ContentFindings {
            word_count: words.len(),
            paragraph_count: PageExtractor::count_paragraphs(document),
            sentence_count,
            readability_score,
            reading_level: readability::reading_level(readability_score).to_string(),
            heading_structure_score: heading_structure_score(&headings),
            keywords: self.keyword_density(&words),
            internal_links,
            external_links,
            other_links,
            thin_content_threshold: threshold,
            gaps,
        }
    }

    /// Most frequent non-stopword keywords, by count desc then keyword asc.
    fn keyword_density(&self, words: &[String]) -> Vec<KeywordFrequency> {
        if words.is_empty() {
            return Vec::new();
        }

        let stop = stopwords();
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for word in words {
            if word.chars().count() >= self.config.keyword_min_length && !stop.contains(word.as_str()) {
                *counts.entry(word.as_str()).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        let total = words.len() as f64;
        ranked
            .into_iter()
            .take(self.config.keyword_top_n)
            .map(|(keyword, count)| KeywordFrequency {
                keyword: keyword.to_string(),
                count,
                density: round_to(count as f64 / total, 4),
            })
            .collect()
    }
}

fn heading_structure_score(headings: &HeadingCounts) -> f64 {
    let mut score: f64 = 100.0;
    match headings.h1 {
        0 => score -= 30.0,
        1 => {}
        _ => score -= 10.0,
    }
    if headings.h2 == 0 {
        score -= 20.0;
    }
    if headings.h3 == 0 {
        score -= 10.0;
    }
    score.max(0.0)
}
