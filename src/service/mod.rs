pub mod analyzer;
pub mod fetcher;
pub mod http;
pub mod insight;
pub mod performance;
pub mod website_analyzer;

pub use fetcher::{FetchedPage, HttpFetcher, PageFetcher};
pub use website_analyzer::WebsiteAnalyzer;
