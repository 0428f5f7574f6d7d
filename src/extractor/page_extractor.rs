use scraper::{Html, Selector};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use url::Url;

/// Elements whose text never reaches the reader.
const NON_VISIBLE_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

#[derive(Debug, Clone)]
pub struct ExtractedHeading {
    pub level: u8,
    pub text: String,
    pub position: usize,
}

#[derive(Debug, Clone)]
pub struct ExtractedImage {
    pub src: Option<String>,
    pub alt: Option<String>,
}

impl ExtractedImage {
    pub fn has_alt(&self) -> bool {
        self.alt.as_deref().map(|a| !a.is_empty()).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Internal,
    External,
    /// mailto:, tel:, javascript: and anything else that is not http(s)
    Other,
}

#[derive(Debug, Clone)]
pub struct ExtractedLink {
    pub href: String,
    pub kind: LinkKind,
    pub text: Option<String>,
}

pub struct PageExtractor;

impl PageExtractor {
    pub fn extract_title(html: &Html) -> Option<String> {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR.get_or_init(|| Selector::parse("title").unwrap());
        html.select(selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|s| !s.is_empty())
    }

    pub fn extract_meta_description(html: &Html) -> Option<String> {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector =
            SELECTOR.get_or_init(|| Selector::parse("meta[name='description']").unwrap());
        html.select(selector)
            .next()
            .and_then(|el| el.value().attr("content"))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    pub fn extract_meta_robots(html: &Html) -> Option<String> {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR.get_or_init(|| Selector::parse("meta[name='robots']").unwrap());
        html.select(selector)
            .next()
            .and_then(|el| el.value().attr("content"))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    pub fn extract_viewport(html: &Html) -> Option<String> {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR.get_or_init(|| Selector::parse("meta[name='viewport']").unwrap());
        html.select(selector)
            .next()
            .and_then(|el| el.value().attr("content"))
            .map(|s| s.trim().to_string())
    }

    /// Canonical link resolved against the page URL.
    pub fn extract_canonical(html: &Html, base: &Url) -> Option<String> {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR.get_or_init(|| Selector::parse("link[rel='canonical']").unwrap());
        html.select(selector)
            .next()
            .and_then(|el| el.value().attr("href"))
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|href| {
                base.join(href)
                    .map(|u| u.to_string())
                    .unwrap_or_else(|_| href.to_string())
            })
    }

    pub fn extract_open_graph(html: &Html) -> BTreeMap<String, String> {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR.get_or_init(|| Selector::parse("meta[property]").unwrap());
        html.select(selector)
            .filter_map(|el| {
                let property = el.value().attr("property")?.trim();
                if !property.starts_with("og:") {
                    return None;
                }
                let content = el.value().attr("content").unwrap_or("").trim();
                Some((property.to_string(), content.to_string()))
            })
            .collect()
    }

    pub fn has_structured_data(html: &Html) -> bool {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR
            .get_or_init(|| Selector::parse("script[type='application/ld+json']").unwrap());
        html.select(selector).next().is_some()
    }

    pub fn extract_headings(html: &Html) -> Vec<ExtractedHeading> {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR.get_or_init(|| Selector::parse("h1, h2, h3, h4, h5, h6").unwrap());

        html.select(selector)
            .enumerate()
            .filter_map(|(idx, element)| {
                let tag = element.value().name();
                let level = tag.trim_start_matches('h').parse::<u8>().ok()?;
                let text = element
                    .text()
                    .collect::<String>()
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ");

                Some(ExtractedHeading {
                    level,
                    text,
                    position: idx,
                })
            })
            .collect()
    }

    pub fn extract_images(html: &Html, base: &Url) -> Vec<ExtractedImage> {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR.get_or_init(|| Selector::parse("img").unwrap());

        html.select(selector)
            .map(|element| {
                let src = element
                    .value()
                    .attr("src")
                    .map(|s| s.trim())
                    .filter(|s| !s.is_empty())
                    .map(|s| base.join(s).map(|u| u.to_string()).unwrap_or_else(|_| s.to_string()));
                let alt = element.value().attr("alt").map(|s| s.trim().to_string());
                ExtractedImage { src, alt }
            })
            .collect()
    }

    /// Every hyperlink on the page, resolved and bucketed against the page host.
    /// Empty and same-page fragment hrefs are skipped.
    pub fn extract_links(html: &Html, base: &Url) -> Vec<ExtractedLink> {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR.get_or_init(|| Selector::parse("a[href]").unwrap());

        let base_host = base.host_str();
        let base_port = base.port_or_known_default();

        let mut links = Vec::new();
        for element in html.select(selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let href = href.trim();
            if href.is_empty() || href.starts_with('#') {
                continue;
            }

            let text = element.text().collect::<String>().trim().to_string();
            let text = if text.is_empty() { None } else { Some(text) };

            let (resolved, kind) = match base.join(href) {
                Ok(link) if matches!(link.scheme(), "http" | "https") => {
                    let kind = if link.host_str() == base_host
                        && link.port_or_known_default() == base_port
                    {
                        LinkKind::Internal
                    } else {
                        LinkKind::External
                    };
                    (link.to_string(), kind)
                }
                Ok(link) => (link.to_string(), LinkKind::Other),
                Err(_) => (href.to_string(), LinkKind::Other),
            };

            links.push(ExtractedLink {
                href: resolved,
                kind,
                text,
            });
        }

        links
    }

    pub fn count_paragraphs(html: &Html) -> usize {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR.get_or_init(|| Selector::parse("p").unwrap());
        html.select(selector).count()
    }

    pub fn has_lists(html: &Html) -> bool {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR.get_or_init(|| Selector::parse("ul, ol").unwrap());
        html.select(selector).next().is_some()
    }

    /// Text a reader would see, whitespace-trimmed fragments joined by single spaces.
    pub fn extract_visible_text(html: &Html) -> String {
        let mut parts: Vec<&str> = Vec::new();

        for node in html.root_element().descendants() {
            let Some(text) = node.value().as_text() else {
                continue;
            };
            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .map(|el| NON_VISIBLE_ELEMENTS.contains(&el.name()))
                    .unwrap_or(false)
            });
            if hidden {
                continue;
            }
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                parts.push(trimmed);
            }
        }

        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/blog/post").unwrap()
    }

    #[test]
    fn test_canonical_is_resolved() {
        let doc = Html::parse_document(r#"<head><link rel="canonical" href="/blog/post"></head>"#);
        assert_eq!(
            PageExtractor::extract_canonical(&doc, &base()).as_deref(),
            Some("https://example.com/blog/post")
        );
    }

    #[test]
    fn test_open_graph_only_collects_og_properties() {
        let doc = Html::parse_document(
            r#"<head>
                <meta property="og:title" content="Hello">
                <meta property="og:type" content="article">
                <meta property="twitter:card" content="summary">
            </head>"#,
        );
        let og = PageExtractor::extract_open_graph(&doc);
        assert_eq!(og.len(), 2);
        assert_eq!(og.get("og:title").map(String::as_str), Some("Hello"));
    }

    #[test]
    fn test_links_are_classified() {
        let doc = Html::parse_document(
            r##"<body>
                <a href="/about">About</a>
                <a href="https://example.com:443/contact">Contact</a>
                <a href="https://other.org/">Other</a>
                <a href="mailto:hi@example.com">Mail</a>
                <a href="#top">Top</a>
                <a href="">Empty</a>
            </body>"##,
        );
        let links = PageExtractor::extract_links(&doc, &base());
        let kinds: Vec<LinkKind> = links.iter().map(|l| l.kind).collect();
        assert_eq!(
            kinds,
            vec![LinkKind::Internal, LinkKind::Internal, LinkKind::External, LinkKind::Other]
        );
        assert_eq!(links[0].href, "https://example.com/about");
    }

    #[test]
    fn test_visible_text_skips_scripts_and_styles() {
        let doc = Html::parse_document(
            r#"<html><head><style>body { color: red; }</style></head>
               <body><p>Hello   world.</p><script>var x = 1;</script><noscript>Enable JS</noscript><p>Bye</p></body></html>"#,
        );
        assert_eq!(PageExtractor::extract_visible_text(&doc), "Hello   world. Bye");
    }

    #[test]
    fn test_images_without_alt() {
        let doc = Html::parse_document(
            r#"<body><img src="a.png" alt="A cat"><img src="b.png" alt="  "><img src="c.png"></body>"#,
        );
        let images = PageExtractor::extract_images(&doc, &base());
        assert_eq!(images.len(), 3);
        assert_eq!(images.iter().filter(|i| i.has_alt()).count(), 1);
        assert_eq!(images[0].src.as_deref(), Some("https://example.com/blog/a.png"));
    }
}
