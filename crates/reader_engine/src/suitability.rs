use ego_tree::NodeId;
use reader_logging::{reader_debug, reader_warn};
use regex_lite::Regex;
use url::Url;

use crate::config::SuitabilityConfig;
use crate::dom::Document;
use crate::error::SuitabilityError;
use crate::typography::collapse_whitespace;

const TEXT_BLOCKS: [&str; 4] = ["p", "div", "article", "section"];

/// Cheap pre-filter deciding whether extraction is worth attempting.
///
/// Pure: the same URL and DOM always give the same verdict.
#[derive(Debug, Clone)]
pub struct SuitabilityClassifier {
    config: SuitabilityConfig,
    patterns: Vec<Regex>,
}

impl Default for SuitabilityClassifier {
    fn default() -> Self {
        Self::new(SuitabilityConfig::default())
    }
}

impl SuitabilityClassifier {
    /// Invalid patterns are logged and skipped.
    pub fn new(config: SuitabilityConfig) -> Self {
        let patterns = config
            .unsuitable_url_patterns
            .iter()
            .filter_map(|pattern| match Regex::new(pattern) {
                Ok(regex) => Some(regex),
                Err(err) => {
                    reader_warn!("suitability: ignoring invalid url pattern {pattern}: {err}");
                    None
                }
            })
            .collect();
        Self { config, patterns }
    }

    pub fn config(&self) -> &SuitabilityConfig {
        &self.config
    }

    /// Checks `body` (any subtree, usually the page `<body>`) of `doc`.
    pub fn check(
        &self,
        page_url: &str,
        doc: &Document,
        body: NodeId,
    ) -> Result<(), SuitabilityError> {
        self.check_url(page_url)?;

        let text = collapse_whitespace(&doc.text_content(body));
        let chars = text.trim().chars().count();
        if chars < self.config.min_text_chars {
            return Err(SuitabilityError::TooLittleText {
                chars,
                min: self.config.min_text_chars,
            });
        }

        let found = doc
            .find_tags(body, &TEXT_BLOCKS)
            .into_iter()
            .filter(|id| doc.text_content(*id).trim().chars().count() > self.config.block_min_chars)
            .count();
        if found < self.config.min_blocks {
            return Err(SuitabilityError::TooFewBlocks {
                found,
                min: self.config.min_blocks,
            });
        }

        reader_debug!("suitability: {chars} chars, {found} substantial blocks");
        Ok(())
    }

    pub fn is_suitable(&self, page_url: &str, doc: &Document, body: NodeId) -> bool {
        self.check(page_url, doc, body).is_ok()
    }

    fn check_url(&self, page_url: &str) -> Result<(), SuitabilityError> {
        // Match the URL without its fragment, and the bare path so that a query
        // string cannot hide a document extension.
        let parsed = Url::parse(page_url).ok();
        let without_fragment = match &parsed {
            Some(url) => {
                let mut url = url.clone();
                url.set_fragment(None);
                url.to_string()
            }
            None => page_url.to_string(),
        };
        let path = parsed.as_ref().map(|url| url.path().to_string());

        for regex in &self.patterns {
            let hit = regex.is_match(&without_fragment)
                || path.as_deref().is_some_and(|p| regex.is_match(p));
            if hit {
                return Err(SuitabilityError::UnsuitableUrl {
                    pattern: regex.as_str().to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article_body(paragraphs: usize) -> Document {
        let mut html = String::from("<main>");
        for i in 0..paragraphs {
            html.push_str(&format!(
                "<p>Paragraph {i} carries enough words to count as a real block of prose.</p>"
            ));
        }
        html.push_str("</main>");
        Document::parse_fragment(&html)
    }

    #[test]
    fn accepts_article_like_page() {
        let doc = article_body(4);
        let classifier = SuitabilityClassifier::default();
        assert_eq!(classifier.check("https://example.com/post/1", &doc, doc.root_id()), Ok(()));
    }

    #[test]
    fn rejects_known_url_patterns() {
        let doc = article_body(5);
        let classifier = SuitabilityClassifier::default();
        for url in [
            "https://example.com/search?q=rust",
            "https://example.com/login",
            "https://shop.example.com/cart/items",
            "https://example.com/api/v1/posts",
            "https://example.com/files/report.PDF",
            "https://example.com/files/report.docx?download=1",
        ] {
            assert!(
                matches!(
                    classifier.check(url, &doc, doc.root_id()),
                    Err(SuitabilityError::UnsuitableUrl { .. })
                ),
                "{url} should be rejected"
            );
        }
    }

    #[test]
    fn short_pages_are_rejected_before_block_count() {
        let doc = Document::parse_fragment("<p>Too short.</p>");
        let err = SuitabilityClassifier::default()
            .check("https://example.com/a", &doc, doc.root_id())
            .unwrap_err();
        assert!(matches!(err, SuitabilityError::TooLittleText { .. }));
    }

    #[test]
    fn long_text_in_too_few_blocks_is_rejected() {
        let long = "word ".repeat(80);
        let doc = Document::parse_fragment(&format!("<span>{long}</span><p>{long}</p>"));
        let err = SuitabilityClassifier::default()
            .check("https://example.com/a", &doc, doc.root_id())
            .unwrap_err();
        assert_eq!(err, SuitabilityError::TooFewBlocks { found: 1, min: 3 });
    }
}
