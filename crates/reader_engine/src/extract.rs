use ego_tree::NodeId;
use reader_logging::reader_debug;

use crate::dom::Document;
use crate::error::ExtractionError;
use crate::suitability::SuitabilityClassifier;

/// Normalized extraction result consumed by the render pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    /// HTML fragment; sanitized in place before rendering.
    pub content: String,
}

/// Raw output of a content extraction algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedContent {
    pub title: String,
    pub content_html: String,
}

/// Content extraction algorithm. Receives a clone of the page and may mutate it.
pub trait Extractor: Send + Sync {
    fn extract(&self, document: &mut Document) -> Option<ExtractedContent>;
}

/// Elements that never carry article content.
const NOISE_ELEMENTS: [&str; 10] = [
    "script", "style", "noscript", "nav", "header", "footer", "aside", "form", "button", "template",
];

/// Lightweight "readability-like" extractor:
/// - title from `<title>`, falling back to the first `<h1>`
/// - content from the first `<article>`, then `<main>`, then `<body>`
/// - navigation, forms and scripts are dropped from the chosen subtree
#[derive(Debug, Default, Clone, Copy)]
pub struct ReadabilityLikeExtractor;

impl Extractor for ReadabilityLikeExtractor {
    fn extract(&self, document: &mut Document) -> Option<ExtractedContent> {
        let root = document.root_id();
        let title = document
            .find_tag(root, "title")
            .or_else(|| document.find_tag(root, "h1"))
            .map(|id| document.text_content(id).trim().to_string())
            .unwrap_or_default();

        let candidate = ["article", "main", "body"]
            .iter()
            .find_map(|tag| document.find_tag(root, tag))?;

        for noise in document.find_tags(candidate, &NOISE_ELEMENTS) {
            document.detach(noise);
        }
        let content_html = document.inner_html(candidate);
        if content_html.trim().is_empty() {
            return None;
        }
        Some(ExtractedContent {
            title,
            content_html,
        })
    }
}

/// Wraps an [`Extractor`] with the suitability gate and minimum-content rule.
pub struct ExtractionAdapter {
    classifier: SuitabilityClassifier,
    extractor: Box<dyn Extractor>,
    min_content_chars: usize,
}

impl ExtractionAdapter {
    pub fn new(
        classifier: SuitabilityClassifier,
        extractor: Box<dyn Extractor>,
        min_content_chars: usize,
    ) -> Self {
        Self {
            classifier,
            extractor,
            min_content_chars,
        }
    }

    /// Extracts from a clone of `document`; the live page is never touched.
    pub fn extract(&self, page_url: &str, document: &Document) -> Result<Article, ExtractionError> {
        let mut snapshot = document.clone();
        let body = body_or_root(&snapshot);
        self.classifier
            .check(page_url, &snapshot, body)
            .map_err(ExtractionError::Unsuitable)?;

        let raw = self
            .extractor
            .extract(&mut snapshot)
            .ok_or(ExtractionError::NoContentParsed)?;

        let chars = raw.content_html.trim().chars().count();
        if chars < self.min_content_chars {
            return Err(ExtractionError::InsufficientContent { chars });
        }
        reader_debug!("extract: title={:?} content={} chars", raw.title, chars);
        Ok(Article {
            title: raw.title,
            content: raw.content_html,
        })
    }
}

fn body_or_root(document: &Document) -> NodeId {
    let root = document.root_id();
    document.find_tag(root, "body").unwrap_or(root)
}
