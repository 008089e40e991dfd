use std::sync::OnceLock;

use regex_lite::Regex;
use url::Url;

const SEARCH_ENDPOINT: &str = "https://www.google.com/search";

fn link_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^\w+[^\s]+(\.[^\s]+)+$").ok())
        .as_ref()
}

fn scheme_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?i)^https?://").ok())
        .as_ref()
}

/// Text selected inside the reader view, with the actions it offers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    text: String,
}

impl Selection {
    /// `None` for a blank selection.
    pub fn new(raw: &str) -> Option<Self> {
        let text = raw.trim();
        if text.is_empty() {
            None
        } else {
            Some(Self {
                text: text.to_string(),
            })
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the selection reads like a URL or bare domain.
    pub fn is_link(&self) -> bool {
        link_pattern().is_some_and(|re| re.is_match(&self.text))
    }

    /// URL to open for a link-like selection, with `https://` added when no
    /// scheme is present.
    pub fn link_url(&self) -> Option<String> {
        if !self.is_link() {
            return None;
        }
        if scheme_pattern().is_some_and(|re| re.is_match(&self.text)) {
            Some(self.text.clone())
        } else {
            Some(format!("https://{}", self.text))
        }
    }

    pub fn search_url(&self) -> String {
        match Url::parse(SEARCH_ENDPOINT) {
            Ok(mut url) => {
                url.query_pairs_mut().append_pair("q", &self.text);
                url.to_string()
            }
            Err(_) => SEARCH_ENDPOINT.to_string(),
        }
    }
}
