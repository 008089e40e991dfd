use std::time::Duration;

/// Thresholds of the suitability gate. The numbers are tuned empirically and
/// are exposed so hosts can adjust them.
#[derive(Debug, Clone, PartialEq)]
pub struct SuitabilityConfig {
    /// Collapsed body text must reach this many characters.
    pub min_text_chars: usize,
    /// Number of substantial blocks required.
    pub min_blocks: usize,
    /// A block is substantial when its trimmed text is longer than this.
    pub block_min_chars: usize,
    /// `regex-lite` patterns; a match on the URL or its path rejects the page.
    pub unsuitable_url_patterns: Vec<String>,
}

impl Default for SuitabilityConfig {
    fn default() -> Self {
        Self {
            min_text_chars: 200,
            min_blocks: 3,
            block_min_chars: 50,
            unsuitable_url_patterns: [
                r"/search\?",
                r"/login",
                r"/register",
                r"/checkout",
                r"/cart",
                r"/admin",
                r"/api/",
                r"(?i)\.(pdf|doc|docx|xls|xlsx|ppt|pptx)$",
            ]
            .iter()
            .map(|p| p.to_string())
            .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoticeTiming {
    pub error_visible: Duration,
    pub toast_visible: Duration,
    pub fade: Duration,
}

impl Default for NoticeTiming {
    fn default() -> Self {
        Self {
            error_visible: Duration::from_secs(5),
            toast_visible: Duration::from_secs(2),
            fade: Duration::from_millis(300),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryConfig {
    pub endpoint: String,
    pub model: String,
    pub timeout: Duration,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.deepseek.com/v1/chat/completions".to_string(),
            model: "deepseek-chat".to_string(),
            timeout: Duration::from_secs(30),
            temperature: 0.7,
            max_tokens: 2000,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReaderConfig {
    pub suitability: SuitabilityConfig,
    /// Extracted content shorter than this (after trimming) is rejected.
    pub min_content_chars: usize,
    /// Wait after the first activation so images can start loading.
    pub preload_delay: Duration,
    pub notices: NoticeTiming,
    pub summary: SummaryConfig,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            suitability: SuitabilityConfig::default(),
            min_content_chars: 100,
            preload_delay: Duration::from_millis(1500),
            notices: NoticeTiming::default(),
            summary: SummaryConfig::default(),
        }
    }
}

impl ReaderConfig {
    /// Same configuration without the image preload wait.
    pub fn without_preload_delay(mut self) -> Self {
        self.preload_delay = Duration::ZERO;
        self
    }
}
