//! Article summarization against a chat-completions endpoint with a streamed
//! response.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use bytes::{Buf, BytesMut};
use futures_util::StreamExt;
use reader_logging::{reader_debug, reader_info, reader_warn};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::SummaryConfig;
use crate::dom::{Document, ElementData, Role};

const TITLE_KEY_CHARS: usize = 50;
const CONTENT_KEY_CHARS: usize = 100;
const TAG_SEPARATOR: char = '、';
const DONE_MARKER: &str = "[DONE]";
const DATA_PREFIX: &str = "data: ";
const SUMMARY_SOURCE_TAGS: [&str; 7] = ["p", "h1", "h2", "h3", "h4", "h5", "h6"];

const SYSTEM_PROMPT: &str = "You are an assistant that summarizes articles. Summarize the \
article the user provides, completely and concisely, without repeating yourself. Answer with a \
JSON object with these fields:
- summary: an overview of at most 120 words capturing the main point of the article
- tags: topics, disciplines or proper nouns the article is about, separated by \"、\"
- key_points: a list of the main points, each with the examples or data that support it
- conclusion: the conclusion or recommendation of the article
- reflection: a reflective take on the main points from another perspective, adding new angles \
instead of restating the article
Stay objective and accurate and do not add anything that is not in the article, except in the \
reflection. Keep the wording easy to read and explain technical terms simply.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SummaryError {
    #[error("no API key configured")]
    MissingApiKey,
    #[error("a summary is already being generated")]
    AlreadyGenerating,
    #[error("no article content to summarize")]
    NoContent,
    #[error("API error ({status}): {message}")]
    HttpStatus { status: u16, message: String },
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
}

/// Structured summary as returned by the model. Every field is optional in
/// the response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Summary {
    pub summary: String,
    pub tags: String,
    pub key_points: Vec<String>,
    pub conclusion: String,
    pub reflection: String,
}

impl Summary {
    /// Parses the accumulated model output. Output that is not a summary
    /// object becomes the overview text as a whole.
    pub fn from_model_output(text: &str) -> Self {
        match serde_json::from_str::<Summary>(text) {
            Ok(summary) => summary,
            Err(err) => {
                reader_debug!("summary: output is not a summary object ({err})");
                Summary {
                    summary: text.to_string(),
                    ..Summary::default()
                }
            }
        }
    }

    pub fn tag_list(&self) -> Vec<&str> {
        self.tags
            .split(TAG_SEPARATOR)
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.summary.is_empty()
            && self.tag_list().is_empty()
            && self.key_points.is_empty()
            && self.conclusion.is_empty()
            && self.reflection.is_empty()
    }
}

/// What gets sent for summarization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryInput {
    pub title: String,
    pub content: String,
}

impl SummaryInput {
    /// Title prefix, `|`, content prefix.
    pub fn cache_key(&self) -> String {
        let title: String = self.title.chars().take(TITLE_KEY_CHARS).collect();
        let content: String = self.content.chars().take(CONTENT_KEY_CHARS).collect();
        format!("{title}|{content}")
    }
}

/// Collects the summary input from a mounted reader view: the reader title
/// (or `page_title`) and the text of every non-empty paragraph and heading.
pub fn summary_input(doc: &Document, page_title: Option<&str>) -> Option<SummaryInput> {
    let content = doc.find_role(Role::ReaderContent)?;
    let title = doc
        .find_role(Role::ReaderTitle)
        .map(|id| doc.text_content(id).trim().to_string())
        .filter(|title| !title.is_empty())
        .or_else(|| page_title.map(str::to_string))
        .unwrap_or_default();
    let blocks: Vec<String> = doc
        .find_tags(content, &SUMMARY_SOURCE_TAGS)
        .into_iter()
        .map(|id| doc.text_content(id).trim().to_string())
        .filter(|text| !text.is_empty())
        .collect();
    Some(SummaryInput {
        title,
        content: blocks.join("\n\n"),
    })
}

/// Receives the text accumulated so far while a response streams in.
pub trait SummarySink: Send + Sync {
    fn partial(&self, text: &str);
}

pub struct ChannelSummarySink {
    tx: std::sync::mpsc::Sender<String>,
}

impl ChannelSummarySink {
    pub fn new(tx: std::sync::mpsc::Sender<String>) -> Self {
        Self { tx }
    }
}

impl SummarySink for ChannelSummarySink {
    fn partial(&self, text: &str) {
        if let Err(err) = self.tx.send(text.to_string()) {
            reader_debug!("summary: partial text dropped: {err}");
        }
    }
}

/// Discards partial output.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSummarySink;

impl SummarySink for NullSummarySink {
    fn partial(&self, _text: &str) {}
}

/// Splits a server-sent event stream into lines across chunk boundaries.
#[derive(Debug, Default)]
pub struct SseLines {
    buffer: BytesMut,
}

impl SseLines {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk and returns every line it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(end) = self.buffer.iter().position(|b| *b == b'\n') {
            let line = self.buffer.split_to(end);
            self.buffer.advance(1);
            lines.push(line_text(&line));
        }
        lines
    }

    /// The trailing line when the stream did not end with a newline.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let rest = self.buffer.split();
        Some(line_text(&rest))
    }
}

fn line_text(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).trim_end_matches('\r').to_string()
}

/// Content delta carried by one event line, if any. `[DONE]` and lines that
/// do not parse are skipped.
pub fn delta_content(line: &str) -> Option<String> {
    let payload = line.strip_prefix(DATA_PREFIX)?;
    if payload.trim() == DONE_MARKER {
        return None;
    }
    let value: Value = serde_json::from_str(payload).ok()?;
    value
        .pointer("/choices/0/delta/content")
        .and_then(Value::as_str)
        .filter(|content| !content.is_empty())
        .map(str::to_string)
}

/// Sends one summarization request and returns the raw model output.
#[async_trait::async_trait]
pub trait SummaryClient: Send + Sync {
    async fn complete(
        &self,
        api_key: &str,
        input: &SummaryInput,
        sink: &dyn SummarySink,
    ) -> Result<String, SummaryError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestSummaryClient {
    config: SummaryConfig,
}

impl ReqwestSummaryClient {
    pub fn new(config: SummaryConfig) -> Self {
        Self { config }
    }

    fn build_client(&self) -> Result<reqwest::Client, SummaryError> {
        reqwest::Client::builder()
            .connect_timeout(self.config.timeout)
            .build()
            .map_err(|err| SummaryError::Network(err.to_string()))
    }

    fn request_body(&self, input: &SummaryInput) -> Value {
        json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                {
                    "role": "user",
                    "content": format!("Title: {}\n\nContent: {}", input.title, input.content),
                },
            ],
            "response_format": { "type": "json_object" },
            "stream": true,
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        })
    }
}

#[async_trait::async_trait]
impl SummaryClient for ReqwestSummaryClient {
    async fn complete(
        &self,
        api_key: &str,
        input: &SummaryInput,
        sink: &dyn SummarySink,
    ) -> Result<String, SummaryError> {
        let client = self.build_client()?;
        let body = serde_json::to_vec(&self.request_body(input))
            .map_err(|err| SummaryError::Network(err.to_string()))?;
        let request = client
            .post(&self.config.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .bearer_auth(api_key)
            .body(body)
            .send();

        // The deadline covers the wait for the response head, not the stream.
        let response = tokio::time::timeout(self.config.timeout, request)
            .await
            .map_err(|_| SummaryError::Timeout)?
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            return Err(SummaryError::HttpStatus {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        let mut text = String::new();
        let mut lines = SseLines::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            for line in lines.push(&chunk) {
                if let Some(delta) = delta_content(&line) {
                    text.push_str(&delta);
                    sink.partial(&text);
                }
            }
        }
        if let Some(delta) = lines.finish().as_deref().and_then(delta_content) {
            text.push_str(&delta);
            sink.partial(&text);
        }
        reader_debug!("summary: received {} chars", text.chars().count());
        Ok(text)
    }
}

fn api_error_message(body: &[u8]) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| "unknown error".to_string())
}

fn map_reqwest_error(err: reqwest::Error) -> SummaryError {
    if err.is_timeout() {
        return SummaryError::Timeout;
    }
    SummaryError::Network(err.to_string())
}

/// Clears the in-flight flag when a request ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Caching, single-flight front for a [`SummaryClient`].
pub struct Summarizer {
    client: Box<dyn SummaryClient>,
    cache: Mutex<HashMap<String, Summary>>,
    generating: AtomicBool,
}

impl Summarizer {
    pub fn new(client: Box<dyn SummaryClient>) -> Self {
        Self {
            client,
            cache: Mutex::new(HashMap::new()),
            generating: AtomicBool::new(false),
        }
    }

    pub fn is_generating(&self) -> bool {
        self.generating.load(Ordering::Acquire)
    }

    pub fn cached(&self, input: &SummaryInput) -> Option<Summary> {
        self.cache
            .lock()
            .ok()
            .and_then(|cache| cache.get(&input.cache_key()).cloned())
    }

    /// Returns the cached summary unless `force` is set; otherwise asks the
    /// client. Only one request runs at a time.
    pub async fn summarize(
        &self,
        api_key: Option<&str>,
        input: &SummaryInput,
        force: bool,
        sink: &dyn SummarySink,
    ) -> Result<Summary, SummaryError> {
        let api_key = api_key
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(SummaryError::MissingApiKey)?;
        if input.content.trim().is_empty() {
            return Err(SummaryError::NoContent);
        }
        if !force {
            if let Some(summary) = self.cached(input) {
                reader_debug!("summary: cache hit");
                return Ok(summary);
            }
        }
        if self
            .generating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SummaryError::AlreadyGenerating);
        }
        let _in_flight = InFlight(&self.generating);

        reader_info!("summary: requesting summary for {:?}", input.title);
        let text = match self.client.complete(api_key, input, sink).await {
            Ok(text) => text,
            Err(err) => {
                reader_warn!("summary: request failed: {err}");
                return Err(err);
            }
        };
        let summary = Summary::from_model_output(&text);
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(input.cache_key(), summary.clone());
        }
        Ok(summary)
    }
}

/// Markup of the summary panel content.
pub fn render_summary_html(summary: &Summary) -> String {
    let mut doc = Document::new();
    let root = doc.root_id();
    if summary.is_empty() {
        if let Some(error) = doc.append_element(root, class_element("div", "ai-summary-error")) {
            doc.append_text(error, "The summary is empty");
        }
        return doc.inner_html(root);
    }

    if !summary.summary.is_empty() {
        if let Some(section) = section(&mut doc, "Overview") {
            text_element(&mut doc, section, "p", &summary.summary);
        }
    }
    let tags = summary.tag_list();
    if !tags.is_empty() {
        if let Some(section) = section(&mut doc, "Tags") {
            if let Some(container) =
                doc.append_element(section, class_element("div", "ai-tags-container"))
            {
                for tag in tags {
                    let span = class_element("span", "ai-tag");
                    if let Some(span) = doc.append_element(container, span) {
                        doc.append_text(span, tag);
                    }
                }
            }
        }
    }
    if !summary.key_points.is_empty() {
        if let Some(section) = section(&mut doc, "Key points") {
            if let Some(list) = doc.append_element(section, ElementData::new("ul")) {
                for point in &summary.key_points {
                    text_element(&mut doc, list, "li", point);
                }
            }
        }
    }
    if !summary.conclusion.is_empty() {
        if let Some(section) = section(&mut doc, "Conclusion") {
            text_element(&mut doc, section, "p", &summary.conclusion);
        }
    }
    if !summary.reflection.is_empty() {
        if let Some(section) = section(&mut doc, "Reflection") {
            text_element(&mut doc, section, "p", &summary.reflection);
        }
    }
    doc.inner_html(root)
}

fn class_element(tag: &str, class: &str) -> ElementData {
    let mut element = ElementData::new(tag);
    element.add_class(class);
    element
}

fn section(doc: &mut Document, heading: &str) -> Option<ego_tree::NodeId> {
    let root = doc.root_id();
    let section = doc.append_element(root, class_element("div", "ai-summary-section"))?;
    text_element(doc, section, "h4", heading);
    Some(section)
}

fn text_element(doc: &mut Document, parent: ego_tree::NodeId, tag: &str, text: &str) {
    if let Some(node) = doc.append_element(parent, ElementData::new(tag)) {
        doc.append_text(node, text);
    }
}
