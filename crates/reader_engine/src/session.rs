//! Session Controller: runs the effects requested by the pure state machine
//! against a [`Page`].

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use reader_core::{update, Effect, Msg, Phase, ReaderSettings, SessionState, SettingsAction};
use reader_logging::{reader_debug, reader_info, reader_warn};

use crate::clipboard::Clipboard;
use crate::config::ReaderConfig;
use crate::dom::{Document, ElementData, Role};
use crate::error::ReaderError;
use crate::extract::{Article, ExtractionAdapter, Extractor, ReadabilityLikeExtractor};
use crate::markdown::{export_markdown, Converter, Html2MdConverter};
use crate::notify::{DetachedListener, StateListener};
use crate::outline::{progress_percent, sync_progress, Outline, ScrollMetrics};
use crate::page::Page;
use crate::render::{
    apply_image_fit, apply_styles, content_images, render, rendered_title, ImageFit,
};
use crate::sanitize::sanitize_html;
use crate::selection::Selection;
use crate::store::{self, KeyValueStore, MemoryStore};
use crate::suitability::SuitabilityClassifier;
use crate::summary::{
    render_summary_html, summary_input, ReqwestSummaryClient, Summarizer, Summary, SummaryClient,
    SummaryError, SummarySink,
};
use crate::viewer::{ImageViewer, Key};

pub const MARKDOWN_COPIED: &str = "Markdown copied to clipboard!";
pub const MARKDOWN_COPY_FAILED: &str = "Copy failed, please retry";
pub const SELECTION_COPIED: &str = "Copied";
pub const SELECTION_COPY_FAILED: &str = "Copy failed";
pub const API_KEY_SAVED: &str = "API key saved";
pub const API_KEY_INVALID: &str = "Please enter a valid API key";
pub const NO_OUTLINE: &str = "No headings detected; outline unavailable";

/// Messages a page accepts from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Toggle,
}

impl Command {
    pub fn parse(action: &str) -> Option<Self> {
        match action {
            "toggle" => Some(Command::Toggle),
            _ => None,
        }
    }
}

pub struct SessionController {
    state: SessionState,
    page: Page,
    config: ReaderConfig,
    adapter: ExtractionAdapter,
    store: Arc<dyn KeyValueStore>,
    listener: Box<dyn StateListener>,
    summarizer: Summarizer,
    converter: Box<dyn Converter>,
    viewer: Option<ImageViewer>,
    outline: Option<Outline>,
    image_widths: Vec<Option<u32>>,
    settings_open: bool,
    preloaded: bool,
    activation_error: Option<ReaderError>,
}

impl SessionController {
    pub fn new(page: Page, config: ReaderConfig) -> Self {
        let page = page.with_notice_timing(config.notices);
        let adapter = ExtractionAdapter::new(
            SuitabilityClassifier::new(config.suitability.clone()),
            Box::new(ReadabilityLikeExtractor),
            config.min_content_chars,
        );
        let summarizer =
            Summarizer::new(Box::new(ReqwestSummaryClient::new(config.summary.clone())));
        Self {
            state: SessionState::new(),
            page,
            config,
            adapter,
            store: Arc::new(MemoryStore::new()),
            listener: Box::new(DetachedListener),
            summarizer,
            converter: Box::new(Html2MdConverter),
            viewer: None,
            outline: None,
            image_widths: Vec::new(),
            settings_open: false,
            preloaded: false,
            activation_error: None,
        }
    }

    pub fn with_extractor(mut self, extractor: Box<dyn Extractor>) -> Self {
        self.adapter = ExtractionAdapter::new(
            SuitabilityClassifier::new(self.config.suitability.clone()),
            extractor,
            self.config.min_content_chars,
        );
        self
    }

    pub fn with_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_listener(mut self, listener: Box<dyn StateListener>) -> Self {
        self.listener = listener;
        self
    }

    pub fn with_summary_client(mut self, client: Box<dyn SummaryClient>) -> Self {
        self.summarizer = Summarizer::new(client);
        self
    }

    pub fn with_converter(mut self, converter: Box<dyn Converter>) -> Self {
        self.converter = converter;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn settings(&self) -> &ReaderSettings {
        self.state.settings()
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    pub fn into_page(self) -> Page {
        self.page
    }

    pub fn outline(&self) -> Option<&Outline> {
        self.outline.as_ref()
    }

    pub fn viewer(&self) -> Option<&ImageViewer> {
        self.viewer.as_ref()
    }

    /// Direct access to the viewer; call [`Self::sync_viewer`] afterwards.
    pub fn viewer_mut(&mut self) -> Option<&mut ImageViewer> {
        self.viewer.as_mut()
    }

    pub fn is_settings_open(&self) -> bool {
        self.settings_open
    }

    /// Enters reading mode when idle, leaves it when active. An activation
    /// failure is returned after the page has been restored.
    pub async fn toggle(&mut self) -> Result<(), ReaderError> {
        let body_markup = self.page.body_markup()?;
        self.activation_error = None;
        self.dispatch(Msg::ToggleRequested { body_markup }).await;
        match self.activation_error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub async fn disable(&mut self) {
        self.dispatch(Msg::DisableRequested).await;
    }

    /// Inbound command. Failures have already been shown on the page and are
    /// only logged here.
    pub async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Toggle => {
                if let Err(err) = self.toggle().await {
                    reader_warn!("session: toggle command failed: {err}");
                }
            }
        }
    }

    pub async fn apply_settings(&mut self, action: SettingsAction) {
        self.dispatch(Msg::Settings(action)).await;
    }

    /// Collapses the settings panel and refreshes outline and progress.
    pub fn on_scroll(&mut self, metrics: &ScrollMetrics) {
        if !self.state.is_enabled() {
            return;
        }
        if self.settings_open {
            self.set_settings_open(false);
        }
        let doc = self.page.document_mut();
        if let Some(outline) = self.outline.as_mut() {
            outline.update_active(metrics);
            outline.sync(doc);
        }
        sync_progress(doc, progress_percent(metrics));
        self.page.collect_garbage();
    }

    /// Records the natural size of content image `index` and sizes it.
    pub fn on_image_loaded(&mut self, index: usize, natural_width: u32, natural_height: u32) {
        if !self.state.is_enabled() {
            return;
        }
        if let Some(slot) = self.image_widths.get_mut(index) {
            *slot = Some(natural_width);
        }
        if let Some(viewer) = self.viewer.as_mut() {
            viewer.set_natural_size(index, natural_width, natural_height);
        }
        let fit = ImageFit::classify(natural_width, self.state.settings().width);
        let doc = self.page.document_mut();
        if let Some(image) = content_images(doc).get(index).copied() {
            apply_image_fit(doc, image, fit);
        }
    }

    /// Opens the viewer on content image `index`, linked or not.
    pub fn click_image(&mut self, index: usize) -> bool {
        let now = Instant::now();
        let opened = self
            .viewer
            .as_mut()
            .is_some_and(|viewer| viewer.open(index, now));
        if opened {
            self.sync_viewer();
        }
        opened
    }

    /// Escape closes the viewer first and reading mode second. Arrow keys
    /// only matter while the viewer is open.
    pub async fn handle_key(&mut self, key: Key) -> bool {
        let now = Instant::now();
        if let Some(viewer) = self.viewer.as_mut() {
            if viewer.handle_key(key, now) {
                self.sync_viewer();
                return true;
            }
        }
        if key == Key::Escape && self.state.is_enabled() {
            self.disable().await;
            return true;
        }
        false
    }

    /// Mirrors the viewer into the page and locks scrolling while it is open.
    pub fn sync_viewer(&mut self) {
        let Some(viewer) = self.viewer.as_ref() else {
            return;
        };
        viewer.sync_overlay(self.page.document_mut(), Instant::now());
        self.page.set_scroll_lock(viewer.is_open());
        self.page.collect_garbage();
    }

    pub fn toggle_settings_panel(&mut self) {
        if self.state.is_enabled() {
            self.set_settings_open(!self.settings_open);
        }
    }

    /// Shows or hides the outline; a page without headings gets a toast.
    pub fn toggle_outline(&mut self) -> bool {
        if !self.state.is_enabled() {
            return false;
        }
        let toggled = self.outline.as_mut().is_some_and(|outline| outline.toggle());
        match self.outline.as_ref() {
            Some(outline) if toggled => {
                outline.sync(self.page.document_mut());
                self.page.collect_garbage();
                true
            }
            _ => {
                self.page.show_toast(NO_OUTLINE, Instant::now());
                false
            }
        }
    }

    /// Exports the reader content as Markdown to `clipboard`.
    pub async fn copy_markdown(&mut self, clipboard: &dyn Clipboard) -> Option<String> {
        let Some(markdown) = export_markdown(self.page.document(), self.converter.as_ref()) else {
            reader_warn!("session: no reader content to export");
            self.page.show_toast(MARKDOWN_COPY_FAILED, Instant::now());
            return None;
        };
        match clipboard.write_text(&markdown).await {
            Ok(()) => {
                self.page.show_toast(MARKDOWN_COPIED, Instant::now());
                Some(markdown)
            }
            Err(err) => {
                reader_warn!("session: markdown copy failed: {err}");
                self.page.show_toast(MARKDOWN_COPY_FAILED, Instant::now());
                None
            }
        }
    }

    pub async fn copy_selection(&mut self, raw: &str, clipboard: &dyn Clipboard) -> bool {
        let Some(selection) = Selection::new(raw) else {
            return false;
        };
        let copied = clipboard.write_text(selection.text()).await;
        let message = match &copied {
            Ok(()) => SELECTION_COPIED,
            Err(err) => {
                reader_warn!("session: selection copy failed: {err}");
                SELECTION_COPY_FAILED
            }
        };
        self.page.show_toast(message, Instant::now());
        copied.is_ok()
    }

    /// Stores a trimmed, non-empty credential.
    pub async fn save_api_key(&mut self, raw: &str) -> bool {
        let key = raw.trim();
        if key.is_empty() {
            self.page.show_toast(API_KEY_INVALID, Instant::now());
            return false;
        }
        match store::save_api_key(self.store.as_ref(), key).await {
            Ok(()) => {
                self.page.show_toast(API_KEY_SAVED, Instant::now());
                true
            }
            Err(err) => {
                reader_warn!("session: API key not saved: {err}");
                self.page.show_toast(API_KEY_INVALID, Instant::now());
                false
            }
        }
    }

    /// Summarizes the reader content and mounts the result in the summary
    /// panel. `force` bypasses the cache.
    pub async fn summarize(
        &mut self,
        force: bool,
        sink: &dyn SummarySink,
    ) -> Result<Summary, SummaryError> {
        if !self.state.is_enabled() {
            return Err(SummaryError::NoContent);
        }
        let input = summary_input(self.page.document(), self.page.title().as_deref())
            .ok_or(SummaryError::NoContent)?;
        let api_key = store::load_api_key(self.store.as_ref()).await;
        let result = self
            .summarizer
            .summarize(api_key.as_deref(), &input, force, sink)
            .await;
        match result {
            Ok(summary) => {
                self.mount_summary(&render_summary_html(&summary));
                self.page.collect_garbage();
                Ok(summary)
            }
            Err(err) => {
                let message = match &err {
                    SummaryError::MissingApiKey => {
                        "Set an API key in the settings panel first".to_string()
                    }
                    other => format!("Summary failed: {other}"),
                };
                self.page.show_toast(&message, Instant::now());
                Err(err)
            }
        }
    }

    pub fn advance_notices(&mut self, now: Instant) {
        self.page.advance_notices(now);
        if let Some(viewer) = self.viewer.as_ref().filter(|viewer| viewer.is_open()) {
            viewer.sync_overlay(self.page.document_mut(), now);
        }
    }

    fn set_settings_open(&mut self, open: bool) {
        self.settings_open = open;
        let doc = self.page.document_mut();
        if let Some(panel) = doc.find_role(Role::SettingsPanel) {
            doc.update_element(panel, |el| {
                if open {
                    el.remove_class("collapsed");
                } else {
                    el.add_class("collapsed");
                }
            });
        }
    }

    fn mount_summary(&mut self, html: &str) {
        let doc = self.page.document_mut();
        let Some(container) = doc.find_role(Role::ReaderContainer) else {
            return;
        };
        let panel = match doc.find_role(Role::SummaryPanel) {
            Some(panel) => {
                doc.clear_children(panel);
                Some(panel)
            }
            None => {
                let panel = ElementData::with_role("div", Role::SummaryPanel);
                doc.append_element(container, panel)
            }
        };
        if let Some(panel) = panel {
            let mut content = ElementData::new("div");
            content.add_class("ai-summary-content");
            if let Some(content) = doc.append_element(panel, content) {
                doc.graft_all(content, &Document::parse_fragment(html));
            }
        }
    }

    /// Applies `msg` and runs the resulting effects in order. A reply from an
    /// effect is applied, and its own effects run, before the next effect of
    /// the batch that produced it.
    async fn dispatch(&mut self, msg: Msg) {
        let mut batches: Vec<VecDeque<Effect>> = vec![self.apply(msg).into()];
        while let Some(batch) = batches.last_mut() {
            let Some(effect) = batch.pop_front() else {
                batches.pop();
                continue;
            };
            if let Some(reply) = self.run_effect(effect).await {
                let effects = self.apply(reply);
                batches.push(effects.into());
            }
        }
    }

    fn apply(&mut self, msg: Msg) -> Vec<Effect> {
        let before = self.state.phase();
        let (state, effects) = update(std::mem::take(&mut self.state), msg);
        self.state = state;
        let after = self.state.phase();
        if before != after {
            reader_debug!("session: {:?} -> {:?}", before, after);
        }
        effects
    }

    async fn run_effect(&mut self, effect: Effect) -> Option<Msg> {
        match effect {
            Effect::ShowLoading => {
                self.page.show_loading();
                None
            }
            Effect::LoadSettings => {
                let settings = store::load_settings(self.store.as_ref()).await;
                Some(Msg::SettingsLoaded(settings))
            }
            Effect::RunPipeline { show_images } => Some(self.activate(show_images).await),
            Effect::RestorePage { markup } => {
                self.restore(&markup);
                Some(Msg::RestoreCompleted)
            }
            Effect::ShowError { message } => {
                self.page.show_error(&message, Instant::now());
                None
            }
            Effect::NotifyListener { active } => {
                if let Err(err) = self.listener.state_changed(active) {
                    reader_debug!("session: state broadcast dropped: {err}");
                }
                None
            }
            Effect::ApplyStyles => {
                if self.state.is_enabled() {
                    apply_styles(
                        self.page.document_mut(),
                        self.state.settings(),
                        &self.image_widths,
                    );
                    self.page.collect_garbage();
                }
                None
            }
            Effect::PersistSettings(settings) => {
                if let Err(err) = store::save_settings(self.store.as_ref(), &settings).await {
                    reader_warn!("session: settings not saved: {err}");
                }
                None
            }
        }
    }

    async fn activate(&mut self, show_images: bool) -> Msg {
        match self.run_pipeline(show_images) {
            Ok(title) => {
                if !self.preloaded {
                    self.preloaded = true;
                    if !self.config.preload_delay.is_zero() {
                        tokio::time::sleep(self.config.preload_delay).await;
                    }
                }
                self.page.hide_loading();
                self.page.attach_scroll_listener();
                reader_info!("session: reading mode on for {} ({title})", self.page.url());
                Msg::ActivationSucceeded { title }
            }
            Err(err) => {
                reader_warn!("session: activation failed: {err}");
                let msg = Msg::ActivationFailed {
                    kind: err.failure_kind(),
                    message: err.user_message(),
                };
                self.activation_error = Some(err);
                msg
            }
        }
    }

    /// Suitability, extraction, sanitization, render, body swap.
    fn run_pipeline(&mut self, show_images: bool) -> Result<String, ReaderError> {
        let snapshot = self.page.clone_document();
        let article = self.adapter.extract(self.page.url(), &snapshot)?;
        let article = Article {
            content: sanitize_html(&article.content)?,
            ..article
        };

        let settings = ReaderSettings {
            show_images,
            ..self.state.settings().clone()
        };
        let mut view = render(&article, &settings);
        let outline = Outline::build(&mut view);
        outline.sync(&mut view);
        sync_progress(&mut view, 0.0);

        self.page.replace_body(&view)?;
        let viewer = ImageViewer::from_view(self.page.document());
        self.image_widths = vec![None; viewer.len()];
        self.viewer = Some(viewer);
        self.outline = Some(outline);
        self.settings_open = false;

        Ok(rendered_title(self.page.document()).unwrap_or(article.title))
    }

    fn restore(&mut self, markup: &str) {
        if let Err(err) = self.page.restore_body(markup) {
            reader_warn!("session: restore failed: {err}");
        }
        self.page.hide_loading();
        self.page.detach_scroll_listener();
        self.page.set_scroll_lock(false);
        self.viewer = None;
        self.outline = None;
        self.image_widths.clear();
        self.settings_open = false;
    }
}
