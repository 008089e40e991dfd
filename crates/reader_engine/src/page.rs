//! The page a session runs against: its document, scroll state and transient
//! notices.
//!
//! Loading overlays, error banners and toasts are mounted next to `<body>`
//! (under the document element), never inside it, so taking a body snapshot
//! and writing it back is an exact round trip.

use std::time::{Duration, Instant};

use ego_tree::NodeId;
use reader_logging::reader_debug;

use crate::config::NoticeTiming;
use crate::dom::{ControlButton, Document, ElementData, Role};
use crate::error::PageError;

const ERROR_TITLE: &str = "Reading mode is not available";
const ERROR_SUGGESTIONS: [&str; 3] = [
    "Make sure the page has finished loading",
    "Try a page that contains an article",
    "Avoid search results, login pages and similar pages",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NoticeKind {
    Error,
    Toast,
}

#[derive(Debug, Clone)]
struct Notice {
    node: NodeId,
    kind: NoticeKind,
    hide_at: Instant,
    fade: Duration,
    fading: bool,
}

#[derive(Debug, Clone)]
pub struct Page {
    url: String,
    document: Document,
    scroll_locked: bool,
    scroll_listener: bool,
    notices: Vec<Notice>,
    timing: NoticeTiming,
}

impl Page {
    pub fn parse(url: impl Into<String>, html: &str) -> Self {
        Self::from_document(url, Document::parse_document(html))
    }

    pub fn from_document(url: impl Into<String>, document: Document) -> Self {
        Self {
            url: url.into(),
            document,
            scroll_locked: false,
            scroll_listener: false,
            notices: Vec::new(),
            timing: NoticeTiming::default(),
        }
    }

    pub fn with_notice_timing(mut self, timing: NoticeTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Independent copy for extraction.
    pub fn clone_document(&self) -> Document {
        self.document.clone()
    }

    /// Full page markup.
    pub fn html(&self) -> String {
        self.document.html()
    }

    pub fn title(&self) -> Option<String> {
        let root = self.document.root_id();
        self.document
            .find_tag(root, "title")
            .map(|id| self.document.text_content(id).trim().to_string())
            .filter(|title| !title.is_empty())
    }

    fn body(&self) -> Result<NodeId, PageError> {
        let root = self.document.root_id();
        self.document.find_tag(root, "body").ok_or(PageError::MissingBody)
    }

    /// Where transient chrome is mounted: the parent of `<body>`.
    fn chrome_parent(&self) -> NodeId {
        self.body()
            .ok()
            .and_then(|body| self.document.parent(body))
            .unwrap_or_else(|| self.document.root_id())
    }

    pub fn body_markup(&self) -> Result<String, PageError> {
        Ok(self.document.inner_html(self.body()?))
    }

    /// Writes `markup` back as the body content.
    pub fn restore_body(&mut self, markup: &str) -> Result<(), PageError> {
        let body = self.body()?;
        self.document.clear_children(body);
        let fragment = Document::parse_fragment(markup);
        self.document.graft_all(body, &fragment);
        self.compact();
        Ok(())
    }

    /// Replaces the body content wholesale with the children of `fragment`.
    pub fn replace_body(&mut self, fragment: &Document) -> Result<(), PageError> {
        let body = self.body()?;
        self.document.clear_children(body);
        self.document.graft_all(body, fragment);
        self.compact();
        Ok(())
    }

    /// Compacts the document once detached nodes outnumber live ones.
    pub fn collect_garbage(&mut self) {
        if self.document.arena_len() > 2 * self.document.live_len() {
            self.compact();
        }
    }

    fn compact(&mut self) {
        let before = self.document.arena_len();
        let ids = self.document.compact();
        self.notices.retain_mut(|notice| match ids.get(&notice.node) {
            Some(id) => {
                notice.node = *id;
                true
            }
            None => false,
        });
        reader_debug!("page: compacted {} -> {} nodes", before, self.document.arena_len());
    }

    pub fn set_scroll_lock(&mut self, locked: bool) {
        self.scroll_locked = locked;
    }

    pub fn is_scroll_locked(&self) -> bool {
        self.scroll_locked
    }

    pub fn attach_scroll_listener(&mut self) {
        self.scroll_listener = true;
    }

    pub fn detach_scroll_listener(&mut self) {
        self.scroll_listener = false;
    }

    pub fn has_scroll_listener(&self) -> bool {
        self.scroll_listener
    }

    /// Mounts a fresh loading overlay, replacing any existing one.
    pub fn show_loading(&mut self) {
        self.hide_loading();
        let parent = self.chrome_parent();
        let Some(overlay) = self
            .document
            .append_element(parent, ElementData::with_role("div", Role::LoadingOverlay))
        else {
            return;
        };
        self.append_classed(overlay, "div", "loading-spinner", None);
        self.append_classed(overlay, "div", "loading-text", Some("Preparing reading mode..."));
    }

    /// Removes every loading overlay in the document.
    pub fn hide_loading(&mut self) {
        for overlay in self.document.find_roles(Role::LoadingOverlay) {
            self.document.detach(overlay);
        }
    }

    pub fn is_loading(&self) -> bool {
        self.document.find_role(Role::LoadingOverlay).is_some()
    }

    /// Shows the dismissible error banner; an existing banner is replaced.
    pub fn show_error(&mut self, message: &str, now: Instant) {
        self.dismiss_error();
        let parent = self.chrome_parent();
        let Some(banner) = self
            .document
            .append_element(parent, ElementData::with_role("div", Role::ErrorBanner))
        else {
            return;
        };
        if let Some(text) = self.append_classed(banner, "div", "error-text", None) {
            self.append_classed(text, "div", "error-title", Some(ERROR_TITLE));
            self.append_classed(text, "div", "error-description", Some(message));
            if let Some(suggestions) = self.append_classed(text, "div", "error-suggestions", None) {
                let heading = Some("Suggestions:");
                self.append_classed(suggestions, "p", "error-suggestions-title", heading);
                let list = self.document.append_element(suggestions, ElementData::new("ul"));
                for suggestion in ERROR_SUGGESTIONS {
                    let item = list.and_then(|list| {
                        self.document.append_element(list, ElementData::new("li"))
                    });
                    if let Some(item) = item {
                        self.document.append_text(item, suggestion);
                    }
                }
            }
        }
        let close = ElementData::with_role("button", Role::Button(ControlButton::ErrorClose))
            .attr_value("aria-label", "Close");
        self.document.append_element(banner, close);

        self.notices.push(Notice {
            node: banner,
            kind: NoticeKind::Error,
            hide_at: now + self.timing.error_visible,
            fade: self.timing.fade,
            fading: false,
        });
    }

    /// Close button of the error banner.
    pub fn dismiss_error(&mut self) {
        for banner in self.document.find_roles(Role::ErrorBanner) {
            self.document.detach(banner);
        }
        self.notices.retain(|notice| notice.kind != NoticeKind::Error);
    }

    pub fn error_message(&self) -> Option<String> {
        let banner = self.document.find_role(Role::ErrorBanner)?;
        self.document
            .descendants(banner)
            .into_iter()
            .find(|id| {
                self.document
                    .element(*id)
                    .is_some_and(|el| el.has_class("error-description"))
            })
            .map(|id| self.document.text_content(id))
    }

    pub fn show_toast(&mut self, message: &str, now: Instant) {
        let parent = self.chrome_parent();
        let Some(toast) = self
            .document
            .append_element(parent, ElementData::with_role("div", Role::Toast))
        else {
            return;
        };
        self.document.append_text(toast, message);
        self.document.update_element(toast, |el| el.add_class("visible"));
        self.notices.push(Notice {
            node: toast,
            kind: NoticeKind::Toast,
            hide_at: now + self.timing.toast_visible,
            fade: self.timing.fade,
            fading: false,
        });
    }

    /// Messages of the toasts currently mounted, oldest first.
    pub fn toast_messages(&self) -> Vec<String> {
        self.document
            .find_roles(Role::Toast)
            .into_iter()
            .map(|id| self.document.text_content(id))
            .collect()
    }

    /// Drives notice lifetimes: visible, then fading, then removed.
    pub fn advance_notices(&mut self, now: Instant) {
        let mut remaining = Vec::with_capacity(self.notices.len());
        for mut notice in std::mem::take(&mut self.notices) {
            if !self.document.is_attached(notice.node) {
                continue;
            }
            if now >= notice.hide_at + notice.fade {
                reader_debug!("page: removing {:?} notice", notice.kind);
                self.document.detach(notice.node);
                continue;
            }
            if now >= notice.hide_at && !notice.fading {
                notice.fading = true;
                self.document.update_element(notice.node, |el| {
                    el.remove_class("visible");
                    el.add_class("fading");
                });
            }
            remaining.push(notice);
        }
        self.notices = remaining;
        self.collect_garbage();
    }

    fn append_classed(
        &mut self,
        parent: NodeId,
        tag: &str,
        class: &str,
        text: Option<&str>,
    ) -> Option<NodeId> {
        let mut element = ElementData::new(tag);
        element.add_class(class);
        let id = self.document.append_element(parent, element)?;
        if let Some(text) = text {
            self.document.append_text(id, text);
        }
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTML: &str = "<html><head><title> Demo </title></head><body><p id=\"a\">Hello</p></body></html>";

    #[test]
    fn chrome_lives_outside_body() {
        let mut page = Page::parse("https://example.com", HTML);
        let before = page.body_markup().unwrap();
        page.show_loading();
        page.show_error("boom", Instant::now());
        page.show_toast("copied", Instant::now());
        assert!(page.is_loading());
        assert_eq!(page.body_markup().unwrap(), before);
        assert_eq!(page.error_message().as_deref(), Some("boom"));
        assert_eq!(page.title().as_deref(), Some("Demo"));
    }

    #[test]
    fn restore_round_trips_body_markup() {
        let mut page = Page::parse("https://example.com", HTML);
        let snapshot = page.body_markup().unwrap();
        page.replace_body(&Document::parse_fragment("<div>reader</div>")).unwrap();
        assert_eq!(page.body_markup().unwrap(), "<div>reader</div>");
        page.restore_body(&snapshot).unwrap();
        assert_eq!(page.body_markup().unwrap(), snapshot);
    }

    #[test]
    fn body_swaps_do_not_grow_the_arena() {
        let mut page = Page::parse("https://example.com", HTML);
        let snapshot = page.body_markup().unwrap();
        let reader = Document::parse_fragment("<div><h2>reader</h2><p>view</p></div>");
        let start = Instant::now();
        page.show_toast("kept", start);

        for _ in 0..20 {
            page.replace_body(&reader).unwrap();
            page.restore_body(&snapshot).unwrap();
        }

        let doc = page.document();
        assert_eq!(doc.arena_len(), doc.live_len());
        assert_eq!(page.body_markup().unwrap(), snapshot);
        assert_eq!(page.toast_messages(), vec!["kept".to_string()]);
        page.advance_notices(start + Duration::from_secs(3));
        assert!(page.toast_messages().is_empty());
    }

    #[test]
    fn error_banner_fades_then_disappears() {
        let mut page = Page::parse("https://example.com", HTML);
        let start = Instant::now();
        page.show_error("boom", start);

        page.advance_notices(start + Duration::from_secs(4));
        assert!(page.error_message().is_some());

        page.advance_notices(start + Duration::from_millis(5_100));
        assert!(page.html().contains("reader-error-message fading"));

        page.advance_notices(start + Duration::from_millis(5_300));
        assert!(page.error_message().is_none());
    }

    #[test]
    fn second_error_replaces_first() {
        let mut page = Page::parse("https://example.com", HTML);
        page.show_error("first", Instant::now());
        page.show_error("second", Instant::now());
        assert_eq!(page.document().find_roles(Role::ErrorBanner).len(), 1);
        assert_eq!(page.error_message().as_deref(), Some("second"));
    }

    #[test]
    fn toast_expires_after_two_seconds() {
        let mut page = Page::parse("https://example.com", HTML);
        let start = Instant::now();
        page.show_toast("saved", start);
        page.advance_notices(start + Duration::from_millis(1_900));
        assert_eq!(page.toast_messages(), vec!["saved".to_string()]);
        page.advance_notices(start + Duration::from_millis(2_300));
        assert!(page.toast_messages().is_empty());
    }
}
