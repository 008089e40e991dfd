//! Article outline and reading progress.

use ego_tree::NodeId;

use crate::dom::{Document, ElementData, Role};

const HEADINGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];
const INDENT_PX: u32 = 16;
const THRESHOLD_RATIO: f64 = 0.1;

/// Scroll position of the reader container, as reported by the host.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub viewport_height: f64,
    pub content_height: f64,
    /// Top offset of each outline heading, in outline order.
    pub heading_tops: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineEntry {
    pub level: u8,
    pub text: String,
    pub anchor: String,
}

impl OutlineEntry {
    pub fn indent_px(&self) -> u32 {
        u32::from(self.level.saturating_sub(1)) * INDENT_PX
    }
}

#[derive(Debug, Clone, Default)]
pub struct Outline {
    entries: Vec<OutlineEntry>,
    visible: bool,
    active: Option<usize>,
}

impl Outline {
    /// Collects the headings of the reader content. A leading `h1` is the
    /// article title and is left out. Headings without an id get `heading-{n}`.
    pub fn build(doc: &mut Document) -> Self {
        let Some(content) = doc.find_role(Role::ReaderContent) else {
            return Self::default();
        };
        let headings = doc.find_tags(content, &HEADINGS);
        let skip_first = headings
            .first()
            .and_then(|id| doc.element(*id))
            .is_some_and(|el| el.is("h1"));

        let mut entries = Vec::new();
        for (index, node) in headings.into_iter().skip(usize::from(skip_first)).enumerate() {
            let Some(level) = doc
                .element(node)
                .and_then(|el| el.name.get(1..))
                .and_then(|digit| digit.parse::<u8>().ok())
            else {
                continue;
            };
            let anchor = match doc.element(node).and_then(|el| el.attr("id")) {
                Some(id) => id.to_string(),
                None => {
                    let id = format!("heading-{index}");
                    doc.update_element(node, |el| el.set_attr("id", id.clone()));
                    id
                }
            };
            entries.push(OutlineEntry {
                level,
                text: doc.text_content(node).trim().to_string(),
                anchor,
            });
        }
        Self {
            entries,
            visible: true,
            active: None,
        }
    }

    pub fn entries(&self) -> &[OutlineEntry] {
        &self.entries
    }

    pub fn has_outline(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    /// Flips visibility. Returns `false` when there is nothing to show.
    pub fn toggle(&mut self) -> bool {
        if !self.has_outline() {
            return false;
        }
        self.visible = !self.visible;
        true
    }

    /// Heading behind entry `index`, for scroll-into-view. Looked up by its
    /// anchor so the result stays valid after the document is compacted.
    pub fn target(&self, doc: &Document, index: usize) -> Option<NodeId> {
        let anchor = &self.entries.get(index)?.anchor;
        let content = doc.find_role(Role::ReaderContent)?;
        doc.find_tags(content, &HEADINGS)
            .into_iter()
            .find(|id| doc.element(*id).and_then(|el| el.attr("id")) == Some(anchor.as_str()))
    }

    /// The last heading at or above scroll top + 10% of the viewport; the
    /// first heading when none has been reached yet.
    pub fn update_active(&mut self, metrics: &ScrollMetrics) -> Option<usize> {
        if self.entries.is_empty() {
            self.active = None;
            return None;
        }
        let threshold = metrics.scroll_top + metrics.viewport_height * THRESHOLD_RATIO;
        let reached = metrics
            .heading_tops
            .iter()
            .take(self.entries.len())
            .rposition(|top| *top <= threshold);
        self.active = Some(reached.unwrap_or(0));
        self.active
    }

    /// Mounts (or refreshes) the outline panel inside the reader container.
    pub fn sync(&self, doc: &mut Document) {
        let Some(container) = doc.find_role(Role::ReaderContainer) else {
            return;
        };
        let panel = match doc.find_role(Role::OutlinePanel) {
            Some(panel) => {
                doc.clear_children(panel);
                panel
            }
            None => {
                if !self.has_outline() {
                    return;
                }
                let Some(panel) =
                    doc.append_element(container, ElementData::with_role("div", Role::OutlinePanel))
                else {
                    return;
                };
                panel
            }
        };
        let visible = self.visible;
        doc.update_element(panel, |el| {
            if visible {
                el.remove_class("collapsed");
            } else {
                el.add_class("collapsed");
            }
        });

        let mut content = ElementData::new("div");
        content.add_class("outline-content");
        let Some(content) = doc.append_element(panel, content) else {
            return;
        };
        let mut list = ElementData::new("ul");
        list.add_class("outline-list");
        let Some(list) = doc.append_element(content, list) else {
            return;
        };
        for (index, entry) in self.entries.iter().enumerate() {
            let mut item = ElementData::with_role("li", Role::OutlineItem)
                .attr_value("data-index", index.to_string())
                .attr_value("style", format!("padding-left: {}px", entry.indent_px()));
            item.add_class(&format!("level-{}", entry.level));
            if self.active == Some(index) {
                item.add_class("active");
            }
            let Some(item) = doc.append_element(list, item) else {
                continue;
            };
            let mut link = ElementData::new("a").attr_value("href", format!("#{}", entry.anchor));
            link.add_class("outline-link");
            if let Some(link) = doc.append_element(item, link) {
                doc.append_text(link, entry.text.clone());
            }
        }
    }
}

/// Reading progress in percent, clamped to `0..=100`.
pub fn progress_percent(metrics: &ScrollMetrics) -> f64 {
    let denominator = metrics.content_height - metrics.viewport_height;
    if denominator <= 0.0 {
        return 0.0;
    }
    (metrics.scroll_top / denominator * 100.0).clamp(0.0, 100.0)
}

/// Mounts or updates the progress bar of the reader container.
pub fn sync_progress(doc: &mut Document, percent: f64) {
    let Some(container) = doc.find_role(Role::ReaderContainer) else {
        return;
    };
    let bar = match doc.find_role(Role::ProgressBar) {
        Some(bar) => bar,
        None => {
            let Some(track) = doc.append_element(container, {
                let mut track = ElementData::new("div");
                track.add_class("reading-progress-container");
                track
            }) else {
                return;
            };
            let bar = ElementData::with_role("div", Role::ProgressBar);
            let Some(bar) = doc.append_element(track, bar) else {
                return;
            };
            bar
        }
    };
    doc.update_element(bar, |el| el.set_attr("style", format!("width: {percent}%")));
}
