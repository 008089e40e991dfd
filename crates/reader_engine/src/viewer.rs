//! In-page image viewer: navigation, wheel zoom and fit-to-viewport.

use std::time::{Duration, Instant};

use crate::dom::{ControlButton, Document, ElementData, Role};
use crate::render::content_images;

const MIN_SCALE: f64 = 0.5;
const MAX_SCALE: f64 = 3.0;
const WHEEL_STEP: f64 = 0.1;
const FIT_RATIO: f64 = 0.9;
const ZOOM_HINT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerImage {
    pub src: String,
    pub alt: String,
    /// Natural `(width, height)` once the image has loaded.
    pub natural_size: Option<(u32, u32)>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    Escape,
    Other,
}

#[derive(Debug, Clone)]
pub struct ImageViewer {
    images: Vec<ViewerImage>,
    current: Option<usize>,
    scale: f64,
    hint_until: Option<Instant>,
}

impl ImageViewer {
    pub fn new(images: Vec<ViewerImage>) -> Self {
        Self {
            images,
            current: None,
            scale: 1.0,
            hint_until: None,
        }
    }

    /// Collects the article images of a rendered reader view.
    pub fn from_view(doc: &Document) -> Self {
        let images = content_images(doc)
            .into_iter()
            .filter_map(|id| doc.element(id))
            .map(|img| ViewerImage {
                src: img.attr("src").unwrap_or_default().to_string(),
                alt: img.attr("alt").unwrap_or_default().to_string(),
                natural_size: None,
            })
            .collect();
        Self::new(images)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_image(&self) -> Option<&ViewerImage> {
        self.current.and_then(|index| self.images.get(index))
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn set_natural_size(&mut self, index: usize, width: u32, height: u32) {
        if let Some(image) = self.images.get_mut(index) {
            image.natural_size = Some((width, height));
        }
    }

    /// Opens the viewer at `index`, whether or not the image sits in a link.
    pub fn open(&mut self, index: usize, now: Instant) -> bool {
        if index >= self.images.len() {
            return false;
        }
        self.show(index, now);
        true
    }

    pub fn close(&mut self) {
        self.current = None;
        self.hint_until = None;
    }

    pub fn can_go_previous(&self) -> bool {
        self.current.is_some_and(|index| index > 0)
    }

    pub fn can_go_next(&self) -> bool {
        self.current.is_some_and(|index| index + 1 < self.images.len())
    }

    pub fn previous(&mut self, now: Instant) -> bool {
        match self.current {
            Some(index) if index > 0 => {
                self.show(index - 1, now);
                true
            }
            _ => false,
        }
    }

    pub fn next(&mut self, now: Instant) -> bool {
        match self.current {
            Some(index) if index + 1 < self.images.len() => {
                self.show(index + 1, now);
                true
            }
            _ => false,
        }
    }

    /// Arrow keys navigate and Escape closes while open. Returns whether the
    /// key was consumed.
    pub fn handle_key(&mut self, key: Key, now: Instant) -> bool {
        if !self.is_open() {
            return false;
        }
        match key {
            Key::ArrowLeft => {
                self.previous(now);
                true
            }
            Key::ArrowRight => {
                self.next(now);
                true
            }
            Key::Escape => {
                self.close();
                true
            }
            Key::Other => false,
        }
    }

    /// Negative `delta_y` (wheel up) zooms in.
    pub fn wheel(&mut self, delta_y: f64, now: Instant) {
        if !self.is_open() {
            return;
        }
        let next = if delta_y < 0.0 {
            self.scale + WHEEL_STEP
        } else {
            self.scale - WHEEL_STEP
        };
        self.scale = round2(next.clamp(MIN_SCALE, MAX_SCALE));
        self.hint_until = Some(now + ZOOM_HINT);
    }

    /// Toggles between actual size and fit-to-viewport.
    pub fn double_click(&mut self, viewport: Viewport, now: Instant) {
        let Some(natural_size) = self.current_image().map(|image| image.natural_size) else {
            return;
        };
        self.scale = if (self.scale - 1.0).abs() < 0.1 {
            match natural_size {
                Some((width, height)) if width > 0 && height > 0 => {
                    let width_ratio = viewport.width * FIT_RATIO / f64::from(width);
                    let height_ratio = viewport.height * FIT_RATIO / f64::from(height);
                    width_ratio.min(height_ratio)
                }
                _ => 1.0,
            }
        } else {
            1.0
        };
        self.hint_until = Some(now + ZOOM_HINT);
    }

    /// A click on the overlay itself (not the image or controls) closes it.
    pub fn click_backdrop(&mut self) {
        self.close();
    }

    pub fn zoom_hint(&self, now: Instant) -> Option<String> {
        match self.hint_until {
            Some(until) if now < until && self.is_open() => Some(format!(
                "Zoom: {}% (wheel to zoom / double-click to toggle)",
                (self.scale * 100.0).round()
            )),
            _ => None,
        }
    }

    fn show(&mut self, index: usize, now: Instant) {
        self.current = Some(index);
        self.scale = 1.0;
        self.hint_until = Some(now + ZOOM_HINT);
    }

    /// Mirrors the viewer state into the overlay of a mounted reader view.
    pub fn sync_overlay(&self, doc: &mut Document, now: Instant) {
        let Some(overlay) = doc.find_role(Role::ImageOverlay) else {
            return;
        };
        for child in doc.children(overlay) {
            if doc.element(child).is_some_and(|el| el.is("img")) {
                doc.detach(child);
            }
        }

        let open = self.current_image().cloned();
        let visible = open.is_some();
        doc.update_element(overlay, |el| {
            if visible {
                el.remove_attr("hidden");
            } else {
                el.set_attr("hidden", "");
            }
        });

        if let Some(image) = open {
            let mut img = ElementData::new("img")
                .attr_value("src", image.src)
                .attr_value("alt", image.alt)
                .attr_value("style", format!("transform: scale({})", self.scale));
            if let Some((width, height)) = image.natural_size {
                img.set_attr("data-original-width", width.to_string());
                img.set_attr("data-original-height", height.to_string());
            }
            doc.append_element(overlay, img);
        }

        for (button, enabled) in [
            (ControlButton::ImagePrev, self.can_go_previous()),
            (ControlButton::ImageNext, self.can_go_next()),
        ] {
            if let Some(id) = doc.find_role(Role::Button(button)) {
                doc.update_element(id, |el| {
                    if enabled {
                        el.remove_attr("disabled");
                    } else {
                        el.set_attr("disabled", "");
                    }
                });
            }
        }

        if let Some(info) = doc.find_role(Role::ZoomInfo) {
            doc.clear_children(info);
            match self.zoom_hint(now) {
                Some(hint) => {
                    doc.append_text(info, hint);
                    doc.update_element(info, |el| el.remove_attr("hidden"));
                }
                None => {
                    doc.update_element(info, |el| el.set_attr("hidden", ""));
                }
            }
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
