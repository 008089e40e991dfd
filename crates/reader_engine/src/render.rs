//! Builds the reading-mode tree from a sanitized article.

use ego_tree::NodeId;
use reader_core::{ColorRole, ReaderSettings, SettingsAction};

use crate::dom::{ControlButton, Document, ElementData, Role};
use crate::extract::Article;

pub const SHOW_IMAGES_ATTR: &str = "data-show-images";
pub const IMAGE_INDEX_ATTR: &str = "data-image-index";

/// Per-image sizing rule, evaluated once the natural width is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFit {
    /// Narrower than the content column: shown at natural size.
    Natural,
    /// At or above the column width: stretched to fill it.
    FillWidth,
}

impl ImageFit {
    pub fn classify(natural_width: u32, content_width: u32) -> Self {
        if natural_width < content_width {
            ImageFit::Natural
        } else {
            ImageFit::FillWidth
        }
    }

    fn class_name(self) -> &'static str {
        match self {
            ImageFit::Natural => "small-image",
            ImageFit::FillWidth => "large-image",
        }
    }

    fn style(self) -> &'static str {
        match self {
            ImageFit::Natural => "width: auto; max-width: 100%",
            ImageFit::FillWidth => "width: 100%",
        }
    }
}

/// Builds the reader container for `article`, whose content must already be
/// sanitized. The result is a fragment with the container as its only child.
pub fn render(article: &Article, settings: &ReaderSettings) -> Document {
    let content = Document::parse_fragment(&article.content);
    let mut view = Document::new();
    let root = view.root_id();
    let Some(container) =
        view.append_element(root, ElementData::with_role("div", Role::ReaderContainer))
    else {
        return view;
    };

    build_image_overlay(&mut view, container);
    build_button_groups(&mut view, container, settings);

    if let Some(reader_content) =
        view.append_element(container, ElementData::with_role("div", Role::ReaderContent))
    {
        if !article.title.is_empty() {
            if let Some(title) =
                view.append_element(reader_content, ElementData::with_role("h1", Role::ReaderTitle))
            {
                view.append_text(title, article.title.clone());
            }
        }
        if let Some(body) =
            view.append_element(reader_content, ElementData::with_role("div", Role::ArticleBody))
        {
            view.graft_all(body, &content);
            for (index, image) in view.find_tags(body, &["img"]).into_iter().enumerate() {
                view.update_element(image, |img| img.set_attr(IMAGE_INDEX_ATTR, index.to_string()));
            }
            for table in view.find_tags(body, &["table"]) {
                optimize_table(&mut view, table);
            }
        }
    }

    let mut panel = ElementData::with_role("div", Role::SettingsPanel);
    panel.add_class("collapsed");
    view.append_element(container, panel);

    apply_styles(&mut view, settings, &[]);
    view
}

/// Re-applies typography, theme and image sizing to a mounted reader view.
/// `image_widths[i]` is the natural width of image `i`, once reported.
pub fn apply_styles(doc: &mut Document, settings: &ReaderSettings, image_widths: &[Option<u32>]) {
    let Some(container) = doc.find_role(Role::ReaderContainer) else {
        return;
    };
    let palette = settings.active_palette();
    let variables = ColorRole::ALL
        .iter()
        .map(|role| format!("--reader-{}-color: {}", css_name(*role), palette.get(*role)))
        .collect::<Vec<_>>()
        .join("; ");
    doc.update_element(container, |el| {
        el.set_attr("data-theme", if settings.is_dark_mode { "dark" } else { "light" });
        el.set_attr(SHOW_IMAGES_ATTR, settings.show_images.to_string());
        el.set_attr("style", variables);
    });

    if let Some(content) = doc.find_role(Role::ReaderContent) {
        let style = format!(
            "font-size: {}px; line-height: {}; max-width: {}px",
            settings.font_size, settings.line_height, settings.width
        );
        doc.update_element(content, |el| el.set_attr("style", style));
        let spacing = format!("margin-bottom: {}em", settings.paragraph_spacing);
        for block in doc.find_tags(content, &["p", "section"]) {
            doc.update_element(block, |el| el.set_attr("style", spacing.clone()));
        }
    }

    for (index, image) in content_images(doc).into_iter().enumerate() {
        if let Some(Some(width)) = image_widths.get(index) {
            apply_image_fit(doc, image, ImageFit::classify(*width, settings.width));
        }
    }

    if let Some(button) = doc.find_role(Role::Button(ControlButton::ImageToggle)) {
        let label = image_toggle_label(settings.show_images);
        doc.update_element(button, |el| {
            el.set_attr("aria-label", label);
            el.set_attr("title", label);
        });
    }

    if let Some(panel) = doc.find_role(Role::SettingsPanel) {
        doc.clear_children(panel);
        build_settings_content(doc, panel, settings);
    }
}

/// Images of the article body in document order.
pub fn content_images(doc: &Document) -> Vec<NodeId> {
    doc.find_role(Role::ArticleBody)
        .map(|body| doc.find_tags(body, &["img"]))
        .unwrap_or_default()
}

pub fn apply_image_fit(doc: &mut Document, image: NodeId, fit: ImageFit) {
    doc.update_element(image, |img| {
        img.remove_class(ImageFit::Natural.class_name());
        img.remove_class(ImageFit::FillWidth.class_name());
        img.add_class(fit.class_name());
        img.set_attr("style", fit.style());
    });
}

fn css_name(role: ColorRole) -> &'static str {
    match role {
        ColorRole::Background => "bg",
        ColorRole::Text => "text",
        ColorRole::Border => "border",
        ColorRole::Link => "link",
        ColorRole::Heading => "heading",
        ColorRole::Quote => "quote",
    }
}

fn image_toggle_label(show_images: bool) -> &'static str {
    if show_images {
        "Hide images"
    } else {
        "Show images"
    }
}

fn button(role_button: ControlButton, label: &str) -> ElementData {
    ElementData::with_role("button", Role::Button(role_button))
        .attr_value("aria-label", label)
        .attr_value("title", label)
}

fn build_image_overlay(doc: &mut Document, container: NodeId) {
    let overlay = ElementData::with_role("div", Role::ImageOverlay).attr_value("hidden", "");
    let Some(overlay) = doc.append_element(container, overlay) else {
        return;
    };
    if let Some(controls) =
        doc.append_element(overlay, ElementData::with_role("div", Role::ImageControls))
    {
        doc.append_element(controls, button(ControlButton::ImagePrev, "Previous image"));
        doc.append_element(controls, button(ControlButton::ImageNext, "Next image"));
    }
    let zoom = ElementData::with_role("div", Role::ZoomInfo).attr_value("hidden", "");
    doc.append_element(overlay, zoom);
}

fn build_button_groups(doc: &mut Document, container: NodeId, settings: &ReaderSettings) {
    let mut left = ElementData::with_role("div", Role::ButtonGroup);
    left.add_class("left");
    if let Some(left) = doc.append_element(container, left) {
        doc.append_element(left, button(ControlButton::Outline, "Toggle outline"));
    }

    let mut right = ElementData::with_role("div", Role::ButtonGroup);
    right.add_class("right");
    let Some(right) = doc.append_element(container, right) else {
        return;
    };
    for (kind, label) in [
        (ControlButton::Summary, "AI summary"),
        (ControlButton::MarkdownCopy, "Copy as Markdown"),
        (ControlButton::ImageToggle, image_toggle_label(settings.show_images)),
        (ControlButton::Settings, "Settings"),
        (ControlButton::Close, "Close reading mode"),
    ] {
        doc.append_element(right, button(kind, label));
    }
}

/// `data-action` name of a control-panel button.
pub fn control_name(action: &SettingsAction) -> &'static str {
    match action {
        SettingsAction::DecreaseFontSize => "decrease-font",
        SettingsAction::IncreaseFontSize => "increase-font",
        SettingsAction::DecreaseLineHeight => "decrease-line-height",
        SettingsAction::IncreaseLineHeight => "increase-line-height",
        SettingsAction::DecreaseParagraphSpacing => "decrease-spacing",
        SettingsAction::IncreaseParagraphSpacing => "increase-spacing",
        SettingsAction::DecreaseWidth => "decrease-width",
        SettingsAction::IncreaseWidth => "increase-width",
        SettingsAction::ToggleDarkMode => "toggle-theme",
        SettingsAction::SetBackground(_) => "set-background",
        SettingsAction::ToggleImages => "toggle-images",
    }
}

/// Inverse of [`control_name`]; `color` feeds `set-background`.
pub fn parse_control(name: &str, color: Option<&str>) -> Option<SettingsAction> {
    let action = match name {
        "decrease-font" => SettingsAction::DecreaseFontSize,
        "increase-font" => SettingsAction::IncreaseFontSize,
        "decrease-line-height" => SettingsAction::DecreaseLineHeight,
        "increase-line-height" => SettingsAction::IncreaseLineHeight,
        "decrease-spacing" => SettingsAction::DecreaseParagraphSpacing,
        "increase-spacing" => SettingsAction::IncreaseParagraphSpacing,
        "decrease-width" => SettingsAction::DecreaseWidth,
        "increase-width" => SettingsAction::IncreaseWidth,
        "toggle-theme" => SettingsAction::ToggleDarkMode,
        "set-background" => SettingsAction::SetBackground(color?.to_string()),
        "toggle-images" => SettingsAction::ToggleImages,
        _ => return None,
    };
    Some(action)
}

fn build_settings_content(doc: &mut Document, panel: NodeId, settings: &ReaderSettings) {
    let Some(content) = doc.append_element(panel, class_element("div", "settings-content")) else {
        return;
    };

    let theme = class_element("div", "control-group theme-controls");
    if let Some(theme) = doc.append_element(content, theme) {
        let label = if settings.is_dark_mode { "Light mode" } else { "Dark mode" };
        control_button(doc, theme, &SettingsAction::ToggleDarkMode, label);
        if let Some(options) = doc.append_element(theme, class_element("div", "color-options")) {
            let active = &settings.active_palette().background;
            for color in settings.background_presets() {
                let mut option = class_element("button", "color-option")
                    .attr_value("data-action", "set-background")
                    .attr_value("data-color", *color)
                    .attr_value("style", format!("background-color: {color}"));
                if active.eq_ignore_ascii_case(color) {
                    option.add_class("active");
                }
                doc.append_element(options, option);
            }
        }
    }

    let rows = [
        (
            "control-group text-controls",
            [
                (
                    "Font size",
                    format!("{}px", settings.font_size),
                    SettingsAction::DecreaseFontSize,
                    SettingsAction::IncreaseFontSize,
                ),
                (
                    "Line height",
                    format!("{}", settings.line_height),
                    SettingsAction::DecreaseLineHeight,
                    SettingsAction::IncreaseLineHeight,
                ),
            ],
        ),
        (
            "control-group layout-controls",
            [
                (
                    "Paragraph spacing",
                    format!("{}em", settings.paragraph_spacing),
                    SettingsAction::DecreaseParagraphSpacing,
                    SettingsAction::IncreaseParagraphSpacing,
                ),
                (
                    "Content width",
                    format!("{}px", settings.width),
                    SettingsAction::DecreaseWidth,
                    SettingsAction::IncreaseWidth,
                ),
            ],
        ),
    ];
    for (group_class, controls) in rows {
        let Some(group) = doc.append_element(content, class_element("div", group_class)) else {
            continue;
        };
        for (label, value, decrease, increase) in controls {
            let Some(row) = doc.append_element(group, class_element("div", "size-control")) else {
                continue;
            };
            if let Some(span) = doc.append_element(row, class_element("span", "control-label")) {
                doc.append_text(span, label);
            }
            control_button(doc, row, &decrease, "-");
            if let Some(span) = doc.append_element(row, class_element("span", "control-value")) {
                doc.append_text(span, value);
            }
            control_button(doc, row, &increase, "+");
        }
    }

    let api = class_element("div", "control-group api-controls");
    if let Some(api) = doc.append_element(content, api) {
        if let Some(span) = doc.append_element(api, class_element("span", "control-label")) {
            doc.append_text(span, "DeepSeek API Key");
        }
        let input = class_element("input", "ai-api-key-input")
            .attr_value("type", "password")
            .attr_value("placeholder", "Enter DeepSeek API Key");
        doc.append_element(api, input);
        let save = class_element("button", "control-button ai-save-key-button");
        if let Some(save) = doc.append_element(api, save) {
            doc.append_text(save, "Save");
        }
    }
}

fn control_button(doc: &mut Document, parent: NodeId, action: &SettingsAction, text: &str) {
    let element =
        class_element("button", "control-button").attr_value("data-action", control_name(action));
    if let Some(id) = doc.append_element(parent, element) {
        doc.append_text(id, text);
    }
}

fn class_element(name: &str, classes: &str) -> ElementData {
    let mut element = ElementData::new(name);
    for class in classes.split_whitespace() {
        element.add_class(class);
    }
    element
}

/// Wide tables scroll; numeric cells align right, short cells centre.
fn optimize_table(doc: &mut Document, table: NodeId) {
    let columns = doc
        .find_tag(table, "tr")
        .map(|row| {
            doc.children(row)
                .into_iter()
                .filter(|id| doc.element(*id).is_some_and(|e| e.is("td") || e.is("th")))
                .count()
        })
        .unwrap_or(0);
    let cells = doc.find_tags(table, &["td", "th"]);
    let has_wide_content = cells.iter().any(|cell| {
        doc.text_content(*cell).chars().count() > 50
            || !doc.find_tags(*cell, &["img", "table", "pre"]).is_empty()
    });
    if columns > 5 || has_wide_content {
        doc.update_element(table, |el| el.add_class("scrollable"));
    }
    for cell in cells {
        let text = doc.text_content(cell);
        let text = text.trim();
        let numeric = is_numeric(text);
        let align = if numeric {
            "right"
        } else if text.chars().count() < 10 {
            "center"
        } else {
            "left"
        };
        doc.update_element(cell, |el| {
            el.set_attr("style", format!("overflow-wrap: break-word; text-align: {align}"))
        });
    }
}

fn is_numeric(text: &str) -> bool {
    let mut parts = text.splitn(2, '.');
    let whole = parts.next().unwrap_or_default();
    let fraction = parts.next();
    !whole.is_empty()
        && whole.chars().all(|c| c.is_ascii_digit())
        && fraction.is_none_or(|f| !f.is_empty() && f.chars().all(|c| c.is_ascii_digit()))
}

/// Text of the reader title node, if present.
pub fn rendered_title(doc: &Document) -> Option<String> {
    doc.find_role(Role::ReaderTitle).map(|id| doc.text_content(id))
}
