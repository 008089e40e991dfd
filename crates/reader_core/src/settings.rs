/// Inclusive bounds for the body font size in pixels.
pub const FONT_SIZE_RANGE: (u32, u32) = (14, 24);
pub const LINE_HEIGHT_RANGE: (f64, f64) = (1.5, 2.25);
pub const PARAGRAPH_SPACING_RANGE: (f64, f64) = (1.2, 2.4);
/// Inclusive bounds for the content column in pixels.
pub const WIDTH_RANGE: (u32, u32) = (640, 1200);

pub const LIGHT_BACKGROUND_PRESETS: [&str; 5] =
    ["#FFFFFF", "#FDFBF7", "#FAF9F7", "#F8F6F0", "#F4F1E8"];
pub const DARK_BACKGROUND_PRESETS: [&str; 5] =
    ["#1a1a1a", "#242424", "#2d2d2d", "#333333", "#404040"];

const FONT_SIZE_STEP: u32 = 2;
const LINE_HEIGHT_STEP: f64 = 0.25;
const PARAGRAPH_SPACING_STEP: f64 = 0.2;
const WIDTH_STEP: u32 = 80;

/// Semantic colour slots of a theme palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorRole {
    Background,
    Text,
    Border,
    Link,
    Heading,
    Quote,
}

impl ColorRole {
    pub const ALL: [ColorRole; 6] = [
        ColorRole::Background,
        ColorRole::Text,
        ColorRole::Border,
        ColorRole::Link,
        ColorRole::Heading,
        ColorRole::Quote,
    ];

    /// Storage key and CSS custom-property suffix.
    pub fn key(self) -> &'static str {
        match self {
            ColorRole::Background => "background",
            ColorRole::Text => "text",
            ColorRole::Border => "border",
            ColorRole::Link => "link",
            ColorRole::Heading => "heading",
            ColorRole::Quote => "quote",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorPalette {
    pub background: String,
    pub text: String,
    pub border: String,
    pub link: String,
    pub heading: String,
    pub quote: String,
}

impl ColorPalette {
    pub fn light() -> Self {
        Self {
            background: "#FAF9F7".to_string(),
            text: "#2c3e50".to_string(),
            border: "#e0e0e0".to_string(),
            link: "#2980b9".to_string(),
            heading: "#1a1a1a".to_string(),
            quote: "#666666".to_string(),
        }
    }

    pub fn dark() -> Self {
        Self {
            background: "#222".to_string(),
            text: "#E4E4E4".to_string(),
            border: "#444".to_string(),
            link: "#7CB4F5".to_string(),
            heading: "#FFFFFF".to_string(),
            quote: "#B4B4B4".to_string(),
        }
    }

    pub fn get(&self, role: ColorRole) -> &str {
        match role {
            ColorRole::Background => &self.background,
            ColorRole::Text => &self.text,
            ColorRole::Border => &self.border,
            ColorRole::Link => &self.link,
            ColorRole::Heading => &self.heading,
            ColorRole::Quote => &self.quote,
        }
    }

    pub fn set(&mut self, role: ColorRole, value: impl Into<String>) {
        let slot = match role {
            ColorRole::Background => &mut self.background,
            ColorRole::Text => &mut self.text,
            ColorRole::Border => &mut self.border,
            ColorRole::Link => &mut self.link,
            ColorRole::Heading => &mut self.heading,
            ColorRole::Quote => &mut self.quote,
        };
        *slot = value.into();
    }
}

/// Typography and theme configuration of the reading view.
///
/// `show_images` is session-scoped: it is reset on every activation and is
/// never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ReaderSettings {
    pub font_size: u32,
    pub line_height: f64,
    pub paragraph_spacing: f64,
    pub width: u32,
    pub is_dark_mode: bool,
    pub show_images: bool,
    pub dark_mode_colors: ColorPalette,
    pub light_mode_colors: ColorPalette,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            font_size: 18,
            line_height: 1.75,
            paragraph_spacing: 1.6,
            width: 800,
            is_dark_mode: false,
            show_images: true,
            dark_mode_colors: ColorPalette::dark(),
            light_mode_colors: ColorPalette::light(),
        }
    }
}

/// Control-panel actions that mutate [`ReaderSettings`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsAction {
    DecreaseFontSize,
    IncreaseFontSize,
    DecreaseLineHeight,
    IncreaseLineHeight,
    DecreaseParagraphSpacing,
    IncreaseParagraphSpacing,
    DecreaseWidth,
    IncreaseWidth,
    ToggleDarkMode,
    /// Background colour of the palette that is currently active.
    SetBackground(String),
    ToggleImages,
}

impl SettingsAction {
    /// Every mutation is persisted except the session-only image toggle.
    pub fn is_persisted(&self) -> bool {
        !matches!(self, SettingsAction::ToggleImages)
    }
}

impl ReaderSettings {
    /// Applies a control-panel action. Returns `false` when the value was
    /// already at its bound and nothing changed.
    pub fn apply(&mut self, action: &SettingsAction) -> bool {
        let before = self.clone();
        match action {
            SettingsAction::DecreaseFontSize => {
                self.font_size = self
                    .font_size
                    .saturating_sub(FONT_SIZE_STEP)
                    .max(FONT_SIZE_RANGE.0);
            }
            SettingsAction::IncreaseFontSize => {
                self.font_size = (self.font_size + FONT_SIZE_STEP).min(FONT_SIZE_RANGE.1);
            }
            SettingsAction::DecreaseLineHeight => {
                self.line_height =
                    round2(self.line_height - LINE_HEIGHT_STEP).max(LINE_HEIGHT_RANGE.0);
            }
            SettingsAction::IncreaseLineHeight => {
                self.line_height =
                    round2(self.line_height + LINE_HEIGHT_STEP).min(LINE_HEIGHT_RANGE.1);
            }
            SettingsAction::DecreaseParagraphSpacing => {
                self.paragraph_spacing = round2(self.paragraph_spacing - PARAGRAPH_SPACING_STEP)
                    .max(PARAGRAPH_SPACING_RANGE.0);
            }
            SettingsAction::IncreaseParagraphSpacing => {
                self.paragraph_spacing = round2(self.paragraph_spacing + PARAGRAPH_SPACING_STEP)
                    .min(PARAGRAPH_SPACING_RANGE.1);
            }
            SettingsAction::DecreaseWidth => {
                self.width = self.width.saturating_sub(WIDTH_STEP).max(WIDTH_RANGE.0);
            }
            SettingsAction::IncreaseWidth => {
                self.width = (self.width + WIDTH_STEP).min(WIDTH_RANGE.1);
            }
            SettingsAction::ToggleDarkMode => self.is_dark_mode = !self.is_dark_mode,
            SettingsAction::SetBackground(color) => {
                self.active_palette_mut()
                    .set(ColorRole::Background, color.clone());
            }
            SettingsAction::ToggleImages => self.show_images = !self.show_images,
        }
        *self != before
    }

    /// Forces every numeric field into its bounds (used after loading
    /// values that were written by an older or foreign build).
    pub fn clamped(mut self) -> Self {
        self.font_size = self.font_size.clamp(FONT_SIZE_RANGE.0, FONT_SIZE_RANGE.1);
        self.line_height = clamp_f64(self.line_height, LINE_HEIGHT_RANGE);
        self.paragraph_spacing = clamp_f64(self.paragraph_spacing, PARAGRAPH_SPACING_RANGE);
        self.width = self.width.clamp(WIDTH_RANGE.0, WIDTH_RANGE.1);
        self
    }

    pub fn active_palette(&self) -> &ColorPalette {
        if self.is_dark_mode {
            &self.dark_mode_colors
        } else {
            &self.light_mode_colors
        }
    }

    fn active_palette_mut(&mut self) -> &mut ColorPalette {
        if self.is_dark_mode {
            &mut self.dark_mode_colors
        } else {
            &mut self.light_mode_colors
        }
    }

    /// Background swatches offered for the active theme.
    pub fn background_presets(&self) -> &'static [&'static str] {
        if self.is_dark_mode {
            &DARK_BACKGROUND_PRESETS
        } else {
            &LIGHT_BACKGROUND_PRESETS
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn clamp_f64(value: f64, (min, max): (f64, f64)) -> f64 {
    if value.is_nan() {
        return min;
    }
    value.clamp(min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_size_steps_and_stops_at_bounds() {
        let mut settings = ReaderSettings::default();
        for _ in 0..10 {
            settings.apply(&SettingsAction::IncreaseFontSize);
        }
        assert_eq!(settings.font_size, 24);
        assert!(!settings.apply(&SettingsAction::IncreaseFontSize));
        for _ in 0..10 {
            settings.apply(&SettingsAction::DecreaseFontSize);
        }
        assert_eq!(settings.font_size, 14);
    }

    #[test]
    fn fractional_steps_do_not_drift() {
        let mut settings = ReaderSettings::default();
        settings.apply(&SettingsAction::IncreaseParagraphSpacing);
        assert_eq!(settings.paragraph_spacing, 1.8);
        for _ in 0..10 {
            settings.apply(&SettingsAction::IncreaseParagraphSpacing);
        }
        assert_eq!(settings.paragraph_spacing, 2.4);
        settings.apply(&SettingsAction::DecreaseLineHeight);
        assert_eq!(settings.line_height, 1.5);
        assert!(!settings.apply(&SettingsAction::DecreaseLineHeight));
    }

    #[test]
    fn background_targets_active_palette() {
        let mut settings = ReaderSettings::default();
        settings.apply(&SettingsAction::ToggleDarkMode);
        settings.apply(&SettingsAction::SetBackground("#333333".into()));
        assert_eq!(settings.dark_mode_colors.background, "#333333");
        assert_eq!(settings.light_mode_colors.background, "#FAF9F7");
        assert_eq!(settings.background_presets(), &DARK_BACKGROUND_PRESETS);
    }

    #[test]
    fn clamped_pulls_foreign_values_into_range() {
        let settings = ReaderSettings {
            font_size: 40,
            line_height: 0.9,
            paragraph_spacing: f64::NAN,
            width: 10,
            ..ReaderSettings::default()
        }
        .clamped();
        assert_eq!(settings.font_size, 24);
        assert_eq!(settings.line_height, 1.5);
        assert_eq!(settings.paragraph_spacing, 1.2);
        assert_eq!(settings.width, 640);
    }

    #[test]
    fn image_toggle_is_not_persisted() {
        assert!(!SettingsAction::ToggleImages.is_persisted());
        assert!(SettingsAction::IncreaseWidth.is_persisted());
    }
}
