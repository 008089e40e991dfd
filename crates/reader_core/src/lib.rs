//! Reader core: pure session state machine, settings and view-model helpers.
mod effect;
mod msg;
mod settings;
mod state;
mod tabs;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use settings::{
    ColorPalette, ColorRole, ReaderSettings, SettingsAction, DARK_BACKGROUND_PRESETS,
    FONT_SIZE_RANGE, LIGHT_BACKGROUND_PRESETS, LINE_HEIGHT_RANGE, PARAGRAPH_SPACING_RANGE,
    WIDTH_RANGE,
};
pub use state::{FailureKind, Phase, SessionState};
pub use tabs::{IconVariant, TabId, TabRegistry};
pub use update::update;
pub use view_model::SessionView;
