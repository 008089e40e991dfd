use crate::ReaderSettings;

/// Side effects requested by [`crate::update`]; executed in order by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Mount the loading overlay.
    ShowLoading,
    /// Read persisted settings; the host answers with `Msg::SettingsLoaded`.
    LoadSettings,
    /// Suitability, extraction, sanitization, render and body swap.
    RunPipeline { show_images: bool },
    /// Put the snapshot back into the body and drop every session artifact.
    RestorePage { markup: String },
    /// Show the dismissible error banner.
    ShowError { message: String },
    /// Fire-and-forget activation broadcast.
    NotifyListener { active: bool },
    /// Re-apply typography/theme to the mounted reader view.
    ApplyStyles,
    PersistSettings(ReaderSettings),
}
