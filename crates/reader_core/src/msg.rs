use crate::{FailureKind, ReaderSettings, SettingsAction};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Toggle invoked (toolbar click or inbound "toggle" command).
    /// Carries the body markup at the moment of invocation.
    ToggleRequested { body_markup: String },
    /// Close button or explicit disable.
    DisableRequested,
    /// Storage read finished, merged with defaults.
    SettingsLoaded(ReaderSettings),
    /// Reader view is mounted in the page; `title` is the rendered headline.
    ActivationSucceeded { title: String },
    /// Any step of the activation pipeline failed.
    ActivationFailed { kind: FailureKind, message: String },
    /// The snapshot has been written back into the page.
    RestoreCompleted,
    /// Control-panel action.
    Settings(SettingsAction),
}
