use std::fmt;

use crate::view_model::SessionView;
use crate::ReaderSettings;

/// Lifecycle of one reading-mode session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Activating,
    Active,
    Deactivating,
}

/// Why an activation attempt was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The page is structurally ineligible (URL pattern, text density).
    Unsuitable,
    /// The extraction library produced nothing.
    NoContentParsed,
    /// Extracted content is below the minimum length.
    InsufficientContent,
    /// Sanitization or rendering could not produce a readable view.
    Sanitization,
}

impl FailureKind {
    /// Unsuitable pages only change when the user navigates elsewhere.
    pub fn is_retryable(self) -> bool {
        !matches!(self, FailureKind::Unsuitable)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Unsuitable => write!(f, "unsuitable page"),
            FailureKind::NoContentParsed => write!(f, "no content parsed"),
            FailureKind::InsufficientContent => write!(f, "insufficient content"),
            FailureKind::Sanitization => write!(f, "sanitization failed"),
        }
    }
}

/// Reading-mode session state. Exactly one instance exists per page.
///
/// `original_content` is `Some` exactly while an attempt is in flight or
/// reading mode is active.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionState {
    phase: Phase,
    original_content: Option<String>,
    settings: ReaderSettings,
    /// Headline of the reader view while Active.
    title: Option<String>,
    last_failure: Option<FailureKind>,
    dirty: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: ReaderSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_enabled(&self) -> bool {
        self.phase == Phase::Active
    }

    pub fn is_processing(&self) -> bool {
        matches!(self.phase, Phase::Activating | Phase::Deactivating)
    }

    pub fn original_content(&self) -> Option<&str> {
        self.original_content.as_deref()
    }

    pub fn settings(&self) -> &ReaderSettings {
        &self.settings
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn last_failure(&self) -> Option<FailureKind> {
        self.last_failure
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            phase: self.phase,
            is_enabled: self.is_enabled(),
            is_processing: self.is_processing(),
            has_snapshot: self.original_content.is_some(),
            show_images: self.settings.show_images,
            title: self.title.clone(),
            last_failure: self.last_failure,
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn begin_activation(&mut self, body_markup: String) {
        self.phase = Phase::Activating;
        self.original_content = Some(body_markup);
        self.settings.show_images = ReaderSettings::default().show_images;
        self.last_failure = None;
        self.dirty = true;
    }

    pub(crate) fn finish_activation(&mut self, title: String) {
        self.phase = Phase::Active;
        self.title = Some(title);
        self.dirty = true;
    }

    /// Abandons the attempt and hands back the snapshot for restoration.
    pub(crate) fn fail_activation(&mut self, kind: FailureKind) -> Option<String> {
        self.phase = Phase::Idle;
        self.last_failure = Some(kind);
        self.dirty = true;
        self.original_content.take()
    }

    /// The snapshot stays owned by the state until restoration completes.
    pub(crate) fn begin_deactivation(&mut self) -> Option<String> {
        self.phase = Phase::Deactivating;
        self.dirty = true;
        self.original_content.clone()
    }

    pub(crate) fn finish_deactivation(&mut self) {
        self.phase = Phase::Idle;
        self.title = None;
        self.original_content = None;
        self.dirty = true;
    }

    /// Persisted values replace the current ones; the session-scoped image
    /// flag is kept as it is.
    pub(crate) fn load_settings(&mut self, loaded: ReaderSettings) {
        let show_images = self.settings.show_images;
        self.settings = ReaderSettings {
            show_images,
            ..loaded
        };
        self.dirty = true;
    }

    pub(crate) fn settings_mut(&mut self) -> &mut ReaderSettings {
        self.dirty = true;
        &mut self.settings
    }
}
