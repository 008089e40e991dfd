use crate::{FailureKind, Phase};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionView {
    pub phase: Phase,
    pub is_enabled: bool,
    pub is_processing: bool,
    pub has_snapshot: bool,
    pub show_images: bool,
    pub title: Option<String>,
    pub last_failure: Option<FailureKind>,
    pub dirty: bool,
}
