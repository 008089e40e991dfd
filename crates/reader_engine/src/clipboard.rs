use std::sync::Mutex;

use reader_logging::reader_debug;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClipboardError {
    #[error("clipboard is not available")]
    Unavailable,
    #[error("clipboard write failed: {0}")]
    Write(String),
}

/// Write-only text clipboard.
#[async_trait::async_trait]
pub trait Clipboard: Send + Sync {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// Tries `primary`, then `fallback` when the primary write fails.
pub struct FallbackClipboard<P, F> {
    primary: P,
    fallback: F,
}

impl<P, F> FallbackClipboard<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait::async_trait]
impl<P: Clipboard, F: Clipboard> Clipboard for FallbackClipboard<P, F> {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        match self.primary.write_text(text).await {
            Ok(()) => Ok(()),
            Err(err) => {
                reader_debug!("clipboard: primary failed ({err}), using fallback");
                self.fallback.write_text(text).await
            }
        }
    }
}

/// Keeps the last written text in memory.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Mutex<Option<String>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.lock().ok().and_then(|guard| guard.clone())
    }
}

#[async_trait::async_trait]
impl Clipboard for MemoryClipboard {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut guard = self
            .contents
            .lock()
            .map_err(|_| ClipboardError::Write("clipboard lock poisoned".to_string()))?;
        *guard = Some(text.to_string());
        Ok(())
    }
}

/// A clipboard that always fails, for environments without one.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableClipboard;

#[async_trait::async_trait]
impl Clipboard for UnavailableClipboard {
    async fn write_text(&self, _text: &str) -> Result<(), ClipboardError> {
        Err(ClipboardError::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fallback_is_used_when_primary_fails() {
        let clipboard = FallbackClipboard::new(UnavailableClipboard, MemoryClipboard::new());
        clipboard.write_text("hello").await.unwrap();
        assert_eq!(clipboard.fallback.contents().as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn both_failing_reports_fallback_error() {
        let clipboard = FallbackClipboard::new(UnavailableClipboard, UnavailableClipboard);
        assert_eq!(
            clipboard.write_text("x").await,
            Err(ClipboardError::Unavailable)
        );
    }
}
