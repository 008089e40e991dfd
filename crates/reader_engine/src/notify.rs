//! Activation broadcasts from a page to whoever tracks it.

use std::sync::{Arc, Mutex};

use reader_core::{IconVariant, TabId, TabRegistry};
use reader_logging::reader_debug;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    #[error("no listener is connected")]
    Disconnected,
    #[error("listener rejected the message: {0}")]
    Rejected(String),
}

/// Receives `state_changed` broadcasts. Delivery is fire-and-forget: the
/// session logs a failure and carries on.
pub trait StateListener: Send + Sync {
    fn state_changed(&self, active: bool) -> Result<(), NotifyError>;
}

pub struct ChannelListener {
    tx: std::sync::mpsc::Sender<bool>,
}

impl ChannelListener {
    pub fn new(tx: std::sync::mpsc::Sender<bool>) -> Self {
        Self { tx }
    }
}

impl StateListener for ChannelListener {
    fn state_changed(&self, active: bool) -> Result<(), NotifyError> {
        self.tx.send(active).map_err(|_| NotifyError::Disconnected)
    }
}

/// Feeds broadcasts of one tab into a shared [`TabRegistry`].
pub struct TabListener {
    tab: TabId,
    registry: Arc<Mutex<TabRegistry>>,
}

impl TabListener {
    pub fn new(tab: TabId, registry: Arc<Mutex<TabRegistry>>) -> Self {
        Self { tab, registry }
    }
}

impl StateListener for TabListener {
    fn state_changed(&self, active: bool) -> Result<(), NotifyError> {
        let mut registry = self
            .registry
            .lock()
            .map_err(|_| NotifyError::Rejected("registry lock poisoned".to_string()))?;
        let icon: IconVariant = registry.state_changed(self.tab, active);
        reader_debug!("notify: tab {} icon {:?}", self.tab, icon);
        Ok(())
    }
}

/// Nobody listening; every broadcast fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedListener;

impl StateListener for DetachedListener {
    fn state_changed(&self, _active: bool) -> Result<(), NotifyError> {
        Err(NotifyError::Disconnected)
    }
}
