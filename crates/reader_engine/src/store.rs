//! Storage boundary for reader settings and the summarization credential.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use reader_core::{ColorPalette, ColorRole, ReaderSettings};
use reader_logging::{reader_debug, reader_warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SETTINGS_KEY: &str = "readerModeSettings";
pub const API_KEY_KEY: &str = "deepseekApiKey";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend failed: {0}")]
    Backend(String),
    #[error("stored value is malformed: {0}")]
    Format(#[from] serde_json::Error),
}

/// Asynchronous string key-value storage.
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(self, key: &str, value: &str) -> Self {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
        self
    }
}

#[async_trait::async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Persisted form of [`ReaderSettings`]. Missing fields fall back to the
/// defaults; the session-scoped image flag has no field here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StoredSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    font_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    line_height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    paragraph_spacing: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_dark_mode: Option<bool>,
    dark_mode_colors: BTreeMap<String, String>,
    light_mode_colors: BTreeMap<String, String>,
}

impl StoredSettings {
    fn from_settings(settings: &ReaderSettings) -> Self {
        Self {
            font_size: Some(settings.font_size),
            line_height: Some(settings.line_height),
            paragraph_spacing: Some(settings.paragraph_spacing),
            width: Some(settings.width),
            is_dark_mode: Some(settings.is_dark_mode),
            dark_mode_colors: palette_map(&settings.dark_mode_colors),
            light_mode_colors: palette_map(&settings.light_mode_colors),
        }
    }

    fn into_settings(self) -> ReaderSettings {
        let defaults = ReaderSettings::default();
        let mut settings = ReaderSettings {
            font_size: self.font_size.unwrap_or(defaults.font_size),
            line_height: self.line_height.unwrap_or(defaults.line_height),
            paragraph_spacing: self.paragraph_spacing.unwrap_or(defaults.paragraph_spacing),
            width: self.width.unwrap_or(defaults.width),
            is_dark_mode: self.is_dark_mode.unwrap_or(defaults.is_dark_mode),
            ..defaults
        };
        merge_palette(&mut settings.dark_mode_colors, &self.dark_mode_colors);
        merge_palette(&mut settings.light_mode_colors, &self.light_mode_colors);
        settings.clamped()
    }
}

fn palette_map(palette: &ColorPalette) -> BTreeMap<String, String> {
    ColorRole::ALL
        .iter()
        .map(|role| (role.key().to_string(), palette.get(*role).to_string()))
        .collect()
}

fn merge_palette(palette: &mut ColorPalette, stored: &BTreeMap<String, String>) {
    for role in ColorRole::ALL {
        if let Some(value) = stored.get(role.key()) {
            palette.set(role, value.clone());
        }
    }
}

pub fn settings_to_json(settings: &ReaderSettings) -> Result<String, StoreError> {
    Ok(serde_json::to_string(&StoredSettings::from_settings(settings))?)
}

/// Stored values merged over the defaults and clamped into range.
pub fn settings_from_json(json: &str) -> Result<ReaderSettings, StoreError> {
    let stored: StoredSettings = serde_json::from_str(json)?;
    Ok(stored.into_settings())
}

/// Never fails: unreadable or malformed settings yield the defaults.
pub async fn load_settings(store: &dyn KeyValueStore) -> ReaderSettings {
    match store.get(SETTINGS_KEY).await {
        Ok(Some(json)) => settings_from_json(&json).unwrap_or_else(|err| {
            reader_warn!("store: ignoring stored settings: {err}");
            ReaderSettings::default()
        }),
        Ok(None) => {
            reader_debug!("store: no stored settings");
            ReaderSettings::default()
        }
        Err(err) => {
            reader_warn!("store: settings read failed: {err}");
            ReaderSettings::default()
        }
    }
}

pub async fn save_settings(
    store: &dyn KeyValueStore,
    settings: &ReaderSettings,
) -> Result<(), StoreError> {
    store.set(SETTINGS_KEY, &settings_to_json(settings)?).await
}

pub async fn load_api_key(store: &dyn KeyValueStore) -> Option<String> {
    match store.get(API_KEY_KEY).await {
        Ok(key) => key.filter(|key| !key.trim().is_empty()),
        Err(err) => {
            reader_warn!("store: API key read failed: {err}");
            None
        }
    }
}

pub async fn save_api_key(store: &dyn KeyValueStore, key: &str) -> Result<(), StoreError> {
    store.set(API_KEY_KEY, key).await
}
