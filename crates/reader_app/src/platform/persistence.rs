use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

use reader_engine::{AtomicFileWriter, KeyValueStore, StoreError};
use reader_logging::{reader_info, reader_warn};
use serde::{Deserialize, Serialize};

const STATE_FILENAME: &str = ".reader_state.ron";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedState {
    entries: BTreeMap<String, String>,
}

/// Key-value store kept in a RON file, rewritten atomically on every set.
pub(crate) struct FileStore {
    writer: AtomicFileWriter,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// A missing or unreadable state file starts an empty store.
    pub(crate) fn open(dir: PathBuf) -> Self {
        let writer = AtomicFileWriter::new(dir);
        let entries = match writer.read(STATE_FILENAME) {
            Ok(Some(content)) => match ron::from_str::<PersistedState>(&content) {
                Ok(state) => {
                    reader_info!("Loaded reader state from {:?}", writer.dir());
                    state.entries
                }
                Err(err) => {
                    reader_warn!("Failed to parse reader state in {:?}: {}", writer.dir(), err);
                    BTreeMap::new()
                }
            },
            Ok(None) => BTreeMap::new(),
            Err(err) => {
                reader_warn!("Failed to read reader state in {:?}: {}", writer.dir(), err);
                BTreeMap::new()
            }
        };
        Self {
            writer,
            entries: Mutex::new(entries),
        }
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let state = PersistedState {
            entries: entries.clone(),
        };
        let content = ron::ser::to_string_pretty(&state, ron::ser::PrettyConfig::new())
            .map_err(|err| StoreError::Backend(err.to_string()))?;
        self.writer
            .write(STATE_FILENAME, &content)
            .map_err(|err| StoreError::Backend(err.to_string()))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Backend("state lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Backend("state lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }
}
