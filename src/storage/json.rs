use super::{Entries, KeyValueStore, StorageError};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Key-value store persisted as a flat JSON object.
pub struct JsonKeyValueStore {
    path: PathBuf,
}

impl JsonKeyValueStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = shellexpand::tilde(&path.as_ref().to_string_lossy()).to_string();
        Self {
            path: PathBuf::from(path),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Entries, StorageError> {
        if !self.path.exists() {
            return Ok(Entries::new());
        }

        let contents = std::fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(Entries::new());
        }

        Ok(serde_json::from_str(&contents)?)
    }

    /// Loads entries ahead of a write. Unparseable contents are dropped so the
    /// write replaces them; the flag reports that a rewrite is needed.
    fn load_for_write(&self) -> Result<(Entries, bool), StorageError> {
        match self.load() {
            Ok(entries) => Ok((entries, false)),
            Err(StorageError::Serialization(e)) => {
                warn!(path = %self.path.display(), error = %e, "discarding unreadable key-value store");
                Ok((Entries::new(), true))
            }
            Err(e) => Err(e),
        }
    }

    fn save(&self, entries: &Entries) -> Result<(), StorageError> {
        // Create parent directories if they don't exist
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, json)?;
        debug!(path = %self.path.display(), keys = entries.len(), "saved key-value store");
        Ok(())
    }
}

impl KeyValueStore for JsonKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let (mut entries, _) = self.load_for_write()?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let (mut entries, reset) = self.load_for_write()?;
        if entries.remove(key).is_some() || reset {
            self.save(&entries)?;
        }
        Ok(())
    }
}
