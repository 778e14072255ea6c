use std::collections::BTreeMap;
use thiserror::Error;

#[cfg(test)]
pub(crate) mod test_utils;

pub mod json;

pub use json::JsonKeyValueStore;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persistent string key-value storage local to this client.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

pub(crate) type Entries = BTreeMap<String, String>;
