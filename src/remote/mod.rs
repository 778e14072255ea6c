//! Boundary to the remote task store.
//!
//! Both operations are single-shot: no retry, no backoff. Callers decide what
//! to log and what to surface.

use crate::models::{NewTaskRecord, TaskRecord};
use thiserror::Error;

pub mod http;

pub use http::HttpTaskStore;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Remote store answered {status} for {url}")]
    Status { status: u16, url: String },
    #[error("Could not decode remote response: {0}")]
    Decode(String),
    #[error("Invalid remote URL: {0}")]
    InvalidUrl(String),
}

pub trait RemoteTaskStore {
    /// Fetches task records, at most `limit` when given.
    fn list_tasks(&self, limit: Option<u32>) -> Result<Vec<TaskRecord>, RemoteError>;

    /// Creates a record; the returned record carries the server-assigned id.
    fn create_task(&self, record: &NewTaskRecord) -> Result<TaskRecord, RemoteError>;
}
