use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Category used when a remote record carries none.
pub const DEFAULT_CATEGORY: &str = "Other";

/// Identifier assigned by the remote task store.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum TaskId {
    Int(u64),
    Str(String),
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskId::Int(id) => write!(f, "{}", id),
            TaskId::Str(id) => f.write_str(id),
        }
    }
}

impl FromStr for TaskId {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TaskError::EmptyId);
        }
        Ok(s.parse::<u64>()
            .map(TaskId::Int)
            .unwrap_or_else(|_| TaskId::Str(s.to_string())))
    }
}

impl From<u64> for TaskId {
    fn from(id: u64) -> Self {
        TaskId::Int(id)
    }
}

/// A task as held in the local list.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    pub category: String,
    pub is_completed: bool,
}

impl Task {
    /// Builds a task from a fetched record, falling back to `default_category`.
    pub fn from_record(record: TaskRecord, default_category: &str) -> Self {
        Self {
            id: record.id,
            text: record.title,
            category: record
                .category
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| default_category.to_string()),
            is_completed: record.completed,
        }
    }

    pub fn toggle(&mut self) {
        self.is_completed = !self.is_completed;
    }

    pub fn matches(&self, needle_lower: &str) -> bool {
        self.text.to_lowercase().contains(needle_lower)
    }
}

/// Record shape returned by the remote store. Missing fields are tolerated.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    pub id: TaskId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Body sent to the remote store on create.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct NewTaskRecord {
    pub title: String,
    pub completed: bool,
    pub category: String,
}

impl NewTaskRecord {
    pub fn new(title: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            completed: false,
            category: category.into(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("Task id cannot be empty")]
    EmptyId,
}
