use super::{Entries, KeyValueStore, StorageError};
use crate::models::{NewTaskRecord, TaskId, TaskRecord};
use crate::remote::{RemoteError, RemoteTaskStore};
use std::cell::{Cell, RefCell};

/// In-memory key-value store for tests.
#[derive(Default)]
pub struct MemoryStore {
    entries: RefCell<Entries>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// Scripted remote store: serves fixed records and assigns ids sequentially.
pub struct FakeTaskStore {
    pub records: Vec<TaskRecord>,
    pub next_id: Cell<u64>,
    pub fail: Cell<bool>,
    pub created: RefCell<Vec<NewTaskRecord>>,
    pub list_calls: Cell<usize>,
}

impl FakeTaskStore {
    pub fn new(records: Vec<TaskRecord>) -> Self {
        Self {
            records,
            next_id: Cell::new(201),
            fail: Cell::new(false),
            created: RefCell::new(Vec::new()),
            list_calls: Cell::new(0),
        }
    }

    pub fn failing() -> Self {
        let store = Self::new(Vec::new());
        store.fail.set(true);
        store
    }
}

impl RemoteTaskStore for FakeTaskStore {
    fn list_tasks(&self, limit: Option<u32>) -> Result<Vec<TaskRecord>, RemoteError> {
        self.list_calls.set(self.list_calls.get() + 1);
        if self.fail.get() {
            return Err(RemoteError::Transport("connection refused".to_string()));
        }
        let take = limit.map_or(self.records.len(), |l| l as usize);
        Ok(self.records.iter().take(take).cloned().collect())
    }

    fn create_task(&self, record: &NewTaskRecord) -> Result<TaskRecord, RemoteError> {
        if self.fail.get() {
            return Err(RemoteError::Status {
                status: 503,
                url: "http://fake/todos".to_string(),
            });
        }
        self.created.borrow_mut().push(record.clone());
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        Ok(TaskRecord {
            id: TaskId::Int(id),
            title: record.title.clone(),
            completed: record.completed,
            category: Some(record.category.clone()),
        })
    }
}

pub fn record(id: u64, title: &str, completed: bool) -> TaskRecord {
    TaskRecord {
        id: TaskId::Int(id),
        title: title.to_string(),
        completed,
        category: None,
    }
}
