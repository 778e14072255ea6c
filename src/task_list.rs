//! In-memory task list and its contract with the remote task store.
//!
//! `load` and `add` go through the remote store and are split into a begin and
//! a finish step. The finish step is discarded when the list was torn down in
//! the meantime, or (for loads) when a newer load was started. `toggle_complete`
//! and `remove` are local only; the local list may diverge from the remote
//! store indefinitely.

use crate::models::{NewTaskRecord, Task, TaskId, TaskRecord, DEFAULT_CATEGORY};
use crate::remote::{RemoteError, RemoteTaskStore};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Failed to load tasks: {0}")]
    Load(#[source] RemoteError),
    #[error("Failed to add task: {0}")]
    Add(#[source] RemoteError),
}

/// Result of finishing a remote operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied<T> {
    Applied(T),
    /// The response arrived for a list that no longer wants it.
    Discarded,
}

impl<T> Applied<T> {
    pub fn applied(self) -> Option<T> {
        match self {
            Applied::Applied(value) => Some(value),
            Applied::Discarded => None,
        }
    }
}

/// Handle for an in-flight load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct PendingLoad {
    generation: u64,
}

/// Handle for an in-flight add, carrying the local inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct PendingAdd {
    record: NewTaskRecord,
}

impl PendingAdd {
    pub fn record(&self) -> &NewTaskRecord {
        &self.record
    }
}

pub struct TaskList {
    tasks: Vec<Task>,
    search: String,
    default_category: String,
    fetch_limit: Option<u32>,
    generation: u64,
    revision: u64,
    live: bool,
}

impl Default for TaskList {
    fn default() -> Self {
        Self::new(DEFAULT_CATEGORY, None)
    }
}

impl TaskList {
    pub fn new(default_category: impl Into<String>, fetch_limit: Option<u32>) -> Self {
        Self {
            tasks: Vec::new(),
            search: String::new(),
            default_category: default_category.into(),
            fetch_limit,
            generation: 0,
            revision: 0,
            live: true,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks,
            ..Self::default()
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Category given to fetched records that carry none, and to adds without one.
    pub fn default_category(&self) -> &str {
        &self.default_category
    }

    /// Bumped on every change to the stored tasks.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
    }

    /// Tasks matching the current search term, in list order.
    pub fn visible(&self) -> Vec<&Task> {
        filter_tasks(&self.tasks, &self.search)
    }

    /// Stops accepting remote results. Pending operations finish as `Discarded`.
    pub fn teardown(&mut self) {
        self.live = false;
    }

    pub fn begin_load(&mut self) -> PendingLoad {
        self.generation += 1;
        PendingLoad {
            generation: self.generation,
        }
    }

    /// Replaces the whole list with the fetched records on success.
    pub fn finish_load(
        &mut self,
        pending: PendingLoad,
        result: Result<Vec<TaskRecord>, RemoteError>,
    ) -> Result<Applied<usize>, SyncError> {
        if !self.live || pending.generation != self.generation {
            debug!(
                generation = pending.generation,
                current = self.generation,
                live = self.live,
                "discarding stale load"
            );
            return Ok(Applied::Discarded);
        }

        match result {
            Ok(records) => {
                let default_category = self.default_category.as_str();
                self.tasks = records
                    .into_iter()
                    .map(|r| Task::from_record(r, default_category))
                    .collect();
                self.revision += 1;
                debug!(count = self.tasks.len(), "loaded tasks");
                Ok(Applied::Applied(self.tasks.len()))
            }
            Err(e) => {
                warn!(error = %e, "failed to load tasks");
                Err(SyncError::Load(e))
            }
        }
    }

    pub fn load<R: RemoteTaskStore + ?Sized>(
        &mut self,
        store: &R,
    ) -> Result<Applied<usize>, SyncError> {
        let pending = self.begin_load();
        let result = store.list_tasks(self.fetch_limit);
        self.finish_load(pending, result)
    }

    pub fn begin_add(&self, text: impl Into<String>, category: impl Into<String>) -> PendingAdd {
        PendingAdd {
            record: NewTaskRecord::new(text, category),
        }
    }

    /// Prepends the new task once the remote store has assigned its id.
    ///
    /// The task is built from the local inputs; only the id comes from the
    /// response. It is prepended to the list as it is now, so adds that
    /// overlap do not overwrite each other.
    pub fn finish_add(
        &mut self,
        pending: PendingAdd,
        result: Result<TaskRecord, RemoteError>,
    ) -> Result<Applied<TaskId>, SyncError> {
        if !self.live {
            debug!(title = %pending.record.title, "discarding add after teardown");
            return Ok(Applied::Discarded);
        }

        match result {
            Ok(created) => {
                let id = created.id;
                self.tasks.insert(
                    0,
                    Task {
                        id: id.clone(),
                        text: pending.record.title,
                        category: pending.record.category,
                        is_completed: false,
                    },
                );
                self.revision += 1;
                debug!(%id, "added task");
                Ok(Applied::Applied(id))
            }
            Err(e) => {
                warn!(error = %e, "failed to add task");
                Err(SyncError::Add(e))
            }
        }
    }

    pub fn add<R: RemoteTaskStore + ?Sized>(
        &mut self,
        store: &R,
        text: impl Into<String>,
        category: impl Into<String>,
    ) -> Result<Applied<TaskId>, SyncError> {
        let pending = self.begin_add(text, category);
        let result = store.create_task(pending.record());
        self.finish_add(pending, result)
    }

    /// Flips completion of the matching task. Returns false when no task matches.
    pub fn toggle_complete(&mut self, id: &TaskId) -> bool {
        match self.tasks.iter_mut().find(|t| &t.id == id) {
            Some(task) => {
                task.toggle();
                self.revision += 1;
                true
            }
            None => false,
        }
    }

    /// Drops the matching task from the list, if any.
    pub fn remove(&mut self, id: &TaskId) -> Option<Task> {
        let index = self.tasks.iter().position(|t| &t.id == id)?;
        self.revision += 1;
        Some(self.tasks.remove(index))
    }
}

/// Case-insensitive substring filter on task text. An empty term keeps everything.
pub fn filter_tasks<'a>(tasks: &'a [Task], term: &str) -> Vec<&'a Task> {
    let needle = term.to_lowercase();
    tasks.iter().filter(|t| t.matches(&needle)).collect()
}
