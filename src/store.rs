//! The task store: the canonical task collection plus its persisted mirror.
//!
//! Every successful mutation rewrites the whole collection to the storage
//! slot before returning. A failed write leaves the in-memory change in
//! place, marks the store dirty, and returns [`StoreError::Persist`]; the
//! next mutation or [`TaskStore::flush`] writes everything again.

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::io::storage::{KeyValueStore, MemoryStore, StorageError};
use crate::model::config::DEFAULT_SLOT;
use crate::model::task::{SubTask, Task, TaskDraft};
use crate::model::view::ViewParams;
use crate::ops::task_ops;
use crate::ops::validate::{
    ValidationErrors, normalize_tags, validate_comment, validate_draft, validate_sub_task,
};
use crate::ops::view::derive_view;

/// Error type for store commands
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Invalid(#[from] ValidationErrors),
    #[error("could not save tasks: {0}")]
    Persist(#[from] StorageError),
    #[error("could not encode tasks: {0}")]
    Encode(#[from] serde_json::Error),
}

type Clock = Box<dyn Fn() -> DateTime<Utc>>;

pub struct TaskStore {
    tasks: Vec<Task>,
    backend: Box<dyn KeyValueStore>,
    slot: String,
    dirty: bool,
    clock: Clock,
}

impl TaskStore {
    /// Load the collection from `slot`.
    ///
    /// Never fails: a missing slot, an unreadable backend, or a blob that
    /// does not parse all start an empty collection.
    pub fn load(backend: Box<dyn KeyValueStore>, slot: &str) -> Self {
        let tasks = match backend.get(slot) {
            Ok(Some(blob)) => decode_tasks(slot, &blob),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(slot, error = %e, "could not read stored tasks, starting empty");
                Vec::new()
            }
        };
        info!(slot, count = tasks.len(), "loaded tasks");
        TaskStore {
            tasks,
            backend,
            slot: slot.to_string(),
            dirty: false,
            clock: Box::new(Utc::now),
        }
    }

    /// An empty store backed by a fresh [`MemoryStore`].
    pub fn in_memory() -> Self {
        Self::load(Box::new(MemoryStore::new()), DEFAULT_SLOT)
    }

    /// Replace the time source used for `createdAt`, comment timestamps and
    /// due-date validation.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        task_ops::find_task(&self.tasks, id)
    }

    /// Look a task up by full id or unique id prefix.
    pub fn resolve(&self, needle: &str) -> Result<Option<&Task>, Vec<String>> {
        task_ops::resolve_id(&self.tasks, needle)
    }

    /// Filtered and sorted projection, evaluated against the store clock.
    pub fn view(&self, params: &ViewParams) -> Vec<&Task> {
        derive_view(&self.tasks, params, self.now())
    }

    /// True when the last write failed and memory is ahead of storage.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }

    // -----------------------------------------------------------------------
    // Task commands
    // -----------------------------------------------------------------------

    /// Validate and append a new task. Returns its id.
    pub fn add_task(&mut self, draft: TaskDraft) -> Result<String, StoreError> {
        let now = self.now();
        let draft = normalize_draft(draft);
        validate_draft(&draft, now, true).into_result()?;

        let id = self.fresh_id();
        task_ops::add_task(&mut self.tasks, draft, id.clone(), now);
        debug!(%id, "task added");
        self.persist()?;
        Ok(id)
    }

    pub fn toggle_completed(&mut self, id: &str) -> Result<bool, StoreError> {
        let changed = task_ops::toggle_completed(&mut self.tasks, id);
        self.persist_if(changed)
    }

    pub fn delete_task(&mut self, id: &str) -> Result<bool, StoreError> {
        let changed = task_ops::delete_task(&mut self.tasks, id);
        self.persist_if(changed)
    }

    /// Replace the task with the same id.
    ///
    /// The stored id and `createdAt` always survive. The past-due-date rule
    /// only applies when the due date actually changes.
    pub fn update_task(&mut self, updated: Task) -> Result<bool, StoreError> {
        let Some(existing) = self.get(&updated.id) else {
            return Ok(false);
        };
        let due_changed = existing.due_date != updated.due_date;

        let draft = normalize_draft(updated.to_draft());
        validate_draft(&draft, self.now(), due_changed).into_result()?;

        let task = Task {
            title: draft.title,
            description: draft.description,
            tags: draft.tags,
            ..updated
        };
        let changed = task_ops::update_task(&mut self.tasks, task);
        self.persist_if(changed)
    }

    // -----------------------------------------------------------------------
    // Comments
    // -----------------------------------------------------------------------

    pub fn add_comment(&mut self, task_id: &str, text: &str) -> Result<bool, StoreError> {
        validate_comment(text).into_result()?;
        let now = self.now();
        let changed = task_ops::add_comment(&mut self.tasks, task_id, text.trim().to_string(), now);
        self.persist_if(changed)
    }

    /// Remove a comment by its chronological (store) index.
    pub fn delete_comment(&mut self, task_id: &str, index: usize) -> Result<bool, StoreError> {
        let changed = task_ops::delete_comment(&mut self.tasks, task_id, index);
        self.persist_if(changed)
    }

    // -----------------------------------------------------------------------
    // Sub-tasks
    // -----------------------------------------------------------------------

    /// Append a sub-task. `Ok(None)` when the parent task does not exist.
    pub fn add_sub_task(
        &mut self,
        task_id: &str,
        title: &str,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<Option<String>, StoreError> {
        let now = self.now();
        validate_sub_task(title, due_date, now).into_result()?;
        if self.get(task_id).is_none() {
            return Ok(None);
        }
        let sub = SubTask {
            id: self.fresh_id(),
            title: title.trim().to_string(),
            created_at: now,
            due_date,
            completed: false,
        };
        let sub_id = sub.id.clone();
        task_ops::add_sub_task(&mut self.tasks, task_id, sub);
        self.persist()?;
        Ok(Some(sub_id))
    }

    pub fn toggle_sub_task(&mut self, task_id: &str, sub_id: &str) -> Result<bool, StoreError> {
        let changed = task_ops::toggle_sub_task(&mut self.tasks, task_id, sub_id);
        self.persist_if(changed)
    }

    pub fn delete_sub_task(&mut self, task_id: &str, sub_id: &str) -> Result<bool, StoreError> {
        let changed = task_ops::delete_sub_task(&mut self.tasks, task_id, sub_id);
        self.persist_if(changed)
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Write the collection again if the last write failed.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        if self.dirty { self.persist() } else { Ok(()) }
    }

    /// The collection in its persisted form.
    pub fn to_json(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string(&self.tasks)?)
    }

    fn persist_if(&mut self, changed: bool) -> Result<bool, StoreError> {
        if changed {
            self.persist()?;
        }
        Ok(changed)
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        let blob = self.to_json()?;
        match self.backend.set(&self.slot, &blob) {
            Ok(()) => {
                if self.dirty {
                    info!(slot = %self.slot, "pending tasks written");
                }
                self.dirty = false;
                Ok(())
            }
            Err(e) => {
                error!(slot = %self.slot, error = %e, "could not persist tasks");
                self.dirty = true;
                Err(e.into())
            }
        }
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = Uuid::new_v4().to_string();
            if !self.id_in_use(&id) {
                return id;
            }
        }
    }

    fn id_in_use(&self, id: &str) -> bool {
        self.tasks
            .iter()
            .any(|t| t.id == id || t.subtasks.iter().any(|s| s.id == id))
    }
}

/// Parse a stored blob entry by entry. A blob that is not a JSON array
/// yields nothing; a malformed entry is skipped and the rest are kept.
fn decode_tasks(slot: &str, blob: &str) -> Vec<Task> {
    let entries: Vec<serde_json::Value> = match serde_json::from_str(blob) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(slot, error = %e, "stored tasks are malformed, starting empty");
            return Vec::new();
        }
    };
    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value::<Task>(entry) {
            Ok(task) => Some(task),
            Err(e) => {
                warn!(slot, index, error = %e, "skipping malformed stored task");
                None
            }
        })
        .collect()
}

/// Trim the title and description, normalize tags.
fn normalize_draft(mut draft: TaskDraft) -> TaskDraft {
    draft.title = draft.title.trim().to_string();
    draft.description = draft
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());
    draft.tags = normalize_tags(&draft.tags);
    draft
}
