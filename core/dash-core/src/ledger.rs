//! Task ledger for the active shift.
//!
//! The list is always replaced wholesale from the server, in server order.
//! Completion toggles are the only optimistic mutation: each entry carries a
//! UI `checked` flag that flips before the request and flips back if it fails.
//! Create and delete are pessimistic and reconcile through a refresh.

use crate::api::ApiClient;
use crate::error::{Result, ValidationError};
use crate::optimistic::apply_tentative;
use crate::transport::Transport;
use nightwatch_protocol::{RecordId, Task};
use std::cell::RefCell;
use tracing::debug;

/// A server task plus the checkbox state shown for it.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskEntry {
    pub task: Task,
    pub checked: bool,
}

impl From<Task> for TaskEntry {
    fn from(task: Task) -> Self {
        let checked = task.is_completed();
        Self { task, checked }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskSummary {
    pub total: usize,
    pub done: usize,
}

impl std::fmt::Display for TaskSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} total / {} done", self.total, self.done)
    }
}

/// Trims a task title, rejecting one that is empty afterwards.
pub fn normalize_title(title: &str) -> std::result::Result<String, ValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Default)]
pub struct TaskLedger {
    entries: RefCell<Vec<TaskEntry>>,
}

impl TaskLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<TaskEntry> {
        self.entries.borrow().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Counts from server completion timestamps, not checkbox state.
    pub fn summary(&self) -> TaskSummary {
        let entries = self.entries.borrow();
        TaskSummary {
            total: entries.len(),
            done: entries.iter().filter(|entry| entry.task.is_completed()).count(),
        }
    }

    pub fn is_checked(&self, task_id: &RecordId) -> Option<bool> {
        self.entries
            .borrow()
            .iter()
            .find(|entry| &entry.task.id == task_id)
            .map(|entry| entry.checked)
    }

    fn set_checked(&self, task_id: &RecordId, checked: bool) {
        if let Some(entry) = self
            .entries
            .borrow_mut()
            .iter_mut()
            .find(|entry| &entry.task.id == task_id)
        {
            entry.checked = checked;
        }
    }

    pub fn replace(&self, tasks: Vec<Task>) {
        self.entries
            .replace(tasks.into_iter().map(TaskEntry::from).collect());
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    pub async fn refresh<T: Transport>(&self, api: &ApiClient<T>) -> Result<TaskSummary> {
        let tasks = api.current_tasks().await?;
        self.replace(tasks);
        let summary = self.summary();
        debug!(total = summary.total, done = summary.done, "Task ledger refreshed");
        Ok(summary)
    }

    /// Creates a task, then refreshes so the server's id and ordering are used.
    pub async fn create<T: Transport>(&self, api: &ApiClient<T>, title: &str) -> Result<()> {
        let title = normalize_title(title)?;
        api.create_task(&title).await?;
        self.refresh(api).await?;
        Ok(())
    }

    /// Optimistically sets the checkbox for `task_id`, confirms with the server,
    /// and refreshes. A failed request restores the prior checkbox state.
    ///
    /// `on_flag_change` runs whenever the checkbox flag is written, so a view
    /// can show the tentative state before the request resolves.
    pub async fn toggle_completion<T: Transport>(
        &self,
        api: &ApiClient<T>,
        task_id: &RecordId,
        completed: bool,
        on_flag_change: impl Fn(),
    ) -> Result<()> {
        let prior = self
            .is_checked(task_id)
            .ok_or_else(|| ValidationError::UnknownTask(task_id.clone()))?;

        apply_tentative(
            || prior,
            |checked| {
                self.set_checked(task_id, checked);
                on_flag_change();
            },
            completed,
            || api.set_task_completed(task_id, completed),
        )
        .await?;

        self.refresh(api).await?;
        Ok(())
    }

    /// Deletes a task. The entry stays until the follow-up refresh drops it.
    pub async fn delete<T: Transport>(&self, api: &ApiClient<T>, task_id: &RecordId) -> Result<()> {
        api.delete_task(task_id).await?;
        self.refresh(api).await?;
        Ok(())
    }
}
