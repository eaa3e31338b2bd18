//! Concurrent registry of generation tasks.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::core::{GenerationTask, OrchestrationResult, TaskStatus, TopicRequest};
use crate::utils::generate_task_id;

/// Thread-safe store of task records keyed by task id.
///
/// Every transition swaps the whole record under the key's shard lock, so
/// readers always see either the old or the new snapshot. Transitions on an
/// unknown id are ignored. Completion is last-write-wins.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: DashMap<String, Arc<GenerationTask>>,
}

impl TaskRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a new pending task and returns its id.
    pub fn create(&self, request: TopicRequest) -> String {
        let task_id = generate_task_id();
        self.insert(GenerationTask::new(task_id.clone(), request));
        task_id
    }

    /// Stores a task record as-is, replacing any record with the same id.
    pub fn insert(&self, task: GenerationTask) {
        self.tasks.insert(task.id.clone(), Arc::new(task));
    }

    /// Returns the current snapshot of a task.
    #[must_use]
    pub fn get(&self, task_id: &str) -> Option<Arc<GenerationTask>> {
        self.tasks.get(task_id).map(|entry| Arc::clone(entry.value()))
    }

    /// Marks a task as picked up by a worker.
    pub fn transition_to_in_progress(&self, task_id: &str) {
        self.replace(task_id, |task| task.with_status(TaskStatus::InProgress));
    }

    /// Marks a task as completed with its result.
    pub fn complete_with_result(&self, task_id: &str, result: OrchestrationResult) {
        self.replace(task_id, |task| task.with_result(result));
    }

    /// Marks a task as failed.
    pub fn fail_with_error(&self, task_id: &str, error: impl Into<String>) {
        let error = error.into();
        self.replace(task_id, |task| task.with_error(error));
    }

    fn replace<F>(&self, task_id: &str, transition: F)
    where
        F: FnOnce(&GenerationTask) -> GenerationTask,
    {
        match self.tasks.get_mut(task_id) {
            Some(mut entry) => {
                let next = transition(entry.value());
                debug!(task_id, from = %entry.status, to = %next.status, "Task transition");
                *entry.value_mut() = Arc::new(next);
            }
            None => debug!(task_id, "Ignoring transition for unknown task"),
        }
    }

    /// Removes every task created before `now - max_age`, whatever its status.
    ///
    /// Returns the number of removed tasks.
    pub fn evict_older_than(&self, max_age: Duration) -> usize {
        let cutoff = chrono::Duration::from_std(max_age)
            .ok()
            .and_then(|age| Utc::now().checked_sub_signed(age))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        self.evict_created_before(cutoff)
    }

    /// Removes every task created strictly before `cutoff`.
    pub fn evict_created_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut removed = 0;
        self.tasks.retain(|_, task| {
            let keep = task.created_at >= cutoff;
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    /// Returns the number of tasks not yet in a terminal status.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|entry| !entry.value().is_completed())
            .count()
    }

    /// Returns the number of stored tasks.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.tasks.len()
    }

    /// Returns true if no tasks are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
