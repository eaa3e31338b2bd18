//! Immutable task records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{OrchestrationResult, TaskStatus, TopicRequest};

/// A snapshot of one generation task.
///
/// Records are never mutated. Every transition builds a new record that
/// replaces the previous one in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationTask {
    /// Task identifier.
    pub id: String,
    /// The request being processed.
    pub request: TopicRequest,
    /// Current status.
    pub status: TaskStatus,
    /// Pipeline output, set on completion.
    pub result: Option<OrchestrationResult>,
    /// Failure message, set on failure.
    pub error: Option<String>,
    /// When the task was accepted.
    pub created_at: DateTime<Utc>,
    /// When the record was last replaced.
    pub updated_at: DateTime<Utc>,
    /// When the task reached a terminal status.
    pub completed_at: Option<DateTime<Utc>>,
}

impl GenerationTask {
    /// Creates a pending task.
    #[must_use]
    pub fn new(id: impl Into<String>, request: TopicRequest) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            request,
            status: TaskStatus::Pending,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Overrides the creation time.
    #[must_use]
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self.updated_at = created_at;
        self
    }

    /// Returns a copy with a new status.
    #[must_use]
    pub fn with_status(&self, status: TaskStatus) -> Self {
        Self {
            status,
            updated_at: Utc::now(),
            ..self.clone()
        }
    }

    /// Returns a completed copy carrying the result.
    #[must_use]
    pub fn with_result(&self, result: OrchestrationResult) -> Self {
        let now = Utc::now();
        Self {
            status: TaskStatus::Completed,
            result: Some(result),
            updated_at: now,
            completed_at: Some(now),
            ..self.clone()
        }
    }

    /// Returns a failed copy carrying the error message.
    #[must_use]
    pub fn with_error(&self, error: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            status: TaskStatus::Failed,
            error: Some(error.into()),
            updated_at: now,
            completed_at: Some(now),
            ..self.clone()
        }
    }

    /// Returns true if the task reached a terminal status.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status.is_terminal()
    }
}
