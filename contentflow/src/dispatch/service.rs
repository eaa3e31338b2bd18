//! Asynchronous generation on top of the task registry and worker pool.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use super::identity::{current_caller, with_caller, CallerIdentity};
use super::pool::{Submission, WorkerPool};
use crate::config::{CleanupConfig, DispatchConfig};
use crate::core::{GenerationTask, OrchestrationResult, TaskStatus, TopicRequest};
use crate::errors::{ContentflowError, DispatchError};
use crate::persistence::{ContentStore, GeneratedContent};
use crate::pipeline::Orchestrator;
use crate::tasks::TaskRegistry;
use crate::utils::panic_message;

/// What a background job needs to run one generation.
#[derive(Clone)]
struct GenerationJob {
    registry: Arc<TaskRegistry>,
    orchestrator: Arc<Orchestrator>,
    store: Arc<dyn ContentStore>,
}

impl GenerationJob {
    /// Runs one task to a terminal state.
    ///
    /// A panic anywhere in the run marks the task FAILED with the panic
    /// message.
    async fn run(self, task_id: String, caller: Option<CallerIdentity>) {
        let execution = with_caller(caller, self.execute(&task_id));
        if let Err(payload) = AssertUnwindSafe(execution).catch_unwind().await {
            let message = panic_message(&*payload);
            error!(task_id = %task_id, error = %message, "Generation task failed");
            self.registry.fail_with_error(&task_id, message);
        }
    }

    async fn execute(&self, task_id: &str) {
        let Some(task) = self.registry.get(task_id) else {
            error!(task_id, "Task not found, skipping generation");
            return;
        };

        self.registry.transition_to_in_progress(task_id);
        let caller = current_caller();
        info!(
            task_id,
            user = caller.as_ref().map_or("anonymous", |c| c.email.as_str()),
            "Executing generation task"
        );

        let result = self.orchestrator.run(&task.request).await;
        let result = match caller {
            Some(caller) => self.persist(task_id, &caller, &task.request, result).await,
            None => {
                debug!(task_id, "No caller identity, result not persisted");
                result
            }
        };

        self.registry.complete_with_result(task_id, result);
        info!(task_id, "Completed generation task");
    }

    async fn persist(
        &self,
        task_id: &str,
        caller: &CallerIdentity,
        request: &TopicRequest,
        result: OrchestrationResult,
    ) -> OrchestrationResult {
        match self.store.save(&caller.email, request, &result).await {
            Ok(id) => {
                info!(task_id, content_id = id, "Persisted generated content");
                result.with_id(id)
            }
            Err(e) => {
                error!(
                    task_id,
                    error = %e,
                    "Failed to persist content, continuing without persistence"
                );
                result
            }
        }
    }
}

/// Starts generations in the background and answers status queries.
pub struct GenerationService {
    job: GenerationJob,
    pool: WorkerPool,
    max_task_age: Duration,
    shutdown_grace: Duration,
}

impl GenerationService {
    /// Creates a service with its own registry and worker pool.
    #[must_use]
    pub fn new(
        orchestrator: Orchestrator,
        store: Arc<dyn ContentStore>,
        dispatch: DispatchConfig,
        cleanup: &CleanupConfig,
    ) -> Self {
        Self {
            job: GenerationJob {
                registry: Arc::new(TaskRegistry::new()),
                orchestrator: Arc::new(orchestrator),
                store,
            },
            shutdown_grace: dispatch.shutdown_grace(),
            pool: WorkerPool::new(dispatch),
            max_task_age: cleanup.max_task_age(),
        }
    }

    /// The task registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<TaskRegistry> {
        &self.job.registry
    }

    /// Registers a task and hands its generation to the worker pool.
    ///
    /// Returns as soon as the job is queued, except when the pool is
    /// saturated and the job runs on the caller. If the pool refuses the job
    /// the task is marked FAILED.
    pub async fn start_generation(
        &self,
        request: TopicRequest,
        caller: Option<CallerIdentity>,
    ) -> Result<String, DispatchError> {
        let task_id = self.job.registry.create(request);
        info!(
            task_id = %task_id,
            user = caller.as_ref().map_or("anonymous", |c| c.email.as_str()),
            "Started async generation task"
        );

        let job = self.job.clone().run(task_id.clone(), caller);
        match self.pool.submit(job).await {
            Ok(Submission::CallerRuns) => {
                debug!(task_id = %task_id, "Generation ran on the submitting task");
                Ok(task_id)
            }
            Ok(_) => Ok(task_id),
            Err(e) => {
                error!(task_id = %task_id, error = %e, "Could not dispatch generation task");
                self.job.registry.fail_with_error(&task_id, e.to_string());
                Err(e)
            }
        }
    }

    /// Runs a generation inline and persists it for `caller`.
    pub async fn generate_now(
        &self,
        request: &TopicRequest,
        caller: &CallerIdentity,
    ) -> Result<OrchestrationResult, ContentflowError> {
        info!(
            topic = %request.topic,
            platform = %request.platform,
            user = %caller.email,
            "Synchronous generation"
        );
        let result = self.job.orchestrator.run(request).await;
        let id = self.job.store.save(&caller.email, request, &result).await?;
        info!(content_id = id, "Completed synchronous generation");
        Ok(result.with_id(id))
    }

    /// Lists the content persisted for `caller`, newest first.
    pub async fn list_content(
        &self,
        caller: &CallerIdentity,
    ) -> Result<Vec<GeneratedContent>, ContentflowError> {
        let records = self.job.store.list_for_user(&caller.email).await?;
        info!(user = %caller.email, count = records.len(), "Retrieved generated content");
        Ok(records)
    }

    /// Returns one persisted record owned by `caller`.
    pub async fn find_content(
        &self,
        id: i64,
        caller: &CallerIdentity,
    ) -> Result<GeneratedContent, ContentflowError> {
        Ok(self.job.store.find_by_id(id, &caller.email).await?)
    }

    /// Deletes one persisted record owned by `caller`.
    pub async fn delete_content(&self, id: i64, caller: &CallerIdentity) -> Result<(), ContentflowError> {
        Ok(self.job.store.delete(id, &caller.email).await?)
    }

    /// Returns a snapshot of a task.
    #[must_use]
    pub fn get_task(&self, task_id: &str) -> Option<Arc<GenerationTask>> {
        self.job.registry.get(task_id)
    }

    /// Returns a task's status.
    #[must_use]
    pub fn get_task_status(&self, task_id: &str) -> Option<TaskStatus> {
        self.get_task(task_id).map(|task| task.status)
    }

    /// Returns a task's result, only once it has COMPLETED.
    #[must_use]
    pub fn get_task_result(&self, task_id: &str) -> Option<OrchestrationResult> {
        self.get_task(task_id)
            .filter(|task| task.status == TaskStatus::Completed)
            .and_then(|task| task.result.clone())
    }

    /// Tasks that have not reached a terminal state.
    #[must_use]
    pub fn active_task_count(&self) -> usize {
        self.job.registry.active_count()
    }

    /// All tasks in the registry.
    #[must_use]
    pub fn total_task_count(&self) -> usize {
        self.job.registry.total_count()
    }

    /// Evicts tasks older than the configured maximum age, whatever their
    /// status.
    pub fn cleanup_old_tasks(&self) -> usize {
        self.job.registry.evict_older_than(self.max_task_age)
    }

    /// Stops the worker pool, waiting for queued work up to the configured
    /// grace period.
    pub async fn shutdown(&self) -> bool {
        self.pool.shutdown(self.shutdown_grace).await
    }
}

impl std::fmt::Debug for GenerationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationService")
            .field("pool", &self.pool)
            .field("max_task_age", &self.max_task_age)
            .field("tasks", &self.total_task_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PersistenceError;
    use crate::persistence::{InMemoryContentStore, MockContentStore};
    use crate::testing::fixed_orchestrator;
    use crate::core::{Platform, Tone};
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn request() -> TopicRequest {
        TopicRequest::new("AI", Platform::Twitter, Tone::Casual)
    }

    fn service(store: Arc<dyn ContentStore>) -> GenerationService {
        GenerationService::new(
            fixed_orchestrator(),
            store,
            DispatchConfig::default().with_sizes(1, 1, 4),
            &CleanupConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_generate_now_persists_and_attaches_id() {
        let store = Arc::new(InMemoryContentStore::new());
        store.register_user("a@example.com");
        let service = service(store.clone());

        let result = service
            .generate_now(&request(), &CallerIdentity::new("a@example.com"))
            .await
            .unwrap();

        assert_eq!(result.id, Some(1));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_generate_now_for_unknown_user_fails() {
        let service = service(Arc::new(InMemoryContentStore::new()));

        let err = service
            .generate_now(&request(), &CallerIdentity::new("ghost@example.com"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ContentflowError::Persistence(PersistenceError::UserNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_content_queries_are_scoped_to_caller() {
        let store = Arc::new(InMemoryContentStore::new());
        store.register_user("a@example.com");
        store.register_user("b@example.com");
        let service = service(store);
        let owner = CallerIdentity::new("a@example.com");
        let other = CallerIdentity::new("b@example.com");

        let id = service.generate_now(&request(), &owner).await.unwrap().id.unwrap();

        assert_eq!(service.list_content(&owner).await.unwrap().len(), 1);
        assert!(service.list_content(&other).await.unwrap().is_empty());
        assert_eq!(service.find_content(id, &owner).await.unwrap().topic, "AI");
        assert!(matches!(
            service.delete_content(id, &other).await,
            Err(ContentflowError::Persistence(PersistenceError::ContentNotFound { .. }))
        ));
        service.delete_content(id, &owner).await.unwrap();
        assert!(service.find_content(id, &owner).await.is_err());
    }

    #[tokio::test]
    async fn test_anonymous_generation_is_not_persisted() {
        let mut store = MockContentStore::new();
        store.expect_save().never();
        let service = service(Arc::new(store));

        let task_id = service.start_generation(request(), None).await.unwrap();
        assert!(service.shutdown().await);

        let result = service.get_task_result(&task_id).unwrap();
        assert_eq!(result.id, None);
        assert_eq!(result.topic, "AI");
    }

    #[tokio::test]
    async fn test_result_hidden_until_completed() {
        let service = service(Arc::new(InMemoryContentStore::new()));
        let task_id = service.registry().create(request());

        assert_eq!(service.get_task_status(&task_id), Some(TaskStatus::Pending));
        assert_eq!(service.get_task_result(&task_id), None);
        assert_eq!(service.get_task_status("missing"), None);
    }

    #[tokio::test]
    async fn test_start_after_shutdown_fails_task() {
        let service = service(Arc::new(InMemoryContentStore::new()));
        assert!(service.shutdown().await);

        let err = service.start_generation(request(), None).await.unwrap_err();

        assert_eq!(err, DispatchError::Shutdown);
        assert_eq!(service.total_task_count(), 1);
        assert_eq!(service.active_task_count(), 0);
    }

    #[tokio::test]
    async fn test_cleanup_uses_configured_age() {
        let service = service(Arc::new(InMemoryContentStore::new()));
        let old = GenerationTask::new("old", request())
            .with_created_at(Utc::now() - chrono::Duration::hours(2));
        service.registry().insert(old);
        service.registry().create(request());

        assert_eq!(service.cleanup_old_tasks(), 1);
        assert!(service.get_task("old").is_none());
        assert_eq!(service.total_task_count(), 1);
    }
}
