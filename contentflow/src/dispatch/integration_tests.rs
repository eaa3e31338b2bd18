//! End-to-end tests of asynchronous generation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use tokio::sync::Semaphore;

use super::{CallerIdentity, GenerationService};
use crate::config::{CleanupConfig, DispatchConfig};
use crate::core::{OrchestrationResult, Platform, ResearchPoints, TaskStatus, Tone, TopicRequest};
use crate::errors::PersistenceError;
use crate::persistence::{ContentStore, GeneratedContent, InMemoryContentStore};
use crate::pipeline::{Orchestrator, StageOutcome};
use crate::stages::ResearchStage;
use crate::testing::{fixed_orchestrator, happy_orchestrator, FixedStage, PanickingStage};

fn service_with(orchestrator: Orchestrator, store: Arc<dyn ContentStore>) -> GenerationService {
    GenerationService::new(
        orchestrator,
        store,
        DispatchConfig::default().with_sizes(2, 4, 10),
        &CleanupConfig::default(),
    )
}

async fn wait_for_terminal(service: &GenerationService, task_id: &str) -> TaskStatus {
    for _ in 0..200 {
        if let Some(status) = service.get_task_status(task_id) {
            if status.is_terminal() {
                return status;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("task {task_id} did not finish");
}

/// A store that always fails.
struct BrokenStore;

#[async_trait]
impl ContentStore for BrokenStore {
    async fn save(
        &self,
        _user_email: &str,
        _request: &TopicRequest,
        _result: &OrchestrationResult,
    ) -> Result<i64, PersistenceError> {
        Err(PersistenceError::Storage("disk full".to_string()))
    }

    async fn find_by_id(&self, id: i64, _user_email: &str) -> Result<GeneratedContent, PersistenceError> {
        Err(PersistenceError::ContentNotFound { id })
    }

    async fn list_for_user(&self, _user_email: &str) -> Result<Vec<GeneratedContent>, PersistenceError> {
        Ok(Vec::new())
    }

    async fn delete(&self, id: i64, _user_email: &str) -> Result<(), PersistenceError> {
        Err(PersistenceError::ContentNotFound { id })
    }
}

/// A store that panics, simulating a failure outside the pipeline.
struct PanickingStore;

#[async_trait]
impl ContentStore for PanickingStore {
    async fn save(
        &self,
        _user_email: &str,
        _request: &TopicRequest,
        _result: &OrchestrationResult,
    ) -> Result<i64, PersistenceError> {
        panic!("connection pool poisoned")
    }

    async fn find_by_id(&self, _id: i64, _user_email: &str) -> Result<GeneratedContent, PersistenceError> {
        panic!("connection pool poisoned")
    }

    async fn list_for_user(&self, _user_email: &str) -> Result<Vec<GeneratedContent>, PersistenceError> {
        panic!("connection pool poisoned")
    }

    async fn delete(&self, _id: i64, _user_email: &str) -> Result<(), PersistenceError> {
        panic!("connection pool poisoned")
    }
}

/// A research stage that waits for a permit before answering.
struct GatedResearch {
    gate: Arc<Semaphore>,
}

#[async_trait]
impl ResearchStage for GatedResearch {
    async fn research(&self, _topic: &str) -> StageOutcome<ResearchPoints> {
        let _permit = self.gate.acquire().await;
        StageOutcome::Success(ResearchPoints::default())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_start_returns_pending_task_immediately() {
    let service = service_with(happy_orchestrator().unwrap(), Arc::new(InMemoryContentStore::new()));

    let task_id = service
        .start_generation(TopicRequest::new("AI", Platform::Twitter, Tone::Casual), None)
        .await
        .unwrap();

    let task = service.get_task(&task_id).unwrap();
    assert_eq!(task.id, task_id);
    assert_eq!(task.request.topic, "AI");
    assert_eq!(wait_for_terminal(&service, &task_id).await, TaskStatus::Completed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_completed_task_exposes_full_result() {
    let service = service_with(happy_orchestrator().unwrap(), Arc::new(InMemoryContentStore::new()));

    let task_id = service
        .start_generation(TopicRequest::new("AI", Platform::Twitter, Tone::Casual), None)
        .await
        .unwrap();
    wait_for_terminal(&service, &task_id).await;

    let task = service.get_task(&task_id).unwrap();
    assert!(task.completed_at.is_some());
    assert!(task.error.is_none());
    let result = service.get_task_result(&task_id).unwrap();
    assert!((5..=7).contains(&result.research.points.len()));
    assert!(!result.content.headline.is_empty());
    assert!(!result.image.open_ai_image_urls.is_empty());
    assert_eq!(service.active_task_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_tasks_keep_their_own_results() {
    let service = service_with(fixed_orchestrator(), Arc::new(InMemoryContentStore::new()));

    let rust = service
        .start_generation(TopicRequest::new("Rust", Platform::Blog, Tone::Authoritative), None)
        .await
        .unwrap();
    let go = service
        .start_generation(TopicRequest::new("Go", Platform::Linkedin, Tone::Professional), None)
        .await
        .unwrap();
    assert_ne!(rust, go);

    wait_for_terminal(&service, &rust).await;
    wait_for_terminal(&service, &go).await;

    assert_eq!(service.get_task_result(&rust).unwrap().topic, "Rust");
    assert_eq!(service.get_task_result(&go).unwrap().topic, "Go");
    assert_eq!(service.get_task(&go).unwrap().request.platform, Platform::Linkedin);
    assert_eq!(service.total_task_count(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_caller_identity_reaches_persistence() {
    let store = Arc::new(InMemoryContentStore::new());
    store.register_user("writer@example.com");
    let service = service_with(fixed_orchestrator(), store.clone());

    let task_id = service
        .start_generation(
            TopicRequest::new("AI", Platform::Twitter, Tone::Casual),
            Some(CallerIdentity::new("writer@example.com")),
        )
        .await
        .unwrap();
    wait_for_terminal(&service, &task_id).await;

    let result = service.get_task_result(&task_id).unwrap();
    let id = result.id.unwrap();
    assert_eq!(store.find_by_id(id, "writer@example.com").await.unwrap().topic, "AI");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_persistence_failure_still_completes_without_id() {
    let service = service_with(fixed_orchestrator(), Arc::new(BrokenStore));

    let task_id = service
        .start_generation(
            TopicRequest::new("AI", Platform::Twitter, Tone::Casual),
            Some(CallerIdentity::new("writer@example.com")),
        )
        .await
        .unwrap();

    assert_eq!(wait_for_terminal(&service, &task_id).await, TaskStatus::Completed);
    assert_eq!(service.get_task_result(&task_id).unwrap().id, None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unknown_user_is_a_persistence_failure_not_a_task_failure() {
    let service = service_with(fixed_orchestrator(), Arc::new(InMemoryContentStore::new()));

    let task_id = service
        .start_generation(
            TopicRequest::new("AI", Platform::Twitter, Tone::Casual),
            Some(CallerIdentity::new("stranger@example.com")),
        )
        .await
        .unwrap();

    assert_eq!(wait_for_terminal(&service, &task_id).await, TaskStatus::Completed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_worker_level_panic_marks_task_failed() {
    let service = service_with(fixed_orchestrator(), Arc::new(PanickingStore));

    let task_id = service
        .start_generation(
            TopicRequest::new("AI", Platform::Twitter, Tone::Casual),
            Some(CallerIdentity::new("writer@example.com")),
        )
        .await
        .unwrap();

    assert_eq!(wait_for_terminal(&service, &task_id).await, TaskStatus::Failed);
    let task = service.get_task(&task_id).unwrap();
    assert_eq!(task.error.as_deref(), Some("connection pool poisoned"));
    assert!(service.get_task_result(&task_id).is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_panicking_stages_still_complete_task() {
    let fixed = Arc::new(FixedStage::default());
    let orchestrator = Orchestrator::new(
        Arc::new(PanickingStage::new("research exploded")),
        fixed.clone(),
        fixed,
    );
    let service = service_with(orchestrator, Arc::new(InMemoryContentStore::new()));

    let task_id = service
        .start_generation(TopicRequest::new("AI", Platform::Twitter, Tone::Casual), None)
        .await
        .unwrap();

    assert_eq!(wait_for_terminal(&service, &task_id).await, TaskStatus::Completed);
    assert!(service.get_task_result(&task_id).unwrap().research.is_empty());
}

#[tokio::test]
async fn test_saturated_pool_runs_on_caller() {
    let service = GenerationService::new(
        fixed_orchestrator(),
        Arc::new(InMemoryContentStore::new()),
        DispatchConfig::default().with_sizes(1, 1, 1),
        &CleanupConfig::default(),
    );
    let request = || TopicRequest::new("AI", Platform::Twitter, Tone::Casual);

    let first = service.start_generation(request(), None).await.unwrap();
    let second = service.start_generation(request(), None).await.unwrap();

    // The core worker has not been polled yet, so `first` fills the queue
    // and `second` is finished by the time the call returns.
    assert_eq!(service.get_task_status(&second), Some(TaskStatus::Completed));

    assert!(service.shutdown().await);
    assert_eq!(service.get_task_status(&first), Some(TaskStatus::Completed));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_dropped_saturated_start_still_finishes_task() {
    let gate = Arc::new(Semaphore::new(0));
    let fixed = Arc::new(FixedStage::default());
    let orchestrator = Orchestrator::new(
        Arc::new(GatedResearch {
            gate: Arc::clone(&gate),
        }),
        fixed.clone(),
        fixed,
    );
    let service = GenerationService::new(
        orchestrator,
        Arc::new(InMemoryContentStore::new()),
        DispatchConfig::default().with_sizes(1, 1, 1),
        &CleanupConfig::default(),
    );
    let request = || TopicRequest::new("AI", Platform::Twitter, Tone::Casual);

    let running = service.start_generation(request(), None).await.unwrap();
    for _ in 0..200 {
        if service.get_task_status(&running) == Some(TaskStatus::InProgress) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(service.get_task_status(&running), Some(TaskStatus::InProgress));
    service.start_generation(request(), None).await.unwrap();

    let abandoned = tokio::time::timeout(
        Duration::from_millis(50),
        service.start_generation(request(), None),
    )
    .await;
    assert!(abandoned.is_err());
    assert_eq!(service.total_task_count(), 3);

    gate.add_permits(3);
    assert!(service.shutdown().await);
    assert_eq!(service.active_task_count(), 0);
}
