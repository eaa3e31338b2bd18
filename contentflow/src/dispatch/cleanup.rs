//! Periodic eviction of old tasks.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::GenerationService;
use crate::utils::panic_message;

/// Runs [`GenerationService::cleanup_old_tasks`] on a fixed interval.
#[derive(Debug)]
pub struct CleanupScheduler {
    service: Arc<GenerationService>,
    interval: Duration,
}

impl CleanupScheduler {
    /// Creates a scheduler.
    #[must_use]
    pub fn new(service: Arc<GenerationService>, interval: Duration) -> Self {
        Self { service, interval }
    }

    /// Spawns the scheduling loop. The first pass runs immediately.
    #[must_use]
    pub fn start(self) -> CleanupHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        info!(interval_secs = self.interval.as_secs(), "Task cleanup scheduled");

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        run_cleanup_pass(&self.service);
                    }
                    _ = &mut shutdown_rx => {
                        debug!("Task cleanup stopped");
                        break;
                    }
                }
            }
        });

        CleanupHandle {
            shutdown: Some(shutdown_tx),
            handle,
        }
    }
}

/// Stops a running [`CleanupScheduler`].
#[derive(Debug)]
pub struct CleanupHandle {
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl CleanupHandle {
    /// Signals the loop to stop and waits for it.
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Err(e) = (&mut self.handle).await {
            error!(error = %e, "Task cleanup loop ended abnormally");
        }
    }
}

/// Runs one cleanup pass and returns the number of evicted tasks.
///
/// A panicking pass is logged and reported as zero evictions.
pub fn run_cleanup_pass(service: &GenerationService) -> usize {
    let pass = catch_unwind(AssertUnwindSafe(|| {
        let active_before = service.active_task_count();
        let total_before = service.total_task_count();
        let removed = service.cleanup_old_tasks();
        let active_after = service.active_task_count();
        let total_after = service.total_task_count();

        if removed > 0 {
            info!(
                removed,
                active_before, total_before, active_after, total_after, "Cleaned up old tasks"
            );
        } else {
            debug!(active = active_after, total = total_after, "No old tasks to clean up");
        }
        removed
    }));

    pass.unwrap_or_else(|payload| {
        error!(error = %panic_message(&*payload), "Task cleanup pass failed");
        0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CleanupConfig, DispatchConfig};
    use crate::core::{GenerationTask, Platform, Tone, TopicRequest};
    use crate::persistence::InMemoryContentStore;
    use crate::testing::fixed_orchestrator;
    use chrono::Utc;

    fn service() -> Arc<GenerationService> {
        Arc::new(GenerationService::new(
            fixed_orchestrator(),
            Arc::new(InMemoryContentStore::new()),
            DispatchConfig::default(),
            &CleanupConfig::default(),
        ))
    }

    fn aged_task(id: &str, hours: i64) -> GenerationTask {
        GenerationTask::new(id, TopicRequest::new("AI", Platform::Blog, Tone::Casual))
            .with_created_at(Utc::now() - chrono::Duration::hours(hours))
    }

    #[test]
    fn test_cleanup_pass_counts_evictions() {
        let service = service();
        service.registry().insert(aged_task("old", 3));
        service.registry().insert(aged_task("new", 0));

        assert_eq!(run_cleanup_pass(&service), 1);
        assert_eq!(run_cleanup_pass(&service), 0);
        assert!(service.get_task("new").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_runs_each_interval_until_stopped() {
        let service = service();
        let handle = CleanupScheduler::new(Arc::clone(&service), Duration::from_secs(300)).start();

        service.registry().insert(aged_task("first", 2));
        tokio::time::sleep(Duration::from_secs(301)).await;
        assert_eq!(service.total_task_count(), 0);

        service.registry().insert(aged_task("second", 2));
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(service.total_task_count(), 0);

        handle.stop().await;
        service.registry().insert(aged_task("third", 2));
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(service.total_task_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_first_pass_runs_at_start() {
        let service = service();
        service.registry().insert(aged_task("stale", 2));

        let handle = CleanupScheduler::new(Arc::clone(&service), Duration::from_secs(300)).start();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(service.total_task_count(), 0);
        handle.stop().await;
    }
}
