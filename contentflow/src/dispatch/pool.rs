//! Bounded worker pool with caller-runs saturation.

use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn, Instrument};

use crate::config::DispatchConfig;
use crate::errors::DispatchError;
use crate::utils::panic_message;

/// A unit of work for the pool.
pub type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

type SharedReceiver = Arc<tokio::sync::Mutex<mpsc::Receiver<Job>>>;

/// Where a submitted job ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// Queued for a core worker.
    Queued,
    /// The queue was full; a new overflow worker took the job.
    Overflow,
    /// The pool was saturated; the submitter waited for the job to finish.
    CallerRuns,
}

/// Runs jobs on a fixed set of core workers backed by a bounded queue.
///
/// When the queue is full an overflow worker is started, up to
/// `max_workers` in total. Overflow workers keep draining the queue and
/// exit after `keep_alive` without work. When the pool is saturated the
/// submitter waits for the job, which slows the producer down. The job runs
/// on its own task, so dropping the submitting future does not cancel it.
///
/// Core workers start on the first submission.
pub struct WorkerPool {
    config: DispatchConfig,
    sender: RwLock<Option<mpsc::Sender<Job>>>,
    receiver: SharedReceiver,
    live_workers: Arc<AtomicUsize>,
    started: AtomicBool,
    next_worker: AtomicUsize,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Creates a pool. No workers run until the first submission.
    #[must_use]
    pub fn new(config: DispatchConfig) -> Self {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        Self {
            config,
            sender: RwLock::new(Some(sender)),
            receiver: Arc::new(tokio::sync::Mutex::new(receiver)),
            live_workers: Arc::new(AtomicUsize::new(0)),
            started: AtomicBool::new(false),
            next_worker: AtomicUsize::new(1),
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Returns the number of running workers.
    #[must_use]
    pub fn live_workers(&self) -> usize {
        self.live_workers.load(Ordering::SeqCst)
    }

    /// Returns true once [`WorkerPool::shutdown`] has been called.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.sender.read().is_none()
    }

    /// Submits a job.
    ///
    /// Returns [`DispatchError::Shutdown`] after shutdown. Under saturation
    /// this waits for the job to finish before returning.
    pub async fn submit<F>(&self, job: F) -> Result<Submission, DispatchError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let sender = self.sender.read().clone().ok_or(DispatchError::Shutdown)?;
        self.ensure_started();

        match sender.try_send(Box::pin(job)) {
            Ok(()) => Ok(Submission::Queued),
            Err(TrySendError::Closed(_)) => Err(DispatchError::Shutdown),
            Err(TrySendError::Full(job)) => {
                if self.reserve_worker() {
                    self.spawn_overflow(job);
                    Ok(Submission::Overflow)
                } else {
                    warn!(
                        max_workers = self.config.max_workers,
                        queue_capacity = self.config.queue_capacity,
                        "Worker pool saturated, running job on caller"
                    );
                    drop(sender);
                    let (done_tx, done_rx) = oneshot::channel();
                    self.track(tokio::spawn(
                        async move {
                            run_job(job).await;
                            let _ = done_tx.send(());
                        }
                        .in_current_span(),
                    ));
                    let _ = done_rx.await;
                    Ok(Submission::CallerRuns)
                }
            }
        }
    }

    /// Stops accepting jobs and waits up to `grace` for queued work to finish.
    ///
    /// Returns false if workers were still busy when the grace period ended.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        let sender = self.sender.write().take();
        if sender.is_none() {
            return true;
        }
        drop(sender);

        info!(
            workers = self.live_workers(),
            grace_secs = grace.as_secs(),
            "Shutting down worker pool"
        );
        // Workers started by in-flight submissions may register after the
        // first batch is taken.
        let drain = async {
            loop {
                let handles: Vec<_> = std::mem::take(&mut *self.handles.lock());
                if handles.is_empty() {
                    break;
                }
                futures::future::join_all(handles).await;
            }
        };
        match tokio::time::timeout(grace, drain).await {
            Ok(_) => {
                info!("Worker pool drained");
                true
            }
            Err(_) => {
                warn!(
                    live_workers = self.live_workers(),
                    "Worker pool did not drain within grace period"
                );
                false
            }
        }
    }

    fn ensure_started(&self) {
        if self
            .started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        let mut handles = self.handles.lock();
        for _ in 0..self.config.core_workers {
            self.live_workers.fetch_add(1, Ordering::SeqCst);
            let name = self.worker_name();
            let receiver = Arc::clone(&self.receiver);
            let live_workers = Arc::clone(&self.live_workers);
            let span = tracing::debug_span!("worker", name = %name);
            handles.push(tokio::spawn(
                async move {
                    core_worker(receiver).await;
                    live_workers.fetch_sub(1, Ordering::SeqCst);
                }
                .instrument(span),
            ));
        }
        debug!(core_workers = self.config.core_workers, "Worker pool started");
    }

    fn reserve_worker(&self) -> bool {
        let max = self.config.max_workers.max(self.config.core_workers);
        self.live_workers
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |live| {
                (live < max).then_some(live + 1)
            })
            .is_ok()
    }

    fn spawn_overflow(&self, first_job: Job) {
        let name = self.worker_name();
        let receiver = Arc::clone(&self.receiver);
        let live_workers = Arc::clone(&self.live_workers);
        let keep_alive = self.config.keep_alive();
        debug!(worker = %name, "Starting overflow worker");

        let span = tracing::debug_span!("worker", name = %name);
        let handle = tokio::spawn(
            async move {
                run_job(first_job).await;
                overflow_worker(receiver, keep_alive).await;
                live_workers.fetch_sub(1, Ordering::SeqCst);
            }
            .instrument(span),
        );

        self.track(handle);
    }

    fn track(&self, handle: JoinHandle<()>) {
        let mut handles = self.handles.lock();
        handles.retain(|handle| !handle.is_finished());
        handles.push(handle);
    }

    fn worker_name(&self) -> String {
        format!(
            "{}{}",
            self.config.worker_name_prefix,
            self.next_worker.fetch_add(1, Ordering::SeqCst)
        )
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("config", &self.config)
            .field("live_workers", &self.live_workers())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

async fn core_worker(receiver: SharedReceiver) {
    loop {
        let job = receiver.lock().await.recv().await;
        match job {
            Some(job) => run_job(job).await,
            None => break,
        }
    }
    debug!("Core worker exiting");
}

async fn overflow_worker(receiver: SharedReceiver, keep_alive: Duration) {
    loop {
        let next = tokio::time::timeout(keep_alive, async {
            receiver.lock().await.recv().await
        })
        .await;
        match next {
            Ok(Some(job)) => run_job(job).await,
            Ok(None) => break,
            Err(_) => {
                debug!("Overflow worker idle, exiting");
                break;
            }
        }
    }
}

async fn run_job(job: Job) {
    if let Err(payload) = AssertUnwindSafe(job).catch_unwind().await {
        warn!(error = %panic_message(&*payload), "Job panicked");
    }
}
