//! Sequential research → content → image orchestration.

use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::{PipelineState, StageName, StageOutcome};
use crate::core::{OrchestrationResult, TopicRequest};
use crate::events::{EventSink, LoggingEventSink, PipelineEvent};
use crate::observability::SpanTimer;
use crate::stages::{ContentStage, ImageStage, ResearchStage};
use crate::utils::panic_message;

/// Runs the three stages in order and assembles the result.
///
/// Each stage runs inside its own unwind boundary: a panicking stage leaves
/// its slot empty and the next stage still runs on whatever the state holds.
/// A panic outside the stages yields [`OrchestrationResult::empty`].
/// `run` never fails.
pub struct Orchestrator {
    research: Arc<dyn ResearchStage>,
    content: Arc<dyn ContentStage>,
    image: Arc<dyn ImageStage>,
    event_sink: Arc<dyn EventSink>,
}

impl Orchestrator {
    /// Creates an orchestrator that logs its events.
    #[must_use]
    pub fn new(
        research: Arc<dyn ResearchStage>,
        content: Arc<dyn ContentStage>,
        image: Arc<dyn ImageStage>,
    ) -> Self {
        Self {
            research,
            content,
            image,
            event_sink: Arc::new(LoggingEventSink::default()),
        }
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, event_sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = event_sink;
        self
    }

    /// Runs the pipeline for a request.
    pub async fn run(&self, request: &TopicRequest) -> OrchestrationResult {
        match AssertUnwindSafe(self.run_stages(request)).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(&*payload);
                error!(topic = %request.topic, error = %message, "Pipeline aborted");
                self.event_sink.emit(&PipelineEvent::PipelineAborted {
                    topic: request.topic.clone(),
                    error: message,
                });
                OrchestrationResult::empty(request.topic.clone())
            }
        }
    }

    async fn run_stages(&self, request: &TopicRequest) -> OrchestrationResult {
        let timer = SpanTimer::start("pipeline");
        let mut state = PipelineState::from_request(request);
        info!(
            topic = %state.topic,
            platform = %state.platform,
            tone = %state.tone,
            image_count = state.image_count,
            "Starting pipeline"
        );
        self.event_sink.emit(&PipelineEvent::PipelineStarted {
            topic: state.topic.clone(),
        });

        let research = self
            .run_stage(StageName::Research, self.research.research(&state.topic))
            .await;
        if let Some(research) = research {
            state.research = research;
        }

        let content = self
            .run_stage(
                StageName::Content,
                self.content
                    .create_content(&state.research, state.platform, state.tone),
            )
            .await;
        if let Some(content) = content {
            state.content = content;
        }

        let image = self
            .run_stage(
                StageName::Image,
                self.image
                    .generate_image(&state.content, state.image_count, &state.topic),
            )
            .await;
        if let Some(image) = image {
            state.image = image;
        }

        let duration_ms = timer.finish();
        info!(topic = %state.topic, duration_ms, "Pipeline completed");
        self.event_sink.emit(&PipelineEvent::PipelineCompleted {
            topic: state.topic.clone(),
            duration_ms,
        });
        state.into_result()
    }

    async fn run_stage<T, F>(&self, stage: StageName, stage_future: F) -> Option<T>
    where
        F: Future<Output = StageOutcome<T>>,
    {
        let timer = SpanTimer::start(stage.as_str());
        let outcome = AssertUnwindSafe(stage_future).catch_unwind().await;
        let duration_ms = timer.finish();

        match outcome {
            Ok(StageOutcome::Success(value)) => {
                info!(%stage, duration_ms, "Stage completed");
                self.event_sink
                    .emit(&PipelineEvent::StageCompleted { stage, duration_ms });
                Some(value)
            }
            Ok(StageOutcome::Fallback { value, reason }) => {
                warn!(%stage, duration_ms, %reason, "Stage used fallback");
                self.event_sink.emit(&PipelineEvent::StageFellBack {
                    stage,
                    duration_ms,
                    reason,
                });
                Some(value)
            }
            Err(payload) => {
                let message = panic_message(&*payload);
                error!(%stage, duration_ms, error = %message, "Stage failed");
                self.event_sink.emit(&PipelineEvent::StageFailed {
                    stage,
                    duration_ms,
                    error: message,
                });
                None
            }
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator").finish_non_exhaustive()
    }
}
