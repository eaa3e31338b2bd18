//! Event sink trait and implementations.

use serde::Serialize;
use tracing::{debug, info, warn, Level};

use crate::pipeline::StageName;

/// Lifecycle events emitted while a pipeline runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// A run started.
    PipelineStarted {
        /// The requested topic.
        topic: String,
    },
    /// A stage returned its primary value.
    StageCompleted {
        /// The stage.
        stage: StageName,
        /// Wall time in milliseconds.
        duration_ms: f64,
    },
    /// A stage substituted its fallback value.
    StageFellBack {
        /// The stage.
        stage: StageName,
        /// Wall time in milliseconds.
        duration_ms: f64,
        /// Why the primary path failed.
        reason: String,
    },
    /// A stage panicked; its slot keeps the empty value.
    StageFailed {
        /// The stage.
        stage: StageName,
        /// Wall time in milliseconds.
        duration_ms: f64,
        /// The panic message.
        error: String,
    },
    /// A run finished, with or without stage failures.
    PipelineCompleted {
        /// The requested topic.
        topic: String,
        /// Wall time in milliseconds.
        duration_ms: f64,
    },
    /// A run was aborted by a failure outside any stage.
    PipelineAborted {
        /// The requested topic.
        topic: String,
        /// The panic message.
        error: String,
    },
}

impl PipelineEvent {
    /// Returns the dotted event name, e.g. `stage.completed`.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::PipelineStarted { .. } => "pipeline.started",
            Self::StageCompleted { .. } => "stage.completed",
            Self::StageFellBack { .. } => "stage.fallback",
            Self::StageFailed { .. } => "stage.failed",
            Self::PipelineCompleted { .. } => "pipeline.completed",
            Self::PipelineAborted { .. } => "pipeline.aborted",
        }
    }
}

/// Receives pipeline events.
///
/// Implementations must not panic and must not block.
pub trait EventSink: Send + Sync {
    /// Emits an event.
    fn emit(&self, event: &PipelineEvent);
}

/// A no-op event sink that discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

impl EventSink for NoOpEventSink {
    fn emit(&self, _event: &PipelineEvent) {}
}

/// An event sink that logs events using the tracing framework.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingEventSink {
    /// Creates a new logging event sink with the specified level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging sink.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }
}

impl EventSink for LoggingEventSink {
    fn emit(&self, event: &PipelineEvent) {
        let event_type = event.event_type();
        match event {
            PipelineEvent::StageFellBack { .. }
            | PipelineEvent::StageFailed { .. }
            | PipelineEvent::PipelineAborted { .. } => {
                warn!(event_type, event_data = ?event, "Event: {}", event_type);
            }
            _ if self.level == Level::DEBUG => {
                debug!(event_type, event_data = ?event, "Event: {}", event_type);
            }
            _ => {
                info!(event_type, event_data = ?event, "Event: {}", event_type);
            }
        }
    }
}

/// A collecting event sink for testing purposes.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: parking_lot::RwLock<Vec<PipelineEvent>>,
}

impl CollectingEventSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.read().clone()
    }

    /// Returns the event names in emission order.
    #[must_use]
    pub fn event_types(&self) -> Vec<&'static str> {
        self.events.read().iter().map(PipelineEvent::event_type).collect()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}

impl EventSink for CollectingEventSink {
    fn emit(&self, event: &PipelineEvent) {
        self.events.write().push(event.clone());
    }
}
