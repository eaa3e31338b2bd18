//! Pipeline lifecycle events.
//!
//! The orchestrator reports every stage outcome to an [`EventSink`]. The
//! default sink logs through `tracing`; tests collect events in memory.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink, PipelineEvent};
