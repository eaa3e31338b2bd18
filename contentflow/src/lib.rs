//! # Contentflow
//!
//! An asynchronous content generation service.
//!
//! A request names a topic, a platform and a tone. Contentflow runs three
//! language-model stages in sequence over it:
//!
//! - **Research**: five to seven concise facts, optionally grounded in web search
//! - **Content**: a platform-shaped draft with headline, body and call to action
//! - **Image**: an illustration prompt and the generated images
//!
//! Every stage degrades to a fallback value instead of failing the run.
//! Runs are dispatched onto a bounded worker pool, tracked in a
//! copy-on-write task registry and polled over HTTP.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use contentflow::prelude::*;
//!
//! let orchestrator = Orchestrator::new(research, content, image);
//! let service = GenerationService::new(orchestrator, store, dispatch, &cleanup);
//!
//! let request = TopicRequest::new("AI", Platform::Twitter, Tone::Casual);
//! let task_id = service.start_generation(request, None).await?;
//! let status = service.get_task_status(&task_id);
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod api;
pub mod config;
pub mod core;
pub mod dispatch;
pub mod errors;
pub mod events;
pub mod observability;
pub mod persistence;
pub mod pipeline;
pub mod providers;
pub mod stages;
pub mod tasks;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{AppConfig, CleanupConfig, DispatchConfig};
    pub use crate::core::{
        ContentDraft, GenerationTask, ImageResult, OrchestrationResult, Platform,
        ResearchPoints, TaskStatus, Tone, TopicRequest,
    };
    pub use crate::dispatch::{CallerIdentity, CleanupScheduler, GenerationService};
    pub use crate::errors::{ContentflowError, PersistenceError, ProviderError};
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::persistence::{ContentStore, InMemoryContentStore};
    pub use crate::pipeline::Orchestrator;
    pub use crate::providers::{ChatModel, ImageModel, WebSearch};
    pub use crate::stages::{ContentStage, ImageStage, ResearchStage};
    pub use crate::tasks::TaskRegistry;
}
