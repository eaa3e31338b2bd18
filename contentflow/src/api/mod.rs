//! HTTP surface.
//!
//! Every route lives under `/api/v1`:
//!
//! | Method | Path                          | Handler                      |
//! |--------|-------------------------------|------------------------------|
//! | POST   | `/generate`                   | [`handlers::generate`]       |
//! | POST   | `/generate/async`             | [`handlers::generate_async`] |
//! | GET    | `/generate/status/:task_id`   | [`handlers::task_status`]    |
//! | GET    | `/generate/result/:task_id`   | [`handlers::task_result`]    |
//! | GET    | `/content`                    | [`handlers::list_content`]   |
//! | GET    | `/content/:id`                | [`handlers::get_content`]    |
//! | DELETE | `/content/:id`                | [`handlers::delete_content`] |
//! | GET    | `/health`                     | [`handlers::health`]         |
//!
//! Downloaded images are served from `/generated-image/` when a storage
//! directory is configured.
//!
//! Authentication happens upstream. The caller arrives in the
//! `X-User-Email` header. The synchronous endpoint and the content routes
//! require it.

mod error;
pub mod handlers;


use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::dispatch::GenerationService;

pub use error::{ApiError, ErrorResponse};
pub use handlers::{AsyncGenerationResponse, HealthResponse, CALLER_HEADER};

/// Shared handler state.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Task dispatch and lookup.
    pub service: Arc<GenerationService>,
    /// Directory of downloaded images, if they are served.
    pub image_dir: Option<PathBuf>,
}

impl AppState {
    /// Wraps a service.
    #[must_use]
    pub fn new(service: Arc<GenerationService>) -> Self {
        Self {
            service,
            image_dir: None,
        }
    }

    /// Serves downloaded images from `dir`.
    #[must_use]
    pub fn with_image_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.image_dir = Some(dir.into());
        self
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/generate", post(handlers::generate))
        .route("/generate/async", post(handlers::generate_async))
        .route("/generate/status/:task_id", get(handlers::task_status))
        .route("/generate/result/:task_id", get(handlers::task_result))
        .route("/content", get(handlers::list_content))
        .route(
            "/content/:id",
            get(handlers::get_content).delete(handlers::delete_content),
        )
        .route("/health", get(handlers::health));

    let mut app = Router::new().nest("/api/v1", api);
    if let Some(dir) = &state.image_dir {
        app = app.nest_service("/generated-image", ServeDir::new(dir));
    }

    app.layer(TraceLayer::new_for_http())
        .with_state(state)
}
