//! Route handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;
use tracing::{debug, info};

use super::error::ApiError;
use super::AppState;
use crate::core::{GenerationTask, OrchestrationResult, TaskStatus, TopicRequest, TopicRequestPayload};
use crate::dispatch::CallerIdentity;
use crate::persistence::GeneratedContent;
use crate::utils::epoch_millis;

/// Header carrying the authenticated caller's email.
pub const CALLER_HEADER: &str = "x-user-email";

/// Reply to an accepted asynchronous generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AsyncGenerationResponse {
    /// The new task.
    pub task_id: String,
    /// Always `PENDING` at acceptance.
    pub status: TaskStatus,
    /// Where to poll the task.
    pub status_url: String,
    /// Where to fetch the result once completed.
    pub result_url: String,
}

impl AsyncGenerationResponse {
    /// Builds the reply for a freshly accepted task.
    #[must_use]
    pub fn for_task(task_id: impl Into<String>) -> Self {
        let task_id = task_id.into();
        Self {
            status: TaskStatus::Pending,
            status_url: format!("/api/v1/generate/status/{task_id}"),
            result_url: format!("/api/v1/generate/result/{task_id}"),
            task_id,
        }
    }
}

/// Liveness and load.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Always `healthy`.
    pub status: &'static str,
    /// Epoch milliseconds.
    pub timestamp: i64,
    /// Tasks pending or in progress.
    pub active_tasks: usize,
    /// Tasks in the registry.
    pub total_tasks: usize,
}

fn caller_from(headers: &HeaderMap) -> Option<CallerIdentity> {
    headers
        .get(CALLER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .map(CallerIdentity::new)
}

fn parse_body(body: Result<Json<TopicRequestPayload>, JsonRejection>) -> Result<TopicRequest, ApiError> {
    let Json(payload) = body.map_err(|rejection| ApiError::MalformedBody(rejection.body_text()))?;
    Ok(payload.validate()?)
}

/// `POST /generate`: runs the pipeline inline and persists the result.
pub async fn generate(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<TopicRequestPayload>, JsonRejection>,
) -> Result<Json<OrchestrationResult>, ApiError> {
    let caller = caller_from(&headers).ok_or(ApiError::Unauthenticated)?;
    let request = parse_body(body)?;

    let result = state.service.generate_now(&request, &caller).await?;
    Ok(Json(result))
}

/// `POST /generate/async`: registers a task and returns immediately.
pub async fn generate_async(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<TopicRequestPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<AsyncGenerationResponse>), ApiError> {
    let request = parse_body(body)?;
    let topic = request.topic.clone();

    let task_id = state
        .service
        .start_generation(request, caller_from(&headers))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    info!(task_id = %task_id, topic = %topic, "Accepted async generation");
    Ok((StatusCode::ACCEPTED, Json(AsyncGenerationResponse::for_task(task_id))))
}

/// `GET /generate/status/:task_id`.
pub async fn task_status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<GenerationTask>, ApiError> {
    let task = state
        .service
        .get_task(&task_id)
        .ok_or_else(|| ApiError::TaskNotFound(task_id.clone()))?;

    debug!(task_id = %task_id, status = %task.status, "Retrieved task status");
    Ok(Json(GenerationTask::clone(&task)))
}

/// `GET /generate/result/:task_id`.
pub async fn task_result(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<OrchestrationResult>, ApiError> {
    let task = state
        .service
        .get_task(&task_id)
        .ok_or_else(|| ApiError::TaskNotFound(task_id.clone()))?;

    if task.status != TaskStatus::Completed {
        return Err(ApiError::TaskNotCompleted {
            task_id,
            status: task.status,
        });
    }

    task.result
        .clone()
        .map(Json)
        .ok_or(ApiError::MissingResult(task_id))
}

/// `GET /content`: the caller's persisted content, newest first.
pub async fn list_content(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<GeneratedContent>>, ApiError> {
    let caller = caller_from(&headers).ok_or(ApiError::Unauthenticated)?;
    Ok(Json(state.service.list_content(&caller).await?))
}

/// `GET /content/:id`.
pub async fn get_content(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<GeneratedContent>, ApiError> {
    let caller = caller_from(&headers).ok_or(ApiError::Unauthenticated)?;
    Ok(Json(state.service.find_content(id, &caller).await?))
}

/// `DELETE /content/:id`.
pub async fn delete_content(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let caller = caller_from(&headers).ok_or(ApiError::Unauthenticated)?;
    state.service.delete_content(id, &caller).await?;
    info!(content_id = id, user = %caller.email, "Deleted content");
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /health`.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: epoch_millis(),
        active_tasks: state.service.active_task_count(),
        total_tasks: state.service.total_task_count(),
    })
}
