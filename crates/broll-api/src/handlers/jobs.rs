//! Job submission and status handlers.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use broll_models::{JobId, JobRecord, JobStatus};
use broll_queue::ProcessVideoJob;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const DEFAULT_PROMPT: &str = "B-roll generation";

/// Body for `POST /api/reels`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReelRequest {
    #[validate(length(min = 1, message = "user_id must not be empty"))]
    pub user_id: String,
    #[validate(length(min = 1, message = "prompt must not be empty"))]
    pub prompt: String,
    pub video_url: String,
}

/// Body for `POST /api/process`, the variant entry point.
#[derive(Debug, Deserialize, Validate)]
pub struct ProcessVideoRequest {
    #[validate(length(min = 1, message = "user_id must not be empty"))]
    pub user_id: String,
    pub video_url: String,
    #[serde(default)]
    pub style: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EnqueueResponse {
    pub job_id: String,
    pub task_id: String,
}

#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub id: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub task_id: String,
    pub status: &'static str,
    pub done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// POST /api/reels
pub async fn create_reel(
    State(state): State<AppState>,
    Json(request): Json<CreateReelRequest>,
) -> ApiResult<Json<EnqueueResponse>> {
    request
        .validate()
        .map_err(|e| ApiError::validation(e.to_string()))?;
    ensure_http_url(&request.video_url)?;

    submit(&state, request.user_id, request.prompt, request.video_url, None).await
}

/// POST /api/process
pub async fn process_video(
    State(state): State<AppState>,
    Json(request): Json<ProcessVideoRequest>,
) -> ApiResult<Json<EnqueueResponse>> {
    request
        .validate()
        .map_err(|e| ApiError::validation(e.to_string()))?;
    ensure_http_url(&request.video_url)?;

    submit(
        &state,
        request.user_id,
        DEFAULT_PROMPT.to_string(),
        request.video_url,
        request.style,
    )
    .await
}

/// GET /api/jobs/:id
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<JobResponse>> {
    let record = state
        .store
        .get(&JobId::from_string(id))
        .await?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    Ok(Json(JobResponse {
        id: record.id.to_string(),
        status: record.status.to_string(),
        created_at: record.created_at.to_rfc3339(),
        updated_at: record.updated_at.to_rfc3339(),
        output_url: record.output_url,
        error: record.error,
    }))
}

/// GET /api/tasks/:task_id
pub async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> ApiResult<Json<TaskResponse>> {
    let record = state
        .store
        .get_by_task(&task_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))?;

    Ok(Json(task_view(task_id, &record)))
}

/// Create the pending record, enqueue it, and tie the two together.
async fn submit(
    state: &AppState,
    user_id: String,
    prompt: String,
    video_url: String,
    style: Option<String>,
) -> ApiResult<Json<EnqueueResponse>> {
    let record = JobRecord::new(&user_id, &prompt, &video_url);
    state.store.put(&record).await?;

    let job = ProcessVideoJob::new(record.id.clone(), &user_id, &video_url, &prompt)
        .with_style(style);
    let task_id = state.queue.enqueue(&job).await?;

    let record = record.with_task_id(&task_id);
    state.store.put(&record).await?;

    info!(
        "enqueued job {} as task {} for user {}",
        record.id, task_id, user_id
    );
    Ok(Json(EnqueueResponse {
        job_id: record.id.to_string(),
        task_id,
    }))
}

/// Map a job record onto the polling task view.
fn task_view(task_id: String, record: &JobRecord) -> TaskResponse {
    let (status, done) = match record.status {
        JobStatus::Pending => ("pending", false),
        JobStatus::Processing => ("started", false),
        JobStatus::Completed => ("success", true),
        JobStatus::Failed => ("failure", true),
    };
    TaskResponse {
        task_id,
        status,
        done,
        result: record.output_url.clone(),
        error: record.error.clone(),
    }
}

fn ensure_http_url(raw: &str) -> ApiResult<()> {
    let parsed = url::Url::parse(raw)
        .map_err(|_| ApiError::validation("video_url is not a valid URL"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ApiError::validation("video_url must be http or https"));
    }
    Ok(())
}
