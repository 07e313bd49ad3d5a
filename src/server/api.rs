use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde_json::Value;
use taskboard_common::validation::{
    validate_ask, validate_project, validate_status_update, validate_task,
};
use taskboard_common::{AnswerResponse, MessageResponse, SummaryResponse, ValidationError};

use super::ai::AiBridge;
use super::db::DbHandle;

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub db: DbHandle,
    pub ai: AiBridge,
}

pub type SharedState = Arc<AppState>;

const PROJECT_NOT_FOUND: &str = "Project not found";
const TASK_NOT_FOUND: &str = "Task not found";

// ── Error handling ────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };
        (status, Json(MessageResponse::new(message))).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Internal(format!("{:#}", e))
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::BadRequest(e.message)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

type JsonBody = Result<Json<Value>, JsonRejection>;

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/api/projects", get(list_projects).post(create_project))
        .route(
            "/api/projects/{id}",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route("/api/projects/{id}/summary", get(project_summary))
        .route("/api/tasks", post(create_task))
        .route("/api/tasks/ask", post(ask_ai))
        .route("/api/tasks/project/{project_id}", get(list_project_tasks))
        .route(
            "/api/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/api/tasks/{id}/status", put(update_task_status))
}

/// Fixed response for unmatched routes and methods.
pub async fn not_found() -> ApiError {
    ApiError::NotFound("Resource Not Found".to_string())
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn root() -> &'static str {
    "Taskboard API Running"
}

async fn health_check() -> &'static str {
    "ok"
}

async fn list_projects(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let projects = state.db.call(|db| db.list_projects()).await?;
    Ok(Json(projects))
}

async fn create_project(
    State(state): State<SharedState>,
    body: JsonBody,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body?;
    let input = validate_project(&body)?;
    let project = state.db.call(move |db| db.create_project(&input)).await?;
    tracing::info!(project_id = %project.id, name = %project.name, "project created");
    Ok((StatusCode::CREATED, Json(project)))
}

async fn get_project(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let project = state.db.call(move |db| db.get_project(&id)).await?;
    match project {
        Some(project) => Ok(Json(project)),
        None => Err(ApiError::NotFound(PROJECT_NOT_FOUND.into())),
    }
}

async fn update_project(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    body: JsonBody,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body?;
    let input = validate_project(&body)?;
    let project = state
        .db
        .call(move |db| db.update_project(&id, &input))
        .await?;
    match project {
        Some(project) => Ok(Json(project)),
        None => Err(ApiError::NotFound(PROJECT_NOT_FOUND.into())),
    }
}

async fn delete_project(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let project_id = id.clone();
    let deleted = state.db.call(move |db| db.delete_project(&id)).await?;
    if !deleted {
        return Err(ApiError::NotFound(PROJECT_NOT_FOUND.into()));
    }
    tracing::info!(project_id = %project_id, "project and its tasks deleted");
    Ok(Json(MessageResponse::new(
        "Project and all associated tasks deleted successfully",
    )))
}

async fn project_summary(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let found = state
        .db
        .call(move |db| {
            let Some(project) = db.get_project(&id)? else {
                return Ok(None);
            };
            let tasks = db.list_tasks(&id)?;
            Ok(Some((project, tasks)))
        })
        .await?;
    let (project, tasks) = found.ok_or_else(|| ApiError::NotFound(PROJECT_NOT_FOUND.into()))?;
    let summary = state.ai.summarize_project(&project, &tasks).await;
    Ok(Json(SummaryResponse { summary }))
}

async fn list_project_tasks(
    State(state): State<SharedState>,
    Path(project_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let tasks = state.db.call(move |db| db.list_tasks(&project_id)).await?;
    Ok(Json(tasks))
}

async fn create_task(
    State(state): State<SharedState>,
    body: JsonBody,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body?;
    let input = validate_task(&body)?;
    let task = state
        .db
        .call(move |db| {
            if db.get_project(&input.project)?.is_none() {
                return Ok(Err(ApiError::NotFound(PROJECT_NOT_FOUND.into())));
            }
            Ok(Ok(db.create_task(&input)?))
        })
        .await??;
    tracing::info!(task_id = %task.id, project_id = %task.project, status = %task.status, "task created");
    Ok((StatusCode::CREATED, Json(task)))
}

async fn get_task(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let task = state.db.call(move |db| db.get_task(&id)).await?;
    match task {
        Some(task) => Ok(Json(task)),
        None => Err(ApiError::NotFound(TASK_NOT_FOUND.into())),
    }
}

async fn update_task(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    body: JsonBody,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body?;
    let input = validate_task(&body)?;
    let task = state
        .db
        .call(move |db| {
            if db.get_task(&id)?.is_none() {
                return Ok(Err(ApiError::NotFound(TASK_NOT_FOUND.into())));
            }
            if db.get_project(&input.project)?.is_none() {
                return Ok(Err(ApiError::NotFound(PROJECT_NOT_FOUND.into())));
            }
            Ok(db
                .update_task(&id, &input)?
                .ok_or_else(|| ApiError::NotFound(TASK_NOT_FOUND.into())))
        })
        .await??;
    Ok(Json(task))
}

async fn update_task_status(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    body: JsonBody,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body?;
    let status = validate_status_update(&body)?;
    let task = state
        .db
        .call(move |db| db.update_task_status(&id, status))
        .await?
        .ok_or_else(|| ApiError::NotFound(TASK_NOT_FOUND.into()))?;
    tracing::info!(task_id = %task.id, status = %task.status, "task status changed");
    Ok(Json(task))
}

async fn delete_task(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let task_id = id.clone();
    let deleted = state.db.call(move |db| db.soft_delete_task(&id)).await?;
    if !deleted {
        return Err(ApiError::NotFound(TASK_NOT_FOUND.into()));
    }
    tracing::info!(task_id = %task_id, "task soft-deleted");
    Ok(Json(MessageResponse::new("Task deleted successfully")))
}

async fn ask_ai(
    State(state): State<SharedState>,
    body: JsonBody,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body?;
    let req = validate_ask(&body)?;
    let task_id = req.task_id.clone();
    let task = state
        .db
        .call(move |db| db.get_task(&task_id))
        .await?
        .ok_or_else(|| ApiError::NotFound(TASK_NOT_FOUND.into()))?;
    let answer = state
        .ai
        .answer_task_question(&req.question, &task, &req.context_type)
        .await;
    Ok(Json(AnswerResponse { answer }))
}
