/// Task endpoints
///
/// # Endpoints
///
/// - `GET /api/tasks` - Active tasks and the ids the user has completed
/// - `GET /api/tasks/status` - Same, plus GitHub's view of each task
/// - `POST /api/tasks/seed` - Insert the default catalog if none exists
/// - `POST /api/tasks/:id/complete` - Complete one task

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Serialize;
use taskclaim_shared::{
    auth::session::SessionUser,
    models::{account::Account, completion::UserTaskCompletion, task::Task},
    workflow::{
        catalog::{seed_catalog, SeedReport},
        completion::{self, CompletionReport},
        verifier::{check_status, StatusMap},
    },
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TasksResponse {
    pub tasks: Vec<Task>,

    pub completed_tasks: Vec<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusResponse {
    pub tasks: Vec<Task>,

    pub completed_tasks: Vec<i32>,

    /// Task id → `{starred}` or `{followed}`; empty without a GitHub token
    pub github_status: StatusMap,
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> ApiResult<Json<TasksResponse>> {
    let tasks = Task::list_active(&state.db).await?;
    let completed_tasks = UserTaskCompletion::completed_task_ids(&state.db, user.id).await?;

    Ok(Json(TasksResponse {
        tasks,
        completed_tasks,
    }))
}

/// Lists tasks with a live GitHub check per task
///
/// GitHub failures never fail the request; the affected tasks report `false`.
pub async fn task_status(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> ApiResult<Json<TaskStatusResponse>> {
    let tasks = Task::list_active(&state.db).await?;
    let completed_tasks = UserTaskCompletion::completed_task_ids(&state.db, user.id).await?;
    let token = Account::github_token(&state.db, user.id).await?;

    let github_status = check_status(state.github.as_ref(), &tasks, token.as_deref()).await;

    Ok(Json(TaskStatusResponse {
        tasks,
        completed_tasks,
        github_status,
    }))
}

pub async fn seed_tasks(State(state): State<AppState>) -> ApiResult<Json<SeedReport>> {
    let report = seed_catalog(&state.db).await?;
    tracing::info!(count = report.count, message = %report.message, "Seed requested");
    Ok(Json(report))
}

/// Completes a task for the session user
///
/// # Errors
///
/// - `400 Bad Request`: `id` is not an integer, or no GitHub token is linked
/// - `404 Not Found`: task does not exist
pub async fn complete_task(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<CompletionReport>> {
    let task_id = parse_task_id(&id)?;

    let report = completion::complete_task(&state.db, state.github.as_ref(), user.id, task_id).await?;
    Ok(Json(report))
}

fn parse_task_id(raw: &str) -> ApiResult<i32> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| ApiError::BadRequest("Task ID is required".to_string()))
}
