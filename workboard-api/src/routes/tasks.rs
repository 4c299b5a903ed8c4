/// Task endpoints
///
/// - `GET    /v1/tasks` - Tasks in every project the caller can view
/// - `POST   /v1/tasks` - Create (editor or admin of the project)
/// - `GET    /v1/tasks/:task_id`
/// - `PUT    /v1/tasks/:task_id` - Update, possibly moving to another project
/// - `DELETE /v1/tasks/:task_id`
/// - `POST   /v1/tasks/:task_id/assign` - Reassign to a project member
/// - `GET    /v1/projects/:project_id/tasks` - Tasks of one project

use super::parse_id;
use crate::{
    app::AppState,
    error::{validate_request, ApiJson, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;
use workboard_shared::auth::middleware::AuthContext;
use workboard_shared::models::task::{Task, TaskInput};

/// Assignment request
#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub user_id: Uuid,
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = state.tasks.read_all(auth.user_id).await?;
    Ok(Json(tasks))
}

pub async fn list_project_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<String>,
) -> ApiResult<Json<Vec<Task>>> {
    let project_id = parse_id(&project_id, "project_id")?;

    let tasks = state.tasks.read_by_project(auth.user_id, project_id).await?;
    Ok(Json(tasks))
}

/// Creates a task
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Field lengths out of range
/// - `400 Bad Request`: Blank title or assignee outside the project
/// - `403 Forbidden`: Caller is a viewer or not a member
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<TaskInput>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    validate_request(&req)?;

    let task = state.tasks.create(auth.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<String>,
) -> ApiResult<Json<Task>> {
    let task_id = parse_id(&task_id, "task_id")?;

    let task = state.tasks.read_by_id(auth.user_id, task_id).await?;
    Ok(Json(task))
}

/// Updates a task
///
/// The caller needs modify rights on the task's current project and, when
/// `project_id` changes, on the destination as well.
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<String>,
    ApiJson(req): ApiJson<TaskInput>,
) -> ApiResult<Json<Task>> {
    let task_id = parse_id(&task_id, "task_id")?;
    validate_request(&req)?;

    let task = state.tasks.update(auth.user_id, task_id, req).await?;
    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<String>,
) -> ApiResult<StatusCode> {
    let task_id = parse_id(&task_id, "task_id")?;

    state.tasks.delete(auth.user_id, task_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn assign_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<String>,
    ApiJson(req): ApiJson<AssignRequest>,
) -> ApiResult<Json<Task>> {
    let task_id = parse_id(&task_id, "task_id")?;

    let task = state
        .tasks
        .assign(auth.user_id, task_id, req.user_id)
        .await?;
    Ok(Json(task))
}
