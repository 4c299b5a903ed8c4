/// Project endpoints
///
/// Every handler runs behind the JWT layer and acts as the authenticated
/// caller. Permission checks live in the project service.
///
/// - `GET    /v1/projects` - Projects the caller created or belongs to
/// - `POST   /v1/projects` - Create (caller becomes admin)
/// - `GET    /v1/projects/:project_id` - Project with creator, tasks and members
/// - `PUT    /v1/projects/:project_id` - Update attributes
/// - `DELETE /v1/projects/:project_id` - Delete with tasks, members and activity
/// - `PUT    /v1/projects/:project_id/favorite` - Set the favorite flag
/// - `PUT    /v1/projects/:project_id/owner` - Transfer ownership (admin only)
/// - `POST   /v1/projects/:project_id/members` - Add member
/// - `PUT    /v1/projects/:project_id/members/:user_id` - Change member role
/// - `DELETE /v1/projects/:project_id/members/:user_id` - Remove member
/// - `GET    /v1/projects/:project_id/activities` - Ten most recent activities

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
use validator::Validate;
use workboard_shared::auth::middleware::AuthContext;
use workboard_shared::models::activity::Activity;
use workboard_shared::models::membership::Membership;
use workboard_shared::models::project::{Project, ProjectDetails, ProjectInput};

/// Favorite flag request
#[derive(Debug, Deserialize)]
pub struct FavoriteRequest {
    pub is_favorite: bool,
}

/// Ownership transfer request
#[derive(Debug, Deserialize)]
pub struct ChangeOwnerRequest {
    /// New owner; must already be a member
    pub user_id: Uuid,
}

/// Add member request
#[derive(Debug, Deserialize, Validate)]
pub struct AddMemberRequest {
    pub user_id: Uuid,

    /// `admin`, `editor` or `viewer`
    #[validate(length(min = 1, message = "Role is required"))]
    pub role: String,
}

/// Role change request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRoleRequest {
    #[validate(length(min = 1, message = "Role is required"))]
    pub role: String,
}

pub async fn list_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Project>>> {
    let projects = state.projects.read_all(auth.user_id).await?;
    Ok(Json(projects))
}

/// Creates a project owned by the caller
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Field lengths out of range
/// - `400 Bad Request`: Blank name
pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<ProjectInput>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    validate_request(&req)?;

    let project = state.projects.create(auth.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn get_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<String>,
) -> ApiResult<Json<ProjectDetails>> {
    let project_id = parse_id(&project_id, "project_id")?;

    let details = state.projects.read(auth.user_id, project_id).await?;
    Ok(Json(details))
}

pub async fn update_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<String>,
    ApiJson(req): ApiJson<ProjectInput>,
) -> ApiResult<Json<Project>> {
    let project_id = parse_id(&project_id, "project_id")?;
    validate_request(&req)?;

    let project = state.projects.update(auth.user_id, project_id, req).await?;
    Ok(Json(project))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<String>,
) -> ApiResult<StatusCode> {
    let project_id = parse_id(&project_id, "project_id")?;

    state.projects.delete(auth.user_id, project_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_favorite(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<String>,
    ApiJson(req): ApiJson<FavoriteRequest>,
) -> ApiResult<Json<Project>> {
    let project_id = parse_id(&project_id, "project_id")?;

    let project = state
        .projects
        .toggle_favorite(auth.user_id, project_id, req.is_favorite)
        .await?;
    Ok(Json(project))
}

/// Transfers ownership to an existing member, who becomes admin
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not an admin
/// - `400 Bad Request`: Target is not a member
pub async fn change_owner(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<String>,
    ApiJson(req): ApiJson<ChangeOwnerRequest>,
) -> ApiResult<Json<Project>> {
    let project_id = parse_id(&project_id, "project_id")?;

    let project = state
        .projects
        .change_owner(auth.user_id, project_id, req.user_id)
        .await?;
    Ok(Json(project))
}

/// Adds a registered user with a role
///
/// # Errors
///
/// - `400 Bad Request`: Unknown role
/// - `404 Not Found`: Unknown project or user
/// - `409 Conflict`: Already a member
pub async fn add_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<String>,
    ApiJson(req): ApiJson<AddMemberRequest>,
) -> ApiResult<(StatusCode, Json<Membership>)> {
    let project_id = parse_id(&project_id, "project_id")?;
    validate_request(&req)?;

    let membership = state
        .projects
        .add_member(auth.user_id, project_id, req.user_id, &req.role)
        .await?;
    Ok((StatusCode::CREATED, Json(membership)))
}

pub async fn update_member_role(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_id, user_id)): Path<(String, String)>,
    ApiJson(req): ApiJson<UpdateRoleRequest>,
) -> ApiResult<Json<Membership>> {
    let project_id = parse_id(&project_id, "project_id")?;
    let user_id = parse_id(&user_id, "user_id")?;
    validate_request(&req)?;

    let membership = state
        .projects
        .update_member_role(auth.user_id, project_id, user_id, &req.role)
        .await?;
    Ok(Json(membership))
}

pub async fn remove_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_id, user_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let project_id = parse_id(&project_id, "project_id")?;
    let user_id = parse_id(&user_id, "user_id")?;

    state
        .projects
        .remove_member(auth.user_id, project_id, user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_activities(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<String>,
) -> ApiResult<Json<Vec<Activity>>> {
    let project_id = parse_id(&project_id, "project_id")?;

    let activities = state.projects.activities(auth.user_id, project_id).await?;
    Ok(Json(activities))
}
