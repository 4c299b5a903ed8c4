/// PostgreSQL-backed store.
///
/// Single-statement operations delegate to the model query functions against
/// the pool. Composite operations open a transaction with `pool.begin()` and
/// run the same model functions against `&mut *tx`; returning early on error
/// drops the transaction, which rolls it back.
///
/// ## Error Mapping
///
/// | SQLx error | PostgreSQL code | StoreError |
/// |------------|-----------------|------------|
/// | Database (unique violation) | `23505` | `Conflict("record already exists")` |
/// | Database (foreign key violation) | `23503` | `NotFound("referenced record")` |
/// | Anything else | | `Backend` |

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::{StoreError, WorkStore};
use crate::models::activity::Activity;
use crate::models::membership::{Membership, ProjectMember, ProjectRole};
use crate::models::project::Project;
use crate::models::task::Task;
use crate::models::user::User;

/// Store backed by a PostgreSQL connection pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorkStore for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        crate::db::pool::health_check(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("ping", e))
    }

    async fn create_user(&self, user: User) -> Result<User, StoreError> {
        User::insert(&self.pool, &user)
            .await
            .map_err(|e| map_sqlx_error("create_user", e))
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        User::find_by_id(&self.pool, id)
            .await
            .map_err(|e| map_sqlx_error("find_user_by_id", e))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        User::find_by_email(&self.pool, email)
            .await
            .map_err(|e| map_sqlx_error("find_user_by_email", e))
    }

    #[instrument(skip(self, project), fields(project_id = %project.id, creator_id = %project.creator_id), err)]
    async fn create_project_with_owner(&self, project: Project) -> Result<Project, StoreError> {
        let op = "create_project_with_owner";
        let mut tx = self.pool.begin().await.map_err(|e| map_sqlx_error(op, e))?;

        let created = Project::insert(&mut *tx, &project)
            .await
            .map_err(|e| map_sqlx_error(op, e))?;

        let owner = Membership::new(created.id, created.creator_id, ProjectRole::Admin);
        Membership::insert(&mut *tx, &owner)
            .await
            .map_err(|e| map_sqlx_error(op, e))?;

        tx.commit().await.map_err(|e| map_sqlx_error(op, e))?;

        debug!("project and owner membership committed");
        Ok(created)
    }

    async fn find_project(&self, id: Uuid) -> Result<Option<Project>, StoreError> {
        Project::find_by_id(&self.pool, id)
            .await
            .map_err(|e| map_sqlx_error("find_project", e))
    }

    async fn list_projects_for_user(&self, user_id: Uuid) -> Result<Vec<Project>, StoreError> {
        Project::list_for_user(&self.pool, user_id)
            .await
            .map_err(|e| map_sqlx_error("list_projects_for_user", e))
    }

    async fn save_project(&self, project: &Project) -> Result<Option<Project>, StoreError> {
        Project::save(&self.pool, project)
            .await
            .map_err(|e| map_sqlx_error("save_project", e))
    }

    #[instrument(skip(self), err)]
    async fn set_project_favorite(
        &self,
        project_id: Uuid,
        is_favorite: bool,
    ) -> Result<Option<Project>, StoreError> {
        Project::set_favorite(&self.pool, project_id, is_favorite)
            .await
            .map_err(|e| map_sqlx_error("set_project_favorite", e))
    }

    #[instrument(skip(self), err)]
    async fn delete_project_cascade(&self, project_id: Uuid) -> Result<(), StoreError> {
        let op = "delete_project_cascade";
        let mut tx = self.pool.begin().await.map_err(|e| map_sqlx_error(op, e))?;

        let members = Membership::delete_for_project(&mut *tx, project_id)
            .await
            .map_err(|e| map_sqlx_error(op, e))?;
        let tasks = Task::delete_for_project(&mut *tx, project_id)
            .await
            .map_err(|e| map_sqlx_error(op, e))?;
        let activities = Activity::delete_for_project(&mut *tx, project_id)
            .await
            .map_err(|e| map_sqlx_error(op, e))?;

        let deleted = Project::delete(&mut *tx, project_id)
            .await
            .map_err(|e| map_sqlx_error(op, e))?;
        if !deleted {
            // tx dropped here, child deletes roll back
            return Err(StoreError::NotFound(format!("project {project_id}")));
        }

        tx.commit().await.map_err(|e| map_sqlx_error(op, e))?;

        debug!(members, tasks, activities, "project cascade committed");
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn transfer_ownership(
        &self,
        project_id: Uuid,
        new_owner_id: Uuid,
    ) -> Result<Project, StoreError> {
        let op = "transfer_ownership";
        let mut tx = self.pool.begin().await.map_err(|e| map_sqlx_error(op, e))?;

        let membership = Membership::find(&mut *tx, project_id, new_owner_id)
            .await
            .map_err(|e| map_sqlx_error(op, e))?
            .ok_or_else(|| {
                StoreError::NotFound(format!("membership of {new_owner_id} on {project_id}"))
            })?;

        let project = Project::set_creator(&mut *tx, project_id, new_owner_id)
            .await
            .map_err(|e| map_sqlx_error(op, e))?
            .ok_or_else(|| StoreError::NotFound(format!("project {project_id}")))?;

        if !membership.role.is_admin() {
            Membership::update_role(&mut *tx, project_id, new_owner_id, ProjectRole::Admin)
                .await
                .map_err(|e| map_sqlx_error(op, e))?;
        }

        tx.commit().await.map_err(|e| map_sqlx_error(op, e))?;

        Ok(project)
    }

    async fn find_membership(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Membership>, StoreError> {
        Membership::find(&self.pool, project_id, user_id)
            .await
            .map_err(|e| map_sqlx_error("find_membership", e))
    }

    async fn add_membership(&self, membership: Membership) -> Result<Membership, StoreError> {
        Membership::insert(&self.pool, &membership)
            .await
            .map_err(|e| map_sqlx_error("add_membership", e))
    }

    async fn update_membership_role(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        role: ProjectRole,
    ) -> Result<Option<Membership>, StoreError> {
        Membership::update_role(&self.pool, project_id, user_id, role)
            .await
            .map_err(|e| map_sqlx_error("update_membership_role", e))
    }

    async fn remove_membership(&self, project_id: Uuid, user_id: Uuid) -> Result<bool, StoreError> {
        Membership::delete(&self.pool, project_id, user_id)
            .await
            .map_err(|e| map_sqlx_error("remove_membership", e))
    }

    async fn list_members(&self, project_id: Uuid) -> Result<Vec<ProjectMember>, StoreError> {
        Membership::list_members(&self.pool, project_id)
            .await
            .map_err(|e| map_sqlx_error("list_members", e))
    }

    async fn create_task(&self, task: Task) -> Result<Task, StoreError> {
        Task::insert(&self.pool, &task)
            .await
            .map_err(|e| map_sqlx_error("create_task", e))
    }

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        Task::find_by_id(&self.pool, id)
            .await
            .map_err(|e| map_sqlx_error("find_task", e))
    }

    async fn list_tasks_for_project(&self, project_id: Uuid) -> Result<Vec<Task>, StoreError> {
        Task::list_by_project(&self.pool, project_id)
            .await
            .map_err(|e| map_sqlx_error("list_tasks_for_project", e))
    }

    async fn list_tasks_visible_to(&self, user_id: Uuid) -> Result<Vec<Task>, StoreError> {
        Task::list_visible_to(&self.pool, user_id)
            .await
            .map_err(|e| map_sqlx_error("list_tasks_visible_to", e))
    }

    async fn save_task(&self, task: &Task) -> Result<Option<Task>, StoreError> {
        Task::save(&self.pool, task)
            .await
            .map_err(|e| map_sqlx_error("save_task", e))
    }

    async fn assign_task(&self, task_id: Uuid, user_id: Uuid) -> Result<Option<Task>, StoreError> {
        Task::set_assignee(&self.pool, task_id, user_id)
            .await
            .map_err(|e| map_sqlx_error("assign_task", e))
    }

    async fn delete_task(&self, task_id: Uuid) -> Result<bool, StoreError> {
        Task::delete(&self.pool, task_id)
            .await
            .map_err(|e| map_sqlx_error("delete_task", e))
    }

    async fn log_activity(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        action: &str,
    ) -> Result<(), StoreError> {
        Activity::log(&self.pool, project_id, user_id, action)
            .await
            .map_err(|e| map_sqlx_error("log_activity", e))
    }

    async fn recent_activities(
        &self,
        project_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Activity>, StoreError> {
        Activity::recent_for_project(&self.pool, project_id, limit)
            .await
            .map_err(|e| map_sqlx_error("recent_activities", e))
    }
}

/// Map SQLx errors to store errors, keeping the operation name for the logs.
///
/// Constraint violations surface to callers, so they carry a fixed message.
/// The database text, which names tables and constraints, only goes to the log.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => match constraint_violation(db_err.code().as_deref()) {
            Some(mapped) => {
                warn!(operation, detail = %db_err.message(), "Constraint violation");
                mapped
            }
            None => StoreError::Backend(format!("{operation}: {}", db_err.message())),
        },
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("{operation}: connection pool closed"))
        }
        other => StoreError::Backend(format!("{operation}: {other}")),
    }
}

fn constraint_violation(code: Option<&str>) -> Option<StoreError> {
    match code {
        Some("23505") => Some(StoreError::Conflict("record already exists".to_string())),
        Some("23503") => Some(StoreError::NotFound("referenced record".to_string())),
        _ => None,
    }
}
