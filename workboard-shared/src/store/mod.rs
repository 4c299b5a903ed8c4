/// Persistence boundary for the services.
///
/// Services never touch a connection pool directly. They are handed an
/// `Arc<dyn WorkStore>` at construction, which is either:
///
/// - [`postgres::PgStore`]: PostgreSQL via sqlx, composite operations in one transaction
/// - [`memory::InMemoryStore`]: hash maps behind a lock, for tests and local runs
///
/// ## Atomic units
///
/// Three operations touch several tables and must be all-or-nothing:
/// [`WorkStore::create_project_with_owner`], [`WorkStore::delete_project_cascade`]
/// and [`WorkStore::transfer_ownership`]. Every other method is a single statement.
///
/// ## Missing rows
///
/// Lookups return `Option`, single-row mutations return `Option`/`bool` for
/// "no such row". `StoreError::NotFound` is reserved for composite operations
/// and for foreign keys that point nowhere.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::activity::Activity;
use crate::models::membership::{Membership, ProjectMember, ProjectRole};
use crate::models::project::Project;
use crate::models::task::Task;
use crate::models::user::User;

pub mod memory;
pub mod postgres;

/// Store operation error.
///
/// These are infrastructure errors. Permission and validation failures are
/// decided by the services before the store is reached.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A referenced row does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// A uniqueness constraint was violated
    #[error("conflict: {0}")]
    Conflict(String),

    /// Connection, query or lock failure
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Persistence primitives per entity plus the composite atomic units.
#[async_trait]
pub trait WorkStore: Send + Sync {
    /// Verifies the backend is reachable
    async fn ping(&self) -> Result<(), StoreError>;

    // ----- users -----

    /// Inserts a user. Fails with `Conflict` if the email is taken.
    async fn create_user(&self, user: User) -> Result<User, StoreError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    // ----- projects -----

    /// Inserts the project and an admin membership for its creator in one unit.
    ///
    /// If either write fails neither is visible afterwards.
    async fn create_project_with_owner(&self, project: Project) -> Result<Project, StoreError>;

    async fn find_project(&self, id: Uuid) -> Result<Option<Project>, StoreError>;

    /// Projects the user created or holds any membership on
    async fn list_projects_for_user(&self, user_id: Uuid) -> Result<Vec<Project>, StoreError>;

    /// Saves name, description, category, status and `updated_at`.
    /// `creator_id` and `is_favorite` are left as stored.
    /// Returns None if the project is gone.
    async fn save_project(&self, project: &Project) -> Result<Option<Project>, StoreError>;

    /// Sets the favorite flag. Returns None if the project is gone.
    async fn set_project_favorite(
        &self,
        project_id: Uuid,
        is_favorite: bool,
    ) -> Result<Option<Project>, StoreError>;

    /// Removes memberships, tasks, activities, then the project, in one unit.
    ///
    /// Fails with `NotFound` (and changes nothing) if the project does not exist.
    async fn delete_project_cascade(&self, project_id: Uuid) -> Result<(), StoreError>;

    /// Sets the project's creator and promotes the new owner to admin, in one unit.
    ///
    /// Fails with `NotFound` (and changes nothing) if the project or the new
    /// owner's membership does not exist.
    async fn transfer_ownership(
        &self,
        project_id: Uuid,
        new_owner_id: Uuid,
    ) -> Result<Project, StoreError>;

    // ----- memberships -----

    async fn find_membership(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Membership>, StoreError>;

    /// Inserts a membership. Fails with `Conflict` if the pair exists.
    async fn add_membership(&self, membership: Membership) -> Result<Membership, StoreError>;

    async fn update_membership_role(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        role: ProjectRole,
    ) -> Result<Option<Membership>, StoreError>;

    /// Returns true if a membership was removed
    async fn remove_membership(&self, project_id: Uuid, user_id: Uuid) -> Result<bool, StoreError>;

    async fn list_members(&self, project_id: Uuid) -> Result<Vec<ProjectMember>, StoreError>;

    // ----- tasks -----

    async fn create_task(&self, task: Task) -> Result<Task, StoreError>;

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, StoreError>;

    async fn list_tasks_for_project(&self, project_id: Uuid) -> Result<Vec<Task>, StoreError>;

    /// Tasks of every project the user created or is a member of
    async fn list_tasks_visible_to(&self, user_id: Uuid) -> Result<Vec<Task>, StoreError>;

    async fn save_task(&self, task: &Task) -> Result<Option<Task>, StoreError>;

    async fn assign_task(&self, task_id: Uuid, user_id: Uuid) -> Result<Option<Task>, StoreError>;

    /// Returns true if a task was removed
    async fn delete_task(&self, task_id: Uuid) -> Result<bool, StoreError>;

    // ----- activity log -----

    async fn log_activity(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        action: &str,
    ) -> Result<(), StoreError>;

    /// Newest first, at most `limit` entries
    async fn recent_activities(
        &self,
        project_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Activity>, StoreError>;
}
