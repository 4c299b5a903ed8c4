/// Project model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY,
///     name VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     category VARCHAR(100) NOT NULL DEFAULT '',
///     status VARCHAR(50) NOT NULL DEFAULT '',
///     is_favorite BOOLEAN NOT NULL DEFAULT FALSE,
///     creator_id UUID NOT NULL REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Project rows are never inserted or deleted on their own: creation and
/// deletion go through the store's atomic composite operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::membership::ProjectMember;
use super::task::Task;
use super::user::User;

/// A project workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    /// Unique project ID (UUID v4)
    pub id: Uuid,

    pub name: String,

    pub description: String,

    pub category: String,

    /// Free-form status label
    pub status: String,

    pub is_favorite: bool,

    /// Current owner. Changed only by ownership transfer.
    pub creator_id: Uuid,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Editable project attributes, used for both create and update
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ProjectInput {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    #[validate(length(max = 100, message = "Category must be at most 100 characters"))]
    pub category: String,

    #[serde(default)]
    #[validate(length(max = 50, message = "Status must be at most 50 characters"))]
    pub status: String,
}

/// A project with its creator, tasks and members resolved
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDetails {
    #[serde(flatten)]
    pub project: Project,

    pub creator: User,

    pub tasks: Vec<Task>,

    pub members: Vec<ProjectMember>,
}

impl Project {
    /// Builds a new, non-favorite project owned by `creator_id`
    pub fn new(input: ProjectInput, creator_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: input.name,
            description: input.description,
            category: input.category,
            status: input.status,
            is_favorite: false,
            creator_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrites the editable attributes, leaving ownership and favorite untouched
    pub fn apply(&mut self, input: ProjectInput) {
        self.name = input.name;
        self.description = input.description;
        self.category = input.category;
        self.status = input.status;
        self.updated_at = Utc::now();
    }

    /// Inserts a project row
    pub async fn insert<'e, E>(executor: E, project: &Project) -> Result<Self, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects
                (id, name, description, category, status, is_favorite, creator_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, name, description, category, status, is_favorite, creator_id, created_at, updated_at
            "#,
        )
        .bind(project.id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(&project.category)
        .bind(&project.status)
        .bind(project.is_favorite)
        .bind(project.creator_id)
        .bind(project.created_at)
        .bind(project.updated_at)
        .fetch_one(executor)
        .await
    }

    /// Finds a project by ID
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, category, status, is_favorite, creator_id, created_at, updated_at
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Lists projects the user created or holds any membership on
    pub async fn list_for_user<'e, E>(executor: E, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT p.id, p.name, p.description, p.category, p.status, p.is_favorite,
                   p.creator_id, p.created_at, p.updated_at
            FROM projects p
            WHERE p.creator_id = $1
               OR EXISTS (
                   SELECT 1 FROM project_members m
                   WHERE m.project_id = p.id AND m.user_id = $1
               )
            ORDER BY p.created_at DESC, p.id
            "#,
        )
        .bind(user_id)
        .fetch_all(executor)
        .await
    }

    /// Saves the descriptive attributes of `project`
    ///
    /// Only name, description, category, status and `updated_at` are written.
    /// Ownership and the favorite flag have their own statements.
    /// Returns None if the row no longer exists.
    pub async fn save<'e, E>(executor: E, project: &Project) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET name = $2, description = $3, category = $4, status = $5, updated_at = $6
            WHERE id = $1
            RETURNING id, name, description, category, status, is_favorite, creator_id, created_at, updated_at
            "#,
        )
        .bind(project.id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(&project.category)
        .bind(&project.status)
        .bind(project.updated_at)
        .fetch_optional(executor)
        .await
    }

    /// Sets the favorite flag
    ///
    /// Returns None if the project does not exist.
    pub async fn set_favorite<'e, E>(
        executor: E,
        id: Uuid,
        is_favorite: bool,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET is_favorite = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, description, category, status, is_favorite, creator_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(is_favorite)
        .fetch_optional(executor)
        .await
    }

    /// Sets the owner of a project
    ///
    /// Returns None if the project does not exist.
    pub async fn set_creator<'e, E>(
        executor: E,
        id: Uuid,
        creator_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET creator_id = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, description, category, status, is_favorite, creator_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(creator_id)
        .fetch_optional(executor)
        .await
    }

    /// Deletes the project row only. Children must already be gone.
    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
