/// Project membership model and database operations
///
/// A membership grants one user one role on one project. The pair is the
/// primary key, so a user holds at most one role per project.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE project_role AS ENUM ('admin', 'editor', 'viewer');
///
/// CREATE TABLE project_members (
///     project_id UUID NOT NULL REFERENCES projects(id),
///     user_id UUID NOT NULL REFERENCES users(id),
///     role project_role NOT NULL DEFAULT 'viewer',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (project_id, user_id)
/// );
/// ```
///
/// # Roles
///
/// - **admin**: everything editors can do, plus ownership transfer
/// - **editor**: modify the project, its tasks and its members
/// - **viewer**: read-only access

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Role a user holds on a project
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "project_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProjectRole {
    /// Full control including ownership transfer
    Admin,

    /// Can modify the project, its tasks and memberships
    Editor,

    /// Read-only access
    #[default]
    Viewer,
}

/// Returned when a role string is outside `admin`, `editor`, `viewer`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid role: {0}")]
pub struct InvalidRole(pub String);

impl ProjectRole {
    /// Converts role to its stored string form
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectRole::Admin => "admin",
            ProjectRole::Editor => "editor",
            ProjectRole::Viewer => "viewer",
        }
    }

    /// Admins and editors may mutate a project and its children
    pub fn can_modify(&self) -> bool {
        matches!(self, ProjectRole::Admin | ProjectRole::Editor)
    }

    /// Only admins may transfer ownership
    pub fn is_admin(&self) -> bool {
        matches!(self, ProjectRole::Admin)
    }

    /// Checks if this role is at least as strong as `required`
    ///
    /// Hierarchy: Admin > Editor > Viewer
    pub fn has_permission(&self, required: &ProjectRole) -> bool {
        self.permission_level() >= required.permission_level()
    }

    fn permission_level(&self) -> u8 {
        match self {
            ProjectRole::Admin => 3,
            ProjectRole::Editor => 2,
            ProjectRole::Viewer => 1,
        }
    }
}

impl FromStr for ProjectRole {
    type Err = InvalidRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(ProjectRole::Admin),
            "editor" => Ok(ProjectRole::Editor),
            "viewer" => Ok(ProjectRole::Viewer),
            other => Err(InvalidRole(other.to_string())),
        }
    }
}

impl fmt::Display for ProjectRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A (user, project, role) association
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Membership {
    /// Project ID
    pub project_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Role within the project
    pub role: ProjectRole,

    /// When the user joined the project
    pub created_at: DateTime<Utc>,
}

/// A membership with its user resolved, as shown in project details
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectMember {
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: ProjectRole,
    pub joined_at: DateTime<Utc>,
}

impl Membership {
    /// Builds a membership stamped with the current time
    pub fn new(project_id: Uuid, user_id: Uuid, role: ProjectRole) -> Self {
        Self {
            project_id,
            user_id,
            role,
            created_at: Utc::now(),
        }
    }

    /// Inserts a membership row
    ///
    /// # Errors
    ///
    /// Returns a database error with code `23505` if the pair already exists,
    /// or `23503` if the user or project does not exist.
    pub async fn insert<'e, E>(executor: E, membership: &Membership) -> Result<Self, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO project_members (project_id, user_id, role, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING project_id, user_id, role, created_at
            "#,
        )
        .bind(membership.project_id)
        .bind(membership.user_id)
        .bind(membership.role)
        .bind(membership.created_at)
        .fetch_one(executor)
        .await
    }

    /// Finds the membership for a (project, user) pair
    pub async fn find<'e, E>(
        executor: E,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query_as::<_, Membership>(
            r#"
            SELECT project_id, user_id, role, created_at
            FROM project_members
            WHERE project_id = $1 AND user_id = $2
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await
    }

    /// Updates a member's role
    ///
    /// Returns the updated membership, or None if the pair does not exist.
    pub async fn update_role<'e, E>(
        executor: E,
        project_id: Uuid,
        user_id: Uuid,
        role: ProjectRole,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query_as::<_, Membership>(
            r#"
            UPDATE project_members
            SET role = $3
            WHERE project_id = $1 AND user_id = $2
            RETURNING project_id, user_id, role, created_at
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .bind(role)
        .fetch_optional(executor)
        .await
    }

    /// Deletes a membership
    ///
    /// Returns true if a row was removed.
    pub async fn delete<'e, E>(
        executor: E,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let result = sqlx::query(
            r#"
            DELETE FROM project_members
            WHERE project_id = $1 AND user_id = $2
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes every membership of a project
    pub async fn delete_for_project<'e, E>(executor: E, project_id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM project_members WHERE project_id = $1")
            .bind(project_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    /// Lists a project's members with their users resolved, oldest first
    pub async fn list_members<'e, E>(
        executor: E,
        project_id: Uuid,
    ) -> Result<Vec<ProjectMember>, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query_as::<_, ProjectMember>(
            r#"
            SELECT m.project_id, m.user_id, u.name, u.email, m.role, m.created_at AS joined_at
            FROM project_members m
            JOIN users u ON u.id = m.user_id
            WHERE m.project_id = $1
            ORDER BY m.created_at ASC, m.user_id ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(executor)
        .await
    }
}
