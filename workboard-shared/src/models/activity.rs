/// Activity log model and database operations
///
/// Activities are append-only: rows are inserted and read, and only removed
/// when their project is deleted.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE activities (
///     id BIGSERIAL PRIMARY KEY,
///     project_id UUID NOT NULL REFERENCES projects(id),
///     user_id UUID NOT NULL REFERENCES users(id),
///     action TEXT NOT NULL,
///     occurred_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of entries returned by the activity feed
pub const RECENT_ACTIVITY_LIMIT: i64 = 10;

/// An action a user took on a project, with the acting user's name resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Activity {
    /// Monotonic ID; breaks ties between entries with equal timestamps
    pub id: i64,

    pub project_id: Uuid,

    pub user_id: Uuid,

    pub user_name: String,

    /// Human-readable description, e.g. "updated project"
    pub action: String,

    pub occurred_at: DateTime<Utc>,
}

impl Activity {
    /// Appends an entry to a project's log
    pub async fn log<'e, E>(
        executor: E,
        project_id: Uuid,
        user_id: Uuid,
        action: &str,
    ) -> Result<(), sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query(
            r#"
            INSERT INTO activities (project_id, user_id, action)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .bind(action)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Most recent entries of a project, newest first
    pub async fn recent_for_project<'e, E>(
        executor: E,
        project_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query_as::<_, Activity>(
            r#"
            SELECT a.id, a.project_id, a.user_id, u.name AS user_name, a.action, a.occurred_at
            FROM activities a
            JOIN users u ON u.id = a.user_id
            WHERE a.project_id = $1
            ORDER BY a.occurred_at DESC, a.id DESC
            LIMIT $2
            "#,
        )
        .bind(project_id)
        .bind(limit)
        .fetch_all(executor)
        .await
    }

    /// Deletes a project's whole log
    pub async fn delete_for_project<'e, E>(executor: E, project_id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM activities WHERE project_id = $1")
            .bind(project_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }
}
