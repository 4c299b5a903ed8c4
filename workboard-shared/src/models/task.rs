/// Task model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY,
///     project_id UUID NOT NULL REFERENCES projects(id),
///     user_id UUID NOT NULL REFERENCES users(id),
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     status VARCHAR(50) NOT NULL DEFAULT 'To Do',
///     due_date TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Status given to tasks created without one
pub const DEFAULT_STATUS: &str = "To Do";

/// A unit of work inside a project, assigned to one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,

    /// Owning project
    pub project_id: Uuid,

    /// Assignee
    pub user_id: Uuid,

    pub title: String,

    pub description: String,

    /// Free-form status such as "To Do", "In Progress" or "Completed"
    pub status: String,

    pub due_date: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Task attributes for create and update
///
/// On update `project_id` is the destination project, which may differ from
/// the task's current one.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    pub project_id: Uuid,

    /// Assignee, must be a member of `project_id`
    pub user_id: Uuid,

    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    #[validate(length(max = 50, message = "Status must be at most 50 characters"))]
    pub status: Option<String>,

    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

impl Task {
    /// Builds a new task with a fresh ID
    pub fn new(input: TaskInput) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            project_id: input.project_id,
            user_id: input.user_id,
            title: input.title,
            description: input.description,
            status: input
                .status
                .unwrap_or_else(|| DEFAULT_STATUS.to_string()),
            due_date: input.due_date,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrites every editable attribute. A missing status keeps the current one.
    pub fn apply(&mut self, input: TaskInput) {
        self.project_id = input.project_id;
        self.user_id = input.user_id;
        self.title = input.title;
        self.description = input.description;
        if let Some(status) = input.status {
            self.status = status;
        }
        self.due_date = input.due_date;
        self.updated_at = Utc::now();
    }

    /// Inserts a task row
    pub async fn insert<'e, E>(executor: E, task: &Task) -> Result<Self, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks
                (id, project_id, user_id, title, description, status, due_date, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, project_id, user_id, title, description, status, due_date, created_at, updated_at
            "#,
        )
        .bind(task.id)
        .bind(task.project_id)
        .bind(task.user_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(&task.status)
        .bind(task.due_date)
        .bind(task.created_at)
        .bind(task.updated_at)
        .fetch_one(executor)
        .await
    }

    /// Finds a task by ID
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, project_id, user_id, title, description, status, due_date, created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Lists a project's tasks, oldest first
    pub async fn list_by_project<'e, E>(
        executor: E,
        project_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, project_id, user_id, title, description, status, due_date, created_at, updated_at
            FROM tasks
            WHERE project_id = $1
            ORDER BY created_at ASC, id
            "#,
        )
        .bind(project_id)
        .fetch_all(executor)
        .await
    }

    /// Lists tasks of every project the user created or is a member of
    pub async fn list_visible_to<'e, E>(executor: E, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT t.id, t.project_id, t.user_id, t.title, t.description, t.status,
                   t.due_date, t.created_at, t.updated_at
            FROM tasks t
            JOIN projects p ON p.id = t.project_id
            WHERE p.creator_id = $1
               OR EXISTS (
                   SELECT 1 FROM project_members m
                   WHERE m.project_id = t.project_id AND m.user_id = $1
               )
            ORDER BY t.created_at ASC, t.id
            "#,
        )
        .bind(user_id)
        .fetch_all(executor)
        .await
    }

    /// Saves every mutable column of `task`
    ///
    /// Returns None if the row no longer exists.
    pub async fn save<'e, E>(executor: E, task: &Task) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET project_id = $2, user_id = $3, title = $4, description = $5,
                status = $6, due_date = $7, updated_at = $8
            WHERE id = $1
            RETURNING id, project_id, user_id, title, description, status, due_date, created_at, updated_at
            "#,
        )
        .bind(task.id)
        .bind(task.project_id)
        .bind(task.user_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(&task.status)
        .bind(task.due_date)
        .bind(task.updated_at)
        .fetch_optional(executor)
        .await
    }

    /// Reassigns a task
    pub async fn set_assignee<'e, E>(
        executor: E,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET user_id = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, project_id, user_id, title, description, status, due_date, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(executor)
        .await
    }

    /// Deletes a task. Returns true if a row was removed.
    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes every task of a project
    pub async fn delete_for_project<'e, E>(executor: E, project_id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM tasks WHERE project_id = $1")
            .bind(project_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> TaskInput {
        TaskInput {
            project_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Spec draft".to_string(),
            description: String::new(),
            status: None,
            due_date: None,
        }
    }

    #[test]
    fn test_new_task_defaults_status() {
        let task = Task::new(input());
        assert_eq!(task.status, DEFAULT_STATUS);
        assert!(task.due_date.is_none());
    }

    #[test]
    fn test_apply_keeps_status_when_absent() {
        let mut task = Task::new(TaskInput {
            status: Some("In Progress".to_string()),
            ..input()
        });
        let destination = Uuid::new_v4();

        task.apply(TaskInput {
            project_id: destination,
            title: "Renamed".to_string(),
            ..input()
        });

        assert_eq!(task.status, "In Progress");
        assert_eq!(task.project_id, destination);
        assert_eq!(task.title, "Renamed");
    }

    #[test]
    fn test_input_validation() {
        assert!(input().validate().is_ok());

        let mut blank = input();
        blank.title = String::new();
        assert!(blank.validate().is_err());

        let mut long_status = input();
        long_status.status = Some("x".repeat(51));
        assert!(long_status.validate().is_err());
    }
}
