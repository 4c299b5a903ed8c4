/// Task service
///
/// Tasks live inside a project's permission boundary. Writes require
/// `can_modify` on every project they touch: on update that is both the
/// task's current project and the destination project. Reads require the
/// caller to be the project's creator or a member.
///
/// The assignee of a task must hold a membership on the task's project.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use super::{ServiceError, ServiceResult};
use crate::auth::authorization::{require_modify, require_view};
use crate::models::project::Project;
use crate::models::task::{Task, TaskInput};
use crate::store::WorkStore;

#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn WorkStore>,
}

impl TaskService {
    pub fn new(store: Arc<dyn WorkStore>) -> Self {
        Self { store }
    }

    /// Creates a task in `input.project_id`
    ///
    /// # Errors
    ///
    /// - `NotFound` if the project does not exist
    /// - `Forbidden` unless `caller` is an admin or editor of it
    /// - `InvalidInput` if the title is blank or the assignee is not a member
    pub async fn create(&self, caller: Uuid, input: TaskInput) -> ServiceResult<Task> {
        let input = normalize(input);
        self.load_project(input.project_id).await?;
        require_modify(self.store.as_ref(), caller, input.project_id).await?;
        input.validate()?;
        self.require_assignable(input.project_id, input.user_id).await?;

        let task = self.store.create_task(Task::new(input)).await?;

        info!(task_id = %task.id, project_id = %task.project_id, user_id = %caller, "Task created");
        self.record(task.project_id, caller, format!("created task {}", task.title))
            .await;

        Ok(task)
    }

    /// Tasks of every project visible to `caller`
    pub async fn read_all(&self, caller: Uuid) -> ServiceResult<Vec<Task>> {
        Ok(self.store.list_tasks_visible_to(caller).await?)
    }

    /// A single task
    pub async fn read_by_id(&self, caller: Uuid, task_id: Uuid) -> ServiceResult<Task> {
        let task = self.load(task_id).await?;
        let project = self.load_project(task.project_id).await?;
        require_view(self.store.as_ref(), caller, project.id, project.creator_id).await?;
        Ok(task)
    }

    /// All tasks of one project
    pub async fn read_by_project(&self, caller: Uuid, project_id: Uuid) -> ServiceResult<Vec<Task>> {
        let project = self.load_project(project_id).await?;
        require_view(self.store.as_ref(), caller, project.id, project.creator_id).await?;
        Ok(self.store.list_tasks_for_project(project_id).await?)
    }

    /// Replaces a task's attributes, possibly moving it to another project
    ///
    /// Requires `can_modify` on the current and on the destination project.
    pub async fn update(
        &self,
        caller: Uuid,
        task_id: Uuid,
        input: TaskInput,
    ) -> ServiceResult<Task> {
        let input = normalize(input);
        let mut task = self.load(task_id).await?;
        require_modify(self.store.as_ref(), caller, task.project_id).await?;

        if input.project_id != task.project_id {
            self.load_project(input.project_id).await?;
            require_modify(self.store.as_ref(), caller, input.project_id).await?;
        }

        input.validate()?;
        self.require_assignable(input.project_id, input.user_id).await?;

        let source_project = task.project_id;
        task.apply(input);
        let saved = self
            .store
            .save_task(&task)
            .await?
            .ok_or_else(|| not_found_task(task_id))?;

        info!(task_id = %task_id, project_id = %saved.project_id, user_id = %caller, "Task updated");
        if source_project != saved.project_id {
            self.record(source_project, caller, format!("moved task {} out", saved.title))
                .await;
        }
        self.record(saved.project_id, caller, format!("updated task {}", saved.title))
            .await;

        Ok(saved)
    }

    /// Deletes a task, checked against its current project
    pub async fn delete(&self, caller: Uuid, task_id: Uuid) -> ServiceResult<()> {
        let task = self.load(task_id).await?;
        require_modify(self.store.as_ref(), caller, task.project_id).await?;

        if !self.store.delete_task(task_id).await? {
            return Err(not_found_task(task_id));
        }

        info!(task_id = %task_id, project_id = %task.project_id, user_id = %caller, "Task deleted");
        self.record(task.project_id, caller, format!("deleted task {}", task.title))
            .await;

        Ok(())
    }

    /// Reassigns a task to another member of its project
    pub async fn assign(&self, caller: Uuid, task_id: Uuid, user_id: Uuid) -> ServiceResult<Task> {
        let task = self.load(task_id).await?;
        require_modify(self.store.as_ref(), caller, task.project_id).await?;
        self.require_assignable(task.project_id, user_id).await?;

        let assigned = self
            .store
            .assign_task(task_id, user_id)
            .await?
            .ok_or_else(|| not_found_task(task_id))?;

        info!(task_id = %task_id, user_id = %user_id, "Task assigned");
        self.record(
            task.project_id,
            caller,
            format!("assigned task {} to {user_id}", task.title),
        )
        .await;

        Ok(assigned)
    }

    async fn load(&self, task_id: Uuid) -> ServiceResult<Task> {
        self.store
            .find_task(task_id)
            .await?
            .ok_or_else(|| not_found_task(task_id))
    }

    async fn load_project(&self, project_id: Uuid) -> ServiceResult<Project> {
        self.store
            .find_project(project_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("project {project_id}")))
    }

    async fn require_assignable(&self, project_id: Uuid, user_id: Uuid) -> ServiceResult<()> {
        if self
            .store
            .find_membership(project_id, user_id)
            .await?
            .is_none()
        {
            warn!(project_id = %project_id, user_id = %user_id, "Assignee is not a project member");
            return Err(ServiceError::InvalidInput(
                "assignee must be a member of the project".to_string(),
            ));
        }
        Ok(())
    }

    async fn record(&self, project_id: Uuid, user_id: Uuid, action: String) {
        if let Err(e) = self.store.log_activity(project_id, user_id, &action).await {
            warn!(project_id = %project_id, user_id = %user_id, error = %e, "Failed to record activity");
        }
    }
}

fn normalize(mut input: TaskInput) -> TaskInput {
    input.title = input.title.trim().to_string();
    input
}

fn not_found_task(task_id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("task {task_id}"))
}
