/// Project lifecycle service
///
/// Orchestrates project creation, update, favorite toggling, cascading
/// deletion, membership management and ownership transfer.
///
/// Every operation that names an existing project loads it first, so a
/// missing project is reported as `NotFound` before any permission check.
/// Mutations then require `can_modify` (admin or editor), except ownership
/// transfer which requires admin.
///
/// Successful mutations append to the project's activity log. Logging is
/// best-effort: a failed append is logged and the mutation still succeeds.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use workboard_shared::models::project::ProjectInput;
/// use workboard_shared::services::projects::ProjectService;
/// use workboard_shared::store::memory::InMemoryStore;
/// use uuid::Uuid;
///
/// # async fn example(creator: Uuid, teammate: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let projects = ProjectService::new(Arc::new(InMemoryStore::new()));
///
/// let project = projects
///     .create(creator, ProjectInput { name: "Roadmap".to_string(), ..Default::default() })
///     .await?;
/// projects.add_member(creator, project.id, teammate, "editor").await?;
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use super::{ServiceError, ServiceResult};
use crate::auth::authorization::{require_admin, require_modify, require_view};
use crate::models::activity::{Activity, RECENT_ACTIVITY_LIMIT};
use crate::models::membership::{Membership, ProjectRole};
use crate::models::project::{Project, ProjectDetails, ProjectInput};
use crate::store::{StoreError, WorkStore};

#[derive(Clone)]
pub struct ProjectService {
    store: Arc<dyn WorkStore>,
}

impl ProjectService {
    pub fn new(store: Arc<dyn WorkStore>) -> Self {
        Self { store }
    }

    /// Creates a project and makes `caller` its admin, atomically
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if the name is blank or a field is too long
    /// - `NotFound` if `caller` is not a registered user
    pub async fn create(&self, caller: Uuid, input: ProjectInput) -> ServiceResult<Project> {
        let input = normalize(input);
        input.validate()?;

        let project = self
            .store
            .create_project_with_owner(Project::new(input, caller))
            .await?;

        info!(project_id = %project.id, user_id = %caller, "Project created");
        self.record(project.id, caller, format!("created project {}", project.name))
            .await;

        Ok(project)
    }

    /// Returns a project with its creator, tasks and members resolved
    ///
    /// # Errors
    ///
    /// - `NotFound` if the project does not exist
    /// - `Forbidden` if `caller` is neither its creator nor a member
    pub async fn read(&self, caller: Uuid, project_id: Uuid) -> ServiceResult<ProjectDetails> {
        let project = self.load(project_id).await?;
        require_view(self.store.as_ref(), caller, project.id, project.creator_id).await?;

        let creator = self
            .store
            .find_user_by_id(project.creator_id)
            .await?
            .ok_or_else(|| {
                ServiceError::Internal(format!("creator of project {project_id} is missing"))
            })?;
        let tasks = self.store.list_tasks_for_project(project.id).await?;
        let members = self.store.list_members(project.id).await?;

        Ok(ProjectDetails {
            project,
            creator,
            tasks,
            members,
        })
    }

    /// Every project `caller` created or holds any membership on
    pub async fn read_all(&self, caller: Uuid) -> ServiceResult<Vec<Project>> {
        Ok(self.store.list_projects_for_user(caller).await?)
    }

    /// Replaces name, description, category and status
    ///
    /// # Errors
    ///
    /// `NotFound`, `Forbidden` (viewer or non-member) or `InvalidInput`
    pub async fn update(
        &self,
        caller: Uuid,
        project_id: Uuid,
        input: ProjectInput,
    ) -> ServiceResult<Project> {
        let mut project = self.load(project_id).await?;
        require_modify(self.store.as_ref(), caller, project_id).await?;

        let input = normalize(input);
        input.validate()?;
        project.apply(input);

        let saved = self
            .store
            .save_project(&project)
            .await?
            .ok_or_else(|| not_found_project(project_id))?;

        info!(project_id = %project_id, user_id = %caller, "Project updated");
        self.record(project_id, caller, "updated project".to_string())
            .await;

        Ok(saved)
    }

    /// Sets the favorite flag
    pub async fn toggle_favorite(
        &self,
        caller: Uuid,
        project_id: Uuid,
        is_favorite: bool,
    ) -> ServiceResult<Project> {
        self.load(project_id).await?;
        require_modify(self.store.as_ref(), caller, project_id).await?;

        let saved = self
            .store
            .set_project_favorite(project_id, is_favorite)
            .await?
            .ok_or_else(|| not_found_project(project_id))?;

        let action = if is_favorite {
            "marked project as favorite"
        } else {
            "unmarked project as favorite"
        };
        self.record(project_id, caller, action.to_string()).await;

        Ok(saved)
    }

    /// Deletes the project with all its memberships, tasks and activity
    ///
    /// The cascade is one atomic unit: on failure nothing is removed.
    pub async fn delete(&self, caller: Uuid, project_id: Uuid) -> ServiceResult<()> {
        self.load(project_id).await?;
        require_modify(self.store.as_ref(), caller, project_id).await?;

        self.store.delete_project_cascade(project_id).await?;

        info!(project_id = %project_id, user_id = %caller, "Project deleted");
        Ok(())
    }

    /// Adds `user_id` to the project with `role`
    ///
    /// # Errors
    ///
    /// - `InvalidRole` if `role` is not admin, editor or viewer
    /// - `NotFound` if the project or the user does not exist
    /// - `Conflict` if the user is already a member
    pub async fn add_member(
        &self,
        caller: Uuid,
        project_id: Uuid,
        user_id: Uuid,
        role: &str,
    ) -> ServiceResult<Membership> {
        self.load(project_id).await?;
        require_modify(self.store.as_ref(), caller, project_id).await?;
        let role = parse_role(role)?;

        if self.store.find_user_by_id(user_id).await?.is_none() {
            return Err(ServiceError::NotFound(format!("user {user_id}")));
        }

        let membership = self
            .store
            .add_membership(Membership::new(project_id, user_id, role))
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => ServiceError::Conflict(format!(
                    "user {user_id} is already a member of this project"
                )),
                other => other.into(),
            })?;

        info!(project_id = %project_id, user_id = %user_id, role = %role, "Member added");
        self.record(project_id, caller, format!("added member {user_id} as {role}"))
            .await;

        Ok(membership)
    }

    /// Changes the role of an existing member
    ///
    /// # Errors
    ///
    /// `InvalidRole`, or `NotFound` if the project or membership does not exist
    pub async fn update_member_role(
        &self,
        caller: Uuid,
        project_id: Uuid,
        user_id: Uuid,
        role: &str,
    ) -> ServiceResult<Membership> {
        self.load(project_id).await?;
        require_modify(self.store.as_ref(), caller, project_id).await?;
        let role = parse_role(role)?;

        let membership = self
            .store
            .update_membership_role(project_id, user_id, role)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("membership of user {user_id}")))?;

        info!(project_id = %project_id, user_id = %user_id, role = %role, "Member role updated");
        self.record(project_id, caller, format!("changed role of {user_id} to {role}"))
            .await;

        Ok(membership)
    }

    /// Removes a member from the project
    pub async fn remove_member(
        &self,
        caller: Uuid,
        project_id: Uuid,
        user_id: Uuid,
    ) -> ServiceResult<()> {
        self.load(project_id).await?;
        require_modify(self.store.as_ref(), caller, project_id).await?;

        if !self.store.remove_membership(project_id, user_id).await? {
            return Err(ServiceError::NotFound(format!("membership of user {user_id}")));
        }

        info!(project_id = %project_id, user_id = %user_id, "Member removed");
        self.record(project_id, caller, format!("removed member {user_id}"))
            .await;

        Ok(())
    }

    /// Transfers ownership to an existing member, promoting them to admin
    ///
    /// The creator field and the promotion commit together.
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless `caller` is an admin of the project
    /// - `InvalidOwner` if `new_owner_id` holds no membership on it
    pub async fn change_owner(
        &self,
        caller: Uuid,
        project_id: Uuid,
        new_owner_id: Uuid,
    ) -> ServiceResult<Project> {
        self.load(project_id).await?;
        require_admin(self.store.as_ref(), caller, project_id).await?;

        if self
            .store
            .find_membership(project_id, new_owner_id)
            .await?
            .is_none()
        {
            warn!(project_id = %project_id, user_id = %new_owner_id, "Ownership target is not a member");
            return Err(ServiceError::InvalidOwner);
        }

        let project = self
            .store
            .transfer_ownership(project_id, new_owner_id)
            .await
            .map_err(|e| match e {
                // Membership removed between the check and the transaction
                StoreError::NotFound(_) => ServiceError::InvalidOwner,
                other => other.into(),
            })?;

        info!(project_id = %project_id, user_id = %new_owner_id, "Project ownership transferred");
        self.record(
            project_id,
            caller,
            format!("transferred ownership to {new_owner_id}"),
        )
        .await;

        Ok(project)
    }

    /// The project's most recent activity, newest first
    pub async fn activities(&self, caller: Uuid, project_id: Uuid) -> ServiceResult<Vec<Activity>> {
        let project = self.load(project_id).await?;
        require_view(self.store.as_ref(), caller, project.id, project.creator_id).await?;

        Ok(self
            .store
            .recent_activities(project_id, RECENT_ACTIVITY_LIMIT)
            .await?)
    }

    async fn load(&self, project_id: Uuid) -> ServiceResult<Project> {
        self.store
            .find_project(project_id)
            .await?
            .ok_or_else(|| not_found_project(project_id))
    }

    async fn record(&self, project_id: Uuid, user_id: Uuid, action: String) {
        if let Err(e) = self.store.log_activity(project_id, user_id, &action).await {
            warn!(project_id = %project_id, user_id = %user_id, error = %e, "Failed to record activity");
        }
    }
}

fn normalize(mut input: ProjectInput) -> ProjectInput {
    input.name = input.name.trim().to_string();
    input
}

fn parse_role(role: &str) -> ServiceResult<ProjectRole> {
    role.parse::<ProjectRole>().map_err(|e| {
        warn!(role = %role, "Rejected invalid role");
        ServiceError::from(e)
    })
}

fn not_found_project(project_id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("project {project_id}"))
}
