/// In-memory store.
///
/// Intended for tests and local development. All state lives behind one
/// `RwLock`, so each composite operation validates and mutates under a single
/// write guard and is all-or-nothing. Foreign keys and uniqueness are checked
/// the way the PostgreSQL schema would check them.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{StoreError, WorkStore};
use crate::models::activity::Activity;
use crate::models::membership::{Membership, ProjectMember, ProjectRole};
use crate::models::project::Project;
use crate::models::task::Task;
use crate::models::user::User;

#[derive(Debug, Default)]
struct State {
    users: HashMap<Uuid, User>,
    projects: HashMap<Uuid, Project>,
    memberships: HashMap<(Uuid, Uuid), Membership>,
    tasks: HashMap<Uuid, Task>,
    activities: Vec<StoredActivity>,
    next_activity_id: i64,
}

#[derive(Debug, Clone)]
struct StoredActivity {
    id: i64,
    project_id: Uuid,
    user_id: Uuid,
    action: String,
    occurred_at: chrono::DateTime<Utc>,
}

impl State {
    fn is_visible_to(&self, project: &Project, user_id: Uuid) -> bool {
        project.creator_id == user_id || self.memberships.contains_key(&(project.id, user_id))
    }

    fn require_user(&self, user_id: Uuid) -> Result<(), StoreError> {
        if self.users.contains_key(&user_id) {
            Ok(())
        } else {
            Err(StoreError::NotFound(format!("user {user_id}")))
        }
    }

    fn require_project(&self, project_id: Uuid) -> Result<(), StoreError> {
        if self.projects.contains_key(&project_id) {
            Ok(())
        } else {
            Err(StoreError::NotFound(format!("project {project_id}")))
        }
    }
}

/// Store keeping every table in process memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    /// Number of memberships, tasks and activity entries that reference a project.
    ///
    /// Lets tests assert that a cascade left nothing behind.
    pub fn rows_referencing(&self, project_id: Uuid) -> Result<usize, StoreError> {
        let state = self.read()?;
        let members = state
            .memberships
            .keys()
            .filter(|(p, _)| *p == project_id)
            .count();
        let tasks = state
            .tasks
            .values()
            .filter(|t| t.project_id == project_id)
            .count();
        let activities = state
            .activities
            .iter()
            .filter(|a| a.project_id == project_id)
            .count();
        Ok(members + tasks + activities)
    }
}

fn by_created_desc(a: &Project, b: &Project) -> std::cmp::Ordering {
    b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id))
}

fn by_created_asc(a: &Task, b: &Task) -> std::cmp::Ordering {
    a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id))
}

#[async_trait]
impl WorkStore for InMemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.read().map(|_| ())
    }

    async fn create_user(&self, user: User) -> Result<User, StoreError> {
        let mut state = self.write()?;
        if state.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(format!("email {} already registered", user.email)));
        }
        if state.users.contains_key(&user.id) {
            return Err(StoreError::Conflict(format!("user {}", user.id)));
        }
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create_project_with_owner(&self, project: Project) -> Result<Project, StoreError> {
        let mut state = self.write()?;
        state.require_user(project.creator_id)?;
        if state.projects.contains_key(&project.id) {
            return Err(StoreError::Conflict(format!("project {}", project.id)));
        }

        let owner = Membership::new(project.id, project.creator_id, ProjectRole::Admin);
        state.memberships.insert((project.id, project.creator_id), owner);
        state.projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn find_project(&self, id: Uuid) -> Result<Option<Project>, StoreError> {
        Ok(self.read()?.projects.get(&id).cloned())
    }

    async fn list_projects_for_user(&self, user_id: Uuid) -> Result<Vec<Project>, StoreError> {
        let state = self.read()?;
        let mut projects: Vec<Project> = state
            .projects
            .values()
            .filter(|p| state.is_visible_to(p, user_id))
            .cloned()
            .collect();
        projects.sort_by(by_created_desc);
        Ok(projects)
    }

    async fn save_project(&self, project: &Project) -> Result<Option<Project>, StoreError> {
        let mut state = self.write()?;
        let Some(stored) = state.projects.get_mut(&project.id) else {
            return Ok(None);
        };
        stored.name = project.name.clone();
        stored.description = project.description.clone();
        stored.category = project.category.clone();
        stored.status = project.status.clone();
        stored.updated_at = project.updated_at;
        Ok(Some(stored.clone()))
    }

    async fn set_project_favorite(
        &self,
        project_id: Uuid,
        is_favorite: bool,
    ) -> Result<Option<Project>, StoreError> {
        let mut state = self.write()?;
        let Some(stored) = state.projects.get_mut(&project_id) else {
            return Ok(None);
        };
        stored.is_favorite = is_favorite;
        stored.updated_at = Utc::now();
        Ok(Some(stored.clone()))
    }

    async fn delete_project_cascade(&self, project_id: Uuid) -> Result<(), StoreError> {
        let mut state = self.write()?;
        state.require_project(project_id)?;

        state.memberships.retain(|(p, _), _| *p != project_id);
        state.tasks.retain(|_, t| t.project_id != project_id);
        state.activities.retain(|a| a.project_id != project_id);
        state.projects.remove(&project_id);
        Ok(())
    }

    async fn transfer_ownership(
        &self,
        project_id: Uuid,
        new_owner_id: Uuid,
    ) -> Result<Project, StoreError> {
        let mut state = self.write()?;
        state.require_project(project_id)?;
        if !state.memberships.contains_key(&(project_id, new_owner_id)) {
            return Err(StoreError::NotFound(format!(
                "membership of {new_owner_id} on {project_id}"
            )));
        }

        if let Some(membership) = state.memberships.get_mut(&(project_id, new_owner_id)) {
            membership.role = ProjectRole::Admin;
        }

        let project = state
            .projects
            .get_mut(&project_id)
            .ok_or_else(|| StoreError::NotFound(format!("project {project_id}")))?;
        project.creator_id = new_owner_id;
        project.updated_at = Utc::now();
        Ok(project.clone())
    }

    async fn find_membership(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Membership>, StoreError> {
        Ok(self.read()?.memberships.get(&(project_id, user_id)).cloned())
    }

    async fn add_membership(&self, membership: Membership) -> Result<Membership, StoreError> {
        let mut state = self.write()?;
        state.require_project(membership.project_id)?;
        state.require_user(membership.user_id)?;

        let key = (membership.project_id, membership.user_id);
        if state.memberships.contains_key(&key) {
            return Err(StoreError::Conflict(format!(
                "user {} is already a member of project {}",
                membership.user_id, membership.project_id
            )));
        }
        state.memberships.insert(key, membership.clone());
        Ok(membership)
    }

    async fn update_membership_role(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        role: ProjectRole,
    ) -> Result<Option<Membership>, StoreError> {
        let mut state = self.write()?;
        Ok(state
            .memberships
            .get_mut(&(project_id, user_id))
            .map(|membership| {
                membership.role = role;
                membership.clone()
            }))
    }

    async fn remove_membership(&self, project_id: Uuid, user_id: Uuid) -> Result<bool, StoreError> {
        Ok(self
            .write()?
            .memberships
            .remove(&(project_id, user_id))
            .is_some())
    }

    async fn list_members(&self, project_id: Uuid) -> Result<Vec<ProjectMember>, StoreError> {
        let state = self.read()?;
        let mut members: Vec<ProjectMember> = state
            .memberships
            .values()
            .filter(|m| m.project_id == project_id)
            .filter_map(|m| {
                state.users.get(&m.user_id).map(|user| ProjectMember {
                    project_id: m.project_id,
                    user_id: m.user_id,
                    name: user.name.clone(),
                    email: user.email.clone(),
                    role: m.role,
                    joined_at: m.created_at,
                })
            })
            .collect();
        members.sort_by(|a, b| a.joined_at.cmp(&b.joined_at).then(a.user_id.cmp(&b.user_id)));
        Ok(members)
    }

    async fn create_task(&self, task: Task) -> Result<Task, StoreError> {
        let mut state = self.write()?;
        state.require_project(task.project_id)?;
        state.require_user(task.user_id)?;
        if state.tasks.contains_key(&task.id) {
            return Err(StoreError::Conflict(format!("task {}", task.id)));
        }
        state.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        Ok(self.read()?.tasks.get(&id).cloned())
    }

    async fn list_tasks_for_project(&self, project_id: Uuid) -> Result<Vec<Task>, StoreError> {
        let state = self.read()?;
        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|t| t.project_id == project_id)
            .cloned()
            .collect();
        tasks.sort_by(by_created_asc);
        Ok(tasks)
    }

    async fn list_tasks_visible_to(&self, user_id: Uuid) -> Result<Vec<Task>, StoreError> {
        let state = self.read()?;
        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|t| {
                state
                    .projects
                    .get(&t.project_id)
                    .is_some_and(|p| state.is_visible_to(p, user_id))
            })
            .cloned()
            .collect();
        tasks.sort_by(by_created_asc);
        Ok(tasks)
    }

    async fn save_task(&self, task: &Task) -> Result<Option<Task>, StoreError> {
        let mut state = self.write()?;
        if !state.tasks.contains_key(&task.id) {
            return Ok(None);
        }
        state.require_project(task.project_id)?;
        state.require_user(task.user_id)?;
        state.tasks.insert(task.id, task.clone());
        Ok(Some(task.clone()))
    }

    async fn assign_task(&self, task_id: Uuid, user_id: Uuid) -> Result<Option<Task>, StoreError> {
        let mut state = self.write()?;
        state.require_user(user_id)?;
        Ok(state.tasks.get_mut(&task_id).map(|task| {
            task.user_id = user_id;
            task.updated_at = Utc::now();
            task.clone()
        }))
    }

    async fn delete_task(&self, task_id: Uuid) -> Result<bool, StoreError> {
        Ok(self.write()?.tasks.remove(&task_id).is_some())
    }

    async fn log_activity(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        action: &str,
    ) -> Result<(), StoreError> {
        let mut state = self.write()?;
        state.require_project(project_id)?;
        state.require_user(user_id)?;

        state.next_activity_id += 1;
        let id = state.next_activity_id;
        state.activities.push(StoredActivity {
            id,
            project_id,
            user_id,
            action: action.to_string(),
            occurred_at: Utc::now(),
        });
        Ok(())
    }

    async fn recent_activities(
        &self,
        project_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Activity>, StoreError> {
        let state = self.read()?;
        let limit = usize::try_from(limit).unwrap_or(0);
        let mut entries: Vec<&StoredActivity> = state
            .activities
            .iter()
            .filter(|a| a.project_id == project_id)
            .collect();
        entries.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at).then(b.id.cmp(&a.id)));

        Ok(entries
            .into_iter()
            .take(limit)
            .filter_map(|a| {
                state.users.get(&a.user_id).map(|user| Activity {
                    id: a.id,
                    project_id: a.project_id,
                    user_id: a.user_id,
                    user_name: user.name.clone(),
                    action: a.action.clone(),
                    occurred_at: a.occurred_at,
                })
            })
            .collect())
    }
}
