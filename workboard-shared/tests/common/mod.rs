//! Shared fixtures for service-level integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use uuid::Uuid;
use workboard_shared::auth::jwt::TokenConfig;
use workboard_shared::models::project::{Project, ProjectInput};
use workboard_shared::models::task::TaskInput;
use workboard_shared::models::user::{CreateUser, User};
use workboard_shared::services::projects::ProjectService;
use workboard_shared::services::session::SessionService;
use workboard_shared::services::tasks::TaskService;
use workboard_shared::store::memory::InMemoryStore;
use workboard_shared::store::WorkStore;

pub const TEST_SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// All services wired to one in-memory store
pub struct Fixture {
    pub store: Arc<InMemoryStore>,
    pub projects: ProjectService,
    pub tasks: TaskService,
    pub session: SessionService,
}

impl Fixture {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let dyn_store: Arc<dyn WorkStore> = store.clone();

        Self {
            projects: ProjectService::new(dyn_store.clone()),
            tasks: TaskService::new(dyn_store.clone()),
            session: SessionService::new(dyn_store, TokenConfig::new(TEST_SECRET)),
            store,
        }
    }

    /// Inserts a user directly, skipping password hashing
    pub async fn user(&self, name: &str) -> Uuid {
        self.store
            .create_user(User::new(CreateUser {
                name: name.to_string(),
                email: format!("{}@x.com", name.to_lowercase()),
                password_hash: "not-a-real-hash".to_string(),
            }))
            .await
            .expect("seed user")
            .id
    }

    pub async fn project(&self, creator: Uuid, name: &str) -> Project {
        self.projects
            .create(creator, project_input(name))
            .await
            .expect("create project")
    }
}

pub fn project_input(name: &str) -> ProjectInput {
    ProjectInput {
        name: name.to_string(),
        description: "Planning for next quarter".to_string(),
        category: "Planning".to_string(),
        status: "Active".to_string(),
    }
}

pub fn task_input(project_id: Uuid, assignee: Uuid, title: &str) -> TaskInput {
    TaskInput {
        project_id,
        user_id: assignee,
        title: title.to_string(),
        description: String::new(),
        status: None,
        due_date: None,
    }
}
