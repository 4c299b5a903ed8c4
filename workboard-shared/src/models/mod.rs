/// Domain models and their PostgreSQL queries
///
/// Each model owns the SQL for its table. Query functions are generic over
/// [`sqlx::PgExecutor`] so the same code runs against the pool or inside a
/// transaction (`&mut *tx`).
///
/// - `user`: registered identities
/// - `project`: project workspaces and their resolved detail view
/// - `membership`: role-scoped (user, project) associations
/// - `task`: tasks scoped to a project and assignee
/// - `activity`: append-only per-project audit log

pub mod activity;
pub mod membership;
pub mod project;
pub mod task;
pub mod user;
