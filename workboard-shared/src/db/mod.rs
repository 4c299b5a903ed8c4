/// Database layer for Workboard
///
/// - `pool`: PostgreSQL connection pool lifecycle (create, health check, close)
/// - `migrations`: embedded schema migrations from the workspace `migrations/` directory
///
/// Query code lives with the models; the `store` module is the only caller.

pub mod migrations;
pub mod pool;
