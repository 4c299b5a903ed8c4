/// Database migration runner
///
/// Migrations are embedded at compile time from the workspace-level
/// `migrations/` directory, one `{timestamp}_{name}.sql` file per step.

use sqlx::postgres::PgPool;
use tracing::{info, warn};

/// Runs all pending migrations
///
/// # Errors
///
/// Returns an error if a migration fails to apply or a previously applied
/// migration has been modified.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Starting database migrations");

    match sqlx::migrate!("../migrations").run(pool).await {
        Ok(()) => {
            info!("All database migrations completed successfully");
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "Migration failed");
            Err(e)
        }
    }
}
