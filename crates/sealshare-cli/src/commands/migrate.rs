//! Database migration command.

use sealshare_core::config::AppConfig;
use sealshare_core::error::AppError;
use sealshare_database::DatabasePool;
use sealshare_database::migration::run_migrations;

use crate::output;

/// Apply pending migrations to the configured database.
pub async fn execute(config: &AppConfig) -> Result<(), AppError> {
    let db = DatabasePool::connect(&config.database).await?;
    run_migrations(db.pool()).await?;
    db.close().await;
    output::print_success("All migrations applied.");
    Ok(())
}
