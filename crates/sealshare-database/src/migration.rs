//! Database migration runner.

use sqlx::PgPool;
use tracing::info;

use sealshare_core::error::{AppError, ErrorKind};

/// Apply every pending migration under `migrations/`.
pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    info!("Applying share schema migrations");

    let migrator = sqlx::migrate!("../../migrations");
    migrator.run(pool).await.map_err(|e| {
        AppError::with_source(ErrorKind::Database, format!("Migration failed: {e}"), e)
    })?;

    info!(
        migrations = migrator.iter().count(),
        "Share schema is up to date"
    );
    Ok(())
}
