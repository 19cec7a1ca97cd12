//! Embedded schema for the bundle catalog.
//!
//! The SQL lives in `migrations/sqlite/` at the workspace root and is compiled
//! in by `sqlx::migrate!`. Schema changes go in a new numbered file; sqlx
//! checksums applied files, so those are never edited.

use sqlx::migrate::Migrator;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

static MIGRATOR: Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Brings the catalog schema up to date.
pub async fn migrate(pool: &SqlitePool) -> DbResult<()> {
    MIGRATOR.run(pool).await?;
    info!(
        migrations = MIGRATOR.migrations.len(),
        "Catalog schema up to date"
    );
    Ok(())
}
