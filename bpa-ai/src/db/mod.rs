//! Database access for bpa-ai
//!
//! SQLite storage behind the `AnalysisStore` contract.

pub mod analyses;

pub use analyses::SqliteAnalysisStore;

use anyhow::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // mode=rwc: read, write, create
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;
    init_tables(&pool).await?;

    Ok(pool)
}

/// Create the analyses table if it doesn't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS analyses (
            analysis_id TEXT PRIMARY KEY,
            subscription_level TEXT NOT NULL,
            score INTEGER NOT NULL,
            provisional INTEGER NOT NULL DEFAULT 0,
            company TEXT,
            document TEXT NOT NULL,
            generated_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (analyses)");

    Ok(())
}
