//! Database Module
//!
//! SQLite persistence for campaigns, their content tables and the many-to-many
//! join tables between them. Operations are grouped into extension traits
//! (`CampaignOps`, `EntityOps`) implemented on [`Database`].

pub(crate) mod campaigns;
pub(crate) mod entities;
pub mod migrations;
pub mod models;
pub mod schema;

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::info;

pub use campaigns::CampaignOps;
pub use entities::{CampaignScope, EntityOps};
pub use models::*;
pub use schema::{
    EntityKind, EntityTable, JoinEndpoint, JoinSpec, ReferenceColumn, CLONE_ORDER, JOIN_TABLES,
    OWNERSHIP_COLUMNS,
};

/// File name of the database inside the data directory
pub const DATABASE_FILE: &str = "lanternwave.db";

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Handle to the application database
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) the database in `data_dir` and run pending migrations.
    pub async fn new(data_dir: &Path) -> Result<Self, sqlx::Error> {
        Self::with_options(data_dir, DEFAULT_MAX_CONNECTIONS, DEFAULT_BUSY_TIMEOUT_MS).await
    }

    /// Open the database with explicit pool settings.
    pub async fn with_options(
        data_dir: &Path,
        max_connections: u32,
        busy_timeout_ms: u64,
    ) -> Result<Self, sqlx::Error> {
        std::fs::create_dir_all(data_dir)?;
        let db_path = data_dir.join(DATABASE_FILE);

        let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.display()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_millis(busy_timeout_ms));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;

        migrations::run_migrations(&pool).await?;

        info!(path = %db_path.display(), "Database ready");
        Ok(Self { pool })
    }

    /// Wrap an existing pool. Migrations are run against it.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, sqlx::Error> {
        migrations::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
