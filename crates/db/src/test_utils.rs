//! Test harness: a migrated in-memory SQLite database.
//!
//! Unlike `MockDatabase`, this enforces the real unique indexes, so services
//! can be tested against actual conflict behavior.

use std::sync::Arc;

use humap_common::{AppError, AppResult};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

/// A fresh, migrated in-memory database.
pub struct TestDatabase {
    db: Arc<DatabaseConnection>,
}

impl TestDatabase {
    /// Connect to `sqlite::memory:` and run all migrations.
    ///
    /// The pool is capped at one connection: every connection to
    /// `sqlite::memory:` opens a separate database.
    pub async fn in_memory() -> AppResult<Self> {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1).min_connections(1).sqlx_logging(false);

        let db = Database::connect(opt)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        crate::migrate(&db).await?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Shared handle for repositories.
    #[must_use]
    pub fn connection(&self) -> Arc<DatabaseConnection> {
        Arc::clone(&self.db)
    }
}
