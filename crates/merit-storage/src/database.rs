// SPDX-FileCopyrightText: 2026 Merit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All statements issued through one [`Database`] run on tokio-rusqlite's
//! single background thread. Writers in other processes (or a second
//! `Database` on the same file) are serialized by SQLite's own locking,
//! bounded by `busy_timeout`.

use std::path::Path;
use std::time::Duration;

use merit_config::StorageConfig;
use merit_core::MeritError;
use tracing::{debug, info};

/// Handle to the engine database.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

/// Convert a tokio-rusqlite error into `MeritError::Storage`.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> MeritError {
    MeritError::Storage {
        source: Box::new(e),
    }
}

impl Database {
    /// Open (or create) the database at `path` with default settings and
    /// run pending migrations.
    pub async fn open(path: &str) -> Result<Self, MeritError> {
        let config = StorageConfig {
            database_path: path.to_string(),
            ..StorageConfig::default()
        };
        Self::open_with(&config).await
    }

    /// Open the database described by `config` and run pending migrations.
    pub async fn open_with(config: &StorageConfig) -> Result<Self, MeritError> {
        let path = config.database_path.clone();
        if let Some(parent) = Path::new(&path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(MeritError::storage)?;
        }

        let conn = tokio_rusqlite::Connection::open(&path)
            .await
            .map_err(MeritError::storage)?;
        let db = Self { conn };
        db.prepare(config.wal_mode, config.busy_timeout_ms).await?;
        info!(path = %path, wal = config.wal_mode, "database opened");
        Ok(db)
    }

    /// Open a private in-memory database. Used by tests and dry runs.
    pub async fn open_in_memory() -> Result<Self, MeritError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(MeritError::storage)?;
        let db = Self { conn };
        db.prepare(false, StorageConfig::default().busy_timeout_ms)
            .await?;
        Ok(db)
    }

    async fn prepare(&self, wal_mode: bool, busy_timeout_ms: u64) -> Result<(), MeritError> {
        self.conn
            .call(move |conn| {
                conn.busy_timeout(Duration::from_millis(busy_timeout_ms))?;
                if wal_mode {
                    let mode: String = conn.pragma_update_and_check(
                        None,
                        "journal_mode",
                        "WAL",
                        |row| row.get(0),
                    )?;
                    debug!(journal_mode = %mode, "journal mode set");
                    conn.pragma_update(None, "synchronous", "NORMAL")?;
                }
                conn.pragma_update(None, "foreign_keys", "ON")?;
                Ok(crate::migrations::run_migrations(conn))
            })
            .await
            .map_err(map_tr_err)?
    }

    /// Underlying connection for query modules and the award ledger.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Close the connection, flushing the WAL.
    pub async fn close(self) -> Result<(), MeritError> {
        self.conn.close().await.map_err(MeritError::storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_runs_migrations() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("merit.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();

        let tables: Vec<String> = db
            .connection()
            .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' \
                     AND name NOT LIKE 'sqlite_%' AND name != 'refinery_schema_history' \
                     ORDER BY name",
                )?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.collect()
            })
            .await
            .unwrap();

        assert_eq!(
            tables,
            vec![
                "achievement_notifications",
                "achievements",
                "badges",
                "user_achievements",
                "user_activity_log",
                "user_badges",
                "user_levels",
            ]
        );
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn reopen_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("merit.db");
        let path = path.to_str().unwrap();

        Database::open(path).await.unwrap().close().await.unwrap();
        let db = Database::open(path).await.unwrap();
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn wal_mode_is_enabled_on_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("merit.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();

        let mode: String = db
            .connection()
            .call(|conn| -> Result<String, rusqlite::Error> {
                conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))
            })
            .await
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[tokio::test]
    async fn open_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/deeper/merit.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        db.close().await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn completed_rows_cannot_be_reverted() {
        let db = Database::open_in_memory().await.unwrap();
        let result = db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "INSERT INTO achievements (slug, name, requirement_type) \
                     VALUES ('first-steps', 'First Steps', 'first_login')",
                    [],
                )?;
                conn.execute(
                    "INSERT INTO user_achievements \
                     (user_id, achievement_id, progress_percent, is_completed, completed_at) \
                     VALUES (1, 1, 100, 1, '2026-01-01T00:00:00.000Z')",
                    [],
                )?;
                conn.execute(
                    "UPDATE user_achievements SET is_completed = 0 WHERE user_id = 1",
                    [],
                )?;
                Ok(())
            })
            .await;
        assert!(result.is_err());
    }
}
