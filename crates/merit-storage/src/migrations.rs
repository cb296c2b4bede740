// SPDX-FileCopyrightText: 2026 Merit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded database migrations using refinery.
//!
//! SQL migration files are compiled into the binary at build time via
//! `embed_migrations!`. Migrations run automatically on database open.

use merit_core::MeritError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Run all pending migrations against the given connection.
///
/// Only engine-owned tables are created; the host platform's tables are
/// never touched. Applied versions are tracked in `refinery_schema_history`.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), MeritError> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(MeritError::storage)?;
    for migration in report.applied_migrations() {
        tracing::info!(version = migration.version(), name = migration.name(), "migration applied");
    }
    Ok(())
}
