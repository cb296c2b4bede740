// SPDX-FileCopyrightText: 2026 Merit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Merit achievement engine.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single
//! connection serialized through `tokio-rusqlite`, typed queries over the
//! engine-owned tables, and a read-only [`SqliteActivitySource`] over the
//! host platform's tables.

pub mod activity;
pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use activity::SqliteActivitySource;
pub use database::{map_tr_err, Database};
pub use models::*;
