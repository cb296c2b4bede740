// SPDX-FileCopyrightText: 2026 Merit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Host platform fixture: creates the external tables and seeds activity.

use merit_core::{MeritError, UserId};
use merit_storage::{map_tr_err, Database};
use rusqlite::params;

/// DDL for the host tables read by `SqliteActivitySource`.
pub const HOST_SCHEMA: &str = include_str!("../fixtures/host_schema.sql");

/// Writes host activity rows for tests.
#[derive(Clone)]
pub struct HostData {
    conn: tokio_rusqlite::Connection,
}

impl HostData {
    /// Create the host tables in `db` and return a writer for them.
    pub async fn install(db: &Database) -> Result<Self, MeritError> {
        let conn = db.connection().clone();
        conn.call(|conn| conn.execute_batch(HOST_SCHEMA))
            .await
            .map_err(map_tr_err)?;
        Ok(Self { conn })
    }

    async fn exec(&self, sql: &'static str, user: UserId, times: u32) -> Result<(), MeritError> {
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                for _ in 0..times {
                    tx.execute(sql, params![user.0])?;
                }
                tx.commit()
            })
            .await
            .map_err(map_tr_err)
    }

    /// Register an active user who joined `days_ago` days ago.
    pub async fn add_user(&self, user: UserId, days_ago: u32) -> Result<(), MeritError> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO users (id, username, created_at, is_active) \
                     VALUES (?1, 'user' || ?1, datetime('now', '-' || ?2 || ' days'), 1)",
                    params![user.0, days_ago],
                )
                .map(|_| ())
            })
            .await
            .map_err(map_tr_err)
    }

    pub async fn deactivate(&self, user: UserId) -> Result<(), MeritError> {
        self.exec("UPDATE users SET is_active = 0 WHERE id = ?1", user, 1)
            .await
    }

    pub async fn add_logins(&self, user: UserId, n: u32) -> Result<(), MeritError> {
        self.exec("INSERT INTO user_logins (user_id) VALUES (?1)", user, n)
            .await
    }

    pub async fn add_posts(&self, user: UserId, n: u32) -> Result<(), MeritError> {
        self.exec(
            "INSERT INTO posts (user_id, post_type) VALUES (?1, 'status')",
            user,
            n,
        )
        .await
    }

    pub async fn add_articles(&self, user: UserId, n: u32) -> Result<(), MeritError> {
        self.exec("INSERT INTO articles (author_id) VALUES (?1)", user, n)
            .await
    }

    pub async fn add_photos(&self, user: UserId, n: u32) -> Result<(), MeritError> {
        self.exec("INSERT INTO user_photos (user_id) VALUES (?1)", user, n)
            .await
    }

    /// Make `user` follow `n` distinct accounts.
    pub async fn add_follows(&self, user: UserId, n: u32) -> Result<(), MeritError> {
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                for target in 0..i64::from(n) {
                    tx.execute(
                        "INSERT OR IGNORE INTO user_follows (follower_id, following_id) \
                         VALUES (?1, ?2)",
                        params![user.0, 1_000_000 + target],
                    )?;
                }
                tx.commit()
            })
            .await
            .map_err(map_tr_err)
    }

    pub async fn complete_courses(&self, user: UserId, n: u32) -> Result<(), MeritError> {
        self.exec(
            "INSERT INTO course_enrollments (user_id, completed_at) VALUES (?1, datetime('now'))",
            user,
            n,
        )
        .await
    }

    /// Fill in display name, bio, and avatar.
    pub async fn complete_profile(&self, user: UserId) -> Result<(), MeritError> {
        self.exec(
            "INSERT OR REPLACE INTO user_profiles (user_id, display_name, bio, avatar) \
             VALUES (?1, 'Tester', 'Writes tests.', 'avatar.png')",
            user,
            1,
        )
        .await
    }
}
