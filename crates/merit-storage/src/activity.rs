// SPDX-FileCopyrightText: 2026 Merit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed [`ActivitySource`] over the host platform's tables.
//!
//! Expected host schema (read-only, never migrated by the engine):
//!
//! | table | columns used |
//! |---|---|
//! | `users` | `id`, `created_at`, `is_active` |
//! | `user_logins` | `user_id` |
//! | `user_follows` | `follower_id` |
//! | `posts` | `user_id`, `post_type` (`'status'` for status updates) |
//! | `articles` | `author_id` |
//! | `user_profiles` | `user_id`, `display_name`, `bio`, `avatar` |
//! | `user_photos` | `user_id` |
//! | `course_enrollments` | `user_id`, `completed_at` |
//!
//! A fact whose table is missing reports [`MeritError::UnknownFact`], so the
//! requirements that need it are unevaluable rather than failing the run.

use async_trait::async_trait;
use merit_core::{ActivitySource, Fact, FactValue, MeritError, UserId};
use rusqlite::params;
use tracing::debug;

use crate::database::{map_tr_err, Database};

/// Reads activity facts with one query per fact.
#[derive(Clone)]
pub struct SqliteActivitySource {
    conn: tokio_rusqlite::Connection,
}

enum FactQuery {
    Count(&'static str),
    ProfileComplete,
    DaysSinceJoin,
}

fn query_for(fact: Fact) -> Option<FactQuery> {
    let query = match fact {
        Fact::LoginCount => FactQuery::Count("SELECT COUNT(*) FROM user_logins WHERE user_id = ?1"),
        Fact::FriendsCount => {
            FactQuery::Count("SELECT COUNT(*) FROM user_follows WHERE follower_id = ?1")
        }
        Fact::PostsCount => FactQuery::Count("SELECT COUNT(*) FROM posts WHERE user_id = ?1"),
        Fact::StatusCount => FactQuery::Count(
            "SELECT COUNT(*) FROM posts WHERE user_id = ?1 AND post_type = 'status'",
        ),
        Fact::ArticleCount => {
            FactQuery::Count("SELECT COUNT(*) FROM articles WHERE author_id = ?1")
        }
        Fact::PhotoUploads => FactQuery::Count("SELECT COUNT(*) FROM user_photos WHERE user_id = ?1"),
        Fact::CourseCompletions => FactQuery::Count(
            "SELECT COUNT(*) FROM course_enrollments \
             WHERE user_id = ?1 AND completed_at IS NOT NULL",
        ),
        Fact::ProfileComplete => FactQuery::ProfileComplete,
        Fact::DaysSinceJoin => FactQuery::DaysSinceJoin,
        Fact::CompletedAchievements | Fact::Level | Fact::TotalPoints => return None,
    };
    Some(query)
}

fn run_query(
    conn: &rusqlite::Connection,
    query: &FactQuery,
    user: i64,
) -> rusqlite::Result<FactValue> {
    match query {
        FactQuery::Count(sql) => {
            let n: i64 = conn.query_row(sql, params![user], |row| row.get(0))?;
            Ok(FactValue::Count(n.max(0).unsigned_abs()))
        }
        FactQuery::ProfileComplete => {
            let fields = conn.query_row(
                "SELECT display_name, bio, avatar FROM user_profiles WHERE user_id = ?1",
                params![user],
                |row| {
                    Ok([
                        row.get::<_, Option<String>>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, Option<String>>(2)?,
                    ])
                },
            );
            match fields {
                Ok(fields) => Ok(FactValue::Flag(
                    fields
                        .iter()
                        .all(|f| f.as_deref().is_some_and(|v| !v.trim().is_empty())),
                )),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(FactValue::Flag(false)),
                Err(e) => Err(e),
            }
        }
        FactQuery::DaysSinceJoin => {
            let days = conn.query_row(
                "SELECT CAST(julianday('now') - julianday(created_at) AS INTEGER) \
                 FROM users WHERE id = ?1",
                params![user],
                |row| row.get::<_, Option<i64>>(0),
            );
            match days {
                Ok(days) => Ok(FactValue::Count(days.unwrap_or(0).max(0).unsigned_abs())),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(FactValue::Count(0)),
                Err(e) => Err(e),
            }
        }
    }
}

fn is_missing_table(e: &rusqlite::Error) -> bool {
    matches!(e, rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.starts_with("no such table"))
}

impl SqliteActivitySource {
    pub fn new(conn: tokio_rusqlite::Connection) -> Self {
        Self { conn }
    }

    /// Share the engine database's connection (host tables in the same file).
    pub fn from_database(db: &Database) -> Self {
        Self::new(db.connection().clone())
    }
}

#[async_trait]
impl ActivitySource for SqliteActivitySource {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn fact(&self, user: UserId, fact: Fact) -> Result<FactValue, MeritError> {
        let Some(query) = query_for(fact) else {
            return Err(MeritError::UnknownFact {
                fact: fact.to_string(),
            });
        };

        let value = self
            .conn
            .call(move |conn| match run_query(conn, &query, user.0) {
                Ok(value) => Ok(Some(value)),
                Err(e) if is_missing_table(&e) => Ok(None),
                Err(e) => Err(e),
            })
            .await
            .map_err(map_tr_err)?;

        match value {
            Some(value) => {
                debug!(user_id = %user, fact = %fact, ?value, "fact read");
                Ok(value)
            }
            None => Err(MeritError::UnknownFact {
                fact: fact.to_string(),
            }),
        }
    }

    async fn active_users(&self) -> Result<Vec<UserId>, MeritError> {
        self.conn
            .call(|conn| {
                let mut stmt = conn.prepare("SELECT id FROM users WHERE is_active = 1 ORDER BY id")?;
                let rows = stmt.query_map([], |row| Ok(UserId(row.get(0)?)))?;
                rows.collect::<Result<Vec<_>, _>>()
            })
            .await
            .map_err(map_tr_err)
    }
}
