// SPDX-FileCopyrightText: 2026 Merit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only log of XP/points credits.

use merit_core::MeritError;
use rusqlite::params;

use crate::database::Database;
use crate::models::{ActivityLogEntry, UserId};

/// Most recent log entries for the user, newest first.
pub async fn recent(
    db: &Database,
    user: UserId,
    limit: usize,
) -> Result<Vec<ActivityLogEntry>, MeritError> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, activity_type, subject_slug, xp_earned, points_earned, created_at \
                 FROM user_activity_log WHERE user_id = ?1 ORDER BY id DESC LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![user.0, limit], |row| {
                Ok(ActivityLogEntry {
                    id: row.get(0)?,
                    user_id: UserId(row.get(1)?),
                    activity_type: row.get(2)?,
                    subject_slug: row.get(3)?,
                    xp_earned: row.get(4)?,
                    points_earned: row.get(5)?,
                    created_at: row.get(6)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Number of log entries of one activity type, e.g. `"user_login"`.
pub async fn count_of(db: &Database, user: UserId, activity_type: &str) -> Result<u64, MeritError> {
    let activity_type = activity_type.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM user_activity_log WHERE user_id = ?1 AND activity_type = ?2",
                params![user.0, activity_type],
                |row| row.get(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}
