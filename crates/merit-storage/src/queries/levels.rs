// SPDX-FileCopyrightText: 2026 Merit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cached per-user XP/level rows and the ranked leaderboard query.

use merit_core::MeritError;
use rusqlite::params;

use crate::database::Database;
use crate::models::{LevelState, UserId};

pub(crate) fn level_state_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<LevelState> {
    Ok(LevelState {
        user_id: UserId(row.get(0)?),
        level: row.get(1)?,
        total_xp: row.get(2)?,
        total_points: row.get(3)?,
        total_achievements: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

/// The user's level row, if one was ever written.
pub async fn get(db: &Database, user: UserId) -> Result<Option<LevelState>, MeritError> {
    db.connection()
        .call(move |conn| {
            match conn.query_row(
                "SELECT user_id, level, total_xp, total_points, total_achievements, updated_at \
                 FROM user_levels WHERE user_id = ?1",
                params![user.0],
                level_state_from_row,
            ) {
                Ok(state) => Ok(Some(state)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Level rows in rank order: XP, then achievement count (both descending),
/// then user id ascending so equal rows order deterministically. The stored
/// `level` column plays no part; callers derive levels from XP.
///
/// With `category`, only users holding at least one completed achievement in
/// that category are included.
pub async fn ranked(
    db: &Database,
    limit: usize,
    category: Option<&str>,
) -> Result<Vec<LevelState>, MeritError> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let category = category.map(str::to_string);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT ul.user_id, ul.level, ul.total_xp, ul.total_points, \
                 ul.total_achievements, ul.updated_at \
                 FROM user_levels ul \
                 WHERE ?1 IS NULL OR EXISTS ( \
                     SELECT 1 FROM user_achievements ua \
                     JOIN achievements a ON a.id = ua.achievement_id \
                     WHERE ua.user_id = ul.user_id AND ua.is_completed = 1 AND a.category = ?1) \
                 ORDER BY ul.total_xp DESC, ul.total_achievements DESC, ul.user_id ASC \
                 LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![category, limit], level_state_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}
