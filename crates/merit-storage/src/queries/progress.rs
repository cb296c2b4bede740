// SPDX-FileCopyrightText: 2026 Merit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user achievement progress and badge holdings.
//!
//! Completion itself is written only by the award ledger's transaction;
//! the writes here touch progress on rows that are not yet completed.

use merit_core::MeritError;
use rusqlite::params;

use crate::database::Database;
use crate::models::{BadgeAward, ProgressRow, UserAchievement, UserId};
use crate::queries::definitions::definition_from_row;

fn progress_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProgressRow> {
    Ok(ProgressRow {
        user_id: UserId(row.get(0)?),
        achievement_id: row.get(1)?,
        progress_percent: row.get(2)?,
        is_completed: row.get(3)?,
        completed_at: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

const PROGRESS_COLUMNS: &str =
    "user_id, achievement_id, progress_percent, is_completed, completed_at, created_at, updated_at";

/// Stored progress, if the pair has been evaluated before.
pub async fn get(
    db: &Database,
    user: UserId,
    achievement_id: i64,
) -> Result<Option<ProgressRow>, MeritError> {
    db.connection()
        .call(move |conn| {
            let sql = format!(
                "SELECT {PROGRESS_COLUMNS} FROM user_achievements \
                 WHERE user_id = ?1 AND achievement_id = ?2"
            );
            match conn.query_row(&sql, params![user.0, achievement_id], progress_from_row) {
                Ok(row) => Ok(Some(row)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Create the default row (0%, not completed) if absent, then return the row.
pub async fn ensure(
    db: &Database,
    user: UserId,
    achievement_id: i64,
) -> Result<ProgressRow, MeritError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO user_achievements (user_id, achievement_id) VALUES (?1, ?2)",
                params![user.0, achievement_id],
            )?;
            let sql = format!(
                "SELECT {PROGRESS_COLUMNS} FROM user_achievements \
                 WHERE user_id = ?1 AND achievement_id = ?2"
            );
            conn.query_row(&sql, params![user.0, achievement_id], progress_from_row)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Store a new progress percentage on a row that is not completed.
///
/// Returns `false` when the row is already completed (nothing changes).
pub async fn record(
    db: &Database,
    user: UserId,
    achievement_id: i64,
    percent: u8,
) -> Result<bool, MeritError> {
    let percent = percent.min(100);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO user_achievements (user_id, achievement_id) VALUES (?1, ?2)",
                params![user.0, achievement_id],
            )?;
            let changed = conn.execute(
                "UPDATE user_achievements SET progress_percent = ?3, \
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') \
                 WHERE user_id = ?1 AND achievement_id = ?2 AND is_completed = 0 \
                 AND progress_percent != ?3",
                params![user.0, achievement_id, percent],
            )?;
            if changed > 0 {
                return Ok(true);
            }
            let completed: bool = conn.query_row(
                "SELECT is_completed FROM user_achievements \
                 WHERE user_id = ?1 AND achievement_id = ?2",
                params![user.0, achievement_id],
                |row| row.get(0),
            )?;
            Ok(!completed)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Definitions joined with this user's progress.
///
/// With `completed_only`, returns only completed awards (including those
/// whose definition was later deactivated). Otherwise returns every active
/// definition, with 0% for pairs never evaluated, plus completed inactive ones.
pub async fn for_user(
    db: &Database,
    user: UserId,
    completed_only: bool,
) -> Result<Vec<UserAchievement>, MeritError> {
    db.connection()
        .call(move |conn| {
            let filter = if completed_only {
                "ua.is_completed = 1"
            } else {
                "(a.is_active = 1 OR ua.is_completed = 1)"
            };
            let sql = format!(
                "SELECT a.id, a.slug, a.name, a.description, a.category, a.rarity, \
                 a.requirement_type, a.requirement_value, a.xp_reward, a.points_reward, \
                 a.is_active, a.sort_order, \
                 COALESCE(ua.progress_percent, 0), COALESCE(ua.is_completed, 0), ua.completed_at \
                 FROM achievements a \
                 LEFT JOIN user_achievements ua ON ua.achievement_id = a.id AND ua.user_id = ?1 \
                 WHERE {filter} \
                 ORDER BY a.sort_order, a.id"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![user.0], |row| {
                Ok(UserAchievement {
                    definition: definition_from_row(row, 0)?,
                    progress_percent: row.get(12)?,
                    is_completed: row.get(13)?,
                    completed_at: row.get(14)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Number of completed achievements for the user.
pub async fn completed_count(db: &Database, user: UserId) -> Result<u64, MeritError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM user_achievements WHERE user_id = ?1 AND is_completed = 1",
                params![user.0],
                |row| row.get(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Badges the user holds, oldest first.
pub async fn badges_for_user(db: &Database, user: UserId) -> Result<Vec<BadgeAward>, MeritError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT b.id, b.slug, b.name, b.description, b.category, b.rarity, \
                 b.requirement_type, b.requirement_value, b.xp_reward, b.points_reward, \
                 b.is_active, b.sort_order, ub.awarded_at \
                 FROM user_badges ub JOIN badges b ON b.id = ub.badge_id \
                 WHERE ub.user_id = ?1 ORDER BY ub.id",
            )?;
            let rows = stmt.query_map(params![user.0], |row| {
                Ok(BadgeAward {
                    definition: definition_from_row(row, 0)?,
                    awarded_at: row.get(12)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}
