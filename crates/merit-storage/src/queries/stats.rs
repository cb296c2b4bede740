// SPDX-FileCopyrightText: 2026 Merit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Completed-achievement breakdowns for profile pages.

use std::str::FromStr;

use merit_core::MeritError;
use rusqlite::params;
use serde::{Deserialize, Serialize};

use crate::database::Database;
use crate::models::{Rarity, UserId};

/// Completed achievements of one user, grouped two ways.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementStats {
    pub total_completed: u64,
    /// (category, count), largest first.
    pub by_category: Vec<(String, u64)>,
    /// (rarity, count), common to legendary.
    pub by_rarity: Vec<(Rarity, u64)>,
}

pub async fn achievement_stats(db: &Database, user: UserId) -> Result<AchievementStats, MeritError> {
    db.connection()
        .call(move |conn| {
            let by_category = {
                let mut stmt = conn.prepare(
                    "SELECT a.category, COUNT(*) AS n FROM user_achievements ua \
                     JOIN achievements a ON a.id = ua.achievement_id \
                     WHERE ua.user_id = ?1 AND ua.is_completed = 1 \
                     GROUP BY a.category ORDER BY n DESC, a.category",
                )?;
                let rows = stmt.query_map(params![user.0], |row| Ok((row.get(0)?, row.get(1)?)))?;
                rows.collect::<Result<Vec<(String, u64)>, _>>()?
            };

            let mut by_rarity = {
                let mut stmt = conn.prepare(
                    "SELECT a.rarity, COUNT(*) FROM user_achievements ua \
                     JOIN achievements a ON a.id = ua.achievement_id \
                     WHERE ua.user_id = ?1 AND ua.is_completed = 1 \
                     GROUP BY a.rarity",
                )?;
                let rows = stmt.query_map(params![user.0], |row| {
                    let rarity: String = row.get(0)?;
                    Ok((Rarity::from_str(&rarity).unwrap_or_default(), row.get(1)?))
                })?;
                rows.collect::<Result<Vec<(Rarity, u64)>, _>>()?
            };
            by_rarity.sort_by_key(|(rarity, _)| *rarity);

            Ok(AchievementStats {
                total_completed: by_category.iter().map(|(_, n)| n).sum(),
                by_category,
                by_rarity,
            })
        })
        .await
        .map_err(crate::database::map_tr_err)
}
