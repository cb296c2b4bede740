// SPDX-FileCopyrightText: 2026 Merit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ranked read model over the per-user level rows.

use merit_core::{MeritError, UserId};
use merit_storage::queries::levels;
use merit_storage::Database;
use serde::{Deserialize, Serialize};

use crate::level::LevelCurve;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// 1-based position.
    pub rank: usize,
    pub user_id: UserId,
    /// Derived from `total_xp` under the current curve.
    pub level: u32,
    pub total_xp: i64,
    pub total_points: i64,
    pub total_achievements: i64,
}

/// Top `limit` users by level, XP, and achievement count, with user id as
/// the final tie-break. `category` keeps only users holding a completed
/// achievement in that category.
///
/// Levels are recomputed from XP rather than read from the cached column.
/// Level is monotone in XP, so ranking by XP already yields level order.
pub async fn leaderboard(
    db: &Database,
    curve: &LevelCurve,
    limit: usize,
    category: Option<&str>,
) -> Result<Vec<LeaderboardEntry>, MeritError> {
    let rows = levels::ranked(db, limit, category).await?;
    Ok(rows
        .into_iter()
        .enumerate()
        .map(|(i, row)| LeaderboardEntry {
            rank: i + 1,
            user_id: row.user_id,
            level: curve.level_for(row.total_xp.max(0).unsigned_abs()),
            total_xp: row.total_xp,
            total_points: row.total_points,
            total_achievements: row.total_achievements,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use merit_core::Namespace;
    use merit_storage::queries::definitions;
    use merit_storage::NewDefinition;
    use std::sync::Arc;

    use crate::ledger::{AwardLedger, RewardPolicy};

    #[tokio::test]
    async fn ties_on_level_and_xp_break_on_achievements() {
        let db = Database::open_in_memory().await.unwrap();
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch(
                    "INSERT INTO user_levels (user_id, level, total_xp, total_achievements) VALUES \
                     (10, 2, 150, 1), (11, 2, 150, 3), (12, 1, 90, 9);",
                )
            })
            .await
            .unwrap();

        let board = leaderboard(&db, &LevelCurve::default(), 10, None).await.unwrap();
        let order: Vec<(usize, i64)> = board.iter().map(|e| (e.rank, e.user_id.0)).collect();
        assert_eq!(order, vec![(1, 11), (2, 10), (3, 12)]);
    }

    #[tokio::test]
    async fn category_filter_keeps_holders_only() {
        let db = Database::open_in_memory().await.unwrap();
        let social = definitions::insert(
            &db,
            Namespace::Achievement,
            &NewDefinition::new("networker", "friends_count", 5).category("social"),
        )
        .await
        .unwrap();
        db.connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch(
                    "INSERT INTO user_levels (user_id, level, total_xp) VALUES (1, 3, 300), (2, 2, 120);",
                )?;
                conn.execute(
                    "INSERT INTO user_achievements (user_id, achievement_id, progress_percent, is_completed, completed_at) \
                     VALUES (2, ?1, 100, 1, '2026-01-01T00:00:00.000Z')",
                    rusqlite::params![social],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        let board = leaderboard(&db, &LevelCurve::default(), 10, Some("social")).await.unwrap();
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].user_id, UserId(2));
        assert_eq!(board[0].rank, 1);
        assert!(leaderboard(&db, &LevelCurve::default(), 10, Some("writing")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn levels_follow_the_current_curve_not_the_cached_column() {
        let db = Arc::new(Database::open_in_memory().await.unwrap());
        let gentle = LevelCurve::new(50, 1.2, 10);
        let steep = LevelCurve::new(200, 1.2, 10);

        // User 1 is credited while the gentle curve is live, user 2 after
        // the switch, so the cached levels disagree with XP order.
        AwardLedger::new(db.clone(), gentle, RewardPolicy::default())
            .credit_activity(UserId(1), "article_create", 150, 0)
            .await
            .unwrap();
        AwardLedger::new(db.clone(), steep.clone(), RewardPolicy::default())
            .credit_activity(UserId(2), "article_create", 190, 0)
            .await
            .unwrap();
        let cached = levels::get(&db, UserId(1)).await.unwrap().unwrap();
        assert_eq!(cached.level, 3);

        let board = leaderboard(&db, &steep, 10, None).await.unwrap();
        let rows: Vec<(usize, i64, u32, i64)> = board
            .iter()
            .map(|e| (e.rank, e.user_id.0, e.level, e.total_xp))
            .collect();
        assert_eq!(rows, vec![(1, 2, 1, 190), (2, 1, 1, 150)]);
    }
}
