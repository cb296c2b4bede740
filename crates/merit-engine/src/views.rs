// SPDX-FileCopyrightText: 2026 Merit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read models served by the engine: levels, holdings, notifications,
//! statistics, and a definition audit.

use merit_core::{Fact, LevelState, MeritError, Namespace, UserId};
use merit_storage::queries::stats::{self, AchievementStats};
use merit_storage::queries::{activity_log, definitions, levels, notifications, progress};
use merit_storage::{ActivityLogEntry, BadgeAward, Notification, UserAchievement};
use serde::{Deserialize, Serialize};

use crate::engine::Engine;
use crate::evaluator::Requirement;
use crate::leaderboard::{leaderboard, LeaderboardEntry};
use crate::level::LevelProgress;

/// Whether a definition's requirement can be evaluated at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionAudit {
    pub namespace: Namespace,
    pub slug: String,
    pub requirement_type: String,
    pub requirement_value: i64,
    pub is_active: bool,
    /// Fact the requirement reads, when evaluable.
    pub fact: Option<Fact>,
    /// Why it is not evaluable.
    pub problem: Option<String>,
}

impl DefinitionAudit {
    pub fn is_evaluable(&self) -> bool {
        self.problem.is_none()
    }
}

impl Engine {
    /// Level progress recomputed from stored XP (never the cached level).
    pub async fn user_level(&self, user: UserId) -> Result<LevelProgress, MeritError> {
        let xp = levels::get(&self.db, user)
            .await?
            .map_or(0, |s| s.total_xp.max(0).unsigned_abs());
        Ok(self.curve().progress(xp))
    }

    pub async fn level_state(&self, user: UserId) -> Result<Option<LevelState>, MeritError> {
        levels::get(&self.db, user).await
    }

    pub async fn user_achievements(
        &self,
        user: UserId,
        completed_only: bool,
    ) -> Result<Vec<UserAchievement>, MeritError> {
        progress::for_user(&self.db, user, completed_only).await
    }

    pub async fn user_badges(&self, user: UserId) -> Result<Vec<BadgeAward>, MeritError> {
        progress::badges_for_user(&self.db, user).await
    }

    pub async fn notifications(
        &self,
        user: UserId,
        limit: usize,
        unread_only: bool,
    ) -> Result<Vec<Notification>, MeritError> {
        notifications::for_user(&self.db, user, limit, unread_only).await
    }

    pub async fn mark_notification_read(&self, user: UserId, id: i64) -> Result<bool, MeritError> {
        notifications::mark_read(&self.db, user, id).await
    }

    pub async fn achievement_stats(&self, user: UserId) -> Result<AchievementStats, MeritError> {
        stats::achievement_stats(&self.db, user).await
    }

    pub async fn activity_log(
        &self,
        user: UserId,
        limit: usize,
    ) -> Result<Vec<ActivityLogEntry>, MeritError> {
        activity_log::recent(&self.db, user, limit).await
    }

    pub async fn leaderboard(
        &self,
        limit: usize,
        category: Option<&str>,
    ) -> Result<Vec<LeaderboardEntry>, MeritError> {
        leaderboard(&self.db, self.curve(), limit, category).await
    }

    /// Audit every definition, active or not, in both namespaces. Read-only.
    pub async fn audit(&self) -> Result<Vec<DefinitionAudit>, MeritError> {
        let mut out = Vec::new();
        for ns in [Namespace::Achievement, Namespace::Badge] {
            for def in definitions::all(&self.db, ns).await? {
                let requirement = Requirement::parse(&def, self.count_metrics());
                let (fact, problem) = match requirement.fact(&def.slug) {
                    Ok(fact) => (Some(fact), None),
                    Err(e) => (None, Some(e.to_string())),
                };
                out.push(DefinitionAudit {
                    namespace: ns,
                    slug: def.slug,
                    requirement_type: def.requirement_type,
                    requirement_value: def.requirement_value,
                    is_active: def.is_active,
                    fact,
                    problem,
                });
            }
        }
        Ok(out)
    }
}
