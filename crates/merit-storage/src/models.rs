// SPDX-FileCopyrightText: 2026 Merit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types for the engine-owned tables.
//!
//! Types that cross into the engine and the CLI (definitions, level state)
//! live in `merit-core::types` and are re-exported here.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

pub use merit_core::types::{Definition, LevelState, Namespace, Rarity, UserId};

/// Kind of an outbox notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    AchievementUnlocked,
    BadgeEarned,
    LevelUp,
}

/// A queued notification for the external delivery surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: UserId,
    pub kind: NotificationKind,
    /// Slug of the achievement or badge; `None` for level-ups.
    pub subject_slug: Option<String>,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: String,
}

/// Stored progress for one (user, achievement) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRow {
    pub user_id: UserId,
    pub achievement_id: i64,
    pub progress_percent: u8,
    pub is_completed: bool,
    pub completed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A definition joined with one user's progress on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAchievement {
    pub definition: Definition,
    pub progress_percent: u8,
    pub is_completed: bool,
    pub completed_at: Option<String>,
}

/// A badge a user holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeAward {
    pub definition: Definition,
    pub awarded_at: String,
}

/// One row of the append-only activity log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub id: i64,
    pub user_id: UserId,
    pub activity_type: String,
    pub subject_slug: Option<String>,
    pub xp_earned: i64,
    pub points_earned: i64,
    pub created_at: String,
}

/// New definition as authored by admin tooling or a seed script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDefinition {
    pub slug: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub rarity: Rarity,
    pub requirement_type: String,
    pub requirement_value: i64,
    pub xp_reward: i64,
    pub points_reward: i64,
    pub is_active: bool,
    pub sort_order: i64,
}

impl NewDefinition {
    /// Active definition in the "general" category with no rewards.
    pub fn new(slug: &str, requirement_type: &str, requirement_value: i64) -> Self {
        Self {
            slug: slug.to_string(),
            name: slug.replace('-', " "),
            description: String::new(),
            category: "general".to_string(),
            rarity: Rarity::Common,
            requirement_type: requirement_type.to_string(),
            requirement_value,
            xp_reward: 0,
            points_reward: 0,
            is_active: true,
            sort_order: 0,
        }
    }

    pub fn rewards(mut self, xp: i64, points: i64) -> Self {
        self.xp_reward = xp;
        self.points_reward = points;
        self
    }

    pub fn category(mut self, category: &str) -> Self {
        self.category = category.to_string();
        self
    }

    pub fn rarity(mut self, rarity: Rarity) -> Self {
        self.rarity = rarity;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}
