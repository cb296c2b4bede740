// SPDX-FileCopyrightText: 2026 Merit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the accessor, storage, and engine crates.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Identifier of a user in the host platform.
///
/// Always passed explicitly; the engine never reads an ambient "current user".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The two award namespaces. Badges are binary; achievements track progress.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    Achievement,
    Badge,
}

/// Display rarity of a definition.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

/// An achievement or badge definition.
///
/// Authored by external admin tooling; read-only to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    pub id: i64,
    /// Unique slug within the namespace (e.g. "first-steps").
    pub slug: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub rarity: Rarity,
    /// Raw requirement tag as authored (e.g. "posts_count").
    pub requirement_type: String,
    /// Numeric threshold; ignored by boolean requirement kinds.
    pub requirement_value: i64,
    pub xp_reward: i64,
    pub points_reward: i64,
    pub is_active: bool,
    pub sort_order: i64,
}

/// A named fact about one user.
///
/// External facts come from the activity accessor; engine-owned facts are
/// derived from the engine's own tables.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Fact {
    LoginCount,
    FriendsCount,
    PostsCount,
    ArticleCount,
    StatusCount,
    ProfileComplete,
    DaysSinceJoin,
    PhotoUploads,
    CourseCompletions,
    CompletedAchievements,
    Level,
    TotalPoints,
}

impl Fact {
    /// Facts the engine computes from its own award and level tables.
    pub fn is_engine_owned(self) -> bool {
        matches!(
            self,
            Fact::CompletedAchievements | Fact::Level | Fact::TotalPoints
        )
    }
}

/// The value of a fact: a counter or a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FactValue {
    Count(u64),
    Flag(bool),
}

impl FactValue {
    /// Numeric view. A set flag counts as one.
    pub fn as_count(self) -> u64 {
        match self {
            FactValue::Count(n) => n,
            FactValue::Flag(true) => 1,
            FactValue::Flag(false) => 0,
        }
    }

    /// Boolean view. Any non-zero counter is true.
    pub fn as_flag(self) -> bool {
        match self {
            FactValue::Count(n) => n > 0,
            FactValue::Flag(b) => b,
        }
    }
}

/// What a completing award credited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardReceipt {
    pub user_id: UserId,
    pub namespace: Namespace,
    pub slug: String,
    pub name: String,
    pub xp_awarded: i64,
    pub points_awarded: i64,
    pub level_before: u32,
    pub level_after: u32,
    pub awarded_at: String,
}

impl AwardReceipt {
    pub fn leveled_up(&self) -> bool {
        self.level_after > self.level_before
    }
}

/// Result of running one award attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AwardOutcome {
    /// Newly completed in this call; rewards were credited atomically.
    Completed(AwardReceipt),
    /// Already completed earlier (or by a concurrent caller). Nothing changed.
    AlreadyCompleted,
    /// Not yet complete; the stored progress now holds `percent`.
    Progressed { percent: u8 },
    /// The requirement cannot be evaluated. Progress is left untouched.
    Unevaluable { reason: String },
}

impl AwardOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, AwardOutcome::Completed(_))
    }
}

/// Cached XP/level state for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelState {
    pub user_id: UserId,
    pub level: u32,
    pub total_xp: i64,
    pub total_points: i64,
    pub total_achievements: i64,
    pub updated_at: String,
}

/// Current UTC time in the ISO 8601 format used by every table.
pub fn now_timestamp() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_timestamp_has_fixed_width() {
        let ts = now_timestamp();
        assert_eq!(ts.len(), 24);
        assert!(ts.ends_with('Z'));
    }

    #[test]
    fn fact_names_are_snake_case() {
        use std::str::FromStr;
        assert_eq!(Fact::PostsCount.to_string(), "posts_count");
        assert_eq!(Fact::from_str("photo_uploads").unwrap(), Fact::PhotoUploads);
        assert!(Fact::from_str("ref_tags").is_err());
    }

    #[test]
    fn engine_owned_facts() {
        assert!(Fact::CompletedAchievements.is_engine_owned());
        assert!(Fact::Level.is_engine_owned());
        assert!(!Fact::PostsCount.is_engine_owned());
    }

    #[test]
    fn fact_value_views() {
        assert_eq!(FactValue::Flag(true).as_count(), 1);
        assert_eq!(FactValue::Flag(false).as_count(), 0);
        assert!(FactValue::Count(3).as_flag());
        assert!(!FactValue::Count(0).as_flag());
    }

    #[test]
    fn award_outcome_serializes_with_tag() {
        let json = serde_json::to_string(&AwardOutcome::Progressed { percent: 40 }).unwrap();
        assert_eq!(json, r#"{"outcome":"progressed","percent":40}"#);
    }
}
