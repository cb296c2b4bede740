// SPDX-FileCopyrightText: 2026 Merit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed XP/points rewards for everyday platform activity.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// An activity the host platform reports to the engine.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    ArticleCreate,
    ArticleEdit,
    WikiCreate,
    WikiEdit,
    WikiVisit,
    UserRegistered,
    UserLogin,
    FriendAdd,
    CommentWrite,
    LikeGiven,
    LikeReceived,
    DailyActive,
    DiscussionStart,
    HelpOther,
    MentionReceived,
    WikiModerate,
    WikiExpert,
    ContentRating,
}

impl ActivityKind {
    /// Base `(xp, points)` before multipliers.
    pub fn reward(self) -> (i64, i64) {
        match self {
            ActivityKind::ArticleCreate => (50, 10),
            ActivityKind::ArticleEdit => (25, 5),
            ActivityKind::WikiCreate => (30, 8),
            ActivityKind::WikiEdit => (15, 3),
            ActivityKind::WikiVisit => (2, 0),
            ActivityKind::UserRegistered => (100, 20),
            ActivityKind::UserLogin => (5, 0),
            ActivityKind::FriendAdd => (20, 5),
            ActivityKind::CommentWrite => (10, 2),
            ActivityKind::LikeGiven => (1, 0),
            ActivityKind::LikeReceived => (2, 1),
            ActivityKind::DailyActive => (10, 0),
            ActivityKind::DiscussionStart => (15, 3),
            ActivityKind::HelpOther => (25, 5),
            ActivityKind::MentionReceived => (10, 2),
            ActivityKind::WikiModerate => (20, 4),
            ActivityKind::WikiExpert => (50, 10),
            ActivityKind::ContentRating => (5, 1),
        }
    }
}
