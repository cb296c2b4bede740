// SPDX-FileCopyrightText: 2026 Merit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Achievement and leveling engine.
//!
//! - [`evaluator`]: requirement parsing and pure evaluation
//! - [`level`]: the XP-to-level curve
//! - [`ledger`]: atomic, idempotent award transactions
//! - [`engine`]: per-user orchestration and batch backfills
//! - [`leaderboard`]: ranked read model
//! - [`views`]: level, holdings, notification, statistics, and audit reads

pub mod activity;
pub mod engine;
pub mod evaluator;
pub mod leaderboard;
pub mod ledger;
pub mod level;
pub mod views;

pub use activity::ActivityKind;
pub use engine::{ActivityReport, BackfillSummary, CheckReport, Engine, FactSnapshot, UserBackfill};
pub use evaluator::{evaluate, Evaluation, Requirement};
pub use leaderboard::LeaderboardEntry;
pub use ledger::{AwardLedger, Credited, RewardPolicy};
pub use level::{LevelCurve, LevelProgress};
pub use merit_storage::queries::stats::AchievementStats;
pub use views::DefinitionAudit;
