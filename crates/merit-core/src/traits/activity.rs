// SPDX-FileCopyrightText: 2026 Merit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Activity accessor trait: read-only facts owned by external domains.

use async_trait::async_trait;

use crate::error::MeritError;
use crate::types::{Fact, FactValue, UserId};

/// Read-only access to activity facts produced by the host platform
/// (posts, articles, follows, logins, course completions, profiles).
///
/// Implementations query the owning domain on every call and hold no cache.
/// The engine caches values for the duration of one orchestration pass.
#[async_trait]
pub trait ActivitySource: Send + Sync + 'static {
    /// Human-readable name used in logs.
    fn name(&self) -> &str;

    /// Current value of `fact` for `user`.
    ///
    /// Returns [`MeritError::UnknownFact`] for facts this source cannot
    /// produce, including the engine-owned ones.
    async fn fact(&self, user: UserId, fact: Fact) -> Result<FactValue, MeritError>;

    /// Users eligible for batch re-evaluation (backfills).
    async fn active_users(&self) -> Result<Vec<UserId>, MeritError>;
}
