// SPDX-FileCopyrightText: 2026 Merit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Merit achievement engine.

use thiserror::Error;

/// The primary error type used across all Merit crates.
///
/// Races on an already-completed award and unevaluable requirements are not
/// errors; the engine reports them as outcomes instead.
#[derive(Debug, Error)]
pub enum MeritError {
    /// Configuration errors (invalid TOML, out-of-range values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Persistence failures. Any award transaction that hits one is rolled back.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The activity accessor does not know how to produce this fact.
    #[error("unknown activity fact `{fact}`")]
    UnknownFact { fact: String },

    /// No active achievement definition with this slug exists.
    #[error("unknown or inactive achievement `{slug}`")]
    UnknownAchievement { slug: String },

    /// No active badge definition with this slug exists.
    #[error("unknown or inactive badge `{slug}`")]
    UnknownBadge { slug: String },

    /// A definition carries a requirement that cannot be interpreted.
    #[error("invalid requirement on `{slug}`: {reason}")]
    InvalidRequirement { slug: String, reason: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MeritError {
    /// Wrap any error as a storage failure.
    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        MeritError::Storage {
            source: Box::new(err),
        }
    }

    /// True for errors that only make one requirement unevaluable.
    pub fn is_unevaluable(&self) -> bool {
        matches!(
            self,
            MeritError::UnknownFact { .. } | MeritError::InvalidRequirement { .. }
        )
    }
}
