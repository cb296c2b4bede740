// SPDX-FileCopyrightText: 2026 Merit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Merit achievement engine.
//!
//! Holds the shared error type, the domain types that cross crate
//! boundaries, and the [`ActivitySource`] trait through which the engine
//! reads facts owned by the host platform.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::MeritError;
pub use traits::ActivitySource;
pub use types::{
    AwardOutcome, AwardReceipt, Definition, Fact, FactValue, LevelState, Namespace, Rarity,
    UserId,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merit_error_has_all_variants() {
        let _config = MeritError::Config("test".into());
        let _storage = MeritError::storage(std::io::Error::other("test"));
        let _fact = MeritError::UnknownFact {
            fact: "ref_tags".into(),
        };
        let _achievement = MeritError::UnknownAchievement {
            slug: "nope".into(),
        };
        let _badge = MeritError::UnknownBadge { slug: "nope".into() };
        let _requirement = MeritError::InvalidRequirement {
            slug: "x".into(),
            reason: "zero threshold".into(),
        };
        let _internal = MeritError::Internal("test".into());
    }

    #[test]
    fn unevaluable_errors_are_classified() {
        assert!(
            MeritError::UnknownFact {
                fact: "x".into()
            }
            .is_unevaluable()
        );
        assert!(!MeritError::storage(std::io::Error::other("disk")).is_unevaluable());
        assert!(
            !MeritError::UnknownAchievement {
                slug: "x".into()
            }
            .is_unevaluable()
        );
    }

    #[test]
    fn namespace_display_and_parse() {
        use std::str::FromStr;
        assert_eq!(Namespace::Badge.to_string(), "badge");
        assert_eq!(
            Namespace::from_str("achievement").unwrap(),
            Namespace::Achievement
        );
    }

    #[test]
    fn rarity_orders_common_to_legendary() {
        assert!(Rarity::Common < Rarity::Legendary);
        assert_eq!(Rarity::default(), Rarity::Common);
    }

    #[test]
    fn activity_source_is_object_safe() {
        fn _assert_object_safe(_: &dyn ActivitySource) {}
    }
}
