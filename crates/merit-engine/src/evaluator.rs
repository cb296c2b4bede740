// SPDX-FileCopyrightText: 2026 Merit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Requirement evaluation.
//!
//! A definition's `(requirement_type, requirement_value)` pair is parsed
//! into a closed [`Requirement`] once, then evaluated as a pure function of
//! a single fact value. Anything that cannot be evaluated (unsupported tag,
//! `count` without a bound metric, zero threshold) yields
//! [`Evaluation::Unevaluable`] and never completes.

use std::collections::BTreeMap;
use std::str::FromStr;

use merit_core::{Definition, Fact, FactValue, MeritError};
use serde::{Deserialize, Serialize};

/// A parsed requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Requirement {
    FirstLogin,
    FriendsCount { threshold: u64 },
    PostsCount { threshold: u64 },
    ArticleCount { threshold: u64 },
    StatusCount { threshold: u64 },
    ProfileComplete,
    DaysSinceJoin { threshold: u64 },
    AchievementCount { threshold: u64 },
    Level { threshold: u64 },
    Points { threshold: u64 },
    /// Generic counter whose metric is bound per slug in configuration.
    Count { metric: Option<Fact>, threshold: u64 },
    /// A tag no evaluator exists for (e.g. `ref_tags`, `bug_reports`).
    Unsupported { tag: String },
}

/// Result of evaluating one requirement against one fact value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Evaluation {
    Progress { percent: u8, complete: bool },
    Unevaluable { reason: String },
}

impl Requirement {
    /// Parse a definition's requirement. `count_metrics` maps slugs of
    /// generic `count` definitions to the fact they count.
    pub fn parse(def: &Definition, count_metrics: &BTreeMap<String, String>) -> Self {
        // Negative thresholds are treated like zero: unevaluable.
        let threshold = u64::try_from(def.requirement_value).unwrap_or(0);
        match def.requirement_type.as_str() {
            "first_login" => Requirement::FirstLogin,
            "friends_count" => Requirement::FriendsCount { threshold },
            "posts_count" => Requirement::PostsCount { threshold },
            "article_count" => Requirement::ArticleCount { threshold },
            "status_count" => Requirement::StatusCount { threshold },
            "profile_complete" => Requirement::ProfileComplete,
            "days_since_join" => Requirement::DaysSinceJoin { threshold },
            "achievement_count" => Requirement::AchievementCount { threshold },
            "level" => Requirement::Level { threshold },
            "points" => Requirement::Points { threshold },
            "count" => Requirement::Count {
                metric: count_metrics
                    .get(&def.slug)
                    .and_then(|name| Fact::from_str(name).ok())
                    .filter(|fact| !fact.is_engine_owned()),
                threshold,
            },
            other => Requirement::Unsupported {
                tag: other.to_string(),
            },
        }
    }

    /// Numeric threshold, for the kinds that have one.
    pub fn threshold(&self) -> Option<u64> {
        match self {
            Requirement::FriendsCount { threshold }
            | Requirement::PostsCount { threshold }
            | Requirement::ArticleCount { threshold }
            | Requirement::StatusCount { threshold }
            | Requirement::DaysSinceJoin { threshold }
            | Requirement::AchievementCount { threshold }
            | Requirement::Level { threshold }
            | Requirement::Points { threshold }
            | Requirement::Count { threshold, .. } => Some(*threshold),
            Requirement::FirstLogin | Requirement::ProfileComplete | Requirement::Unsupported { .. } => {
                None
            }
        }
    }

    /// The fact this requirement is evaluated against.
    ///
    /// Errors are always unevaluable ([`MeritError::is_unevaluable`]).
    pub fn fact(&self, slug: &str) -> Result<Fact, MeritError> {
        if self.threshold() == Some(0) {
            return Err(MeritError::InvalidRequirement {
                slug: slug.to_string(),
                reason: "threshold must be positive".to_string(),
            });
        }
        match self {
            Requirement::FirstLogin => Ok(Fact::LoginCount),
            Requirement::FriendsCount { .. } => Ok(Fact::FriendsCount),
            Requirement::PostsCount { .. } => Ok(Fact::PostsCount),
            Requirement::ArticleCount { .. } => Ok(Fact::ArticleCount),
            Requirement::StatusCount { .. } => Ok(Fact::StatusCount),
            Requirement::ProfileComplete => Ok(Fact::ProfileComplete),
            Requirement::DaysSinceJoin { .. } => Ok(Fact::DaysSinceJoin),
            Requirement::AchievementCount { .. } => Ok(Fact::CompletedAchievements),
            Requirement::Level { .. } => Ok(Fact::Level),
            Requirement::Points { .. } => Ok(Fact::TotalPoints),
            Requirement::Count {
                metric: Some(fact), ..
            } => Ok(*fact),
            Requirement::Count { metric: None, .. } => Err(MeritError::InvalidRequirement {
                slug: slug.to_string(),
                reason: "no metric is bound to this count requirement".to_string(),
            }),
            Requirement::Unsupported { tag } => Err(MeritError::UnknownFact { fact: tag.clone() }),
        }
    }
}

/// Percentage of `threshold` reached by `value`, capped at 100.
pub fn percent_of(value: u64, threshold: u64) -> u8 {
    if threshold == 0 {
        return 0;
    }
    let pct = (u128::from(value) * 100) / u128::from(threshold);
    u8::try_from(pct.min(100)).unwrap_or(100)
}

/// Evaluate a requirement against the value of its fact.
pub fn evaluate(requirement: &Requirement, value: FactValue) -> Evaluation {
    match requirement {
        Requirement::FirstLogin => boolean(value.as_count() >= 1),
        Requirement::ProfileComplete => boolean(value.as_flag()),
        Requirement::Count { metric: None, .. } => Evaluation::Unevaluable {
            reason: "no metric is bound to this count requirement".to_string(),
        },
        Requirement::Unsupported { tag } => Evaluation::Unevaluable {
            reason: format!("unsupported requirement type `{tag}`"),
        },
        numeric => match numeric.threshold() {
            Some(0) | None => Evaluation::Unevaluable {
                reason: "threshold must be positive".to_string(),
            },
            Some(threshold) => {
                let metric = value.as_count();
                Evaluation::Progress {
                    percent: percent_of(metric, threshold),
                    complete: metric >= threshold,
                }
            }
        },
    }
}

fn boolean(done: bool) -> Evaluation {
    Evaluation::Progress {
        percent: if done { 100 } else { 0 },
        complete: done,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use merit_core::Rarity;
    use proptest::prelude::*;

    fn def(slug: &str, requirement_type: &str, value: i64) -> Definition {
        Definition {
            id: 1,
            slug: slug.to_string(),
            name: slug.to_string(),
            description: String::new(),
            category: "general".to_string(),
            rarity: Rarity::Common,
            requirement_type: requirement_type.to_string(),
            requirement_value: value,
            xp_reward: 10,
            points_reward: 1,
            is_active: true,
            sort_order: 0,
        }
    }

    fn no_metrics() -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    #[test]
    fn zero_posts_is_zero_progress() {
        let req = Requirement::parse(&def("prolific", "posts_count", 20), &no_metrics());
        assert_eq!(
            evaluate(&req, FactValue::Count(0)),
            Evaluation::Progress { percent: 0, complete: false }
        );
    }

    #[test]
    fn reaching_threshold_completes() {
        let req = Requirement::parse(&def("prolific", "posts_count", 20), &no_metrics());
        assert_eq!(
            evaluate(&req, FactValue::Count(20)),
            Evaluation::Progress { percent: 100, complete: true }
        );
        assert_eq!(
            evaluate(&req, FactValue::Count(7)),
            Evaluation::Progress { percent: 35, complete: false }
        );
    }

    #[test]
    fn first_login_is_boolean() {
        let req = Requirement::parse(&def("first-steps", "first_login", 0), &no_metrics());
        assert_eq!(req.fact("first-steps").unwrap(), Fact::LoginCount);
        assert_eq!(
            evaluate(&req, FactValue::Count(0)),
            Evaluation::Progress { percent: 0, complete: false }
        );
        assert_eq!(
            evaluate(&req, FactValue::Count(12)),
            Evaluation::Progress { percent: 100, complete: true }
        );
    }

    #[test]
    fn profile_complete_reads_flag() {
        let req = Requirement::parse(&def("me", "profile_complete", 1), &no_metrics());
        assert!(matches!(
            evaluate(&req, FactValue::Flag(true)),
            Evaluation::Progress { complete: true, .. }
        ));
    }

    #[test]
    fn unsupported_tag_is_unevaluable() {
        let req = Requirement::parse(&def("tagger", "ref_tags", 5), &no_metrics());
        assert_eq!(req, Requirement::Unsupported { tag: "ref_tags".into() });
        assert!(req.fact("tagger").unwrap_err().is_unevaluable());
        assert!(matches!(
            evaluate(&req, FactValue::Count(1_000)),
            Evaluation::Unevaluable { .. }
        ));
    }

    #[test]
    fn unbound_count_is_unevaluable() {
        let req = Requirement::parse(&def("mystery", "count", 3), &no_metrics());
        assert_eq!(req, Requirement::Count { metric: None, threshold: 3 });
        assert!(matches!(
            req.fact("mystery"),
            Err(MeritError::InvalidRequirement { .. })
        ));
        assert!(matches!(
            evaluate(&req, FactValue::Count(99)),
            Evaluation::Unevaluable { .. }
        ));
    }

    #[test]
    fn bound_count_uses_its_metric() {
        let metrics = BTreeMap::from([("photo-pioneer".to_string(), "photo_uploads".to_string())]);
        let req = Requirement::parse(&def("photo-pioneer", "count", 4), &metrics);
        assert_eq!(req.fact("photo-pioneer").unwrap(), Fact::PhotoUploads);
        assert_eq!(
            evaluate(&req, FactValue::Count(1)),
            Evaluation::Progress { percent: 25, complete: false }
        );
    }

    #[test]
    fn count_cannot_bind_engine_owned_fact() {
        let metrics = BTreeMap::from([("loop".to_string(), "level".to_string())]);
        let req = Requirement::parse(&def("loop", "count", 4), &metrics);
        assert_eq!(req, Requirement::Count { metric: None, threshold: 4 });
    }

    #[test]
    fn zero_or_negative_threshold_is_unevaluable() {
        for value in [0, -5] {
            let req = Requirement::parse(&def("free", "posts_count", value), &no_metrics());
            assert!(req.fact("free").unwrap_err().is_unevaluable());
            assert!(matches!(
                evaluate(&req, FactValue::Count(0)),
                Evaluation::Unevaluable { .. }
            ));
        }
    }

    #[test]
    fn engine_owned_kinds_map_to_engine_facts() {
        let m = no_metrics();
        assert_eq!(
            Requirement::parse(&def("a", "achievement_count", 5), &m).fact("a").unwrap(),
            Fact::CompletedAchievements
        );
        assert_eq!(
            Requirement::parse(&def("b", "level", 5), &m).fact("b").unwrap(),
            Fact::Level
        );
        assert_eq!(
            Requirement::parse(&def("c", "points", 5), &m).fact("c").unwrap(),
            Fact::TotalPoints
        );
    }

    proptest! {
        #[test]
        fn progress_stays_within_bounds(value in any::<u64>(), threshold in 1u64..) {
            let req = Requirement::PostsCount { threshold };
            match evaluate(&req, FactValue::Count(value)) {
                Evaluation::Progress { percent, complete } => {
                    prop_assert!(percent <= 100);
                    prop_assert_eq!(complete, value >= threshold);
                    prop_assert_eq!(complete, percent == 100);
                }
                other => prop_assert!(false, "unexpected {:?}", other),
            }
        }

        #[test]
        fn progress_is_monotone_in_metric(a in 0u64..1_000_000, b in 0u64..1_000_000, t in 1u64..10_000) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(percent_of(lo, t) <= percent_of(hi, t));
        }
    }
}
