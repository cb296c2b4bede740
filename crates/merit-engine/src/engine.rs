// SPDX-FileCopyrightText: 2026 Merit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Engine orchestrator: evaluates definitions for one user and hands
//! completions to the award ledger.
//!
//! Each definition is processed in isolation. A failure while evaluating
//! or awarding one achievement is logged and reported, and the pass moves
//! on to the next.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use merit_config::MeritConfig;
use merit_core::{
    ActivitySource, AwardOutcome, AwardReceipt, Definition, Fact, FactValue, MeritError,
    Namespace, UserId,
};
use merit_storage::queries::{definitions, levels, progress};
use merit_storage::Database;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::activity::ActivityKind;
use crate::evaluator::{evaluate, Evaluation, Requirement};
use crate::ledger::{AwardLedger, Credited, RewardPolicy};
use crate::level::LevelCurve;

/// Fact values for one user, cached for a single evaluation pass.
///
/// Only external facts are cached; engine-owned facts (completed count,
/// level, points) are read fresh on every lookup so awards made earlier in
/// the pass are visible.
pub struct FactSnapshot<'a> {
    user: UserId,
    source: &'a dyn ActivitySource,
    db: &'a Database,
    curve: &'a LevelCurve,
    cache: HashMap<Fact, FactValue>,
}

impl<'a> FactSnapshot<'a> {
    pub fn new(
        user: UserId,
        source: &'a dyn ActivitySource,
        db: &'a Database,
        curve: &'a LevelCurve,
    ) -> Self {
        Self {
            user,
            source,
            db,
            curve,
            cache: HashMap::new(),
        }
    }

    pub async fn get(&mut self, fact: Fact) -> Result<FactValue, MeritError> {
        match fact {
            Fact::CompletedAchievements => Ok(FactValue::Count(
                progress::completed_count(self.db, self.user).await?,
            )),
            Fact::Level => {
                let xp = levels::get(self.db, self.user)
                    .await?
                    .map_or(0, |s| s.total_xp.max(0).unsigned_abs());
                Ok(FactValue::Count(u64::from(self.curve.level_for(xp))))
            }
            Fact::TotalPoints => {
                let points = levels::get(self.db, self.user)
                    .await?
                    .map_or(0, |s| s.total_points.max(0).unsigned_abs());
                Ok(FactValue::Count(points))
            }
            external => {
                if let Some(value) = self.cache.get(&external) {
                    return Ok(*value);
                }
                let value = self.source.fact(self.user, external).await?;
                self.cache.insert(external, value);
                Ok(value)
            }
        }
    }
}

/// Everything one `check_achievements` call did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckReport {
    pub user_id: UserId,
    pub awarded: Vec<AwardReceipt>,
    /// (slug, percent) for achievements still in progress.
    pub progressed: Vec<(String, u8)>,
    /// (slug, reason) for achievements that cannot be evaluated.
    pub unevaluable: Vec<(String, String)>,
    /// (slug, error) for achievements whose evaluation or award failed.
    pub failures: Vec<(String, String)>,
    pub passes: u32,
}

impl CheckReport {
    fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            awarded: Vec::new(),
            progressed: Vec::new(),
            unevaluable: Vec::new(),
            failures: Vec::new(),
            passes: 0,
        }
    }
}

/// Result of reporting one activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityReport {
    pub credited: Credited,
    pub achievements: CheckReport,
}

/// Per-user result of a batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserBackfill {
    pub user_id: UserId,
    pub achievements: Vec<String>,
    pub badges: Vec<String>,
    pub failures: usize,
}

/// Totals of a batch run over many users.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackfillSummary {
    pub users_processed: usize,
    pub achievements_awarded: usize,
    pub badges_awarded: usize,
    pub results: Vec<UserBackfill>,
    /// Users whose run failed outright, with the error.
    pub failed_users: Vec<(UserId, String)>,
}

enum Status {
    Progressed(u8),
    Unevaluable(String),
    Failed(String),
}

pub struct Engine {
    pub(crate) db: Arc<Database>,
    source: Arc<dyn ActivitySource>,
    ledger: AwardLedger,
    count_metrics: BTreeMap<String, String>,
    enabled: bool,
    max_passes: u32,
}

impl Engine {
    pub fn new(db: Arc<Database>, source: Arc<dyn ActivitySource>, config: &MeritConfig) -> Self {
        let ledger = AwardLedger::new(
            db.clone(),
            LevelCurve::from_config(&config.levels),
            RewardPolicy::from_config(&config.engine),
        );
        Self {
            db,
            source,
            ledger,
            count_metrics: config.count_metrics.clone(),
            enabled: config.engine.enabled,
            max_passes: config.engine.max_passes.max(1),
        }
    }

    pub fn ledger(&self) -> &AwardLedger {
        &self.ledger
    }

    pub fn curve(&self) -> &LevelCurve {
        self.ledger.curve()
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn count_metrics(&self) -> &BTreeMap<String, String> {
        &self.count_metrics
    }

    fn snapshot(&self, user: UserId) -> FactSnapshot<'_> {
        FactSnapshot::new(user, self.source.as_ref(), &self.db, self.ledger.curve())
    }

    /// Evaluate one active achievement for `user` and award it if complete.
    ///
    /// Fails with [`MeritError::UnknownAchievement`] for unknown or inactive
    /// slugs without touching any state.
    pub async fn award(&self, user: UserId, slug: &str) -> Result<AwardOutcome, MeritError> {
        let def = definitions::find_active(&self.db, Namespace::Achievement, slug)
            .await?
            .ok_or_else(|| MeritError::UnknownAchievement {
                slug: slug.to_string(),
            })?;
        if !self.enabled {
            return Ok(AwardOutcome::Unevaluable {
                reason: "the achievement engine is disabled".to_string(),
            });
        }
        let mut facts = self.snapshot(user);
        self.process_achievement(user, &def, &mut facts).await
    }

    async fn process_achievement(
        &self,
        user: UserId,
        def: &Definition,
        facts: &mut FactSnapshot<'_>,
    ) -> Result<AwardOutcome, MeritError> {
        let row = self.ledger.ensure_progress(user, def).await?;
        if row.is_completed {
            debug!(user_id = %user, slug = %def.slug, "already completed");
            return Ok(AwardOutcome::AlreadyCompleted);
        }

        match self.evaluate(def, facts).await? {
            Evaluation::Unevaluable { reason } => {
                warn!(user_id = %user, slug = %def.slug, reason = %reason, "requirement unevaluable");
                Ok(AwardOutcome::Unevaluable { reason })
            }
            Evaluation::Progress {
                complete: true, ..
            } => self.ledger.complete_achievement(user, def).await,
            Evaluation::Progress { percent, .. } => {
                self.ledger.record_progress(user, def, percent).await?;
                Ok(AwardOutcome::Progressed { percent })
            }
        }
    }

    /// Evaluate a definition. Unevaluable errors become an outcome; storage
    /// and accessor failures propagate.
    async fn evaluate(
        &self,
        def: &Definition,
        facts: &mut FactSnapshot<'_>,
    ) -> Result<Evaluation, MeritError> {
        let requirement = Requirement::parse(def, &self.count_metrics);
        let value = match requirement.fact(&def.slug) {
            Ok(fact) => facts.get(fact).await,
            Err(e) => Err(e),
        };
        match value {
            Ok(value) => Ok(evaluate(&requirement, value)),
            Err(e) if e.is_unevaluable() => Ok(Evaluation::Unevaluable {
                reason: e.to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    /// Evaluate every active achievement for `user`.
    ///
    /// Passes repeat while the previous pass awarded something, up to the
    /// configured bound, so count/level/points requirements see credits made
    /// earlier in the same call.
    pub async fn check_achievements(&self, user: UserId) -> Result<CheckReport, MeritError> {
        let mut report = CheckReport::new(user);
        if !self.enabled {
            return Ok(report);
        }

        let defs = definitions::active(&self.db, Namespace::Achievement).await?;
        let mut done: HashSet<i64> = HashSet::new();
        let mut statuses: BTreeMap<String, Status> = BTreeMap::new();

        while report.passes < self.max_passes {
            report.passes += 1;
            let mut facts = self.snapshot(user);
            let mut awarded_this_pass = false;

            let pending: Vec<&Definition> =
                defs.iter().filter(|d| !done.contains(&d.id)).collect();
            for def in pending {
                match self.process_achievement(user, def, &mut facts).await {
                    Ok(AwardOutcome::Completed(receipt)) => {
                        done.insert(def.id);
                        statuses.remove(&def.slug);
                        report.awarded.push(receipt);
                        awarded_this_pass = true;
                    }
                    Ok(AwardOutcome::AlreadyCompleted) => {
                        done.insert(def.id);
                        statuses.remove(&def.slug);
                    }
                    Ok(AwardOutcome::Progressed { percent }) => {
                        statuses.insert(def.slug.clone(), Status::Progressed(percent));
                    }
                    Ok(AwardOutcome::Unevaluable { reason }) => {
                        statuses.insert(def.slug.clone(), Status::Unevaluable(reason));
                    }
                    Err(e) => {
                        warn!(user_id = %user, slug = %def.slug, error = %e, "achievement check failed");
                        statuses.insert(def.slug.clone(), Status::Failed(e.to_string()));
                    }
                }
            }

            if !awarded_this_pass {
                break;
            }
        }

        for (slug, status) in statuses {
            match status {
                Status::Progressed(percent) => report.progressed.push((slug, percent)),
                Status::Unevaluable(reason) => report.unevaluable.push((slug, reason)),
                Status::Failed(error) => report.failures.push((slug, error)),
            }
        }

        if !report.awarded.is_empty() {
            info!(
                user_id = %user,
                awarded = report.awarded.len(),
                passes = report.passes,
                "achievements awarded"
            );
        }
        Ok(report)
    }

    /// Evaluate every active badge `user` does not hold yet and return the
    /// newly awarded ones.
    pub async fn check_and_award_badges(&self, user: UserId) -> Result<Vec<Definition>, MeritError> {
        if !self.enabled {
            return Ok(Vec::new());
        }
        let held: HashSet<i64> = progress::badges_for_user(&self.db, user)
            .await?
            .into_iter()
            .map(|b| b.definition.id)
            .collect();
        let defs = definitions::active(&self.db, Namespace::Badge).await?;
        let mut facts = self.snapshot(user);
        let mut earned = Vec::new();

        for def in defs.into_iter().filter(|d| !held.contains(&d.id)) {
            let outcome = match self.evaluate(&def, &mut facts).await {
                Ok(Evaluation::Progress { complete: true, .. }) => {
                    self.ledger.award_badge(user, &def).await
                }
                Ok(Evaluation::Progress { .. }) => continue,
                Ok(Evaluation::Unevaluable { reason }) => {
                    warn!(user_id = %user, slug = %def.slug, reason = %reason, "badge requirement unevaluable");
                    continue;
                }
                Err(e) => Err(e),
            };
            match outcome {
                Ok(AwardOutcome::Completed(_)) => earned.push(def),
                Ok(_) => {}
                Err(e) => {
                    warn!(user_id = %user, slug = %def.slug, error = %e, "badge check failed");
                }
            }
        }
        Ok(earned)
    }

    /// Evaluate and award one active badge by slug. Badges keep no partial
    /// progress, so an incomplete requirement reports its percent only.
    pub async fn award_badge(&self, user: UserId, slug: &str) -> Result<AwardOutcome, MeritError> {
        let def = definitions::find_active(&self.db, Namespace::Badge, slug)
            .await?
            .ok_or_else(|| MeritError::UnknownBadge {
                slug: slug.to_string(),
            })?;
        if !self.enabled {
            return Ok(AwardOutcome::Unevaluable {
                reason: "the achievement engine is disabled".to_string(),
            });
        }
        let held = progress::badges_for_user(&self.db, user)
            .await?
            .iter()
            .any(|b| b.definition.id == def.id);
        if held {
            return Ok(AwardOutcome::AlreadyCompleted);
        }

        let mut facts = self.snapshot(user);
        match self.evaluate(&def, &mut facts).await? {
            Evaluation::Progress {
                complete: true, ..
            } => self.ledger.award_badge(user, &def).await,
            Evaluation::Progress { percent, .. } => Ok(AwardOutcome::Progressed { percent }),
            Evaluation::Unevaluable { reason } => {
                warn!(user_id = %user, slug = %def.slug, reason = %reason, "badge requirement unevaluable");
                Ok(AwardOutcome::Unevaluable { reason })
            }
        }
    }

    /// Credit the fixed reward for an activity, then re-check achievements.
    pub async fn record_activity(
        &self,
        user: UserId,
        kind: ActivityKind,
    ) -> Result<ActivityReport, MeritError> {
        let credited = if self.enabled {
            let (xp, points) = kind.reward();
            self.ledger
                .credit_activity(user, &kind.to_string(), xp, points)
                .await?
        } else {
            let level = self.snapshot(user).get(Fact::Level).await?.as_count();
            let level = u32::try_from(level).unwrap_or(u32::MAX);
            Credited {
                xp: 0,
                points: 0,
                level_before: level,
                level_after: level,
            }
        };
        let achievements = self.check_achievements(user).await?;
        Ok(ActivityReport {
            credited,
            achievements,
        })
    }

    /// Run achievement and badge checks for each user in turn.
    ///
    /// A user whose run fails is recorded and skipped; the batch continues.
    pub async fn backfill(&self, users: &[UserId]) -> BackfillSummary {
        let mut summary = BackfillSummary::default();
        for &user in users {
            summary.users_processed += 1;
            let achievements = match self.check_achievements(user).await {
                Ok(report) => report,
                Err(e) => {
                    warn!(user_id = %user, error = %e, "backfill failed for user");
                    summary.failed_users.push((user, e.to_string()));
                    continue;
                }
            };
            let badges = match self.check_and_award_badges(user).await {
                Ok(badges) => badges,
                Err(e) => {
                    warn!(user_id = %user, error = %e, "badge backfill failed for user");
                    summary.failed_users.push((user, e.to_string()));
                    Vec::new()
                }
            };
            summary.achievements_awarded += achievements.awarded.len();
            summary.badges_awarded += badges.len();
            summary.results.push(UserBackfill {
                user_id: user,
                achievements: achievements.awarded.into_iter().map(|r| r.slug).collect(),
                badges: badges.into_iter().map(|d| d.slug).collect(),
                failures: achievements.failures.len(),
            });
        }
        info!(
            users = summary.users_processed,
            achievements = summary.achievements_awarded,
            badges = summary.badges_awarded,
            failed = summary.failed_users.len(),
            "backfill finished"
        );
        summary
    }

    /// Backfill every user the activity source reports as active.
    pub async fn backfill_all(&self) -> Result<BackfillSummary, MeritError> {
        let users = self.source.active_users().await?;
        Ok(self.backfill(&users).await)
    }
}
