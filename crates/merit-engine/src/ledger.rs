// SPDX-FileCopyrightText: 2026 Merit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Award ledger: the only writer of completions, XP, points, and levels.
//!
//! A completing award runs as one `BEGIN IMMEDIATE` transaction: a
//! compare-and-set flip of the completion flag (or an `INSERT OR IGNORE` for
//! badges), the XP/points credit, the level recompute, the activity-log row,
//! and the notifications. If the flip changes no row, someone else already
//! completed the award and the transaction is dropped without effect.

use std::sync::Arc;

use merit_config::EngineConfig;
use merit_core::types::now_timestamp;
use merit_core::{AwardOutcome, AwardReceipt, Definition, MeritError, Namespace, UserId};
use merit_storage::queries::progress;
use merit_storage::{map_tr_err, Database, NotificationKind, ProgressRow};
use rusqlite::{params, Transaction, TransactionBehavior};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::level::LevelCurve;

/// How credits are scaled and what side effects they produce.
#[derive(Debug, Clone, PartialEq)]
pub struct RewardPolicy {
    pub xp_multiplier: f64,
    pub points_multiplier: f64,
    pub level_system_enabled: bool,
    pub notifications_enabled: bool,
}

impl RewardPolicy {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            xp_multiplier: config.xp_multiplier,
            points_multiplier: config.points_multiplier,
            level_system_enabled: config.level_system_enabled,
            notifications_enabled: config.notifications_enabled,
        }
    }

    fn xp(&self, base: i64) -> i64 {
        if self.level_system_enabled {
            scale(base, self.xp_multiplier)
        } else {
            0
        }
    }

    fn points(&self, base: i64) -> i64 {
        scale(base, self.points_multiplier)
    }
}

impl Default for RewardPolicy {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

/// Truncating multiply; negative or non-finite results credit nothing.
fn scale(base: i64, multiplier: f64) -> i64 {
    let scaled = (base as f64 * multiplier).trunc();
    if scaled.is_finite() && scaled > 0.0 {
        scaled as i64
    } else {
        0
    }
}

/// What a plain activity credit changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credited {
    pub xp: i64,
    pub points: i64,
    pub level_before: u32,
    pub level_after: u32,
}

pub struct AwardLedger {
    db: Arc<Database>,
    curve: LevelCurve,
    policy: RewardPolicy,
}

impl AwardLedger {
    pub fn new(db: Arc<Database>, curve: LevelCurve, policy: RewardPolicy) -> Self {
        Self { db, curve, policy }
    }

    pub fn curve(&self) -> &LevelCurve {
        &self.curve
    }

    /// Progress row for the pair, created at 0% if absent.
    pub async fn ensure_progress(
        &self,
        user: UserId,
        def: &Definition,
    ) -> Result<ProgressRow, MeritError> {
        progress::ensure(&self.db, user, def.id).await
    }

    /// Store progress short of completion. No-op on completed rows.
    pub async fn record_progress(
        &self,
        user: UserId,
        def: &Definition,
        percent: u8,
    ) -> Result<bool, MeritError> {
        let updated = progress::record(&self.db, user, def.id, percent).await?;
        debug!(user_id = %user, slug = %def.slug, percent, updated, "progress recorded");
        Ok(updated)
    }

    /// Complete an achievement and credit its rewards atomically.
    ///
    /// Returns [`AwardOutcome::AlreadyCompleted`] if the row was already
    /// completed, including by a concurrent caller.
    pub async fn complete_achievement(
        &self,
        user: UserId,
        def: &Definition,
    ) -> Result<AwardOutcome, MeritError> {
        let award = Award::new(Namespace::Achievement, def, &self.policy);
        let curve = self.curve.clone();
        let policy = self.policy.clone();
        let achievement_id = def.id;

        let receipt = self
            .db
            .connection()
            .call(move |conn| {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                tx.execute(
                    "INSERT OR IGNORE INTO user_achievements (user_id, achievement_id) VALUES (?1, ?2)",
                    params![user.0, achievement_id],
                )?;
                let flipped = tx.execute(
                    "UPDATE user_achievements \
                     SET is_completed = 1, progress_percent = 100, completed_at = ?3, updated_at = ?3 \
                     WHERE user_id = ?1 AND achievement_id = ?2 AND is_completed = 0",
                    params![user.0, achievement_id, award.at],
                )?;
                if flipped == 0 {
                    return Ok(None);
                }
                let receipt = award.credit(&tx, user, &curve, &policy)?;
                tx.commit()?;
                Ok(Some(receipt))
            })
            .await
            .map_err(map_tr_err)?;

        Ok(self.finish(user, receipt))
    }

    /// Award a badge and credit its rewards atomically.
    pub async fn award_badge(
        &self,
        user: UserId,
        def: &Definition,
    ) -> Result<AwardOutcome, MeritError> {
        let award = Award::new(Namespace::Badge, def, &self.policy);
        let curve = self.curve.clone();
        let policy = self.policy.clone();
        let badge_id = def.id;

        let receipt = self
            .db
            .connection()
            .call(move |conn| {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                let inserted = tx.execute(
                    "INSERT OR IGNORE INTO user_badges (user_id, badge_id, awarded_at) \
                     VALUES (?1, ?2, ?3)",
                    params![user.0, badge_id, award.at],
                )?;
                if inserted == 0 {
                    return Ok(None);
                }
                let receipt = award.credit(&tx, user, &curve, &policy)?;
                tx.commit()?;
                Ok(Some(receipt))
            })
            .await
            .map_err(map_tr_err)?;

        Ok(self.finish(user, receipt))
    }

    /// Credit a fixed activity reward (scaled by the policy).
    pub async fn credit_activity(
        &self,
        user: UserId,
        activity: &str,
        xp: i64,
        points: i64,
    ) -> Result<Credited, MeritError> {
        let activity = activity.to_string();
        let curve = self.curve.clone();
        let policy = self.policy.clone();
        let (xp, points) = (policy.xp(xp), policy.points(points));

        let credited = self
            .db
            .connection()
            .call(move |conn| {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                let credited = apply_credit(&tx, user, &curve, &policy, &activity, None, xp, points)?;
                tx.commit()?;
                Ok(credited)
            })
            .await
            .map_err(map_tr_err)?;

        debug!(
            user_id = %user,
            xp = credited.xp,
            points = credited.points,
            level = credited.level_after,
            "activity credited"
        );
        Ok(credited)
    }

    fn finish(&self, user: UserId, receipt: Option<AwardReceipt>) -> AwardOutcome {
        match receipt {
            Some(receipt) => {
                info!(
                    user_id = %user,
                    namespace = %receipt.namespace,
                    slug = %receipt.slug,
                    xp = receipt.xp_awarded,
                    points = receipt.points_awarded,
                    level = receipt.level_after,
                    "award completed"
                );
                AwardOutcome::Completed(receipt)
            }
            None => {
                debug!(user_id = %user, "award already completed");
                AwardOutcome::AlreadyCompleted
            }
        }
    }
}

/// The owned pieces of a definition an award transaction needs.
struct Award {
    namespace: Namespace,
    slug: String,
    name: String,
    xp: i64,
    points: i64,
    at: String,
}

impl Award {
    fn new(namespace: Namespace, def: &Definition, policy: &RewardPolicy) -> Self {
        Self {
            namespace,
            slug: def.slug.clone(),
            name: def.name.clone(),
            xp: policy.xp(def.xp_reward),
            points: policy.points(def.points_reward),
            at: now_timestamp(),
        }
    }

    fn credit(
        &self,
        tx: &Transaction<'_>,
        user: UserId,
        curve: &LevelCurve,
        policy: &RewardPolicy,
    ) -> rusqlite::Result<AwardReceipt> {
        let (activity, kind, title, message) = match self.namespace {
            Namespace::Achievement => (
                "achievement_unlocked",
                NotificationKind::AchievementUnlocked,
                "Achievement Unlocked!",
                format!("You've earned the '{}' achievement!", self.name),
            ),
            Namespace::Badge => (
                "badge_earned",
                NotificationKind::BadgeEarned,
                "Badge Earned!",
                format!("You've earned the '{}' badge!", self.name),
            ),
        };
        let credited = apply_credit(
            tx,
            user,
            curve,
            policy,
            activity,
            Some(&self.slug),
            self.xp,
            self.points,
        )?;
        if policy.notifications_enabled {
            notify(tx, user, kind, Some(&self.slug), title, &message)?;
        }
        Ok(AwardReceipt {
            user_id: user,
            namespace: self.namespace,
            slug: self.slug.clone(),
            name: self.name.clone(),
            xp_awarded: credited.xp,
            points_awarded: credited.points,
            level_before: credited.level_before,
            level_after: credited.level_after,
            awarded_at: self.at.clone(),
        })
    }
}

/// Credit already-scaled XP/points inside `tx` and rewrite the level row.
///
/// The level and the achievement count are recomputed from scratch rather
/// than patched, so they cannot drift from XP and the completed rows.
#[allow(clippy::too_many_arguments)]
fn apply_credit(
    tx: &Transaction<'_>,
    user: UserId,
    curve: &LevelCurve,
    policy: &RewardPolicy,
    activity: &str,
    subject_slug: Option<&str>,
    xp: i64,
    points: i64,
) -> rusqlite::Result<Credited> {
    tx.execute(
        "INSERT OR IGNORE INTO user_levels (user_id) VALUES (?1)",
        params![user.0],
    )?;
    let (old_xp, old_points): (i64, i64) = tx.query_row(
        "SELECT total_xp, total_points FROM user_levels WHERE user_id = ?1",
        params![user.0],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    let total_xp = old_xp.saturating_add(xp);
    let total_points = old_points.saturating_add(points);
    let level_before = curve.level_for(old_xp.max(0).unsigned_abs());
    let level_after = curve.level_for(total_xp.max(0).unsigned_abs());

    tx.execute(
        "UPDATE user_levels SET total_xp = ?2, total_points = ?3, level = ?4, \
         total_achievements = (SELECT COUNT(*) FROM user_achievements \
                               WHERE user_id = ?1 AND is_completed = 1), \
         updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') \
         WHERE user_id = ?1",
        params![user.0, total_xp, total_points, level_after],
    )?;
    tx.execute(
        "INSERT INTO user_activity_log (user_id, activity_type, subject_slug, xp_earned, points_earned) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![user.0, activity, subject_slug, xp, points],
    )?;

    if level_after > level_before && policy.notifications_enabled {
        notify(
            tx,
            user,
            NotificationKind::LevelUp,
            None,
            "Level Up!",
            &format!("Congratulations! You've reached level {level_after}!"),
        )?;
    }

    Ok(Credited {
        xp,
        points,
        level_before,
        level_after,
    })
}

fn notify(
    tx: &Transaction<'_>,
    user: UserId,
    kind: NotificationKind,
    subject_slug: Option<&str>,
    title: &str,
    message: &str,
) -> rusqlite::Result<()> {
    tx.execute(
        "INSERT INTO achievement_notifications \
         (user_id, notification_type, subject_slug, title, message) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![user.0, kind.to_string(), subject_slug, title, message],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use merit_storage::queries::{definitions, levels, notifications};
    use merit_storage::NewDefinition;

    async fn setup(policy: RewardPolicy) -> (AwardLedger, Arc<Database>, Definition) {
        let db = Arc::new(Database::open_in_memory().await.unwrap());
        definitions::insert(
            &db,
            Namespace::Achievement,
            &NewDefinition::new("first-steps", "first_login", 0).rewards(150, 10),
        )
        .await
        .unwrap();
        let def = definitions::find_active(&db, Namespace::Achievement, "first-steps")
            .await
            .unwrap()
            .unwrap();
        let ledger = AwardLedger::new(db.clone(), LevelCurve::default(), policy);
        (ledger, db, def)
    }

    #[tokio::test]
    async fn completion_credits_everything_once() {
        let (ledger, db, def) = setup(RewardPolicy::default()).await;
        let user = UserId(1);

        let AwardOutcome::Completed(receipt) = ledger.complete_achievement(user, &def).await.unwrap()
        else {
            panic!("expected completion");
        };
        assert_eq!(receipt.xp_awarded, 150);
        assert_eq!(receipt.points_awarded, 10);
        assert_eq!((receipt.level_before, receipt.level_after), (1, 2));
        assert!(receipt.leveled_up());

        assert_eq!(
            ledger.complete_achievement(user, &def).await.unwrap(),
            AwardOutcome::AlreadyCompleted
        );

        let state = levels::get(&db, user).await.unwrap().unwrap();
        assert_eq!(state.total_xp, 150);
        assert_eq!(state.total_points, 10);
        assert_eq!(state.total_achievements, 1);
        assert_eq!(state.level, 2);

        let kinds: Vec<NotificationKind> = notifications::for_user(&db, user, 10, false)
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![NotificationKind::AchievementUnlocked, NotificationKind::LevelUp]
        );
    }

    #[tokio::test]
    async fn record_progress_never_touches_completed_rows() {
        let (ledger, db, def) = setup(RewardPolicy::default()).await;
        let user = UserId(2);
        ledger.complete_achievement(user, &def).await.unwrap();
        let before = progress::get(&db, user, def.id).await.unwrap().unwrap();

        assert!(!ledger.record_progress(user, &def, 10).await.unwrap());
        let after = progress::get(&db, user, def.id).await.unwrap().unwrap();
        assert_eq!(after.progress_percent, 100);
        assert_eq!(after.completed_at, before.completed_at);
    }

    #[tokio::test]
    async fn multipliers_truncate_and_level_switch_drops_xp() {
        let policy = RewardPolicy {
            xp_multiplier: 1.5,
            points_multiplier: 0.33,
            level_system_enabled: false,
            notifications_enabled: false,
        };
        let (ledger, db, def) = setup(policy).await;
        let AwardOutcome::Completed(receipt) =
            ledger.complete_achievement(UserId(3), &def).await.unwrap()
        else {
            panic!("expected completion");
        };
        assert_eq!(receipt.xp_awarded, 0);
        assert_eq!(receipt.points_awarded, 3);
        assert!(notifications::for_user(&db, UserId(3), 10, false)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn failed_transaction_leaves_no_trace() {
        let (ledger, db, def) = setup(RewardPolicy::default()).await;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch(
                    "CREATE TRIGGER fail_notifications BEFORE INSERT ON achievement_notifications \
                     BEGIN SELECT RAISE(ABORT, 'outbox unavailable'); END;",
                )
            })
            .await
            .unwrap();

        let err = ledger.complete_achievement(UserId(4), &def).await.unwrap_err();
        assert!(matches!(err, MeritError::Storage { .. }));

        let row = progress::get(&db, UserId(4), def.id).await.unwrap();
        assert!(row.is_none_or(|r| !r.is_completed));
        assert!(levels::get(&db, UserId(4)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn badges_are_awarded_once() {
        let (ledger, db, _) = setup(RewardPolicy::default()).await;
        definitions::insert(
            &db,
            Namespace::Badge,
            &NewDefinition::new("veteran", "days_since_join", 30).rewards(20, 5),
        )
        .await
        .unwrap();
        let badge = definitions::find_active(&db, Namespace::Badge, "veteran")
            .await
            .unwrap()
            .unwrap();

        assert!(ledger.award_badge(UserId(5), &badge).await.unwrap().is_completed());
        assert_eq!(
            ledger.award_badge(UserId(5), &badge).await.unwrap(),
            AwardOutcome::AlreadyCompleted
        );
        let state = levels::get(&db, UserId(5)).await.unwrap().unwrap();
        assert_eq!(state.total_xp, 20);
        assert_eq!(state.total_achievements, 0);
    }

    #[tokio::test]
    async fn activity_credit_recomputes_level() {
        let (ledger, db, _) = setup(RewardPolicy::default()).await;
        let first = ledger.credit_activity(UserId(6), "article_create", 50, 10).await.unwrap();
        assert_eq!((first.level_before, first.level_after), (1, 1));
        let second = ledger.credit_activity(UserId(6), "article_create", 50, 10).await.unwrap();
        assert_eq!((second.level_before, second.level_after), (1, 2));

        let state = levels::get(&db, UserId(6)).await.unwrap().unwrap();
        assert_eq!((state.total_xp, state.total_points, state.level), (100, 20, 2));
    }

    #[test]
    fn scale_truncates_and_clamps() {
        assert_eq!(scale(25, 1.5), 37);
        assert_eq!(scale(10, 0.0), 0);
        assert_eq!(scale(-4, 1.0), 0);
        assert_eq!(scale(10, f64::NAN), 0);
    }
}
