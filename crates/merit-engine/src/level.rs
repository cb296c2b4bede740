// SPDX-FileCopyrightText: 2026 Merit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! XP-to-level curve.
//!
//! Going from level 1 to 2 costs `base_xp`; every further step costs the
//! previous step times `scaling_factor`, truncated. The curve is tabulated
//! once, so `level_for` is a pure lookup over cumulative thresholds.

use merit_config::LevelCurveConfig;
use serde::{Deserialize, Serialize};

/// Where a user stands on the curve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelProgress {
    pub level: u32,
    pub total_xp: u64,
    /// XP earned since reaching `level`.
    pub current_level_xp: u64,
    /// XP still needed for the next level; 0 at the level cap.
    pub xp_to_next_level: u64,
    /// Cumulative XP at which the next level starts; `None` at the cap.
    pub next_level_threshold: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LevelCurve {
    /// `thresholds[n - 1]` is the cumulative XP needed to reach level `n`.
    thresholds: Vec<u64>,
}

impl LevelCurve {
    /// Tabulate a curve. `max_level` of 0 is treated as 1.
    pub fn new(base_xp: u64, scaling_factor: f64, max_level: u32) -> Self {
        let max_level = max_level.max(1) as usize;
        let mut thresholds: Vec<u64> = Vec::with_capacity(max_level);
        thresholds.push(0);
        let mut step = base_xp;
        while thresholds.len() < max_level {
            let prev = thresholds[thresholds.len() - 1];
            thresholds.push(prev.saturating_add(step));
            // `as` saturates on overflow and NaN maps to 0.
            step = (step as f64 * scaling_factor).floor() as u64;
        }
        Self { thresholds }
    }

    pub fn from_config(config: &LevelCurveConfig) -> Self {
        Self::new(config.base_xp, config.scaling_factor, config.max_level)
    }

    pub fn max_level(&self) -> u32 {
        u32::try_from(self.thresholds.len()).unwrap_or(u32::MAX)
    }

    /// Cumulative XP needed to reach `level`. Level 1 (and 0) needs none;
    /// levels past the cap return the cap's threshold.
    pub fn threshold(&self, level: u32) -> u64 {
        let index = (level.max(1) as usize - 1).min(self.thresholds.len() - 1);
        self.thresholds[index]
    }

    /// Highest level whose threshold is at most `total_xp`.
    pub fn level_for(&self, total_xp: u64) -> u32 {
        // thresholds[0] == 0, so at least one entry always qualifies.
        let reached = self.thresholds.partition_point(|&t| t <= total_xp);
        u32::try_from(reached).unwrap_or(u32::MAX)
    }

    pub fn progress(&self, total_xp: u64) -> LevelProgress {
        let level = self.level_for(total_xp);
        let floor = self.threshold(level);
        let next = (level < self.max_level()).then(|| self.threshold(level + 1));
        LevelProgress {
            level,
            total_xp,
            current_level_xp: total_xp - floor,
            xp_to_next_level: next.map_or(0, |n| n - total_xp),
            next_level_threshold: next,
        }
    }
}

impl Default for LevelCurve {
    fn default() -> Self {
        Self::from_config(&LevelCurveConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn default_curve_steps_truncate() {
        let curve = LevelCurve::default();
        assert_eq!(curve.threshold(1), 0);
        assert_eq!(curve.threshold(2), 100);
        assert_eq!(curve.threshold(3), 220);
        assert_eq!(curve.threshold(4), 364);
        assert_eq!(curve.threshold(5), 536);
        assert_eq!(curve.threshold(6), 742);
    }

    #[test]
    fn zero_xp_is_level_one() {
        assert_eq!(LevelCurve::default().level_for(0), 1);
    }

    #[test]
    fn exact_threshold_reaches_level() {
        let curve = LevelCurve::new(100, 1.2, 100);
        assert_eq!(curve.level_for(535), 4);
        assert_eq!(curve.level_for(536), 5);
        assert_eq!(curve.level_for(537), 5);
    }

    #[test]
    fn level_is_capped() {
        let curve = LevelCurve::new(10, 1.0, 3);
        assert_eq!(curve.level_for(1_000_000), 3);
        assert_eq!(curve.threshold(50), curve.threshold(3));

        let at_cap = curve.progress(1_000_000);
        assert_eq!(at_cap.level, 3);
        assert_eq!(at_cap.xp_to_next_level, 0);
        assert_eq!(at_cap.next_level_threshold, None);
    }

    #[test]
    fn progress_splits_xp_around_level() {
        let progress = LevelCurve::default().progress(250);
        assert_eq!(progress.level, 3);
        assert_eq!(progress.current_level_xp, 30);
        assert_eq!(progress.next_level_threshold, Some(364));
        assert_eq!(progress.xp_to_next_level, 114);
    }

    #[test]
    fn huge_curves_saturate_instead_of_overflowing() {
        let curve = LevelCurve::new(u64::MAX / 2, 10.0, 10);
        assert_eq!(curve.threshold(10), u64::MAX);
        assert_eq!(curve.level_for(u64::MAX), 10);
    }

    proptest! {
        #[test]
        fn level_is_monotone_in_xp(
            a in 0u64..10_000_000,
            b in 0u64..10_000_000,
            base in 1u64..1_000,
            scale in 1.0f64..3.0,
        ) {
            let curve = LevelCurve::new(base, scale, 100);
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(curve.level_for(lo) <= curve.level_for(hi));
            prop_assert_eq!(curve.level_for(lo), curve.level_for(lo));
        }

        #[test]
        fn level_threshold_bounds_xp(xp in 0u64..50_000_000) {
            let curve = LevelCurve::default();
            let level = curve.level_for(xp);
            prop_assert!(curve.threshold(level) <= xp);
            if level < curve.max_level() {
                prop_assert!(curve.threshold(level + 1) > xp);
            }
        }
    }
}
