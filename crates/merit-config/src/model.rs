// SPDX-FileCopyrightText: 2026 Merit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Merit achievement engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Top-level Merit configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MeritConfig {
    /// Award engine switches and reward multipliers.
    #[serde(default)]
    pub engine: EngineConfig,

    /// XP-to-level curve.
    #[serde(default)]
    pub levels: LevelCurveConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metric bound to each generic `count` achievement, keyed by slug.
    ///
    /// A `count` achievement whose slug is missing here is unevaluable.
    #[serde(default = "default_count_metrics")]
    pub count_metrics: BTreeMap<String, String>,
}

impl Default for MeritConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            levels: LevelCurveConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
            count_metrics: default_count_metrics(),
        }
    }
}

fn default_count_metrics() -> BTreeMap<String, String> {
    BTreeMap::from([("photo-pioneer".to_string(), "photo_uploads".to_string())])
}

/// Award engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Master switch. When false, checks and awards are no-ops.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Enqueue notification records for new awards and level-ups.
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,

    /// Credit XP and track levels. Points are credited either way.
    #[serde(default = "default_true")]
    pub level_system_enabled: bool,

    /// Multiplier applied to every XP credit (result truncated).
    #[serde(default = "default_multiplier")]
    pub xp_multiplier: f64,

    /// Multiplier applied to every points credit (result truncated).
    #[serde(default = "default_multiplier")]
    pub points_multiplier: f64,

    /// Upper bound on evaluation passes in one achievement check.
    /// Later passes only run when an earlier one awarded something.
    #[serde(default = "default_max_passes")]
    pub max_passes: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            notifications_enabled: true,
            level_system_enabled: true,
            xp_multiplier: default_multiplier(),
            points_multiplier: default_multiplier(),
            max_passes: default_max_passes(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_multiplier() -> f64 {
    1.0
}

fn default_max_passes() -> u32 {
    4
}

/// Geometric XP curve.
///
/// Level 2 needs `base_xp`; each further step needs the previous step
/// multiplied by `scaling_factor`, truncated to an integer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LevelCurveConfig {
    #[serde(default = "default_base_xp")]
    pub base_xp: u64,

    #[serde(default = "default_scaling_factor")]
    pub scaling_factor: f64,

    #[serde(default = "default_max_level")]
    pub max_level: u32,
}

impl Default for LevelCurveConfig {
    fn default() -> Self {
        Self {
            base_xp: default_base_xp(),
            scaling_factor: default_scaling_factor(),
            max_level: default_max_level(),
        }
    }
}

fn default_base_xp() -> u64 {
    100
}

fn default_scaling_factor() -> f64 {
    1.2
}

fn default_max_level() -> u32 {
    100
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_true")]
    pub wal_mode: bool,

    /// How long a writer waits for a competing connection's lock.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: true,
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("merit").join("merit.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("merit.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = MeritConfig::default();
        assert!(config.engine.enabled);
        assert_eq!(config.engine.max_passes, 4);
        assert_eq!(config.levels.base_xp, 100);
        assert!((config.levels.scaling_factor - 1.2).abs() < f64::EPSILON);
        assert_eq!(config.levels.max_level, 100);
        assert_eq!(
            config.count_metrics.get("photo-pioneer").map(String::as_str),
            Some("photo_uploads")
        );
    }

    #[test]
    fn partial_section_fills_defaults() {
        let config: MeritConfig = toml::from_str("[levels]\nbase_xp = 500\n").unwrap();
        assert_eq!(config.levels.base_xp, 500);
        assert_eq!(config.levels.max_level, 100);
        assert!(config.engine.notifications_enabled);
    }

    #[test]
    fn explicit_count_metrics_replace_defaults() {
        let config: MeritConfig =
            toml::from_str("[count_metrics]\n\"course-hero\" = \"course_completions\"\n")
                .unwrap();
        assert_eq!(config.count_metrics.len(), 1);
        assert!(config.count_metrics.contains_key("course-hero"));
    }

    #[test]
    fn unknown_engine_key_is_rejected() {
        let result = toml::from_str::<MeritConfig>("[engine]\nxp_multipler = 2.0\n");
        assert!(result.is_err());
    }
}
