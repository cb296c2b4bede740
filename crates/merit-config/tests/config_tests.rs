// SPDX-FileCopyrightText: 2026 Merit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Merit configuration system.

use std::io::Write;

use merit_config::diagnostic::ConfigError;
use merit_config::model::MeritConfig;
use merit_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};

/// Valid TOML with every section deserializes successfully.
#[test]
fn valid_toml_deserializes_into_merit_config() {
    let toml = r#"
[engine]
enabled = true
notifications_enabled = false
level_system_enabled = true
xp_multiplier = 2.0
points_multiplier = 1.5
max_passes = 2

[levels]
base_xp = 50
scaling_factor = 1.5
max_level = 20

[storage]
database_path = "/tmp/merit-test.db"
wal_mode = false
busy_timeout_ms = 250

[logging]
log_level = "debug"

[count_metrics]
"course-hero" = "course_completions"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert!(!config.engine.notifications_enabled);
    assert_eq!(config.engine.xp_multiplier, 2.0);
    assert_eq!(config.engine.max_passes, 2);
    assert_eq!(config.levels.base_xp, 50);
    assert_eq!(config.levels.max_level, 20);
    assert_eq!(config.storage.database_path, "/tmp/merit-test.db");
    assert_eq!(config.storage.busy_timeout_ms, 250);
    assert!(!config.storage.wal_mode);
    assert_eq!(config.logging.log_level, "debug");
    assert_eq!(
        config.count_metrics.get("course-hero").map(String::as_str),
        Some("course_completions")
    );
}

/// User-bound metrics are merged over the built-in photo binding.
#[test]
fn count_metrics_merge_with_defaults() {
    let config = load_config_from_str("[count_metrics]\n\"course-hero\" = \"course_completions\"\n")
        .expect("should load");
    assert!(config.count_metrics.contains_key("course-hero"));
    assert!(config.count_metrics.contains_key("photo-pioneer"));
}

/// Empty TOML yields documented defaults.
#[test]
fn missing_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");
    assert!(config.engine.enabled);
    assert!(config.engine.level_system_enabled);
    assert_eq!(config.engine.points_multiplier, 1.0);
    assert_eq!(config.levels.base_xp, 100);
    assert_eq!(config.levels.scaling_factor, 1.2);
    assert_eq!(config.storage.busy_timeout_ms, 5000);
    assert_eq!(config.logging.log_level, "info");
}

/// Dotted keys (as produced by the env provider) reach the right field.
#[test]
fn dotted_override_sets_underscored_field() {
    use figment::{
        providers::{Format, Serialized, Toml},
        Figment,
    };

    let config: MeritConfig = Figment::new()
        .merge(Serialized::defaults(MeritConfig::default()))
        .merge(Toml::string("[engine]\nxp_multiplier = 3.0\n"))
        .merge(("engine.xp_multiplier", 1.25))
        .merge(("levels.max_level", 60))
        .extract()
        .expect("should merge override");

    assert_eq!(config.engine.xp_multiplier, 1.25);
    assert_eq!(config.levels.max_level, 60);
}

/// A typo is reported as an unknown key with a suggestion.
#[test]
fn typo_produces_unknown_key_diagnostic() {
    let errors = load_and_validate_str("[engine]\nnotifications_enabeld = false\n").unwrap_err();
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert_eq!(key, "notifications_enabeld");
            assert_eq!(suggestion.as_deref(), Some("notifications_enabled"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

/// A wrong value type is reported as InvalidType.
#[test]
fn wrong_type_produces_invalid_type() {
    let errors = load_and_validate_str("[levels]\nmax_level = \"lots\"\n").unwrap_err();
    assert!(matches!(&errors[0], ConfigError::InvalidType { key, .. } if key.contains("max_level")));
}

/// Semantic violations surface after successful parsing.
#[test]
fn validation_runs_after_parse() {
    let errors = load_and_validate_str("[levels]\nscaling_factor = 0.5\n").unwrap_err();
    assert!(matches!(&errors[0], ConfigError::Validation { .. }));
}

/// An explicit config file is read and validated.
#[test]
fn explicit_path_is_loaded() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[levels]\nmax_level = 7").unwrap();

    let config = load_and_validate_path(file.path()).expect("file config should load");
    assert_eq!(config.levels.max_level, 7);
}

/// Unknown keys in an explicit file are reported with a suggestion.
#[test]
fn explicit_path_unknown_key_is_reported() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[storage]\nwal_mod = true").unwrap();

    let errors = load_and_validate_path(file.path()).unwrap_err();
    assert!(matches!(
        &errors[0],
        ConfigError::UnknownKey { key, suggestion: Some(s), .. } if key == "wal_mod" && s == "wal_mode"
    ));
}

/// Missing config files are silently skipped.
#[test]
fn missing_config_file_uses_defaults() {
    let config = load_and_validate_path(std::path::Path::new("/nonexistent/merit.toml"))
        .expect("missing file should be skipped");
    assert_eq!(config.levels.max_level, 100);
}
