// SPDX-FileCopyrightText: 2026 Merit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as curve parameters, positive multipliers, and bound metric names.

use std::str::FromStr;

use merit_core::Fact;

use crate::diagnostic::ConfigError;
use crate::model::MeritConfig;

/// Highest configurable level cap.
pub const MAX_LEVEL_CAP: u32 = 10_000;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &MeritConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.levels.base_xp == 0 {
        errors.push(ConfigError::Validation {
            message: "levels.base_xp must be at least 1".to_string(),
        });
    }

    let scaling = config.levels.scaling_factor;
    if !scaling.is_finite() || scaling < 1.0 {
        errors.push(ConfigError::Validation {
            message: format!("levels.scaling_factor must be a finite number >= 1.0, got {scaling}"),
        });
    }

    if config.levels.max_level == 0 || config.levels.max_level > MAX_LEVEL_CAP {
        errors.push(ConfigError::Validation {
            message: format!(
                "levels.max_level must be between 1 and {MAX_LEVEL_CAP}, got {}",
                config.levels.max_level
            ),
        });
    }

    for (key, value) in [
        ("engine.xp_multiplier", config.engine.xp_multiplier),
        ("engine.points_multiplier", config.engine.points_multiplier),
    ] {
        if !value.is_finite() || value <= 0.0 {
            errors.push(ConfigError::Validation {
                message: format!("{key} must be a positive number, got {value}"),
            });
        }
    }

    if config.engine.max_passes == 0 {
        errors.push(ConfigError::Validation {
            message: "engine.max_passes must be at least 1".to_string(),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    for (slug, metric) in &config.count_metrics {
        match Fact::from_str(metric) {
            Ok(fact) if !fact.is_engine_owned() => {}
            _ => errors.push(ConfigError::Validation {
                message: format!(
                    "count_metrics.{slug} names `{metric}`, which is not an activity fact"
                ),
            }),
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
