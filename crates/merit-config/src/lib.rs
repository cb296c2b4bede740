// SPDX-FileCopyrightText: 2026 Merit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Merit achievement engine.
//!
//! Provides TOML configuration parsing with strict validation (`deny_unknown_fields`),
//! XDG file hierarchy lookup, `MERIT_*` environment overrides, and miette
//! diagnostics with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use merit_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("max level: {}", config.levels.max_level);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{EngineConfig, LevelCurveConfig, LoggingConfig, MeritConfig, StorageConfig};

/// Load configuration from the XDG hierarchy and validate it.
///
/// Figment errors are converted to diagnostics carrying source spans for the
/// files that were read; validation errors are collected in full.
pub fn load_and_validate() -> Result<MeritConfig, Vec<ConfigError>> {
    finish(loader::load_config(), collect_toml_sources)
}

/// Load configuration from one explicit file (plus env overrides) and validate it.
pub fn load_and_validate_path(path: &Path) -> Result<MeritConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_path(path), || {
        std::fs::read_to_string(path)
            .map(|content| vec![(path.display().to_string(), content)])
            .unwrap_or_default()
    })
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<MeritConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

fn finish(
    loaded: Result<MeritConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<MeritConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            tracing::debug!(
                max_level = config.levels.max_level,
                bound_metrics = config.count_metrics.len(),
                "configuration loaded"
            );
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &sources())),
    }
}

/// Read whichever config files exist, for error span resolution.
fn collect_toml_sources() -> Vec<(String, String)> {
    let mut candidates = vec![std::env::current_dir()
        .map(|d| d.join("merit.toml"))
        .unwrap_or_else(|_| "merit.toml".into())];
    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join("merit/merit.toml"));
    }
    candidates.push("/etc/merit/merit.toml".into());

    candidates
        .into_iter()
        .filter_map(|path| {
            std::fs::read_to_string(&path)
                .ok()
                .map(|content| (path.display().to_string(), content))
        })
        .collect()
}
