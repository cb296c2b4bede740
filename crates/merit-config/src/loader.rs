// SPDX-FileCopyrightText: 2026 Merit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./merit.toml` > `~/.config/merit/merit.toml` > `/etc/merit/merit.toml`
//! with environment variable overrides via `MERIT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::MeritConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/merit/merit.toml` (system-wide)
/// 3. `~/.config/merit/merit.toml` (user XDG config)
/// 4. `./merit.toml` (local directory)
/// 5. `MERIT_*` environment variables
pub fn load_config() -> Result<MeritConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<MeritConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MeritConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<MeritConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MeritConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(MeritConfig::default()))
        .merge(Toml::file("/etc/merit/merit.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("merit/merit.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("merit.toml"))
        .merge(env_provider())
}

/// Environment provider with explicit section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `MERIT_ENGINE_XP_MULTIPLIER` must map to
/// `engine.xp_multiplier`, not `engine.xp.multiplier`.
fn env_provider() -> Env {
    Env::prefixed("MERIT_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("engine_", "engine.", 1)
            .replacen("levels_", "levels.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("logging_", "logging.", 1);
        mapped.into()
    })
}
