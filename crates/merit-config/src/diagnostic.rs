// SPDX-FileCopyrightText: 2026 Merit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment-to-miette error bridge with fuzzy match suggestions.
//!
//! Turns Figment extraction failures into miette diagnostics that point at
//! the offending key in `merit.toml` and suggest the closest valid key.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum Jaro-Winkler similarity for a "did you mean" hint.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration error with rich diagnostic information.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// An unknown key was found in the configuration.
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(merit::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        suggestion: Option<String>,
        valid_keys: String,
        #[label("not a recognized key")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A configuration value has the wrong type.
    #[error("invalid type for key `{key}`: {detail}")]
    #[diagnostic(code(merit::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
    },

    /// A required configuration key is missing.
    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(merit::config::missing_key),
        help("add `{key} = <value>` to your merit.toml")
    )]
    MissingKey { key: String },

    /// A value parsed but violates a semantic constraint.
    #[error("validation error: {message}")]
    #[diagnostic(code(merit::config::validation))]
    Validation { message: String },

    /// Catch-all for other configuration errors.
    #[error("configuration error: {0}")]
    #[diagnostic(code(merit::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// Convert a `figment::Error` (which may hold several errors) into diagnostics.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| match &error.kind {
            Kind::UnknownField(field, expected) => {
                let valid_keys: Vec<&str> = expected.to_vec();
                let (span, src) = locate(&error, field, toml_sources);
                ConfigError::UnknownKey {
                    key: field.clone(),
                    suggestion: suggest_key(field, &valid_keys),
                    valid_keys: valid_keys.join(", "),
                    span,
                    src,
                }
            }
            Kind::MissingField(field) => ConfigError::MissingKey {
                key: field.clone().into_owned(),
            },
            Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
                key: error.path.join("."),
                detail: format!("found {actual}, expected {expected}"),
                expected: expected.to_string(),
            },
            _ => ConfigError::Other(error.to_string()),
        })
        .collect()
}

/// Find the file and byte span an unknown-key error refers to.
fn locate(
    error: &figment::error::Error,
    field: &str,
    toml_sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let source_path = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| match s {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });

    let Some((path, content)) = source_path.as_deref().and_then(|path| {
        toml_sources
            .iter()
            .find(|(p, _)| p == path)
            .map(|(p, c)| (p.as_str(), c.as_str()))
    }) else {
        return (None, None);
    };

    match find_key_offset(content, &error.path, field) {
        Some(offset) => (
            Some(SourceSpan::new(offset.into(), field.len())),
            Some(NamedSource::new(path, content.to_string())),
        ),
        None => (None, None),
    }
}

/// Byte offset of `field` inside the table named by `path`.
///
/// `path = ["levels"]` searches after the `[levels]` header; an empty path
/// searches from the top of the file.
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let start = if path.is_empty() {
        0
    } else {
        let header = format!("[{}]", path.join("."));
        content.find(&header)? + header.len()
    };

    let mut offset = start;
    for line in content[start..].split_inclusive('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with('[') && offset != start {
            // Next table: the key is not in this section.
            return None;
        }
        if let Some(rest) = trimmed.strip_prefix(field)
            && rest.trim_start().starts_with('=')
        {
            return Some(offset + (line.len() - trimmed.len()));
        }
        offset += line.len();
    }
    None
}

/// Best valid key above the similarity threshold, if any.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Render diagnostics to stderr using miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    use miette::GraphicalReportHandler;

    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        let diagnostic: &dyn Diagnostic = error;
        if handler.render_report(&mut buf, diagnostic).is_ok() {
            eprint!("{buf}");
        } else {
            eprintln!("Error: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggest_base_xp_for_typo() {
        let valid = &["base_xp", "scaling_factor", "max_level"];
        assert_eq!(suggest_key("bse_xp", valid), Some("base_xp".to_string()));
    }

    #[test]
    fn suggest_multiplier_for_misspelling() {
        let valid = &["xp_multiplier", "points_multiplier", "enabled"];
        assert_eq!(
            suggest_key("xp_multipler", valid),
            Some("xp_multiplier".to_string())
        );
    }

    #[test]
    fn no_suggestion_for_distant_typo() {
        let valid = &["base_xp", "scaling_factor", "max_level"];
        assert_eq!(suggest_key("zzzzzz", valid), None);
    }

    #[test]
    fn find_key_offset_in_section() {
        let content = "[engine]\nenabled = true\n\n[levels]\nbse_xp = 10\n";
        let path = vec!["levels".to_string()];
        let o = find_key_offset(content, &path, "bse_xp").unwrap();
        assert_eq!(&content[o..o + 6], "bse_xp");
    }

    #[test]
    fn find_key_offset_stops_at_next_table() {
        let content = "[engine]\nenabled = true\n[levels]\nbse_xp = 10\n";
        let path = vec!["engine".to_string()];
        assert_eq!(find_key_offset(content, &path, "bse_xp"), None);
    }

    #[test]
    fn unknown_field_becomes_unknown_key_with_suggestion() {
        let err = crate::loader::load_config_from_str("[levels]\nmax_levle = 5\n").unwrap_err();
        let errors = figment_to_config_errors(err, &[]);
        assert!(errors.iter().any(|e| matches!(
            e,
            ConfigError::UnknownKey { key, suggestion: Some(s), .. }
                if key == "max_levle" && s == "max_level"
        )));
    }
}
