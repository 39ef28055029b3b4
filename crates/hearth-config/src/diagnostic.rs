// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment-to-miette error bridge with "did you mean?" suggestions.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum Jaro-Winkler similarity for a key suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration error with rich diagnostic information.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// An unknown key was found in the configuration.
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(hearth::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        suggestion: Option<String>,
        valid_keys: String,
        #[label("this key is not recognized")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A configuration value has the wrong type.
    #[error("invalid type for key `{key}`: {detail}")]
    #[diagnostic(code(hearth::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
    },

    /// A required configuration key is missing.
    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(hearth::config::missing_key),
        help("add `{key} = <value>` to your hearth.toml")
    )]
    MissingKey { key: String },

    /// A `HEARTH_*` environment variable could not be applied.
    #[error("environment variable `{var}` is invalid: {detail}")]
    #[diagnostic(
        code(hearth::config::environment),
        help("unset `{var}` or correct its value")
    )]
    Environment { var: String, detail: String },

    /// A semantic check failed after deserialization.
    #[error("validation error: {message}")]
    #[diagnostic(code(hearth::config::validation))]
    Validation { message: String },

    /// Catch-all for other configuration errors.
    #[error("configuration error: {0}")]
    #[diagnostic(code(hearth::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// Turns every error carried by a `figment::Error` into a diagnostic.
///
/// Errors raised by environment overrides name the offending variable; file
/// errors point at the key inside `toml_sources` when it can be found.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| {
            if from_environment(&error) {
                env_error(&error)
            } else {
                file_error(&error, toml_sources)
            }
        })
        .collect()
}

fn from_environment(error: &figment::error::Error) -> bool {
    error
        .metadata
        .as_ref()
        .is_some_and(|m| m.name.contains("environment variable"))
}

/// Rebuilds the variable name from the key path, `models.max_retries`
/// becoming `HEARTH_MODELS_MAX_RETRIES`.
fn env_var_name(path: &[String], field: Option<&str>) -> String {
    let mut parts: Vec<&str> = path.iter().map(String::as_str).collect();
    if let Some(field) = field.filter(|f| parts.last() != Some(f)) {
        parts.push(field);
    }
    format!("HEARTH_{}", parts.join("_").to_ascii_uppercase())
}

fn env_error(error: &figment::error::Error) -> ConfigError {
    use figment::error::Kind;

    let field = match &error.kind {
        Kind::UnknownField(field, _) => Some(field.as_str()),
        _ => None,
    };
    ConfigError::Environment {
        var: env_var_name(&error.path, field),
        detail: error.kind.to_string(),
    }
}

fn file_error(error: &figment::error::Error, toml_sources: &[(String, String)]) -> ConfigError {
    use figment::error::Kind;

    match &error.kind {
        Kind::UnknownField(field, expected) => {
            let (span, src) = locate_key(error, field, toml_sources);
            ConfigError::UnknownKey {
                key: field.clone(),
                suggestion: suggest_key(field, expected),
                valid_keys: expected.join(", "),
                span,
                src,
            }
        }
        Kind::MissingField(field) => ConfigError::MissingKey {
            key: field.to_string(),
        },
        Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
            key: error.path.join("."),
            detail: format!("found {actual}, expected {expected}"),
            expected: expected.to_string(),
        },
        _ => ConfigError::Other(error.to_string()),
    }
}

/// Resolve the file an error came from and the key's byte span within it.
fn locate_key(
    error: &figment::error::Error,
    field: &str,
    toml_sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let Some(figment::Source::File(origin)) = error.metadata.as_ref().and_then(|m| m.source.as_ref())
    else {
        return (None, None);
    };
    let origin = origin.display().to_string();
    let Some((name, content)) = toml_sources.iter().find(|(p, _)| *p == origin) else {
        return (None, None);
    };

    find_key_offset(content, &error.path, field)
        .map(|offset| {
            (
                Some(SourceSpan::new(offset.into(), field.len())),
                Some(NamedSource::new(name, content.clone())),
            )
        })
        .unwrap_or((None, None))
}

/// Byte offset of `field` inside the `[section]` named by `path[0]`, or from
/// the start of the file for top-level keys.
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let start = match path.first() {
        None => 0,
        Some(section) => {
            let header = format!("[{section}]");
            content.find(&header)? + header.len()
        }
    };

    let mut offset = start;
    for line in content[start..].split_inclusive('\n') {
        let trimmed = line.trim_start();
        if let Some(after) = trimmed.strip_prefix(field)
            && after.trim_start().starts_with('=')
        {
            return Some(offset + (line.len() - trimmed.len()));
        }
        offset += line.len();
    }
    None
}

/// Best Jaro-Winkler match above the threshold.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(_, key)| key.to_string())
}

/// Render diagnostics to stderr using miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        if handler.render_report(&mut buf, error as &dyn Diagnostic).is_ok() {
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
    fn suggests_sliding_window_for_typo() {
        let valid = &["sliding_window", "subagent_history_runs"];
        assert_eq!(
            suggest_key("sliding_windw", valid),
            Some("sliding_window".to_string())
        );
    }

    #[test]
    fn no_suggestion_for_distant_typo() {
        let valid = &["debounce_ms", "max_entries"];
        assert_eq!(suggest_key("zzzzzz", valid), None);
    }

    #[test]
    fn finds_key_inside_its_section() {
        let content = "[agent]\nname = \"x\"\n[models]\ndefualt = \"a/b\"\n";
        let offset = find_key_offset(content, &["models".to_string()], "defualt").unwrap();
        assert_eq!(&content[offset..offset + 7], "defualt");
    }

    #[test]
    fn env_var_name_is_rebuilt_from_the_key_path() {
        assert_eq!(env_var_name(&[], Some("models_max_retrie")), "HEARTH_MODELS_MAX_RETRIE");
        assert_eq!(
            env_var_name(&["limiter".into(), "max_concurrent".into()], None),
            "HEARTH_LIMITER_MAX_CONCURRENT"
        );
    }

    #[test]
    fn missing_section_yields_no_offset() {
        assert_eq!(find_key_offset("[agent]\n", &["ipc".to_string()], "x"), None);
    }
}
