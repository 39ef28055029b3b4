// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks cross-field constraints serde cannot express: model keys resolve
//! against the catalog and provider table, and sizes are positive.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::HearthConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &HearthConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    match config.models.default.split_once('/') {
        None => fail(format!(
            "models.default `{}` must have the form provider/model",
            config.models.default
        )),
        Some((provider, id)) => {
            if !config.providers.contains_key(provider) {
                fail(format!(
                    "models.default refers to unknown provider `{provider}`"
                ));
            }
            if config.find_model(provider, id).is_none() {
                fail(format!(
                    "models.default `{}` is not in models.catalog",
                    config.models.default
                ));
            }
        }
    }

    for key in &config.models.fallback {
        if !key.contains('/') {
            fail(format!(
                "models.fallback entry `{key}` must have the form provider/model"
            ));
        }
    }

    let mut seen = HashSet::new();
    for entry in &config.models.catalog {
        if !seen.insert(entry.key()) {
            fail(format!("duplicate model `{}` in models.catalog", entry.key()));
        }
        if !config.providers.contains_key(&entry.provider) {
            fail(format!(
                "models.catalog entry `{}` refers to unknown provider `{}`",
                entry.key(),
                entry.provider
            ));
        }
        if entry.context_budget == 0 {
            fail(format!(
                "models.catalog entry `{}` must have a positive context_budget",
                entry.key()
            ));
        }
    }

    for (name, provider) in &config.providers {
        if provider.kind != "openai" {
            fail(format!(
                "providers.{name}.type `{}` is not supported (expected `openai`)",
                provider.kind
            ));
        }
        if provider.endpoint.trim().is_empty() {
            fail(format!("providers.{name}.endpoint must not be empty"));
        }
    }

    if !(0.0..=2.0).contains(&config.memory.relevance_threshold) {
        fail(format!(
            "memory.relevance_threshold must be within 0.0..=2.0, got {}",
            config.memory.relevance_threshold
        ));
    }

    let positives = [
        ("context.sliding_window", config.context.sliding_window),
        ("limiter.max_concurrent", config.limiter.max_concurrent),
        ("debounce.max_entries", config.debounce.max_entries),
        ("tools.max_rounds", config.tools.max_rounds as usize),
        ("ipc.max_line_bytes", config.ipc.max_line_bytes),
    ];
    for (key, value) in positives {
        if value == 0 {
            fail(format!("{key} must be greater than zero"));
        }
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    if config.ipc.socket_path.trim().is_empty() {
        fail("ipc.socket_path must not be empty".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelEntry;

    #[test]
    fn default_config_validates() {
        let config = HearthConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn default_model_without_slash_fails() {
        let mut config = HearthConfig::default();
        config.models.default = "llama3.2".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("provider/model"));
    }

    #[test]
    fn default_model_missing_from_catalog_fails() {
        let mut config = HearthConfig::default();
        config.models.default = "ollama/unknown".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(
            errors
                .iter()
                .any(|e| e.to_string().contains("not in models.catalog"))
        );
    }

    #[test]
    fn catalog_entry_with_unknown_provider_fails() {
        let mut config = HearthConfig::default();
        config.models.catalog.push(ModelEntry {
            provider: "zai".into(),
            id: "glm-5".into(),
            max_tokens: 1024,
            context_budget: 8192,
        });
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.to_string().contains("`zai`")));
    }

    #[test]
    fn zero_sizes_collect_multiple_errors() {
        let mut config = HearthConfig::default();
        config.context.sliding_window = 0;
        config.tools.max_rounds = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn threshold_out_of_range_fails() {
        let mut config = HearthConfig::default();
        config.memory.relevance_threshold = 3.5;
        assert!(validate_config(&config).is_err());
    }
}
