// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./hearth.toml` > `~/.config/hearth/hearth.toml` > `/etc/hearth/hearth.toml`
//! with environment variable overrides via `HEARTH_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::HearthConfig;

/// Sections that env vars may address. `HEARTH_<SECTION>_<KEY>` maps to `section.key`.
const ENV_SECTIONS: &[&str] = &[
    "agent", "ipc", "debounce", "limiter", "models", "context", "memory", "tools", "storage",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/hearth/hearth.toml` (system-wide)
/// 3. `~/.config/hearth/hearth.toml` (user XDG config)
/// 4. `./hearth.toml` (local directory)
/// 5. `HEARTH_*` environment variables
pub fn load_config() -> Result<HearthConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<HearthConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HearthConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<HearthConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HearthConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(HearthConfig::default()))
        .merge(Toml::file("/etc/hearth/hearth.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("hearth/hearth.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("hearth.toml"))
        .merge(env_provider())
}

/// Maps `HEARTH_SECTION_KEY` to `section.key`, splitting only after the section.
///
/// `Env::split("_")` would turn `HEARTH_MODELS_MAX_RETRIES` into
/// `models.max.retries`.
fn env_provider() -> Env {
    Env::prefixed("HEARTH_").map(|key| map_env_key(key.as_str()).into())
}

/// Figment passes the key upper-cased as written in the environment.
fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in ENV_SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_split_after_section_only() {
        assert_eq!(map_env_key("models_max_retries"), "models.max_retries");
        assert_eq!(map_env_key("ipc_socket_path"), "ipc.socket_path");
        assert_eq!(map_env_key("unknown_key"), "unknown_key");
    }

    #[test]
    fn env_keys_are_matched_case_insensitively() {
        assert_eq!(map_env_key("MODELS_MAX_RETRIES"), "models.max_retries");
        assert_eq!(map_env_key("Tools_Sandbox_Root"), "tools.sandbox_root");
    }

    #[test]
    fn upper_case_env_var_alone_loads() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("hearth.toml", "")?;
            jail.set_env("HEARTH_MODELS_MAX_RETRIES", "5");
            let config = load_config_from_path(Path::new("hearth.toml"))?;
            assert_eq!(config.models.max_retries, 5);
            Ok(())
        });
    }
}
