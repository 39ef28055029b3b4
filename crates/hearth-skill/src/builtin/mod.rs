// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in tools, always available without configuration beyond `[tools]`.

pub mod file;

pub use file::FileTool;

use std::sync::Arc;

use hearth_config::model::ToolsConfig;
use hearth_core::HearthError;

use crate::ToolRegistry;

/// Registers all built-in tools into the given registry.
pub fn register_builtins(registry: &mut ToolRegistry, config: &ToolsConfig) -> Result<(), HearthError> {
    registry.register(Arc::new(FileTool::new(&config.sandbox_root)?));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_file_tool_at_sandbox_root() {
        let dir = tempfile::tempdir().unwrap();
        let config = ToolsConfig {
            sandbox_root: dir.path().join("ws").to_string_lossy().into_owned(),
            ..ToolsConfig::default()
        };
        let mut registry = ToolRegistry::new();
        register_builtins(&mut registry, &config).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.get("file").is_some());
        assert!(dir.path().join("ws").is_dir());
    }
}
