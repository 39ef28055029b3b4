// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in file tool confined to a sandbox root.
//!
//! Paths are resolved against the root and canonicalized before use, so
//! `..` segments and symlinks that leave the root are rejected with
//! [`HearthError::AccessDenied`]. Reads are truncated to 100KB.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use hearth_core::HearthError;
use tracing::debug;

use crate::tool::{Tool, ToolOutput};

/// Maximum file read size in bytes (100KB).
const MAX_READ_SIZE: usize = 100 * 1024;

/// Reads, writes and lists files under a single root directory.
pub struct FileTool {
    root: PathBuf,
}

impl FileTool {
    /// Creates the tool, creating `root` if it does not exist yet.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, HearthError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| skill_io("create sandbox root", &root, e))?;
        let root = root
            .canonicalize()
            .map_err(|e| skill_io("resolve sandbox root", &root, e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lexically joins `requested` onto the root, refusing to climb above it.
    fn join(&self, requested: &str) -> Result<PathBuf, HearthError> {
        let denied = || HearthError::AccessDenied {
            path: requested.to_string(),
        };
        let requested_path = Path::new(requested);
        let relative = if requested_path.is_absolute() {
            requested_path.strip_prefix(&self.root).map_err(|_| denied())?
        } else {
            requested_path
        };

        let mut out = self.root.clone();
        let mut depth = 0usize;
        for component in relative.components() {
            match component {
                Component::Normal(part) => {
                    out.push(part);
                    depth += 1;
                }
                Component::CurDir => {}
                Component::ParentDir if depth > 0 => {
                    out.pop();
                    depth -= 1;
                }
                _ => return Err(denied()),
            }
        }
        Ok(out)
    }

    /// Resolves an existing path, following symlinks, and checks containment.
    async fn resolve_existing(&self, requested: &str) -> Result<PathBuf, HearthError> {
        let joined = self.join(requested)?;
        let real = tokio::fs::canonicalize(&joined)
            .await
            .map_err(|e| skill_io("resolve", &joined, e))?;
        self.contain(real, requested)
    }

    /// Resolves a path that may not exist yet via its parent directory.
    async fn resolve_for_write(&self, requested: &str) -> Result<PathBuf, HearthError> {
        let joined = self.join(requested)?;
        let (Some(parent), Some(name)) = (joined.parent(), joined.file_name()) else {
            return Err(HearthError::AccessDenied {
                path: requested.to_string(),
            });
        };
        // Containment is checked on the deepest existing ancestor before any
        // missing directory is created.
        let mut existing = parent;
        let mut missing = Vec::new();
        while tokio::fs::symlink_metadata(existing).await.is_err() {
            let (Some(up), Some(part)) = (existing.parent(), existing.file_name()) else {
                break;
            };
            missing.push(part.to_owned());
            existing = up;
        }
        let real_existing = tokio::fs::canonicalize(existing)
            .await
            .map_err(|e| skill_io("resolve", existing, e))?;
        let mut real_parent = self.contain(real_existing, requested)?;
        if !missing.is_empty() {
            real_parent.extend(missing.iter().rev());
            tokio::fs::create_dir_all(&real_parent)
                .await
                .map_err(|e| skill_io("create directory", &real_parent, e))?;
        }
        let target = real_parent.join(name);

        // An existing symlink at the target must also stay inside the root.
        if tokio::fs::symlink_metadata(&target)
            .await
            .is_ok_and(|m| m.file_type().is_symlink())
        {
            return self.resolve_existing(requested).await;
        }
        Ok(target)
    }

    fn contain(&self, real: PathBuf, requested: &str) -> Result<PathBuf, HearthError> {
        if real.starts_with(&self.root) {
            Ok(real)
        } else {
            Err(HearthError::AccessDenied {
                path: requested.to_string(),
            })
        }
    }

    async fn read(&self, path: &str) -> Result<ToolOutput, HearthError> {
        let real = self.resolve_existing(path).await?;
        let bytes = tokio::fs::read(&real)
            .await
            .map_err(|e| skill_io("read", &real, e))?;
        let total = bytes.len();
        let contents = String::from_utf8_lossy(&bytes[..total.min(MAX_READ_SIZE)]).into_owned();
        if total > MAX_READ_SIZE {
            return Ok(ToolOutput::ok(format!(
                "{contents}...\n\n[File truncated from {total} to {MAX_READ_SIZE} bytes]"
            )));
        }
        Ok(ToolOutput::ok(contents))
    }

    async fn write(&self, path: &str, content: &str) -> Result<ToolOutput, HearthError> {
        let real = self.resolve_for_write(path).await?;
        tokio::fs::write(&real, content)
            .await
            .map_err(|e| skill_io("write", &real, e))?;
        Ok(ToolOutput::ok(format!(
            "wrote {} bytes to '{path}'",
            content.len()
        )))
    }

    async fn list(&self, path: &str) -> Result<ToolOutput, HearthError> {
        let real = self.resolve_existing(path).await?;
        let mut entries = tokio::fs::read_dir(&real)
            .await
            .map_err(|e| skill_io("list", &real, e))?;
        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| skill_io("list", &real, e))?
        {
            let mut name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type().await.is_ok_and(|t| t.is_dir()) {
                name.push('/');
            }
            names.push(name);
        }
        names.sort();
        Ok(ToolOutput::ok(names.join("\n")))
    }
}

fn skill_io(action: &str, path: &Path, e: std::io::Error) -> HearthError {
    HearthError::Skill {
        message: format!("failed to {action} '{}': {e}", path.display()),
        source: Some(Box::new(e)),
    }
}

fn required<'a>(input: &'a serde_json::Value, key: &str) -> Result<&'a str, HearthError> {
    input[key].as_str().ok_or_else(|| HearthError::Skill {
        message: format!("missing required '{key}' parameter"),
        source: None,
    })
}

#[async_trait]
impl Tool for FileTool {
    fn name(&self) -> &str {
        "file"
    }

    fn description(&self) -> &str {
        "Read, write or list files in the agent workspace"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": ["read", "write", "list"],
                    "description": "Operation to perform"
                },
                "path": {
                    "type": "string",
                    "description": "Path relative to the workspace root"
                },
                "content": {
                    "type": "string",
                    "description": "Content to write (write only)"
                }
            },
            "required": ["action", "path"]
        })
    }

    async fn invoke(&self, input: serde_json::Value) -> Result<ToolOutput, HearthError> {
        let action = required(&input, "action")?;
        let path = required(&input, "path")?;
        debug!(action, path, "file tool");

        match action {
            "read" => self.read(path).await,
            "write" => self.write(path, required(&input, "content")?).await,
            "list" => self.list(path).await,
            other => Ok(ToolOutput::error(format!(
                "unknown action '{other}'; supported actions: read, write, list"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool() -> (tempfile::TempDir, FileTool) {
        let dir = tempfile::tempdir().unwrap();
        let tool = FileTool::new(dir.path().join("workspace")).unwrap();
        (dir, tool)
    }

    #[tokio::test]
    async fn write_then_read_inside_root() {
        let (_dir, tool) = tool();
        let out = tool
            .invoke(serde_json::json!({"action": "write", "path": "notes/a.txt", "content": "hello"}))
            .await
            .unwrap();
        assert!(!out.is_error);

        let out = tool
            .invoke(serde_json::json!({"action": "read", "path": "notes/a.txt"}))
            .await
            .unwrap();
        assert_eq!(out.content, "hello");

        let out = tool
            .invoke(serde_json::json!({"action": "list", "path": "."}))
            .await
            .unwrap();
        assert_eq!(out.content, "notes/");
    }

    #[tokio::test]
    async fn parent_traversal_is_denied() {
        let (_dir, tool) = tool();
        let err = tool
            .invoke(serde_json::json!({"action": "read", "path": "../secret.txt"}))
            .await
            .unwrap_err();
        assert!(matches!(err, HearthError::AccessDenied { .. }));
    }

    #[tokio::test]
    async fn absolute_path_outside_root_is_denied() {
        let (_dir, tool) = tool();
        let err = tool
            .invoke(serde_json::json!({"action": "read", "path": "/etc/hostname"}))
            .await
            .unwrap_err();
        assert!(matches!(err, HearthError::AccessDenied { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlink_escape_is_denied() {
        let (dir, tool) = tool();
        let outside = dir.path().join("outside.txt");
        std::fs::write(&outside, "private").unwrap();
        std::os::unix::fs::symlink(&outside, tool.root().join("link.txt")).unwrap();

        let read = tool
            .invoke(serde_json::json!({"action": "read", "path": "link.txt"}))
            .await
            .unwrap_err();
        assert!(matches!(read, HearthError::AccessDenied { .. }));

        let write = tool
            .invoke(serde_json::json!({"action": "write", "path": "link.txt", "content": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(write, HearthError::AccessDenied { .. }));
        assert_eq!(std::fs::read_to_string(&outside).unwrap(), "private");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlinked_directory_escape_is_denied() {
        let (dir, tool) = tool();
        let outside = dir.path().join("elsewhere");
        std::fs::create_dir_all(&outside).unwrap();
        std::os::unix::fs::symlink(&outside, tool.root().join("dir")).unwrap();

        let err = tool
            .invoke(serde_json::json!({"action": "write", "path": "dir/new.txt", "content": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, HearthError::AccessDenied { .. }));
        assert!(!outside.join("new.txt").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn denied_write_creates_no_directories_outside() {
        let (dir, tool) = tool();
        let outside = dir.path().join("elsewhere");
        std::fs::create_dir_all(&outside).unwrap();
        std::os::unix::fs::symlink(&outside, tool.root().join("link")).unwrap();

        let err = tool
            .invoke(serde_json::json!({
                "action": "write",
                "path": "link/evil/deeper/f.txt",
                "content": "x"
            }))
            .await
            .unwrap_err();
        assert!(matches!(err, HearthError::AccessDenied { .. }));
        assert!(!outside.join("evil").exists());
    }

    #[tokio::test]
    async fn write_creates_missing_directories_inside_root() {
        let (_dir, tool) = tool();
        tool.invoke(serde_json::json!({"action": "write", "path": "a/b/c.txt", "content": "deep"}))
            .await
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(tool.root().join("a/b/c.txt")).unwrap(),
            "deep"
        );
    }

    #[tokio::test]
    async fn large_files_are_truncated() {
        let (_dir, tool) = tool();
        std::fs::write(tool.root().join("big.txt"), "a".repeat(MAX_READ_SIZE + 10)).unwrap();
        let out = tool
            .invoke(serde_json::json!({"action": "read", "path": "big.txt"}))
            .await
            .unwrap();
        assert!(out.content.contains("[File truncated"));
    }

    #[tokio::test]
    async fn unknown_action_is_reported_to_model() {
        let (_dir, tool) = tool();
        let out = tool
            .invoke(serde_json::json!({"action": "delete", "path": "a"}))
            .await
            .unwrap();
        assert!(out.is_error);
    }
}
