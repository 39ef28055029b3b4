// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool trait and registry.
//!
//! The [`Tool`] trait is the interface every built-in tool implements. The
//! [`ToolRegistry`] indexes tools by name, advertises their definitions to
//! the model, and executes batches of tool calls.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use hearth_core::{HearthError, ToolCall, ToolDefinition, ToolExecutor, ToolResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Output from a tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Text handed back to the model.
    pub content: String,
    /// Whether the invocation failed in a way the model should see.
    pub is_error: bool,
}

impl ToolOutput {
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}

/// A tool the model can call.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name, used for lookup and in the model's tool list.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema of the arguments object.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Runs the tool with already-parsed JSON arguments.
    async fn invoke(&self, input: serde_json::Value) -> Result<ToolOutput, HearthError>;
}

/// Registry of available tools, indexed by name.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Registers a tool under its `name()`, replacing any previous one.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Runs one call. Every failure becomes error text for the model.
    async fn execute_one(&self, call: &ToolCall) -> ToolResult {
        let content = match self.run(call).await {
            Ok(output) if output.is_error => format!("error: {}", output.content),
            Ok(output) => output.content,
            Err(e) => {
                warn!(tool = %call.name, call_id = %call.id, error = %e, "tool call failed");
                format!("error: {e}")
            }
        };
        ToolResult {
            call_id: call.id.clone(),
            content,
        }
    }

    async fn run(&self, call: &ToolCall) -> Result<ToolOutput, HearthError> {
        let tool = self.get(&call.name).ok_or_else(|| HearthError::Skill {
            message: format!("unknown tool `{}`", call.name),
            source: None,
        })?;

        let raw = if call.arguments.trim().is_empty() {
            "{}"
        } else {
            call.arguments.as_str()
        };
        let input: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| HearthError::Skill {
                message: format!("invalid arguments for `{}`: {e}", call.name),
                source: Some(Box::new(e)),
            })?;

        debug!(tool = %call.name, call_id = %call.id, "invoking tool");
        tool.invoke(input).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolExecutor for ToolRegistry {
    /// Definitions sorted by name, for a stable prompt.
    fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self
            .tools
            .values()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters_schema(),
            })
            .collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    async fn execute_all(&self, calls: &[ToolCall]) -> Vec<ToolResult> {
        join_all(calls.iter().map(|call| self.execute_one(call))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echoes the input back"
        }

        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "message": { "type": "string" },
                    "delay_ms": { "type": "integer" }
                },
                "required": ["message"]
            })
        }

        async fn invoke(&self, input: serde_json::Value) -> Result<ToolOutput, HearthError> {
            if let Some(ms) = input["delay_ms"].as_u64() {
                tokio::time::sleep(Duration::from_millis(ms)).await;
            }
            match input["message"].as_str() {
                Some(m) => Ok(ToolOutput::ok(m)),
                None => Ok(ToolOutput::error("missing message")),
            }
        }
    }

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn name(&self) -> &str {
            "fail"
        }

        fn description(&self) -> &str {
            "Always fails"
        }

        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object"})
        }

        async fn invoke(&self, _input: serde_json::Value) -> Result<ToolOutput, HearthError> {
            Err(HearthError::AccessDenied {
                path: "/etc/shadow".into(),
            })
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        registry.register(Arc::new(FailingTool));
        registry
    }

    fn call(id: &str, name: &str, args: &str) -> ToolCall {
        ToolCall {
            id: id.into(),
            name: name.into(),
            arguments: args.into(),
        }
    }

    #[test]
    fn definitions_are_sorted() {
        let defs = registry().definitions();
        let names: Vec<&str> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["echo", "fail"]);
        assert_eq!(defs[0].parameters["type"], "object");
    }

    #[tokio::test]
    async fn results_follow_call_order() {
        let calls = vec![
            call("a", "echo", r#"{"message":"slow","delay_ms":50}"#),
            call("b", "echo", r#"{"message":"fast"}"#),
        ];
        let results = registry().execute_all(&calls).await;
        assert_eq!(results[0].call_id, "a");
        assert_eq!(results[0].content, "slow");
        assert_eq!(results[1].call_id, "b");
        assert_eq!(results[1].content, "fast");
    }

    #[tokio::test]
    async fn calls_run_concurrently() {
        let calls: Vec<ToolCall> = (0..4)
            .map(|i| call(&i.to_string(), "echo", r#"{"message":"x","delay_ms":100}"#))
            .collect();
        let started = std::time::Instant::now();
        registry().execute_all(&calls).await;
        assert!(started.elapsed() < Duration::from_millis(350));
    }

    #[tokio::test]
    async fn failures_become_error_text() {
        let calls = vec![
            call("1", "nope", "{}"),
            call("2", "echo", "not json"),
            call("3", "fail", ""),
            call("4", "echo", "{}"),
        ];
        let results = registry().execute_all(&calls).await;
        assert!(results[0].content.contains("unknown tool `nope`"));
        assert!(results[1].content.contains("invalid arguments"));
        assert!(results[2].content.contains("access denied"));
        assert_eq!(results[3].content, "error: missing message");
        assert!(results.iter().all(|r| r.content.starts_with("error: ")));
    }
}
