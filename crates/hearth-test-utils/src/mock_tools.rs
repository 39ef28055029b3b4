// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool executor that records calls and answers with canned text.

use std::sync::Mutex;

use async_trait::async_trait;
use hearth_core::{ToolCall, ToolDefinition, ToolExecutor, ToolResult};

/// Advertises a single `lookup` tool.
///
/// Each call is answered with `result:<call id>`, or with the fixed text set
/// through [`MockToolExecutor::respond_with`].
#[derive(Default)]
pub struct MockToolExecutor {
    calls: Mutex<Vec<ToolCall>>,
    fixed: Mutex<Option<String>>,
}

impl MockToolExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond_with(&self, content: impl Into<String>) {
        *self.fixed.lock().unwrap_or_else(|p| p.into_inner()) = Some(content.into());
    }

    /// Every call executed so far, in execution order.
    pub fn calls(&self) -> Vec<ToolCall> {
        self.calls.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

#[async_trait]
impl ToolExecutor for MockToolExecutor {
    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![ToolDefinition {
            name: "lookup".into(),
            description: "Looks something up".into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": { "q": { "type": "string" } }
            }),
        }]
    }

    async fn execute_all(&self, calls: &[ToolCall]) -> Vec<ToolResult> {
        self.calls.lock().unwrap_or_else(|p| p.into_inner()).extend(calls.iter().cloned());
        let fixed = self.fixed.lock().unwrap_or_else(|p| p.into_inner()).clone();
        calls
            .iter()
            .map(|call| ToolResult {
                call_id: call.id.clone(),
                content: fixed
                    .clone()
                    .unwrap_or_else(|| format!("result:{}", call.id)),
            })
            .collect()
    }
}
