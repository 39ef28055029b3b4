// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool executor trait.

use async_trait::async_trait;

use crate::types::{ToolCall, ToolDefinition, ToolResult};

/// Executes model-requested tool calls.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Tool definitions advertised to the model.
    fn definitions(&self) -> Vec<ToolDefinition>;

    /// Executes every call and returns one result per call, in input order.
    ///
    /// Failures are reported in the result text rather than as errors.
    async fn execute_all(&self, calls: &[ToolCall]) -> Vec<ToolResult>;
}
