// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! System prompt and retrieval block rendering.

use std::fmt::Write;

use hearth_core::{RetrievedMemory, ToolDefinition};

/// Header line of the retrieval system message.
pub const RETRIEVAL_HEADER: &str = "From earlier in this conversation:";

/// Renders the single leading system message.
pub fn render_system_prompt(
    prompt: &str,
    summary: Option<&str>,
    tools: &[ToolDefinition],
    skills: &[String],
) -> String {
    let mut out = prompt.trim().to_string();

    if let Some(summary) = summary.map(str::trim).filter(|s| !s.is_empty()) {
        let _ = write!(out, "\n\n## Last Summary\n{summary}");
    }

    if !tools.is_empty() {
        out.push_str("\n\n## Available Tools");
        for tool in tools {
            let _ = write!(out, "\n- {}: {}", tool.name, tool.description);
        }
    }

    if !skills.is_empty() {
        out.push_str("\n\n## Skills");
        for skill in skills {
            let _ = write!(out, "\n- {skill}");
        }
    }

    out
}

/// Renders retrieved memories under [`RETRIEVAL_HEADER`].
pub fn render_retrieval(memories: &[RetrievedMemory]) -> String {
    let mut out = RETRIEVAL_HEADER.to_string();
    for memory in memories {
        let _ = write!(
            out,
            "\n- [{}] {}: {}",
            memory.created_at, memory.source, memory.content
        );
    }
    out
}
