// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Hearth agent runtime.
//!
//! This crate provides the error type, shared domain types, the token
//! estimator, and the collaborator traits implemented by the other crates.

pub mod error;
pub mod tokens;
pub mod traits;
pub mod types;

pub use error::HearthError;
pub use types::{
    ChatMessage, ChatRequest, ChatResponse, Conversation, FinishReason, InboundEnvelope, Message,
    MessageType, NewMessage, OutboundEnvelope, ProviderRequest, RetrievedMemory, Role, Schedule,
    TokenUsage, ToolCall, ToolDefinition, ToolResult, now_timestamp,
};

pub use traits::{
    EmbeddingAdapter, Maintenance, MemorySearch, OutboundSink, ProviderClient, Scheduler,
    StorageAdapter, ToolExecutor,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_traits_are_object_safe() {
        fn _provider(_: &dyn ProviderClient) {}
        fn _storage(_: &dyn StorageAdapter) {}
        fn _embedding(_: &dyn EmbeddingAdapter) {}
        fn _tools(_: &dyn ToolExecutor) {}
        fn _memory(_: &dyn MemorySearch) {}
        fn _scheduler(_: &dyn Scheduler) {}
        fn _maintenance(_: &dyn Maintenance) {}
        fn _outbound(_: &dyn OutboundSink) {}
    }
}
