// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits.
//!
//! Every seam between components is an `#[async_trait]` trait object passed
//! at construction time.

pub mod channel;
pub mod embedding;
pub mod memory;
pub mod operator;
pub mod provider;
pub mod storage;
pub mod tools;

pub use channel::OutboundSink;
pub use embedding::EmbeddingAdapter;
pub use memory::MemorySearch;
pub use operator::{Maintenance, Scheduler};
pub use provider::ProviderClient;
pub use storage::StorageAdapter;
pub use tools::ToolExecutor;
