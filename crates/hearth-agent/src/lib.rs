// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation processing for the Hearth agent.
//!
//! - [`DebounceBuffer`] collects inbound messages per chat until it goes quiet
//! - [`PriorityLimiter`] bounds concurrent model calls, interactive first
//! - [`ToolLoop`] runs bounded model/tool rounds for one turn
//! - [`Pipeline`] glues storage, context assembly, routing and tools together
//! - [`shutdown`] turns SIGINT/SIGTERM into a cancellation token

pub mod debounce;
pub mod limiter;
pub mod pipeline;
pub mod shutdown;
pub mod tool_loop;

pub use debounce::{DebounceBuffer, FlushHandler};
pub use limiter::{LimiterPermit, Priority, PriorityLimiter};
pub use pipeline::{Pipeline, ReplyDispatcher};
pub use shutdown::install_signal_handler;
pub use tool_loop::{LoopOptions, LoopOutcome, LoopState, ToolLoop};
