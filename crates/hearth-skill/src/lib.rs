// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool trait, registry, and built-in tools for the Hearth agent runtime.
//!
//! The [`ToolRegistry`] implements [`hearth_core::ToolExecutor`], so the
//! tool-call loop can run every call the model requests concurrently.
//!
//! Built-in tools:
//! - [`builtin::FileTool`] -- read, write and list files inside a sandbox root

pub mod builtin;
pub mod tool;

pub use tool::{Tool, ToolOutput, ToolRegistry};
