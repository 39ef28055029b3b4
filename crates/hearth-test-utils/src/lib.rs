// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Hearth integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic tests without model backends.
//!
//! # Components
//!
//! - [`MockProvider`] - scripted model provider that records requests
//! - [`MockEmbedder`] - deterministic keyword embedder
//! - [`MockToolExecutor`] - tool executor that records calls
//! - [`TestHarness`] - full pipeline over a temp SQLite database

pub mod harness;
pub mod mock_embedder;
pub mod mock_provider;
pub mod mock_tools;

pub use harness::{TestHarness, TestHarnessBuilder, envelope};
pub use mock_embedder::MockEmbedder;
pub use mock_provider::MockProvider;
pub use mock_tools::MockToolExecutor;
