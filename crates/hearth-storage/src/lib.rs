// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Hearth agent runtime.
//!
//! WAL-mode SQLite with embedded refinery migrations and a single-writer
//! model via `tokio-rusqlite`. Provides conversations, the append-only
//! message log (with its FTS5 index and embedding side table), summaries,
//! and schedule definitions.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;
pub mod scheduler;

pub use adapter::SqliteStorage;
pub use database::{Database, map_tr_err};
pub use scheduler::SqliteScheduler;
