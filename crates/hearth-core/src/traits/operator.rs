// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborators driven by operator commands.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::HearthError;
use crate::types::Schedule;

/// Persistent schedule definitions. Firing is handled elsewhere.
#[async_trait]
pub trait Scheduler: Send + Sync {
    async fn list(&self) -> Result<Vec<Schedule>, HearthError>;

    /// Adds or replaces a schedule by name.
    async fn add(&self, schedule: Schedule) -> Result<(), HearthError>;

    /// Removes a schedule. Returns `false` if no such schedule existed.
    async fn remove(&self, name: &str) -> Result<bool, HearthError>;
}

/// Long-running maintenance jobs.
#[async_trait]
pub trait Maintenance: Send + Sync {
    /// Rebuilds the embedding index, reporting progress lines on `progress`.
    /// Returns the number of items indexed.
    async fn reindex(&self, progress: mpsc::Sender<String>) -> Result<u64, HearthError>;
}
