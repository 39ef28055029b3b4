// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistent schedule definitions behind the [`Scheduler`] trait.
//!
//! Only definitions are stored here; firing belongs to an external engine.

use async_trait::async_trait;
use croner::Cron;

use hearth_core::{HearthError, Schedule, Scheduler};

use crate::database::Database;
use crate::queries;

/// Fields in a standard cron expression (no seconds).
const CRON_FIELDS: usize = 5;

/// SQLite-backed schedule store.
#[derive(Clone)]
pub struct SqliteScheduler {
    db: Database,
}

impl SqliteScheduler {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Scheduler for SqliteScheduler {
    async fn list(&self) -> Result<Vec<Schedule>, HearthError> {
        queries::schedules::list(&self.db).await
    }

    async fn add(&self, schedule: Schedule) -> Result<(), HearthError> {
        if schedule.name.trim().is_empty() {
            return Err(HearthError::Config("schedule name must not be empty".into()));
        }
        validate_cron(&schedule.cron)?;
        queries::schedules::upsert(&self.db, schedule).await
    }

    async fn remove(&self, name: &str) -> Result<bool, HearthError> {
        queries::schedules::delete(&self.db, name).await
    }
}

/// Checks a five-field cron expression or an `@daily`-style nickname.
///
/// Names such as `MON-FRI` and `JAN` are accepted.
pub fn validate_cron(expr: &str) -> Result<(), HearthError> {
    let expr = expr.trim();
    if !expr.starts_with('@') {
        let fields = expr.split_whitespace().count();
        if fields != CRON_FIELDS {
            return Err(HearthError::Config(format!(
                "cron expression `{expr}` must have {CRON_FIELDS} fields, found {fields}"
            )));
        }
    }
    expr.parse::<Cron>()
        .map(|_| ())
        .map_err(|e| HearthError::Config(format!("invalid cron expression `{expr}`: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_core::now_timestamp;

    fn schedule(name: &str, cron: &str) -> Schedule {
        Schedule {
            name: name.into(),
            cron: cron.into(),
            message: "check the weather".into(),
            model: None,
            inject_into: Some("chat-1".into()),
            created_at: now_timestamp(),
        }
    }

    #[test]
    fn accepts_common_expressions() {
        for expr in [
            "* * * * *",
            "0 9 * * 1-5",
            "*/15 0,12 1 1-12/2 0",
            "0 9 * * MON-FRI",
            "0 0 1 JAN *",
            "@daily",
        ] {
            assert!(validate_cron(expr).is_ok(), "{expr}");
        }
    }

    #[test]
    fn rejects_malformed_expressions() {
        for expr in ["* * * *", "0 0 * * * *", "60 * * * *", "* 24 * * *", "a * * * *"] {
            assert!(validate_cron(expr).is_err(), "{expr}");
        }
    }

    #[tokio::test]
    async fn add_list_remove() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("s.db"), true).await.unwrap();
        let scheduler = SqliteScheduler::new(db);

        scheduler.add(schedule("morning", "0 8 * * *")).await.unwrap();
        scheduler.add(schedule("morning", "30 8 * * *")).await.unwrap();
        let all = scheduler.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].cron, "30 8 * * *");

        assert!(scheduler.add(schedule("bad", "nope")).await.is_err());
        assert!(scheduler.remove("morning").await.unwrap());
        assert!(!scheduler.remove("morning").await.unwrap());
    }
}
