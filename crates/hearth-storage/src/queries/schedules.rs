// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Schedule definitions.

use hearth_core::{HearthError, Schedule};
use rusqlite::params;

use crate::database::{Database, map_tr_err};

/// All schedules ordered by name.
pub async fn list(db: &Database) -> Result<Vec<Schedule>, HearthError> {
    db.connection()
        .call(|conn| -> Result<Vec<Schedule>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT name, cron, message, model, inject_into, created_at
                 FROM schedules ORDER BY name ASC",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(Schedule {
                    name: row.get(0)?,
                    cron: row.get(1)?,
                    message: row.get(2)?,
                    model: row.get(3)?,
                    inject_into: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Insert or replace a schedule by name.
pub async fn upsert(db: &Database, schedule: Schedule) -> Result<(), HearthError> {
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO schedules (name, cron, message, model, inject_into, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(name) DO UPDATE SET
                    cron = excluded.cron,
                    message = excluded.message,
                    model = excluded.model,
                    inject_into = excluded.inject_into",
                params![
                    schedule.name,
                    schedule.cron,
                    schedule.message,
                    schedule.model,
                    schedule.inject_into,
                    schedule.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Delete a schedule. Returns whether a row was removed.
pub async fn delete(db: &Database, name: &str) -> Result<bool, HearthError> {
    let name = name.to_string();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            Ok(conn.execute("DELETE FROM schedules WHERE name = ?1", params![name])? > 0)
        })
        .await
        .map_err(map_tr_err)
}
