//! Session repository: CRUD operations for the `processing_sessions` table.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DatabaseError};
use crate::models::{ProcessingSession, SessionStatus};

fn from_row(row: &Row<'_>) -> Result<ProcessingSession, rusqlite::Error> {
    Ok(ProcessingSession {
        id: row.get("id")?,
        csv_filename: row.get("csv_filename")?,
        total_orders: row.get("total_orders")?,
        completed_orders: row.get("completed_orders")?,
        started_at: row.get("started_at")?,
        completed_at: row.get("completed_at")?,
        status: row.get("status")?,
        created_at: row.get("created_at")?,
    })
}

/// Inserts a new session row.
pub fn insert(db: &Database, session: &ProcessingSession) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO processing_sessions (id, csv_filename, total_orders, completed_orders,
             started_at, completed_at, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                session.id,
                session.csv_filename,
                session.total_orders,
                session.completed_orders,
                session.started_at,
                session.completed_at,
                session.status,
                session.created_at,
            ],
        )?;
        Ok(())
    })
}

/// Overwrites the counters and status of an existing session.
pub fn update(db: &Database, session: &ProcessingSession) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE processing_sessions SET total_orders=?2, completed_orders=?3,
             completed_at=?4, status=?5 WHERE id=?1",
            params![
                session.id,
                session.total_orders,
                session.completed_orders,
                session.completed_at,
                session.status,
            ],
        )?;
        if changed == 0 {
            return Err(DatabaseError::NotFound {
                entity: "Session",
                id: session.id.clone(),
            });
        }
        Ok(())
    })
}

/// Finds a session by its ID.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<ProcessingSession>, DatabaseError> {
    db.with_conn(|conn| {
        let session = conn
            .query_row(
                "SELECT * FROM processing_sessions WHERE id = ?1",
                params![id],
                from_row,
            )
            .optional()?;
        Ok(session)
    })
}

/// Most recent sessions first.
pub fn list_recent(db: &Database, limit: u32) -> Result<Vec<ProcessingSession>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM processing_sessions ORDER BY created_at DESC, rowid DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// The newest session still in progress, if any.
pub fn latest_in_progress(db: &Database) -> Result<Option<ProcessingSession>, DatabaseError> {
    db.with_conn(|conn| {
        let session = conn
            .query_row(
                "SELECT * FROM processing_sessions WHERE status = ?1
                 ORDER BY created_at DESC, rowid DESC LIMIT 1",
                params![SessionStatus::InProgress],
                from_row,
            )
            .optional()?;
        Ok(session)
    })
}
