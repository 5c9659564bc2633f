//! SKU position repository: one remembered stamp position per SKU.

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DatabaseError};
use crate::models::SkuPosition;

fn from_row(row: &Row<'_>) -> Result<SkuPosition, rusqlite::Error> {
    Ok(SkuPosition {
        id: row.get("id")?,
        sku: row.get("sku")?,
        x_position: row.get("x_position")?,
        y_position: row.get("y_position")?,
        font_size: row.get("font_size")?,
        last_updated: row.get("last_updated")?,
        created_at: row.get("created_at")?,
    })
}

/// Inserts or updates the position for `sku` and returns the stored row.
///
/// The row id and `created_at` survive updates.
pub fn upsert(
    db: &Database,
    sku: &str,
    x_position: f64,
    y_position: f64,
    font_size: f64,
) -> Result<SkuPosition, DatabaseError> {
    db.with_conn(|conn| {
        let now = Utc::now();
        conn.execute(
            "INSERT INTO sku_positions (id, sku, x_position, y_position, font_size, last_updated, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
             ON CONFLICT(sku) DO UPDATE SET
               x_position = ?3,
               y_position = ?4,
               font_size = ?5,
               last_updated = ?6",
            params![
                uuid::Uuid::new_v4().to_string(),
                sku,
                x_position,
                y_position,
                font_size,
                now,
            ],
        )?;
        let row = conn.query_row(
            "SELECT * FROM sku_positions WHERE sku = ?1",
            params![sku],
            from_row,
        )?;
        Ok(row)
    })
}

/// Finds the position remembered for a SKU (exact match).
pub fn find_by_sku(db: &Database, sku: &str) -> Result<Option<SkuPosition>, DatabaseError> {
    db.with_conn(|conn| {
        let row = conn
            .query_row(
                "SELECT * FROM sku_positions WHERE sku = ?1",
                params![sku],
                from_row,
            )
            .optional()?;
        Ok(row)
    })
}

/// All positions, most recently updated first.
pub fn list_all(db: &Database) -> Result<Vec<SkuPosition>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt =
            conn.prepare("SELECT * FROM sku_positions ORDER BY last_updated DESC, sku ASC")?;
        let rows = stmt
            .query_map([], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Deletes a position by row id. Returns whether a row was removed.
pub fn delete(db: &Database, id: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute("DELETE FROM sku_positions WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    })
}
