//! Routing rule repository: CRUD operations for the `sku_routing_rules` table.

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DatabaseError};
use crate::models::RoutingRule;

fn from_row(row: &Row<'_>) -> Result<RoutingRule, rusqlite::Error> {
    Ok(RoutingRule {
        id: row.get("id")?,
        pattern: row.get("pattern")?,
        folder_name: row.get("folder_name")?,
        priority: row.get("priority")?,
        active: row.get("active")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Store order for rules. Equal priorities fall back to creation time, then id.
const ORDER_BY: &str = "ORDER BY priority ASC, created_at ASC, id ASC";

/// Inserts a new rule row.
pub fn insert(db: &Database, rule: &RoutingRule) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO sku_routing_rules (id, pattern, folder_name, priority, active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                rule.id,
                rule.pattern,
                rule.folder_name,
                rule.priority,
                rule.active,
                rule.created_at,
                rule.updated_at,
            ],
        )?;
        Ok(())
    })
}

/// Overwrites pattern, folder, priority and active flag of an existing rule.
pub fn update(db: &Database, rule: &RoutingRule) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE sku_routing_rules SET pattern=?2, folder_name=?3, priority=?4, active=?5,
             updated_at=?6 WHERE id=?1",
            params![
                rule.id,
                rule.pattern,
                rule.folder_name,
                rule.priority,
                rule.active,
                Utc::now(),
            ],
        )?;
        if changed == 0 {
            return Err(DatabaseError::NotFound {
                entity: "Routing rule",
                id: rule.id.clone(),
            });
        }
        Ok(())
    })
}

/// Deletes a rule. Returns whether a row was removed.
pub fn delete(db: &Database, id: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute("DELETE FROM sku_routing_rules WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    })
}

/// Sets the active flag. Returns whether a row was updated.
pub fn set_active(db: &Database, id: &str, active: bool) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE sku_routing_rules SET active = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, active, Utc::now()],
        )?;
        Ok(changed > 0)
    })
}

/// Finds a rule by its ID.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<RoutingRule>, DatabaseError> {
    db.with_conn(|conn| {
        let rule = conn
            .query_row(
                "SELECT * FROM sku_routing_rules WHERE id = ?1",
                params![id],
                from_row,
            )
            .optional()?;
        Ok(rule)
    })
}

/// All rules, active or not, in store order.
pub fn list_all(db: &Database) -> Result<Vec<RoutingRule>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(&format!("SELECT * FROM sku_routing_rules {}", ORDER_BY))?;
        let rows = stmt
            .query_map([], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Active rules in store order.
pub fn list_active(db: &Database) -> Result<Vec<RoutingRule>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(&format!(
            "SELECT * FROM sku_routing_rules WHERE active = 1 {}",
            ORDER_BY
        ))?;
        let rows = stmt
            .query_map([], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}
