//! Order item repository: CRUD operations for the `order_items` table.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DatabaseError};
use crate::models::{OrderItem, OrderStatus};

fn from_row(row: &Row<'_>) -> Result<OrderItem, rusqlite::Error> {
    Ok(OrderItem {
        id: row.get("id")?,
        session_id: row.get("session_id")?,
        external_id: row.get("external_id")?,
        order_number: row.get("order_number")?,
        sku: row.get("sku")?,
        product_title: row.get("product_title")?,
        quantity: row.get("quantity")?,
        number_of_lines: row.get("number_of_lines")?,
        customer_note: row.get("customer_note")?,
        additional_options: row.get("additional_options")?,
        is_customized: row.get("is_customized")?,
        status: row.get("status")?,
        saved_at: row.get("saved_at")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Inserts all items in one transaction; either every row lands or none does.
pub fn insert_many(db: &Database, items: &[OrderItem]) -> Result<(), DatabaseError> {
    db.with_transaction(|tx| {
        let mut stmt = tx.prepare(
            "INSERT INTO order_items (id, session_id, external_id, order_number, sku,
             product_title, quantity, number_of_lines, customer_note, additional_options,
             is_customized, status, saved_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        )?;
        for item in items {
            stmt.execute(params![
                item.id,
                item.session_id,
                item.external_id,
                item.order_number,
                item.sku,
                item.product_title,
                item.quantity,
                item.number_of_lines,
                item.customer_note,
                item.additional_options,
                item.is_customized,
                item.status,
                item.saved_at,
                item.created_at,
                item.updated_at,
            ])?;
        }
        log::debug!("Inserted {} order items", items.len());
        Ok(())
    })
}

/// Finds an order item by its ID.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<OrderItem>, DatabaseError> {
    db.with_conn(|conn| {
        let item = conn
            .query_row(
                "SELECT * FROM order_items WHERE id = ?1",
                params![id],
                from_row,
            )
            .optional()?;
        Ok(item)
    })
}

/// Items of a session in CSV order.
pub fn list_by_session(db: &Database, session_id: &str) -> Result<Vec<OrderItem>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt =
            conn.prepare("SELECT * FROM order_items WHERE session_id = ?1 ORDER BY rowid")?;
        let rows = stmt
            .query_map(params![session_id], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Sets the status of an item. `saved_at` is written as given.
pub fn update_status(
    db: &Database,
    id: &str,
    status: OrderStatus,
    saved_at: Option<DateTime<Utc>>,
) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE order_items SET status = ?2, saved_at = ?3, updated_at = ?4 WHERE id = ?1",
            params![id, status, saved_at, Utc::now()],
        )?;
        if changed == 0 {
            return Err(DatabaseError::NotFound {
                entity: "Order item",
                id: id.to_string(),
            });
        }
        Ok(())
    })
}

/// Number of items of a session with the given status.
pub fn count_by_status(
    db: &Database,
    session_id: &str,
    status: OrderStatus,
) -> Result<u32, DatabaseError> {
    db.with_conn(|conn| {
        let count: u32 = conn.query_row(
            "SELECT COUNT(*) FROM order_items WHERE session_id = ?1 AND status = ?2",
            params![session_id, status],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}
