//! CSV column mapping repository. At most one mapping row exists.

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DatabaseError};
use crate::models::ColumnMapping;

fn from_row(row: &Row<'_>) -> Result<ColumnMapping, rusqlite::Error> {
    Ok(ColumnMapping {
        external_id_column: row.get("external_id_column")?,
        order_number_column: row.get("order_number_column")?,
        sku_column: row.get("sku_column")?,
        title_column: row.get("title_column")?,
        quantity_column: row.get("quantity_column")?,
        number_of_lines_column: row.get("number_of_lines_column")?,
        customer_note_column: row.get("customer_note_column")?,
        additional_options_column: row.get("additional_options_column")?,
    })
}

/// The stored mapping, if one was saved.
pub fn load(db: &Database) -> Result<Option<ColumnMapping>, DatabaseError> {
    db.with_conn(|conn| {
        let mapping = conn
            .query_row(
                "SELECT * FROM csv_column_mappings ORDER BY created_at LIMIT 1",
                [],
                from_row,
            )
            .optional()?;
        Ok(mapping)
    })
}

/// Saves the mapping, updating the existing row when there is one.
pub fn save(db: &Database, mapping: &ColumnMapping) -> Result<(), DatabaseError> {
    db.with_transaction(|tx| {
        let now = Utc::now();
        let existing: Option<String> = tx
            .query_row(
                "SELECT id FROM csv_column_mappings ORDER BY created_at LIMIT 1",
                [],
                |r| r.get(0),
            )
            .optional()?;

        match existing {
            Some(id) => {
                tx.execute(
                    "UPDATE csv_column_mappings SET external_id_column=?2, order_number_column=?3,
                     sku_column=?4, title_column=?5, quantity_column=?6, number_of_lines_column=?7,
                     customer_note_column=?8, additional_options_column=?9, updated_at=?10
                     WHERE id=?1",
                    params![
                        id,
                        mapping.external_id_column,
                        mapping.order_number_column,
                        mapping.sku_column,
                        mapping.title_column,
                        mapping.quantity_column,
                        mapping.number_of_lines_column,
                        mapping.customer_note_column,
                        mapping.additional_options_column,
                        now,
                    ],
                )?;
            }
            None => {
                tx.execute(
                    "INSERT INTO csv_column_mappings (id, external_id_column, order_number_column,
                     sku_column, title_column, quantity_column, number_of_lines_column,
                     customer_note_column, additional_options_column, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
                    params![
                        uuid::Uuid::new_v4().to_string(),
                        mapping.external_id_column,
                        mapping.order_number_column,
                        mapping.sku_column,
                        mapping.title_column,
                        mapping.quantity_column,
                        mapping.number_of_lines_column,
                        mapping.customer_note_column,
                        mapping.additional_options_column,
                        now,
                    ],
                )?;
            }
        }
        Ok(())
    })
}

/// Removes the stored mapping so imports use the default headers again.
pub fn clear(db: &Database) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        let removed = conn.execute("DELETE FROM csv_column_mappings", [])?;
        log::debug!("Cleared {} column mapping rows", removed);
        Ok(())
    })
}
