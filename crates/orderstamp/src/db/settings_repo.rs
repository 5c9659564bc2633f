//! Key/value settings stored in `app_settings`.

use rusqlite::{params, OptionalExtension};

use super::{Database, DatabaseError};
use crate::models::{AppSettings, DATE_FOLDER_KEY, PREMADE_FOLDER_KEY};

/// Reads one setting.
pub fn get(db: &Database, key: &str) -> Result<Option<String>, DatabaseError> {
    db.with_conn(|conn| {
        let value = conn
            .query_row(
                "SELECT value FROM app_settings WHERE key = ?1",
                params![key],
                |r| r.get(0),
            )
            .optional()?;
        Ok(value)
    })
}

/// Writes one setting, replacing any previous value.
pub fn set(db: &Database, key: &str, value: &str) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO app_settings (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = ?3",
            params![key, value, chrono::Utc::now()],
        )?;
        Ok(())
    })
}

/// Both folder settings; absent keys read as empty.
pub fn load(db: &Database) -> Result<AppSettings, DatabaseError> {
    Ok(AppSettings {
        date_folder_path: get(db, DATE_FOLDER_KEY)?.unwrap_or_default(),
        premade_folder_path: get(db, PREMADE_FOLDER_KEY)?.unwrap_or_default(),
    })
}

/// Writes both folder settings in one transaction.
pub fn save(db: &Database, settings: &AppSettings) -> Result<(), DatabaseError> {
    db.with_transaction(|tx| {
        let now = chrono::Utc::now();
        for (key, value) in [
            (DATE_FOLDER_KEY, &settings.date_folder_path),
            (PREMADE_FOLDER_KEY, &settings.premade_folder_path),
        ] {
            tx.execute(
                "INSERT INTO app_settings (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = ?3",
                params![key, value, now],
            )?;
        }
        Ok(())
    })
}
