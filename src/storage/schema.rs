//! Database schema definitions and version upgrade logic.

use rusqlite::{Connection, Result};
use std::time::Duration;

/// Schema version this build writes. Stored in `PRAGMA user_version`.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Name of the note collection.
pub const NOTES_TABLE: &str = "notes";

/// Version 1: the note collection.
///
/// `AUTOINCREMENT` keeps ids strictly increasing and never hands out the id
/// of a deleted note again.
const NOTES_SQL: &str = r"
    CREATE TABLE notes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        color TEXT NOT NULL,
        text TEXT NOT NULL DEFAULT '',
        x TEXT,
        y TEXT
    );
";

/// What opening a database at its current on-disk version requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaAction {
    Current,
    Upgrade { from: i32 },
    /// The file was written by a newer build; it must not be touched.
    TooNew { found: i32 },
}

/// Read the persisted schema version. Fresh databases report 0.
///
/// # Errors
///
/// Returns an error if the pragma cannot be read (e.g. the file is not a database).
pub fn schema_version(conn: &Connection) -> Result<i32> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
}

/// Compare the on-disk version with [`CURRENT_SCHEMA_VERSION`].
///
/// # Errors
///
/// Returns an error if the version cannot be read.
pub fn plan(conn: &Connection) -> Result<SchemaAction> {
    let found = schema_version(conn)?;
    Ok(match found.cmp(&CURRENT_SCHEMA_VERSION) {
        std::cmp::Ordering::Equal => SchemaAction::Current,
        std::cmp::Ordering::Less => SchemaAction::Upgrade { from: found },
        std::cmp::Ordering::Greater => SchemaAction::TooNew { found },
    })
}

/// Connection settings applied on every open.
///
/// # Errors
///
/// Returns an error if a pragma cannot be set.
pub fn configure(conn: &Connection, busy_timeout: Duration) -> Result<()> {
    conn.busy_timeout(busy_timeout)?;
    // In-memory databases keep MEMORY journaling regardless of this request.
    conn.pragma_update(None, "journal_mode", "WAL")?;
    // NORMAL synchronous is safe with WAL: committed data survives OS crash
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    Ok(())
}

/// Bring the schema from `from` up to [`CURRENT_SCHEMA_VERSION`].
///
/// Runs in a single transaction so a failed upgrade leaves the old version
/// in place. Each step checks for existing structures first, so rerunning an
/// interrupted upgrade is harmless.
///
/// # Errors
///
/// Returns an error if a step or the version bump fails.
pub fn upgrade(conn: &mut Connection, from: i32) -> Result<()> {
    let tx = conn.transaction()?;
    for version in (from + 1)..=CURRENT_SCHEMA_VERSION {
        if version == 1 && !table_exists(&tx, NOTES_TABLE) {
            tx.execute_batch(NOTES_SQL)?;
        }
    }
    tx.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION)?;
    tx.commit()
}

fn table_exists(conn: &Connection, table: &str) -> bool {
    conn.prepare("SELECT 1 FROM sqlite_master WHERE type='table' AND name=?")
        .and_then(|mut stmt| stmt.exists([table]))
        .unwrap_or(false)
}
