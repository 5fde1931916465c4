//! SQLite persistence for gateway debounce state, so a restart between poll
//! cycles neither re-emits nor forgets a pending transition.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use gwwatch_core::{CanonicalStatus, EntityStateRecord, EntityStateStore, StoreError};

/// SQLite-backed [`EntityStateStore`] scoped to one namespace.
///
/// A namespace identifies one monitoring configuration; records of other
/// namespaces in the same database are invisible to this store.
pub struct SqliteStateStore {
    conn: Connection,
    namespace: String,
}

fn store_err(e: rusqlite::Error) -> StoreError {
    StoreError::new(e.to_string())
}

impl SqliteStateStore {
    /// Open (or create) a database at the given filesystem path and run migrations.
    pub fn open(path: &Path, namespace: impl Into<String>) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(store_err)?;
        Self::with_connection(conn, namespace.into())
    }

    /// Open an in-memory database. Useful for testing.
    pub fn open_in_memory(namespace: impl Into<String>) -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(store_err)?;
        Self::with_connection(conn, namespace.into())
    }

    fn with_connection(conn: Connection, namespace: String) -> Result<Self, StoreError> {
        let store = Self { conn, namespace };
        store.migrate().map_err(store_err)?;
        Ok(store)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Create the schema if it does not already exist.
    fn migrate(&self) -> rusqlite::Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS entity_state (
                namespace      TEXT NOT NULL,
                entity_key     TEXT NOT NULL,
                last_status    TEXT,
                last_change    TEXT,
                notified       INTEGER NOT NULL DEFAULT 0,
                last_reported  TEXT,
                updated_at     TEXT NOT NULL,
                PRIMARY KEY (namespace, entity_key)
            );",
        )
    }

    /// All records in this namespace, ordered by entity key.
    pub fn list(&self) -> Result<Vec<(String, EntityStateRecord)>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT entity_key, last_status, last_change, notified, last_reported
                 FROM entity_state
                 WHERE namespace = ?1
                 ORDER BY entity_key",
            )
            .map_err(store_err)?;

        let rows = stmt
            .query_map(params![self.namespace], |row| {
                let key: String = row.get(0)?;
                Ok((key, record_from_columns(row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)))
            })
            .map_err(store_err)?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row.map_err(store_err)?);
        }
        Ok(result)
    }

    /// Delete the record for `entity_key`. Removing a missing key is a no-op.
    pub fn remove(&self, entity_key: &str) -> Result<bool, StoreError> {
        let deleted = self
            .conn
            .execute(
                "DELETE FROM entity_state WHERE namespace = ?1 AND entity_key = ?2",
                params![self.namespace, entity_key],
            )
            .map_err(store_err)?;
        Ok(deleted > 0)
    }
}

impl EntityStateStore for SqliteStateStore {
    fn get(&self, entity_key: &str) -> Result<EntityStateRecord, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT last_status, last_change, notified, last_reported
                 FROM entity_state
                 WHERE namespace = ?1 AND entity_key = ?2",
                params![self.namespace, entity_key],
                |row| {
                    Ok(record_from_columns(
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                    ))
                },
            )
            .optional()
            .map_err(store_err)?;
        Ok(row.unwrap_or_default())
    }

    fn put(&mut self, entity_key: &str, record: &EntityStateRecord) -> Result<(), StoreError> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO entity_state
                    (namespace, entity_key, last_status, last_change,
                     notified, last_reported, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    self.namespace,
                    entity_key,
                    record.last_status.map(CanonicalStatus::as_str),
                    record.last_change.map(|dt| dt.to_rfc3339()),
                    record.notified,
                    record.last_reported.map(CanonicalStatus::as_str),
                    Utc::now().to_rfc3339(),
                ],
            )
            .map_err(store_err)?;
        Ok(())
    }
}

/// Build a record from raw columns. Unparseable values fall back to the
/// unobserved defaults rather than failing the read.
fn record_from_columns(
    last_status: Option<String>,
    last_change: Option<String>,
    notified: bool,
    last_reported: Option<String>,
) -> EntityStateRecord {
    let last_status = last_status.as_deref().and_then(parse_status);
    let last_change = last_change.as_deref().and_then(|s| {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    });

    EntityStateRecord {
        last_status,
        last_change,
        // A flag without a status cannot refer to the current status.
        notified: notified && last_status.is_some(),
        last_reported: last_reported.as_deref().and_then(parse_status),
    }
}

fn parse_status(s: &str) -> Option<CanonicalStatus> {
    match s.parse() {
        Ok(status) => Some(status),
        Err(e) => {
            tracing::warn!("ignoring persisted status: {e}");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
