//! Fallback store schema.
//!
//! The store is a single table of named JSON slots, so there is one schema
//! version instead of a migration chain. `PRAGMA user_version` records it.

use super::{DbError, DbResult};
use log::info;
use rusqlite::Connection;
use std::cmp::Ordering;

/// Schema version written by this build.
pub const SCHEMA_VERSION: u32 = 1;

const CREATE_KV_STORE: &str = "
CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now') * 1000)
);";

/// Creates the slot table on a fresh database.
///
/// # Errors
/// - `SchemaTooNew` when the file was written by a newer build.
pub(crate) fn ensure_schema(conn: &mut Connection) -> DbResult<()> {
    let found = conn.pragma_query_value(None, "user_version", |row| row.get::<_, u32>(0))?;
    match found.cmp(&SCHEMA_VERSION) {
        Ordering::Equal => Ok(()),
        Ordering::Greater => Err(DbError::SchemaTooNew {
            found,
            supported: SCHEMA_VERSION,
        }),
        Ordering::Less => {
            let tx = conn.transaction()?;
            tx.execute_batch(CREATE_KV_STORE)?;
            tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
            tx.commit()?;
            info!("event=db_schema module=db status=ok from_version={found} to_version={SCHEMA_VERSION}");
            Ok(())
        }
    }
}
