//! The SQLite snapshot store.

use parking_lot::Mutex;
use rusqlite::Connection;
use session::{PersistedState, SnapshotStore, StoreError};
use types::CompletedLot;

use crate::schema::{StorageConfig, init_schema};

/// SQLite-backed implementation of the engine's [`SnapshotStore`] seam.
///
/// Uses interior mutability (Mutex) because the trait takes `&self`. The
/// state document is serialized as one JSON blob: the whole point of the
/// single-row table is that recovery never merges anything.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the store at the configured path.
    pub fn new(config: StorageConfig) -> rusqlite::Result<Self> {
        let conn = if config.path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(&config.path)?
        };
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open a store from a path with default configuration.
    pub fn from_path(path: impl AsRef<std::path::Path>) -> rusqlite::Result<Self> {
        Self::new(StorageConfig::from_path(path))
    }
}

fn db_err(err: impl std::fmt::Display) -> StoreError {
    StoreError(err.to_string())
}

impl SnapshotStore for SqliteStore {
    fn save(&self, state: &PersistedState) -> Result<(), StoreError> {
        let json = serde_json::to_string(state).map_err(db_err)?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO engine_state (id, state, saved_at)
             VALUES (0, ?1, strftime('%s', 'now'))
             ON CONFLICT(id) DO UPDATE SET state = ?1, saved_at = strftime('%s', 'now')",
            rusqlite::params![json],
        )
        .map_err(db_err)?;
        Ok(())
    }

    fn load(&self) -> Result<Option<PersistedState>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare("SELECT state FROM engine_state WHERE id = 0")
            .map_err(db_err)?;
        let mut rows = stmt.query([]).map_err(db_err)?;
        let Some(row) = rows.next().map_err(db_err)? else {
            return Ok(None);
        };
        let json: String = row.get(0).map_err(db_err)?;
        let state = serde_json::from_str(&json).map_err(db_err)?;
        Ok(Some(state))
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.conn
            .lock()
            .execute("DELETE FROM engine_state", [])
            .map_err(db_err)?;
        Ok(())
    }

    fn record_result(&self, completed: &CompletedLot) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "INSERT INTO lot_results
                 (lot_id, label, provenance, winner, amount, total_bids, ended_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .map_err(db_err)?;

        if completed.winners.is_empty() {
            stmt.execute(rusqlite::params![
                completed.lot.id.0 as i64,
                completed.lot.label,
                completed.lot.provenance.to_string(),
                "",
                0i64,
                completed.total_bids as i64,
                completed.ended_at as i64,
            ])
            .map_err(db_err)?;
            return Ok(());
        }

        for winner in &completed.winners {
            stmt.execute(rusqlite::params![
                completed.lot.id.0 as i64,
                completed.lot.label,
                completed.lot.provenance.to_string(),
                winner.name,
                winner.amount.raw(),
                completed.total_bids as i64,
                completed.ended_at as i64,
            ])
            .map_err(db_err)?;
        }
        Ok(())
    }
}
