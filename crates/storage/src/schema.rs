//! Database schema and configuration.

use rusqlite::Connection;
use std::path::Path;

/// Storage configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Path to the SQLite database (`:memory:` for in-memory).
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: ":memory:".to_string(),
        }
    }
}

impl StorageConfig {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_string_lossy().to_string(),
        }
    }
}

/// Initialize the database schema.
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    // Single-row engine state document (crash recovery)
    conn.execute(
        "CREATE TABLE IF NOT EXISTS engine_state (
            id INTEGER PRIMARY KEY CHECK (id = 0),
            state TEXT NOT NULL,
            saved_at INTEGER DEFAULT (strftime('%s', 'now'))
        )",
        [],
    )?;

    // Completed lots (append-only audit log)
    conn.execute(
        "CREATE TABLE IF NOT EXISTS lot_results (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            lot_id INTEGER NOT NULL,
            label TEXT NOT NULL,
            provenance TEXT NOT NULL,
            winner TEXT NOT NULL,
            amount INTEGER NOT NULL,
            total_bids INTEGER NOT NULL,
            ended_at INTEGER NOT NULL,
            created_at INTEGER DEFAULT (strftime('%s', 'now'))
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_lot_results_lot ON lot_results(lot_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_lot_results_winner ON lot_results(winner)",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_creation() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert!(tables.contains(&"engine_state".to_string()));
        assert!(tables.contains(&"lot_results".to_string()));
    }

    #[test]
    fn test_state_table_is_single_row() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        conn.execute(
            "INSERT INTO engine_state (id, state) VALUES (0, '{}')",
            [],
        )
        .unwrap();
        // A second row violates the id = 0 check.
        assert!(
            conn.execute("INSERT INTO engine_state (id, state) VALUES (1, '{}')", [])
                .is_err()
        );
    }
}
