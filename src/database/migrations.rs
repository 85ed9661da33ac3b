//! Schema migrations for the tab/history database.
//!
//! Uses a `schema_version` table to track which migrations have been applied.
//! Each migration runs exactly once and is recorded with a timestamp.

use rusqlite::Connection;

/// Current schema version. Bump this when adding a new migration.
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Returns the current schema version from the database (0 if none applied).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .unwrap_or(0)
}

/// Runs all pending schema migrations against the provided connection.
///
/// # Errors
/// Returns `rusqlite::Error` if any SQL statement fails.
pub fn run_all(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
         CREATE TABLE IF NOT EXISTS schema_version (
             version INTEGER PRIMARY KEY,
             applied_at INTEGER NOT NULL,
             description TEXT NOT NULL
         );",
    )?;

    let current = get_schema_version(conn);

    if current < 1 {
        migration_v1(conn)?;
        record_version(conn, 1, "Initial schema: links, tabs, tab and browser history")?;
    }

    if current < 2 {
        migration_v2(conn)?;
        record_version(conn, 2, "Add favicon to link")?;
    }

    Ok(())
}

fn record_version(conn: &Connection, version: i32, description: &str) -> Result<(), rusqlite::Error> {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at, description) VALUES (?1, ?2, ?3)",
        rusqlite::params![version, now, description],
    )?;
    Ok(())
}

/// V1: links are shared between tab history and browsing history.
fn migration_v1(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS link (
            link_id INTEGER PRIMARY KEY AUTOINCREMENT,
            url TEXT NOT NULL,
            title TEXT NOT NULL DEFAULT '',
            thumb_path TEXT NOT NULL DEFAULT ''
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_link_url ON link(url);

        CREATE TABLE IF NOT EXISTS tab (
            tab_id INTEGER PRIMARY KEY,
            tab_history_id INTEGER
        );

        CREATE TABLE IF NOT EXISTS tab_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            tab_id INTEGER NOT NULL,
            link_id INTEGER NOT NULL,
            date INTEGER NOT NULL,
            FOREIGN KEY (tab_id) REFERENCES tab(tab_id) ON DELETE CASCADE,
            FOREIGN KEY (link_id) REFERENCES link(link_id)
        );

        CREATE INDEX IF NOT EXISTS idx_tab_history_tab ON tab_history(tab_id);

        CREATE TABLE IF NOT EXISTS browser_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            link_id INTEGER NOT NULL,
            date INTEGER NOT NULL,
            FOREIGN KEY (link_id) REFERENCES link(link_id)
        );

        CREATE INDEX IF NOT EXISTS idx_browser_history_date ON browser_history(date);
        ",
    )
}

/// V2: favicon column for databases created before navigations carried one.
fn migration_v2(conn: &Connection) -> Result<(), rusqlite::Error> {
    if conn.prepare("SELECT favicon FROM link LIMIT 0").is_err() {
        conn.execute_batch("ALTER TABLE link ADD COLUMN favicon TEXT NOT NULL DEFAULT '';")?;
    }
    Ok(())
}
