use crate::db::migrations::MigrationManager;
use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

/// Opens the lead database with the schema brought up to date
pub struct DbConnection;

impl DbConnection {
    /// Open (or create) the database at `db_path`, creating parent directories
    pub fn connect(db_path: &Path) -> Result<Connection> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database: {}", db_path.display()))?;
        Self::prepare(conn)
    }

    /// Fresh in-memory database, used by tests
    pub fn connect_in_memory() -> Result<Connection> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::prepare(conn)
    }

    fn prepare(conn: Connection) -> Result<Connection> {
        // Must be set outside a transaction to take effect
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .context("Failed to enable foreign keys")?;
        MigrationManager::initialize(&conn).context("Failed to initialize database schema")?;
        Ok(conn)
    }
}
