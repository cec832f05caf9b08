//! Versioned schema migrations.
//!
//! Each migration runs in its own transaction together with the insert into
//! `schema_version`, so a failed step leaves the previous version intact.

use rusqlite::{Connection, Result, Transaction};

/// Schema version this build expects
pub const CURRENT_VERSION: u32 = 2;

type Migration = fn(&Transaction) -> Result<()>;

/// Migrations in ascending version order, starting at 1
const MIGRATIONS: &[(u32, Migration)] = &[(1, leads_and_projects), (2, stage_history)];

pub struct MigrationManager;

impl MigrationManager {
    /// Create the version table if needed and apply every pending migration
    pub fn initialize(conn: &Connection) -> Result<()> {
        conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY);")?;

        let installed = Self::get_version(conn)?;
        for (version, migrate) in MIGRATIONS.iter().filter(|(v, _)| *v > installed) {
            let tx = conn.unchecked_transaction()?;
            migrate(&tx)?;
            tx.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
            tx.commit()?;
            log::debug!("Applied schema migration v{}", version);
        }
        Ok(())
    }

    /// Highest applied version, 0 for a fresh database
    pub fn get_version(conn: &Connection) -> Result<u32> {
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |row| row.get(0))
    }
}

fn leads_and_projects(tx: &Transaction) -> Result<()> {
    // Stage is free text: ids outside the registry are kept and shown as uncategorized
    tx.execute_batch(
        "CREATE TABLE projects (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            created_ts INTEGER NOT NULL
        );
        CREATE TABLE leads (
            id TEXT PRIMARY KEY,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL DEFAULT '',
            phone TEXT NULL,
            email TEXT NULL,
            stage TEXT NOT NULL,
            priority TEXT NOT NULL CHECK(priority IN ('critical','high','medium','low')),
            source TEXT NOT NULL DEFAULT '',
            score INTEGER NOT NULL DEFAULT 0 CHECK(score BETWEEN 0 AND 100),
            project_id INTEGER NULL REFERENCES projects(id),
            assigned_to TEXT NULL,
            budget_value INTEGER NULL,
            follow_up_ts INTEGER NULL,
            created_ts INTEGER NOT NULL,
            modified_ts INTEGER NOT NULL
        );
        CREATE INDEX idx_leads_stage ON leads(stage);
        CREATE INDEX idx_leads_project ON leads(project_id);",
    )
}

fn stage_history(tx: &Transaction) -> Result<()> {
    tx.execute_batch(
        "CREATE TABLE stage_events (
            id INTEGER PRIMARY KEY,
            lead_id TEXT NOT NULL REFERENCES leads(id),
            from_stage TEXT NOT NULL,
            to_stage TEXT NOT NULL,
            ts INTEGER NOT NULL
        );
        CREATE INDEX idx_stage_events_lead ON stage_events(lead_id);",
    )
}
