//! Versioned schema migrations for the local task database.
//!
//! Each migration runs once, inside a transaction, and is recorded in the
//! `migrations` table. New schema changes are appended with the next
//! version number; applied migrations are never edited.

use crate::libs::messages::Message;
use crate::{msg_debug, msg_error};
use anyhow::Result;
use rusqlite::{params, Connection, Transaction};

const MIGRATIONS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS migrations (
    id INTEGER PRIMARY KEY,
    version INTEGER NOT NULL UNIQUE,
    name TEXT NOT NULL,
    applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)";

struct Migration {
    version: u32,
    name: &'static str,
    up: fn(&Transaction) -> Result<()>,
}

pub struct MigrationManager {
    migrations: Vec<Migration>,
}

impl MigrationManager {
    pub fn new() -> Self {
        let mut manager = Self { migrations: Vec::new() };
        manager.register_migrations();
        manager
    }

    fn register_migrations(&mut self) {
        // Version 1: the todos collection. Main tasks carry `priority`,
        // subtasks carry `parent_id` and `sort_order`; never both.
        self.add_migration(1, "create_todos", |tx| {
            tx.execute(
                "CREATE TABLE IF NOT EXISTS todos (
                    id TEXT NOT NULL PRIMARY KEY,
                    title TEXT NOT NULL,
                    completed BOOLEAN NOT NULL DEFAULT FALSE,
                    owner TEXT NOT NULL,
                    created_time INTEGER NOT NULL,
                    priority TEXT,
                    sort_order INTEGER,
                    parent_id TEXT,
                    CHECK ((priority IS NULL) <> (parent_id IS NULL)),
                    CHECK ((parent_id IS NULL) = (sort_order IS NULL))
                )",
                [],
            )?;
            Ok(())
        });

        // Version 2: indices for the two list queries
        self.add_migration(2, "index_todos_queries", |tx| {
            tx.execute(
                "CREATE INDEX IF NOT EXISTS idx_todos_main ON todos(created_time) WHERE priority IS NOT NULL",
                [],
            )?;
            tx.execute("CREATE INDEX IF NOT EXISTS idx_todos_parent ON todos(parent_id, sort_order)", [])?;
            Ok(())
        });
    }

    fn add_migration(&mut self, version: u32, name: &'static str, up: fn(&Transaction) -> Result<()>) {
        self.migrations.push(Migration { version, name, up });
    }

    /// Applies every migration newer than the current schema version.
    pub fn migrate(&self, conn: &mut Connection) -> Result<()> {
        conn.execute(MIGRATIONS_TABLE, [])?;
        let current_version = Self::current_version(conn)?;

        let pending: Vec<&Migration> = self.migrations.iter().filter(|m| m.version > current_version).collect();
        if pending.is_empty() {
            return Ok(());
        }

        let tx = conn.transaction()?;
        for migration in pending {
            msg_debug!(Message::RunningMigration(migration.version, migration.name.to_string()));
            if let Err(e) = (migration.up)(&tx) {
                msg_error!(Message::MigrationFailed(migration.version, e.to_string()));
                return Err(e);
            }
            tx.execute(
                "INSERT INTO migrations (version, name) VALUES (?1, ?2)",
                params![migration.version, migration.name],
            )?;
        }
        tx.commit()?;

        Ok(())
    }

    pub fn current_version(conn: &Connection) -> Result<u32> {
        let version: Option<u32> = conn.query_row("SELECT MAX(version) FROM migrations", [], |row| row.get(0))?;
        Ok(version.unwrap_or(0))
    }

    pub fn latest_version(&self) -> u32 {
        self.migrations.last().map(|m| m.version).unwrap_or(0)
    }
}

impl Default for MigrationManager {
    fn default() -> Self {
        Self::new()
    }
}
