use super::migrations::MigrationManager;
use crate::libs::data_storage::DataStorage;
use anyhow::Result;
use rusqlite::Connection;
use std::path::Path;

pub const DB_FILE_NAME: &str = "taskgen.db";

/// SQLite connection with the schema migrated to the latest version.
pub struct Db {
    pub conn: Connection,
}

impl Db {
    /// Opens the database in the application data directory.
    pub fn new() -> Result<Db> {
        let db_file_path = DataStorage::new().get_path(DB_FILE_NAME)?;
        Self::open(&db_file_path)
    }

    pub fn open(path: &Path) -> Result<Db> {
        Self::prepare(Connection::open(path)?)
    }

    /// Opens a private in-memory database.
    pub fn in_memory() -> Result<Db> {
        Self::prepare(Connection::open_in_memory()?)
    }

    fn prepare(mut conn: Connection) -> Result<Db> {
        MigrationManager::new().migrate(&mut conn)?;
        Ok(Db { conn })
    }
}
