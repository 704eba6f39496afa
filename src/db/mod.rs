//! Local persistence for taskgen.
//!
//! When no Firebase project is configured, the `todos` collection lives in a
//! SQLite database in the application data directory.
//!
//! ```rust,no_run
//! use taskgen::db::todos::Todos;
//! use taskgen::libs::store::{Query, TaskStore};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let todos = Todos::new()?;
//! let newest_first = todos.query(&Query::main_tasks_newest_first()).await?;
//! # Ok(())
//! # }
//! ```

/// Connection setup and schema migration on open.
pub mod db;

/// Versioned schema changes.
pub mod migrations;

/// The `todos` collection backed by SQLite.
pub mod todos;
