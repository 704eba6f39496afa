//! # taskgen
//!
//! Turns a goal (and an optional photo) into a main task with short,
//! ordered subtasks generated by Gemini, and keeps them in Firestore or in a
//! local SQLite database.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use taskgen::commands::Cli;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Cli::menu().await
//! }
//! ```

pub mod api;
pub mod commands;
pub mod db;
pub mod libs;
