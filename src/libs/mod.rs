//! Core library modules of taskgen.
//!
//! - **Model**: tasks, drafts, the store abstraction
//! - **Generation**: requests, responses and reference photos
//! - **Session**: identity, the task service and the planner state machine
//! - **Presentation**: card view models, tables, notifications, messages
//! - **Infrastructure**: configuration, data directory, encrypted secrets
//!
//! ```rust,no_run
//! use taskgen::libs::backend;
//! use taskgen::libs::config::Config;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let mut planner = backend::planner(&Config::read()?).await?;
//! planner.load().await?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod components;
pub mod config;
pub mod data_storage;
pub mod generation;
pub mod identity;
pub mod image;
pub mod messages;
pub mod notify;
pub mod planner;
pub mod secret;
pub mod store;
pub mod task;
pub mod task_service;
pub mod view;
