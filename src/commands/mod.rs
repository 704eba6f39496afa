//! Command-line interface of taskgen.

pub mod delete;
pub mod done;
pub mod go;
pub mod init;
pub mod list;
pub mod login;
pub mod logout;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Configure Gemini, Firebase and reference photos")]
    Init(init::InitArgs),
    #[command(about = "Generate a task with subtasks and save it after a preview")]
    Go(go::GoArgs),
    #[command(about = "List tasks with their subtasks")]
    List(list::ListArgs),
    #[command(about = "Mark a task (and its subtasks) as done", arg_required_else_help = true)]
    Done(done::DoneArgs),
    #[command(about = "Delete a main task and its subtasks", arg_required_else_help = true)]
    Delete(delete::DeleteArgs),
    #[command(about = "Sign in anonymously")]
    Login,
    #[command(about = "Sign out")]
    Logout,
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help(true))]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub async fn menu() -> Result<()> {
        let cli = Self::parse();
        match cli.command {
            Commands::Init(args) => init::cmd(args),
            Commands::Go(args) => go::cmd(args).await,
            Commands::List(args) => list::cmd(args).await,
            Commands::Done(args) => done::cmd(args).await,
            Commands::Delete(args) => delete::cmd(args).await,
            Commands::Login => login::cmd().await,
            Commands::Logout => logout::cmd().await,
        }
    }
}
