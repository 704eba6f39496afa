use super::go;
use crate::libs::backend;
use crate::libs::config::Config;
use crate::libs::messages::Message;
use crate::libs::view::View;
use crate::msg_info;
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Print tasks as JSON
    #[arg(long)]
    json: bool,

    /// Do not generate a first plan when there are no tasks
    #[arg(long)]
    no_generate: bool,
}

pub async fn cmd(args: ListArgs) -> Result<()> {
    let mut planner = backend::planner(&Config::read()?).await?;

    if args.json || args.no_generate {
        planner.refresh().await?;
    } else {
        planner.load().await?;
        go::review(&mut planner, false).await?;
    }

    if args.json {
        return View::json(planner.tasks());
    }
    if planner.tasks().is_empty() {
        msg_info!(Message::TasksNotFound);
        return Ok(());
    }
    View::tasks(planner.tasks())
}
