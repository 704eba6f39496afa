use crate::libs::backend;
use crate::libs::config::Config;
use crate::libs::messages::Message;
use crate::{msg_bail_anyhow, msg_success};
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct DoneArgs {
    /// Id of a main task or a subtask
    #[arg(required = true)]
    id: String,

    /// Mark as not done
    #[arg(short, long)]
    undo: bool,
}

pub async fn cmd(args: DoneArgs) -> Result<()> {
    let mut planner = backend::planner(&Config::read()?).await?;
    planner.refresh().await?;

    let title = match planner.find(&args.id) {
        Some(task) => task.title.clone(),
        None => msg_bail_anyhow!(Message::TaskNotFoundWithId(args.id)),
    };
    planner.set_completed(&args.id, !args.undo).await?;

    if args.undo {
        msg_success!(Message::TaskReopened(title));
    } else {
        msg_success!(Message::TaskCompleted(title));
    }
    Ok(())
}
