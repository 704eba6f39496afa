use crate::libs::backend;
use crate::libs::config::Config;
use crate::libs::messages::Message;
use crate::{msg_bail_anyhow, msg_info, msg_success};
use anyhow::Result;
use clap::Args;
use dialoguer::{theme::ColorfulTheme, Confirm};

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Id of the main task
    #[arg(required = true)]
    id: String,

    /// Delete without asking
    #[arg(short, long)]
    yes: bool,
}

pub async fn cmd(args: DeleteArgs) -> Result<()> {
    let mut planner = backend::planner(&Config::read()?).await?;
    planner.refresh().await?;

    let card = planner.tasks().iter().find(|card| card.id() == args.id);
    let (id, title) = match card.and_then(|card| card.delete_clicked().map(|id| (id, card.maintask.title.clone()))) {
        Some(found) => found,
        None => msg_bail_anyhow!(Message::TaskNotFoundWithId(args.id)),
    };

    let confirmed = args.yes
        || Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::ConfirmDeleteTask(title.clone()).to_string())
            .default(false)
            .interact()?;
    if !confirmed {
        msg_info!(Message::OperationCancelled);
        return Ok(());
    }

    planner.delete(&id).await?;
    msg_success!(Message::TaskDeleted(title));
    Ok(())
}
