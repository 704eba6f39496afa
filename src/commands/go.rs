use crate::libs::backend::{self, AppPlanner};
use crate::libs::components::{ImageCheckbox, TaskCard};
use crate::libs::config::Config;
use crate::libs::messages::Message;
use crate::libs::planner::PlannerState;
use crate::libs::view::View;
use crate::{msg_bail_anyhow, msg_info, msg_print, msg_success};
use anyhow::Result;
use clap::Args;
use dialoguer::{theme::ColorfulTheme, Confirm};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct GoArgs {
    /// Use the room photo and the "Clean this room" preset
    #[arg(short, long)]
    room: bool,

    /// Goal to plan, instead of the preset prompt
    #[arg(short, long)]
    prompt: Option<String>,

    /// Photo to attach, instead of the configured one
    #[arg(short, long)]
    image: Option<PathBuf>,

    /// Let the model name the main task
    #[arg(short, long)]
    freeform: bool,

    /// Save the generated task without asking
    #[arg(short, long)]
    yes: bool,
}

pub async fn cmd(args: GoArgs) -> Result<()> {
    let mut planner = backend::planner(&Config::read()?).await?;
    if args.room {
        planner.select_room();
    }
    if let Some(prompt) = &args.prompt {
        planner.set_prompt(prompt);
    }
    if let Some(image) = &args.image {
        if !image.exists() {
            msg_bail_anyhow!(Message::ImageNotFound(image.display().to_string()));
        }
        planner.set_image(ImageCheckbox::new(image, true));
    }

    msg_print!(Message::Generating(planner.prompt().to_string()));
    if args.freeform {
        planner.go_freeform().await;
    } else {
        planner.go().await;
    }

    review(&mut planner, args.yes).await
}

/// Shows the generated preview and saves it once confirmed.
pub async fn review(planner: &mut AppPlanner, yes: bool) -> Result<()> {
    let plan = match planner.state() {
        PlannerState::Previewing(plan) => plan.clone(),
        _ => return Ok(()),
    };
    View::preview(&TaskCard::preview(&plan))?;

    let save = yes
        || Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::ConfirmSavePreview.to_string())
            .default(true)
            .interact()?;
    if !save {
        planner.reset();
        msg_info!(Message::PreviewDiscarded);
        return Ok(());
    }

    if let Some(group) = planner.save().await? {
        msg_success!(Message::TaskSaved(group.maintask.title));
    }
    Ok(())
}
