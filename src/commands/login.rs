use crate::libs::backend;
use crate::libs::config::Config;
use crate::libs::messages::Message;
use crate::{msg_info, msg_success, msg_warning};
use anyhow::Result;

pub async fn cmd() -> Result<()> {
    let config = Config::read()?;
    if config.firebase.is_none() {
        msg_warning!(Message::AuthNotConfigured);
    }

    let service = backend::service(&config).await?;
    match service.current_user() {
        Some(user) => msg_success!(Message::SignedInAnonymously(user.uid)),
        None => msg_info!(Message::UsingLocalIdentity(service.local_uid().to_string())),
    }
    Ok(())
}
