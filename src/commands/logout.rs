use crate::libs::backend;
use crate::libs::config::Config;
use crate::libs::identity::AuthProvider;
use crate::libs::messages::Message;
use crate::{msg_error_anyhow, msg_success};
use anyhow::Result;

pub async fn cmd() -> Result<()> {
    backend::auth(&Config::read()?)?
        .sign_out()
        .await
        .map_err(|e| msg_error_anyhow!(Message::SignOutFailed(e.to_string())))?;

    msg_success!(Message::SignedOut);
    Ok(())
}
