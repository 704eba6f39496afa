//! Identity of the person owning the tasks.
//!
//! An [`AuthProvider`] signs in anonymously and publishes the current user
//! (or `None`) on a `tokio::sync::watch` channel. When nobody is signed in,
//! tasks are owned by a random local id kept for the lifetime of the
//! process.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

pub const LOCAL_ID_PREFIX: &str = "local-";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub uid: String,
    /// Bearer token for the document store, when the provider issues one.
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            id_token: None,
            refresh_token: None,
            expires_at: None,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Identity provider is not configured")]
    NotConfigured,

    #[error("Authentication failed ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Authentication request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Cannot access the session cache: {0}")]
    Io(String),
}

/// Anonymous sign-in and an observable authentication state.
#[allow(async_fn_in_trait)]
pub trait AuthProvider {
    async fn sign_in_anonymously(&self) -> Result<User, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Stream of "current user or none".
    fn subscribe(&self) -> watch::Receiver<Option<User>>;
}

/// Provider used when no identity service is configured: sign-in always
/// fails and the state stays signed out.
pub struct Offline {
    state: watch::Sender<Option<User>>,
}

impl Offline {
    pub fn new() -> Self {
        let (state, _) = watch::channel(None);
        Self { state }
    }
}

impl Default for Offline {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthProvider for Offline {
    async fn sign_in_anonymously(&self) -> Result<User, AuthError> {
        Err(AuthError::NotConfigured)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.state.send_replace(None);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.state.subscribe()
    }
}

/// Random identifier used as owner while nobody is signed in.
pub fn generate_local_uid() -> String {
    format!("{}{}", LOCAL_ID_PREFIX, uuid::Uuid::new_v4())
}
