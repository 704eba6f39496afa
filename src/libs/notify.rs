//! User notifications for failed operations.
//!
//! Errors are caught where they happen, logged, and turned into a short
//! [`Notification`]. Configuration problems (a rejected Gemini key, store
//! permissions) get a remediation message shown for longer. A missing
//! Firestore index is expected on an empty collection and produces no
//! notification at all.

use super::generation::GenerationError;
use super::identity::AuthError;
use super::messages::Message;
use super::store::StoreError;
use crate::msg_error;
use std::time::Duration;
use thiserror::Error;
use tracing::error;

pub const DEFAULT_DURATION: Duration = Duration::from_secs(3);
pub const CONFIG_ERROR_DURATION: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub duration: Duration,
}

impl Notification {
    pub fn new(message: impl Into<String>, duration: Duration) -> Self {
        Self {
            message: message.into(),
            duration,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    /// No visible main task or subtask has this id.
    #[error("{}", Message::TaskNotFoundWithId(.0.clone()))]
    TaskNotFound(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// The notification shown for this error, or `None` when it is
    /// swallowed. `fallback` replaces the raw error text for errors that
    /// have no dedicated message.
    pub fn notification(&self, fallback: Option<&Message>) -> Option<Notification> {
        match self {
            AppError::Store(StoreError::MissingIndex(_)) => None,
            AppError::Store(StoreError::PermissionDenied(_)) => Some(Notification::new(
                Message::StorePermissionDenied.to_string(),
                CONFIG_ERROR_DURATION,
            )),
            AppError::Generation(e) if e.is_invalid_api_key() => Some(Notification::new(
                Message::GeminiApiKeyInvalid.to_string(),
                CONFIG_ERROR_DURATION,
            )),
            AppError::Generation(GenerationError::MissingApiKey) => Some(Notification::new(
                Message::GeminiApiKeyMissing.to_string(),
                CONFIG_ERROR_DURATION,
            )),
            other => Some(Notification::new(
                fallback.map(Message::to_string).unwrap_or_else(|| other.to_string()),
                DEFAULT_DURATION,
            )),
        }
    }
}

/// Shows notifications to the user.
pub trait Notifier {
    fn notify(&self, notification: Notification);

    /// Logs `error` and shows its notification, if it has one.
    fn report(&self, error: &AppError, fallback: Option<&Message>) {
        match error.notification(fallback) {
            Some(notification) => {
                error!(error = %error, "operation failed");
                self.notify(notification);
            }
            None => tracing::debug!(error = %error, "error swallowed"),
        }
    }
}

/// Prints notifications to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        msg_error!(notification.message);
    }
}
