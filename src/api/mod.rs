//! Clients for the Google services taskgen talks to.
//!
//! - **Gemini**: generates the main task and subtasks from a prompt and photo
//! - **Firebase Auth**: anonymous sign-in through the Identity Toolkit REST API
//! - **Firestore**: the remote `todos` collection through the REST API
//!
//! All three return errors in the same `{ "error": { code, message, status } }`
//! envelope, parsed by [`ApiError::from_response`].
//!
//! ```rust,no_run
//! use taskgen::api::gemini::{Gemini, GeminiConfig};
//!
//! let gemini = Gemini::from_config(&GeminiConfig::default());
//! ```

use reqwest::Response;
use serde::Deserialize;

pub mod firebase;
pub mod firestore;
pub mod gemini;

pub use firebase::{FirebaseAuth, FirebaseConfig};
pub use firestore::Firestore;
pub use gemini::{Gemini, GeminiConfig};

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Error reported by a Google REST API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: u16,
    pub message: String,
    /// Canonical status such as `PERMISSION_DENIED`, when present.
    pub code: Option<String>,
}

impl ApiError {
    /// Parses an error body. Firestore streaming endpoints wrap it in an
    /// array, so both shapes are accepted.
    pub fn from_body(status: u16, body: &str) -> Self {
        // A derived struct also deserializes from a sequence, so the array
        // shape has to be tried first.
        let envelope = serde_json::from_str::<Vec<ErrorEnvelope>>(body)
            .ok()
            .and_then(|v| v.into_iter().next())
            .or_else(|| serde_json::from_str::<ErrorEnvelope>(body).ok());

        match envelope {
            Some(envelope) => Self {
                status,
                message: envelope.error.message,
                code: envelope.error.status,
            },
            None => Self {
                status,
                message: body.trim().to_string(),
                code: None,
            },
        }
    }

    pub async fn from_response(response: Response) -> Self {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Self::from_body(status, &body)
    }
}
