//! Task generation with a generative model.
//!
//! A [`GenerationRequest`] carries the user prompt, an optional inline image
//! and the [`ResponseSchema`] the answer must follow. A [`Generator`] turns
//! it into raw JSON text, which is then parsed into [`GeneratedTasks`] or
//! [`GeneratedSubtasks`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

/// Marker of the Gemini error returned for a rejected key.
pub const INVALID_API_KEY_MARKER: &str = "API key not valid";

/// Shape of the JSON answer requested from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSchema {
    /// `{ "title": string, "subtasks": string[] }`
    Task,
    /// `{ "subtasks": [{ "title": string, "order": number }] }`
    Subtasks,
}

impl ResponseSchema {
    fn example(&self) -> serde_json::Value {
        match self {
            ResponseSchema::Task => json!({ "title": "string", "subtasks": "string[]" }),
            ResponseSchema::Subtasks => json!({ "subtasks": [{ "title": "string", "order": "number" }] }),
        }
    }

    /// Fixed system instruction sent with every request of this schema.
    pub fn system_instruction(&self) -> String {
        format!(
            "Keep task names short, ideally within 7 words. Use the following schema in your response {}. The subtasks should follow logical order",
            self.example()
        )
    }
}

/// Image attached to a request as base64 data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub image: Option<InlineImage>,
    pub schema: ResponseSchema,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedTasks {
    pub title: String,
    #[serde(default)]
    pub subtasks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedSubtask {
    pub title: String,
    pub order: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedSubtasks {
    #[serde(default)]
    pub subtasks: Vec<GeneratedSubtask>,
}

#[derive(Debug, Error)]
pub enum GenerationError {
    /// The API answered with an error status.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Generation request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The answer is missing or does not follow the requested schema.
    #[error("{0}")]
    InvalidResponse(String),

    #[error("The model refused to answer: {0}")]
    Blocked(String),

    #[error("Gemini API key is not set")]
    MissingApiKey,

    #[error("Cannot attach image {path}: {reason}")]
    Image { path: String, reason: String },
}

impl GenerationError {
    pub fn is_invalid_api_key(&self) -> bool {
        matches!(self, GenerationError::Api { message, .. } if message.contains(INVALID_API_KEY_MARKER))
    }
}

/// Produces raw JSON text for a generation request.
#[allow(async_fn_in_trait)]
pub trait Generator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

/// Parses the model's JSON text, tolerating a surrounding Markdown fence.
pub fn parse_response<T: DeserializeOwned>(text: &str) -> Result<T, GenerationError> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed);
    serde_json::from_str(body.trim()).map_err(|e| GenerationError::InvalidResponse(e.to_string()))
}

/// Builds the instruction asking for the next steps of `title`, listing the
/// subtasks that already exist so the model does not repeat them.
pub fn subtasks_prompt(title: &str, existing_subtasks: &[String]) -> String {
    if existing_subtasks.is_empty() {
        return title.to_string();
    }
    let existing = existing_subtasks.iter().map(|s| format!("- {}", s)).collect::<Vec<_>>().join("\n");
    format!(
        "{}\nThese subtasks already exist, do not repeat them and continue after them:\n{}",
        title, existing
    )
}
