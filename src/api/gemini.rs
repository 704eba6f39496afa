//! Gemini `generateContent` client.
//!
//! Sends one user turn (prompt text plus an optional inline image) with a
//! fixed system instruction and asks for a JSON answer. The answer text is
//! returned as-is; parsing happens in the task service.

use super::ApiError;
use crate::libs::config::ConfigModule;
use crate::libs::generation::{GenerationError, GenerationRequest, Generator};
use crate::libs::messages::Message;
use crate::libs::secret::Secret;
use crate::msg_print;
use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Input};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use tracing::debug;

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
const SECRET_FILE: &str = ".gemini_secret";
const API_KEY_HEADER: &str = "x-goog-api-key";
const JSON_MIME_TYPE: &str = "application/json";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
}

impl GenerateContentRequest {
    pub fn new(request: &GenerationRequest) -> Self {
        let mut parts = Vec::new();
        if !request.prompt.is_empty() {
            parts.push(Part::Text {
                text: request.prompt.clone(),
            });
        }
        if let Some(image) = &request.image {
            parts.push(Part::Inline {
                inline_data: InlineData {
                    mime_type: image.mime_type.clone(),
                    data: image.data.clone(),
                },
            });
        }

        Self {
            system_instruction: Content {
                role: None,
                parts: vec![Part::Text {
                    text: request.schema.system_instruction(),
                }],
            },
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            generation_config: GenerationConfig {
                response_mime_type: JSON_MIME_TYPE.to_string(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate.
    pub fn text(self) -> Result<String, GenerationError> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(GenerationError::Blocked(reason));
        }
        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| GenerationError::InvalidResponse(Message::GenerationEmptyResponse.to_string()))?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(match candidate.finish_reason {
                Some(reason) if reason != "STOP" => GenerationError::Blocked(reason),
                _ => GenerationError::InvalidResponse(Message::GenerationEmptyResponse.to_string()),
            });
        }
        Ok(text)
    }
}

pub struct Gemini {
    client: Client,
    config: GeminiConfig,
    api_key: Option<String>,
}

impl Gemini {
    pub fn new(config: &GeminiConfig, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            config: config.clone(),
            api_key,
        }
    }

    /// Builds a client with the key from `GEMINI_API_KEY` or the stored
    /// secret. Without a key every request fails with `MissingApiKey`.
    pub fn from_config(config: &GeminiConfig) -> Self {
        Self::new(config, GeminiConfig::api_key())
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.config.api_url.trim_end_matches('/'), self.config.model)
    }
}

impl Generator for Gemini {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let api_key = self.api_key.as_deref().ok_or(GenerationError::MissingApiKey)?;
        debug!(model = %self.config.model, schema = ?request.schema, has_image = request.image.is_some(), "generateContent");
        let response = self
            .client
            .post(self.url())
            .header(API_KEY_HEADER, api_key)
            .json(&GenerateContentRequest::new(request))
            .send()
            .await?;

        if !response.status().is_success() {
            let error = ApiError::from_response(response).await;
            return Err(GenerationError::Api {
                status: error.status,
                message: error.message,
            });
        }

        response.json::<GenerateContentResponse>().await?.text()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GeminiConfig {
    pub model: String,
    pub api_url: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

impl GeminiConfig {
    pub fn module() -> ConfigModule {
        ConfigModule {
            key: "gemini".to_string(),
            name: "Gemini".to_string(),
        }
    }

    fn secret() -> Secret {
        Secret::new(SECRET_FILE, &Message::PromptGeminiApiKey.to_string())
    }

    /// API key from the environment, falling back to the encrypted secret.
    pub fn api_key() -> Option<String> {
        env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty()).or_else(|| Self::secret().get())
    }

    pub fn delete_api_key() -> Result<()> {
        Self::secret().delete()
    }

    pub fn init(config: &Option<GeminiConfig>) -> Result<Self> {
        let config = config.clone().unwrap_or_default();
        msg_print!(Message::ConfigModuleGemini);

        Self::secret().prompt()?;
        Ok(Self {
            model: Input::with_theme(&ColorfulTheme::default())
                .with_prompt(Message::PromptGeminiModel.to_string())
                .default(config.model)
                .interact_text()?,
            api_url: Input::with_theme(&ColorfulTheme::default())
                .with_prompt(Message::PromptGeminiApiUrl.to_string())
                .default(config.api_url)
                .interact_text()?,
        })
    }
}
