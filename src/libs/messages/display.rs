//! Display implementation for taskgen messages.
//!
//! All user-facing text is defined here, in one match, so wording stays
//! consistent between the CLI, notifications and error values.
//!
//! ```rust
//! use taskgen::libs::messages::Message;
//!
//! assert_eq!(Message::TasksNotFound.to_string(), "No tasks yet");
//! ```

use super::types::Message;
use std::fmt::{Display, Formatter, Result};

impl Display for Message {
    fn fmt(&self, f: &mut Formatter) -> Result {
        let s = match self {
            // === TASK MESSAGES ===
            Message::TaskSaved(title) => format!("Saved \"{}\"", title),
            Message::TaskDeleted(title) => format!("Deleted \"{}\" and its subtasks", title),
            Message::TaskNotFoundWithId(id) => format!("Task with ID {} not found", id),
            Message::TaskCompleted(title) => format!("Completed \"{}\"", title),
            Message::TaskReopened(title) => format!("Reopened \"{}\"", title),
            Message::TasksNotFound => "No tasks yet".to_string(),
            Message::TasksHeader => "Tasks".to_string(),
            Message::SubtasksCount(count) => format!("{} subtasks", count),
            Message::ConfirmDeleteTask(title) => format!("Delete \"{}\" and all of its subtasks?", title),
            Message::ConfirmSavePreview => "Save this task?".to_string(),
            Message::PreviewHeader => "Preview".to_string(),
            Message::PreviewDiscarded => "Preview discarded".to_string(),
            Message::GeneratedWithGemini => "Generated with Gemini".to_string(),

            // === GENERATION MESSAGES ===
            Message::Generating(prompt) => format!("Generating tasks for \"{}\"...", prompt),
            Message::PleaseProvidePrompt => "Please provide a prompt".to_string(),
            Message::GenerationFailed => "Failed to generate subtasks".to_string(),
            Message::GenerationEmptyResponse => "The model returned an empty response".to_string(),
            Message::GeminiApiKeyInvalid => {
                "Error loading Gemini API key. Please run `taskgen init` and enter a valid key".to_string()
            }
            Message::GeminiApiKeyMissing => {
                "Gemini API key is not set. Export GEMINI_API_KEY or run `taskgen init`".to_string()
            }

            // === STORE MESSAGES ===
            Message::StorePermissionDenied => {
                "Error communicating with Firestore. Please check the security rules and run `taskgen init`".to_string()
            }
            Message::StoreAddFailed => "Error adding main task and subtasks to the store".to_string(),
            Message::StoreUpdateFailed => "Error updating task".to_string(),
            Message::StoreDeleteFailed => "Error deleting task".to_string(),
            Message::StoreLoadFailed => "Error loading data".to_string(),

            // === AUTHENTICATION MESSAGES ===
            Message::SignedInAnonymously(uid) => format!("Signed in anonymously as {}", uid),
            Message::SignedOut => "Signed out".to_string(),
            Message::AnonymousLoginFailed(error) => format!("Anonymous login failed: {}", error),
            Message::SignOutFailed(error) => format!("Sign out error: {}", error),
            Message::AuthNotConfigured => "Identity provider is not configured".to_string(),
            Message::UsingLocalIdentity(id) => format!("Continuing without authentication as {}", id),

            // === CONFIGURATION MESSAGES ===
            Message::ConfigSaved => "Configuration saved successfully".to_string(),
            Message::ConfigDeleted => "Configuration deleted".to_string(),
            Message::ConfigModuleGemini => "Gemini settings".to_string(),
            Message::ConfigModuleFirebase => "Firebase settings".to_string(),
            Message::ConfigModuleImages => "Reference images".to_string(),
            Message::ImageNotFound(path) => format!("Image not found: {}", path),

            // === DATABASE MESSAGES ===
            Message::RunningMigration(version, name) => format!("Running migration v{}: {}", version, name),
            Message::MigrationFailed(version, error) => format!("Migration v{} failed: {}", version, error),

            // === PROMPTS ===
            Message::PromptSelectModules => "Select modules to configure".to_string(),
            Message::PromptGeminiApiKey => "Enter your Gemini API key".to_string(),
            Message::PromptGeminiModel => "Gemini model".to_string(),
            Message::PromptGeminiApiUrl => "Gemini API URL".to_string(),
            Message::PromptFirebaseProjectId => "Firebase project ID (empty to keep tasks locally)".to_string(),
            Message::PromptFirebaseApiKey => "Firebase web API key".to_string(),
            Message::PromptLocationImage => "Path to the location photo (optional)".to_string(),
            Message::PromptRoomImage => "Path to the room photo (optional)".to_string(),

            // === GENERAL ===
            Message::OperationCancelled => "Operation cancelled".to_string(),
        };
        write!(f, "{}", s)
    }
}
