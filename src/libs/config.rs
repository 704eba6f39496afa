//! Configuration management for taskgen.
//!
//! The configuration is a JSON file in the platform data directory. Each
//! integration is an optional module with its own setup wizard:
//!
//! - **gemini**: model and endpoint of the generative API (the key itself is
//!   kept in an encrypted secret file or `GEMINI_API_KEY`)
//! - **firebase**: project and web API key; when absent, tasks are kept in
//!   the local SQLite database and no sign-in happens
//! - **images**: the reference photos attached to generation requests
//!
//! ```rust,no_run
//! use taskgen::libs::config::Config;
//!
//! let config = Config::read()?;
//! if config.firebase.is_none() {
//!     println!("Tasks are stored locally");
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

use super::data_storage::DataStorage;
use crate::api::firebase::FirebaseConfig;
use crate::api::gemini::GeminiConfig;
use crate::libs::messages::Message;
use crate::msg_print;
use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Input, MultiSelect};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::PathBuf;

pub const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone)]
pub struct ConfigModule {
    pub key: String,
    pub name: String,
}

/// Reference photos for the two photo contexts.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct ImagesConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<PathBuf>,
}

impl ImagesConfig {
    pub fn module() -> ConfigModule {
        ConfigModule {
            key: "images".to_string(),
            name: "Images".to_string(),
        }
    }

    pub fn init(config: &Option<ImagesConfig>) -> Result<Self> {
        let config = config.clone().unwrap_or_default();
        msg_print!(Message::ConfigModuleImages);

        Ok(Self {
            location: Self::prompt_path(Message::PromptLocationImage, &config.location)?,
            room: Self::prompt_path(Message::PromptRoomImage, &config.room)?,
        })
    }

    fn prompt_path(prompt: Message, current: &Option<PathBuf>) -> Result<Option<PathBuf>> {
        let current = current.as_ref().map(|p| p.display().to_string()).unwrap_or_default();
        let path: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt.to_string())
            .default(current)
            .allow_empty(true)
            .interact_text()?;
        let path = path.trim();
        Ok((!path.is_empty()).then(|| PathBuf::from(path)))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gemini: Option<GeminiConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub firebase: Option<FirebaseConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<ImagesConfig>,
}

impl Config {
    /// Reads the configuration file, returning the default configuration
    /// when it does not exist yet.
    pub fn read() -> Result<Config> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;
        if !config_file_path.exists() {
            return Ok(Config::default());
        }

        let config_str = fs::read_to_string(config_file_path)?;
        let config: Config = serde_json::from_str(&config_str)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;
        let config_file = File::create(config_file_path)?;
        serde_json::to_writer_pretty(&config_file, &self)?;
        Ok(())
    }

    /// Removes the configuration file and the stored Gemini key.
    pub fn delete() -> Result<()> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;
        if config_file_path.exists() {
            fs::remove_file(config_file_path)?;
        }
        GeminiConfig::delete_api_key()
    }

    /// Runs the interactive setup wizard, starting from the current values.
    pub fn init() -> Result<Self> {
        let mut config = Self::read().unwrap_or_default();

        let modules = vec![GeminiConfig::module(), FirebaseConfig::module(), ImagesConfig::module()];
        let selected = MultiSelect::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::PromptSelectModules.to_string())
            .items(&modules.iter().map(|module| &module.name).collect::<Vec<_>>())
            .interact()?;

        for &selection in &selected {
            match modules[selection].key.as_str() {
                "gemini" => config.gemini = Some(GeminiConfig::init(&config.gemini)?),
                "firebase" => config.firebase = FirebaseConfig::init(&config.firebase)?,
                "images" => config.images = Some(ImagesConfig::init(&config.images)?),
                _ => {}
            }
        }

        Ok(config)
    }

    /// Gemini settings, falling back to the defaults.
    pub fn gemini_or_default(&self) -> GeminiConfig {
        self.gemini.clone().unwrap_or_default()
    }
}
