//! Encrypted on-disk storage for API keys.
//!
//! Values are encrypted with AES-256-CBC using key material generated by
//! `build.rs` and stored base64-encoded in the data directory.

use super::data_storage::DataStorage;
use aes::Aes256;
use anyhow::Result;
use base64::prelude::*;
use block_modes::block_padding::Pkcs7;
use block_modes::{BlockMode, Cbc};
use dialoguer::{theme::ColorfulTheme, Password};
use std::fs;
use std::path::PathBuf;

include!(concat!(env!("OUT_DIR"), "/app_metadata.rs"));

type Aes256Cbc = Cbc<Aes256, Pkcs7>;

#[derive(Clone, Debug)]
pub struct Secret {
    prompt: String,
    secret_file_path: PathBuf,
}

impl Secret {
    pub fn new(secret_name: &str, prompt: &str) -> Self {
        let secret_file_path = DataStorage::new().get_path(secret_name).unwrap_or_else(|_| PathBuf::from(secret_name));

        Self {
            prompt: prompt.to_owned(),
            secret_file_path,
        }
    }

    /// Returns the stored value, if there is one and it decrypts.
    pub fn get(&self) -> Option<String> {
        if !self.secret_file_path.exists() {
            return None;
        }
        self.decrypt().ok()
    }

    pub fn get_or_prompt(&self) -> Result<String> {
        match self.get() {
            Some(value) => Ok(value),
            None => self.prompt(),
        }
    }

    /// Asks for the value interactively and stores it.
    pub fn prompt(&self) -> Result<String> {
        let value = Password::with_theme(&ColorfulTheme::default()).with_prompt(&self.prompt).interact()?;
        self.store(&value)?;
        Ok(value)
    }

    pub fn store(&self, value: &str) -> Result<()> {
        let cipher = Aes256Cbc::new_from_slices(APP_METADATA_ENCRYPTION_KEY, APP_METADATA_ENCRYPTION_IV)?;
        let encoded = BASE64_STANDARD.encode(cipher.encrypt_vec(value.as_bytes()));

        if let Some(parent) = self.secret_file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.secret_file_path, encoded)?;
        Ok(())
    }

    pub fn delete(&self) -> Result<()> {
        if self.secret_file_path.exists() {
            fs::remove_file(&self.secret_file_path)?;
        }
        Ok(())
    }

    fn decrypt(&self) -> Result<String> {
        let encoded = fs::read_to_string(&self.secret_file_path)?;
        let ciphertext = BASE64_STANDARD.decode(encoded.trim())?;
        let cipher = Aes256Cbc::new_from_slices(APP_METADATA_ENCRYPTION_KEY, APP_METADATA_ENCRYPTION_IV)?;
        Ok(String::from_utf8(cipher.decrypt_vec(&ciphertext)?)?)
    }
}
