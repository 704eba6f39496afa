//! Firebase anonymous authentication over the Identity Toolkit REST API.
//!
//! The signed-in user is cached in the data directory, so the same
//! anonymous identity owns the tasks across CLI invocations. An expired
//! token is refreshed through the Secure Token API; if that fails a new
//! anonymous account is created.

use super::ApiError;
use crate::libs::config::ConfigModule;
use crate::libs::data_storage::DataStorage;
use crate::libs::identity::{AuthError, AuthProvider, User};
use crate::libs::messages::Message;
use crate::msg_print;
use anyhow::Result;
use chrono::{Duration, Utc};
use dialoguer::{theme::ColorfulTheme, Input};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tracing::{debug, info};

pub const DEFAULT_AUTH_URL: &str = "https://identitytoolkit.googleapis.com/v1";
pub const DEFAULT_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1";
pub const DEFAULT_FIRESTORE_URL: &str = "https://firestore.googleapis.com/v1";
const SESSION_FILE: &str = ".firebase_session";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignUpResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
    local_id: String,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
    user_id: String,
}

fn user_from_tokens(uid: String, id_token: String, refresh_token: String, expires_in: &str) -> User {
    let seconds = expires_in.parse::<i64>().unwrap_or(3600);
    User {
        uid,
        id_token: Some(id_token),
        refresh_token: Some(refresh_token),
        expires_at: Some(Utc::now() + Duration::seconds(seconds)),
    }
}

pub struct FirebaseAuth {
    client: Client,
    config: FirebaseConfig,
    state: watch::Sender<Option<User>>,
    session_file: PathBuf,
}

impl FirebaseAuth {
    /// Creates the provider with the session cached in the data directory.
    pub fn new(config: &FirebaseConfig) -> Result<Self> {
        let session_file = DataStorage::new().get_path(SESSION_FILE)?;
        Ok(Self::with_session_file(config, &session_file))
    }

    pub fn with_session_file(config: &FirebaseConfig, session_file: &Path) -> Self {
        let cached = Self::read_session(session_file);
        let (state, _) = watch::channel(cached);
        Self {
            client: Client::new(),
            config: config.clone(),
            state,
            session_file: session_file.to_path_buf(),
        }
    }

    fn read_session(path: &Path) -> Option<User> {
        let content = fs::read_to_string(path).ok()?;
        serde_json::from_str(&content).ok()
    }

    fn write_session(&self, user: &User) -> Result<(), AuthError> {
        let content = serde_json::to_string(user).map_err(|e| AuthError::Io(e.to_string()))?;
        fs::write(&self.session_file, content).map_err(|e| AuthError::Io(e.to_string()))
    }

    fn delete_session(&self) -> Result<(), AuthError> {
        match fs::remove_file(&self.session_file) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::Io(e.to_string())),
        }
    }

    async fn sign_up(&self) -> Result<User, AuthError> {
        let url = format!("{}/accounts:signUp?key={}", self.config.auth_url, self.config.api_key);
        let response = self.client.post(url).json(&json!({ "returnSecureToken": true })).send().await?;
        if !response.status().is_success() {
            let error = ApiError::from_response(response).await;
            return Err(AuthError::Api {
                status: error.status,
                message: error.message,
            });
        }
        let body = response.json::<SignUpResponse>().await?;
        Ok(user_from_tokens(body.local_id, body.id_token, body.refresh_token, &body.expires_in))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<User, AuthError> {
        let url = format!("{}/token?key={}", self.config.token_url, self.config.api_key);
        let response = self
            .client
            .post(url)
            .json(&json!({ "grant_type": "refresh_token", "refresh_token": refresh_token }))
            .send()
            .await?;
        if !response.status().is_success() {
            let error = ApiError::from_response(response).await;
            return Err(AuthError::Api {
                status: error.status,
                message: error.message,
            });
        }
        let body = response.json::<RefreshResponse>().await?;
        Ok(user_from_tokens(body.user_id, body.id_token, body.refresh_token, &body.expires_in))
    }

    fn publish(&self, user: User) -> Result<User, AuthError> {
        self.write_session(&user)?;
        self.state.send_replace(Some(user.clone()));
        Ok(user)
    }
}

impl AuthProvider for FirebaseAuth {
    async fn sign_in_anonymously(&self) -> Result<User, AuthError> {
        let cached = self.state.borrow().clone();
        if let Some(user) = cached {
            if !user.is_expired(Utc::now()) {
                return Ok(user);
            }
            if let Some(refresh_token) = &user.refresh_token {
                match self.refresh(refresh_token).await {
                    Ok(user) => {
                        debug!(uid = %user.uid, "refreshed identity token");
                        return self.publish(user);
                    }
                    Err(e) => debug!(error = %e, "token refresh failed, signing up again"),
                }
            }
        }

        let user = self.sign_up().await?;
        info!(uid = %user.uid, "signed in anonymously");
        self.publish(user)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.delete_session()?;
        self.state.send_replace(None);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.state.subscribe()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FirebaseConfig {
    pub project_id: String,
    pub api_key: String,
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_firestore_url")]
    pub firestore_url: String,
}

fn default_auth_url() -> String {
    DEFAULT_AUTH_URL.to_string()
}

fn default_token_url() -> String {
    DEFAULT_TOKEN_URL.to_string()
}

fn default_firestore_url() -> String {
    DEFAULT_FIRESTORE_URL.to_string()
}

impl FirebaseConfig {
    pub fn new(project_id: &str, api_key: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            api_key: api_key.to_string(),
            auth_url: default_auth_url(),
            token_url: default_token_url(),
            firestore_url: default_firestore_url(),
        }
    }

    pub fn module() -> ConfigModule {
        ConfigModule {
            key: "firebase".to_string(),
            name: "Firebase".to_string(),
        }
    }

    /// Runs the Firebase part of the setup wizard. An empty project id
    /// disables the module and keeps tasks in the local database.
    pub fn init(config: &Option<FirebaseConfig>) -> Result<Option<Self>> {
        let config = config.clone().unwrap_or_else(|| Self::new("", ""));
        msg_print!(Message::ConfigModuleFirebase);

        let project_id: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::PromptFirebaseProjectId.to_string())
            .default(config.project_id.clone())
            .allow_empty(true)
            .interact_text()?;
        if project_id.trim().is_empty() {
            return Ok(None);
        }
        let api_key: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::PromptFirebaseApiKey.to_string())
            .default(config.api_key.clone())
            .interact_text()?;

        Ok(Some(Self {
            project_id: project_id.trim().to_string(),
            api_key,
            ..config
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cached_session_is_published_on_creation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let user = User {
            uid: "anon-1".to_string(),
            id_token: Some("token".to_string()),
            refresh_token: Some("refresh".to_string()),
            expires_at: Some(Utc::now() + Duration::minutes(30)),
        };
        fs::write(&path, serde_json::to_string(&user).unwrap()).unwrap();

        let auth = FirebaseAuth::with_session_file(&FirebaseConfig::new("demo", "key"), &path);
        assert_eq!(auth.subscribe().borrow().as_ref(), Some(&user));
    }

    #[tokio::test]
    async fn valid_cached_user_is_reused_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let user = User {
            uid: "anon-2".to_string(),
            id_token: Some("token".to_string()),
            refresh_token: None,
            expires_at: Some(Utc::now() + Duration::minutes(30)),
        };
        fs::write(&path, serde_json::to_string(&user).unwrap()).unwrap();

        let auth = FirebaseAuth::with_session_file(&FirebaseConfig::new("demo", "key"), &path);
        assert_eq!(auth.sign_in_anonymously().await.unwrap().uid, "anon-2");
    }

    #[tokio::test]
    async fn sign_out_clears_state_and_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, serde_json::to_string(&User::new("anon-3")).unwrap()).unwrap();

        let auth = FirebaseAuth::with_session_file(&FirebaseConfig::new("demo", "key"), &path);
        auth.sign_out().await.unwrap();
        assert!(auth.subscribe().borrow().is_none());
        assert!(!path.exists());
    }

    #[test]
    fn config_urls_default_when_missing() {
        let config: FirebaseConfig = serde_json::from_str(r#"{"project_id":"p","api_key":"k"}"#).unwrap();
        assert_eq!(config.firestore_url, DEFAULT_FIRESTORE_URL);
        assert_eq!(config.auth_url, DEFAULT_AUTH_URL);
    }
}
