//! Backend selection from the configuration.
//!
//! With a `firebase` module configured, tasks live in Firestore and are
//! owned by the anonymous Firebase user. Without it, tasks live in the local
//! SQLite database and are owned by a local id.

use super::components::ImageCheckbox;
use super::config::Config;
use super::identity::{AuthError, AuthProvider, Offline, User};
use super::notify::ConsoleNotifier;
use super::planner::Planner;
use super::store::{Query, StoreError, TaskStore};
use super::task::Task;
use super::task_service::TaskService;
use crate::api::{FirebaseAuth, Firestore, Gemini};
use crate::db::todos::Todos;
use anyhow::Result;
use tokio::sync::watch;
use tracing::debug;

pub enum StoreBackend {
    Local(Todos),
    Firestore(Firestore),
}

impl TaskStore for StoreBackend {
    fn new_id(&self) -> String {
        match self {
            StoreBackend::Local(store) => store.new_id(),
            StoreBackend::Firestore(store) => store.new_id(),
        }
    }

    async fn count(&self, query: &Query) -> Result<usize, StoreError> {
        match self {
            StoreBackend::Local(store) => store.count(query).await,
            StoreBackend::Firestore(store) => store.count(query).await,
        }
    }

    async fn query(&self, query: &Query) -> Result<Vec<Task>, StoreError> {
        match self {
            StoreBackend::Local(store) => store.query(query).await,
            StoreBackend::Firestore(store) => store.query(query).await,
        }
    }

    async fn get(&self, id: &str) -> Result<Option<Task>, StoreError> {
        match self {
            StoreBackend::Local(store) => store.get(id).await,
            StoreBackend::Firestore(store) => store.get(id).await,
        }
    }

    async fn set(&self, task: &Task) -> Result<(), StoreError> {
        match self {
            StoreBackend::Local(store) => store.set(task).await,
            StoreBackend::Firestore(store) => store.set(task).await,
        }
    }

    async fn merge(&self, task: &Task) -> Result<(), StoreError> {
        match self {
            StoreBackend::Local(store) => store.merge(task).await,
            StoreBackend::Firestore(store) => store.merge(task).await,
        }
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        match self {
            StoreBackend::Local(store) => store.delete(id).await,
            StoreBackend::Firestore(store) => store.delete(id).await,
        }
    }
}

pub enum AuthBackend {
    Offline(Offline),
    Firebase(FirebaseAuth),
}

impl AuthProvider for AuthBackend {
    async fn sign_in_anonymously(&self) -> Result<User, AuthError> {
        match self {
            AuthBackend::Offline(auth) => auth.sign_in_anonymously().await,
            AuthBackend::Firebase(auth) => auth.sign_in_anonymously().await,
        }
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        match self {
            AuthBackend::Offline(auth) => auth.sign_out().await,
            AuthBackend::Firebase(auth) => auth.sign_out().await,
        }
    }

    fn subscribe(&self) -> watch::Receiver<Option<User>> {
        match self {
            AuthBackend::Offline(auth) => auth.subscribe(),
            AuthBackend::Firebase(auth) => auth.subscribe(),
        }
    }
}

pub type AppService = TaskService<StoreBackend, Gemini, AuthBackend, ConsoleNotifier>;
pub type AppPlanner = Planner<StoreBackend, Gemini, AuthBackend, ConsoleNotifier>;

/// Identity provider for `config`.
pub fn auth(config: &Config) -> Result<AuthBackend> {
    Ok(match &config.firebase {
        Some(firebase) => AuthBackend::Firebase(FirebaseAuth::new(firebase)?),
        None => AuthBackend::Offline(Offline::new()),
    })
}

/// Builds the task service for `config`. Signs in when Firebase is
/// configured.
pub async fn service(config: &Config) -> Result<AppService> {
    let auth = auth(config)?;
    let store = match &config.firebase {
        Some(firebase) => {
            debug!(project = %firebase.project_id, "using Firestore");
            StoreBackend::Firestore(Firestore::new(firebase, auth.subscribe()))
        }
        None => {
            debug!("using the local database");
            StoreBackend::Local(Todos::new()?)
        }
    };
    let gemini = Gemini::from_config(&config.gemini_or_default());
    Ok(TaskService::new(store, gemini, auth, ConsoleNotifier).await)
}

/// Builds the planner for `config`, with the configured reference photos.
pub async fn planner(config: &Config) -> Result<AppPlanner> {
    let images = config.images.clone().unwrap_or_default();
    Ok(Planner::new(service(config).await?).with_images(
        images.location.map(|path| ImageCheckbox::new(path, true)),
        images.room.map(|path| ImageCheckbox::new(path, false)),
    ))
}
