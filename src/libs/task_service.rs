//! Task service: persistence, generation and identity in one place.
//!
//! The service owns a [`TaskStore`], a [`Generator`], an [`AuthProvider`]
//! and a [`Notifier`]. Every failure is logged and shown through the
//! notifier before it is returned, so callers only decide what happens
//! next, never how the error is presented.
//!
//! The current list of main tasks is broadcast to subscribers whenever it is
//! loaded.
//!
//! ```rust,no_run
//! use taskgen::api::Gemini;
//! use taskgen::api::gemini::GeminiConfig;
//! use taskgen::db::todos::Todos;
//! use taskgen::libs::identity::Offline;
//! use taskgen::libs::notify::ConsoleNotifier;
//! use taskgen::libs::task_service::TaskService;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let service = TaskService::new(
//!     Todos::new()?,
//!     Gemini::from_config(&GeminiConfig::default()),
//!     Offline::new(),
//!     ConsoleNotifier,
//! )
//! .await;
//! let tasks = service.load_tasks().await;
//! # Ok(())
//! # }
//! ```

use super::generation::{
    parse_response, subtasks_prompt, GeneratedSubtasks, GeneratedTasks, GenerationError, GenerationRequest, Generator,
    ResponseSchema,
};
use super::identity::{generate_local_uid, AuthError, AuthProvider, User};
use super::image::ImageFile;
use super::messages::Message;
use super::notify::{AppError, Notifier};
use super::store::{Query, StoreError, TaskStore};
use super::task::{Draft, Task, TaskKind, TaskWithSubtasks};
use chrono::{DateTime, SubsecRound, Utc};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

const TASKS_CHANNEL_CAPACITY: usize = 16;

/// Creation timestamp at the precision both stores keep (microseconds).
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

pub struct TaskService<S, G, A, N> {
    store: S,
    generator: G,
    auth: A,
    notifier: N,
    user: watch::Receiver<Option<User>>,
    local_uid: String,
    tasks: broadcast::Sender<Vec<Task>>,
}

impl<S, G, A, N> TaskService<S, G, A, N>
where
    S: TaskStore,
    G: Generator,
    A: AuthProvider,
    N: Notifier,
{
    /// Creates the service and attempts an anonymous sign-in once. A failed
    /// sign-in is logged and the service continues with the local id.
    pub async fn new(store: S, generator: G, auth: A, notifier: N) -> Self {
        let (tasks, _) = broadcast::channel(TASKS_CHANNEL_CAPACITY);
        let service = Self {
            user: auth.subscribe(),
            store,
            generator,
            auth,
            notifier,
            local_uid: generate_local_uid(),
            tasks,
        };
        service.login().await;
        service
    }

    async fn login(&self) -> Option<User> {
        match self.auth.sign_in_anonymously().await {
            Ok(user) => {
                info!(uid = %user.uid, "signed in anonymously");
                Some(user)
            }
            Err(e) => {
                warn!("{}", Message::AnonymousLoginFailed(e.to_string()));
                None
            }
        }
    }

    pub async fn sign_out(&self) -> Result<(), AuthError> {
        match self.auth.sign_out().await {
            Ok(()) => {
                info!("{}", Message::SignedOut);
                Ok(())
            }
            Err(e) => {
                warn!("{}", Message::SignOutFailed(e.to_string()));
                Err(e)
            }
        }
    }

    pub fn current_user(&self) -> Option<User> {
        self.user.borrow().clone()
    }

    pub fn local_uid(&self) -> &str {
        &self.local_uid
    }

    /// Owner of new tasks: the signed-in user, or the local id.
    pub fn owner(&self) -> String {
        self.user
            .borrow()
            .as_ref()
            .map(|user| user.uid.clone())
            .unwrap_or_else(|| self.local_uid.clone())
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn auth(&self) -> &A {
        &self.auth
    }

    /// Receives every main-task list loaded by [`load_tasks`](Self::load_tasks).
    pub fn subscribe(&self) -> broadcast::Receiver<Vec<Task>> {
        self.tasks.subscribe()
    }

    /// Waits for the next sign-in or sign-out and reloads the task list.
    /// Returns `None` once the identity provider is gone.
    pub async fn follow_auth_changes(&self) -> Option<Vec<Task>> {
        let mut changes = self.auth.subscribe();
        changes.changed().await.ok()?;
        let uid = changes.borrow_and_update().as_ref().map(|user| user.uid.clone());
        debug!(?uid, "identity changed, reloading tasks");
        Some(self.load_tasks().await)
    }

    fn reported<T, E: Into<AppError>>(&self, result: Result<T, E>, fallback: Option<Message>) -> Result<T, AppError> {
        result.map_err(|e| {
            let error = e.into();
            self.notifier.report(&error, fallback.as_ref());
            error
        })
    }

    /// Main tasks, newest first. An empty store is detected with a count
    /// first, so the ordered query is only issued when there is something
    /// to order. Errors are reported and yield an empty list.
    pub async fn load_tasks(&self) -> Vec<Task> {
        let result = async {
            if self.store.count(&Query::main_tasks()).await? == 0 {
                debug!("no main tasks stored");
                return Ok(Vec::new());
            }
            self.store.query(&Query::main_tasks_newest_first()).await
        }
        .await;

        let tasks = self.reported(result, None).unwrap_or_default();
        // No subscribers is not an error.
        let _ = self.tasks.send(tasks.clone());
        tasks
    }

    pub async fn load_subtasks(&self, main_id: &str) -> Result<Vec<Task>, AppError> {
        let result = self.store.query(&Query::subtasks_of(main_id)).await;
        self.reported(result, Some(Message::StoreLoadFailed))
    }

    /// Every main task with its subtasks. Records that are not main tasks
    /// are skipped.
    pub async fn load_tasks_with_subtasks(&self) -> Result<Vec<TaskWithSubtasks>, AppError> {
        let mut groups = Vec::new();
        for task in self.load_tasks().await {
            if !task.is_main() {
                warn!(id = %task.id, "skipping non-main task in main task list");
                continue;
            }
            let subtasks = self.load_subtasks(&task.id).await?;
            groups.push(TaskWithSubtasks::new(task, subtasks));
        }
        Ok(groups)
    }

    /// Generates a main task title and its subtasks from a prompt and/or a
    /// photo.
    pub async fn generate_task(&self, prompt: &str, image: Option<&ImageFile>) -> Result<GeneratedTasks, AppError> {
        if prompt.trim().is_empty() && image.is_none() {
            return Ok(GeneratedTasks {
                title: Message::PleaseProvidePrompt.to_string(),
                subtasks: Vec::new(),
            });
        }

        let request = GenerationRequest {
            prompt: prompt.to_string(),
            image: image.map(ImageFile::to_inline),
            schema: ResponseSchema::Task,
        };
        let result = async {
            let text = self.generator.generate(&request).await?;
            parse_response::<GeneratedTasks>(&text)
        }
        .await;
        self.reported(result, Some(Message::GenerationFailed))
    }

    /// Generates the next subtasks of `title`, sorted by their order.
    /// `existing_subtasks` are listed in the request so they are not
    /// generated again.
    pub async fn generate_subtasks(
        &self,
        title: &str,
        existing_subtasks: &[String],
        image: Option<&ImageFile>,
    ) -> Result<GeneratedSubtasks, AppError> {
        let request = GenerationRequest {
            prompt: subtasks_prompt(title, existing_subtasks),
            image: image.map(ImageFile::to_inline),
            schema: ResponseSchema::Subtasks,
        };
        let result = async {
            let text = self.generator.generate(&request).await?;
            let mut generated = parse_response::<GeneratedSubtasks>(&text)?;
            generated.subtasks.sort_by_key(|subtask| subtask.order);
            Ok::<_, GenerationError>(generated)
        }
        .await;
        self.reported(result, Some(Message::GenerationFailed))
    }

    /// Persists a main task and its subtasks, in that order. Subtask `order`
    /// is the position in `subtasks`. A failure part way leaves the tasks
    /// written so far in the store.
    pub async fn add_maintask_with_subtasks(
        &self,
        maintask: &Draft,
        subtasks: &[Draft],
    ) -> Result<TaskWithSubtasks, AppError> {
        let owner = self.owner();
        let result = async {
            let main = Task {
                id: self.store.new_id(),
                title: maintask.title.clone(),
                completed: maintask.completed,
                owner: owner.clone(),
                created_time: now(),
                kind: TaskKind::Main {
                    priority: maintask.priority.unwrap_or_default(),
                },
            };
            self.store.set(&main).await?;

            let mut saved = Vec::with_capacity(subtasks.len());
            for (index, subtask) in subtasks.iter().enumerate() {
                let task = Task {
                    id: self.store.new_id(),
                    title: subtask.title.clone(),
                    completed: subtask.completed,
                    owner: owner.clone(),
                    created_time: now(),
                    kind: TaskKind::Subtask {
                        parent_id: main.id.clone(),
                        order: index as u32,
                    },
                };
                self.store.set(&task).await?;
                saved.push(task);
            }
            Ok::<_, StoreError>(TaskWithSubtasks::new(main, saved))
        }
        .await;

        let group = self.reported(result, Some(Message::StoreAddFailed))?;
        info!(id = %group.maintask.id, subtasks = group.subtasks.len(), "saved main task");
        Ok(group)
    }

    /// Deletes every subtask of `main_id`, then the main task itself.
    pub async fn delete_maintask_and_subtasks(&self, main_id: &str) -> Result<(), AppError> {
        let subtasks = self.load_subtasks(main_id).await?;
        let result = async {
            for subtask in &subtasks {
                self.store.delete(&subtask.id).await?;
            }
            self.store.delete(main_id).await
        }
        .await;

        self.reported(result, Some(Message::StoreDeleteFailed))?;
        info!(id = %main_id, subtasks = subtasks.len(), "deleted main task");
        Ok(())
    }

    /// Merges the task's fields into the stored record with the same id.
    pub async fn update_task(&self, task: &Task) -> Result<(), AppError> {
        let result = self.store.merge(task).await;
        self.reported(result, Some(Message::StoreUpdateFailed))
    }
}
