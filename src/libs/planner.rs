//! The planning session: photo context, prompt, generated preview and the
//! visible task list.
//!
//! ```text
//! Idle --go--> Generating --ok--> Previewing --save/reset--> Idle
//!                   \--error--> Idle
//! ```
//!
//! Generation is only started from `Idle`, so a second request while one is
//! running or while a preview is shown is ignored.

use super::components::{ImageCheckbox, TaskCard};
use super::generation::{GeneratedSubtasks, Generator};
use super::identity::AuthProvider;
use super::image::ImageFile;
use super::notify::{AppError, Notifier};
use super::store::TaskStore;
use super::task::{Draft, DraftPlan, Task, TaskWithSubtasks};
use super::task_service::TaskService;
use tracing::{debug, warn};

pub const HELP_ME_PLAN: &str = "Plan a trip to Greece";
pub const HELP_ME_CLEAN: &str = "Clean this room";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhotoContext {
    #[default]
    Location,
    Room,
}

impl PhotoContext {
    pub fn preset_prompt(&self) -> &'static str {
        match self {
            PhotoContext::Location => HELP_ME_PLAN,
            PhotoContext::Room => HELP_ME_CLEAN,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlannerState {
    Idle,
    Generating,
    Previewing(DraftPlan),
}

pub struct Planner<S, G, A, N> {
    service: TaskService<S, G, A, N>,
    state: PlannerState,
    context: PhotoContext,
    prompt: String,
    location: Option<ImageCheckbox>,
    room: Option<ImageCheckbox>,
    tasks: Vec<TaskCard<Task>>,
}

impl<S, G, A, N> Planner<S, G, A, N>
where
    S: TaskStore,
    G: Generator,
    A: AuthProvider,
    N: Notifier,
{
    pub fn new(service: TaskService<S, G, A, N>) -> Self {
        let context = PhotoContext::default();
        Self {
            service,
            state: PlannerState::Idle,
            context,
            prompt: context.preset_prompt().to_string(),
            location: None,
            room: None,
            tasks: Vec::new(),
        }
    }

    /// Sets the reference photos of the two contexts.
    pub fn with_images(mut self, location: Option<ImageCheckbox>, room: Option<ImageCheckbox>) -> Self {
        self.location = location;
        self.room = room;
        self.sync_checkboxes();
        self
    }

    pub fn service(&self) -> &TaskService<S, G, A, N> {
        &self.service
    }

    pub fn state(&self) -> &PlannerState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == PlannerState::Generating
    }

    pub fn context(&self) -> PhotoContext {
        self.context
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn set_prompt(&mut self, prompt: &str) {
        self.prompt = prompt.to_string();
    }

    pub fn tasks(&self) -> &[TaskCard<Task>] {
        &self.tasks
    }

    /// Finds a visible main task or subtask.
    pub fn find(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find_map(|card| card.find(id))
    }

    pub fn select_location(&mut self) {
        self.select(PhotoContext::Location);
    }

    pub fn select_room(&mut self) {
        self.select(PhotoContext::Room);
    }

    fn select(&mut self, context: PhotoContext) {
        self.context = context;
        self.prompt = context.preset_prompt().to_string();
        self.sync_checkboxes();
    }

    fn sync_checkboxes(&mut self) {
        if let Some(location) = &mut self.location {
            location.checked = self.context == PhotoContext::Location;
        }
        if let Some(room) = &mut self.room {
            room.checked = self.context == PhotoContext::Room;
        }
    }

    /// Replaces the photo of the current context.
    pub fn set_image(&mut self, image: ImageCheckbox) {
        match self.context {
            PhotoContext::Location => self.location = Some(image),
            PhotoContext::Room => self.room = Some(image),
        }
        self.sync_checkboxes();
    }

    /// Photo of the current context. A photo that cannot be read is
    /// reported and generation continues without it.
    fn current_image(&self) -> Option<ImageFile> {
        let checkbox = match self.context {
            PhotoContext::Location => self.location.as_ref(),
            PhotoContext::Room => self.room.as_ref(),
        }?;
        match checkbox.file() {
            Ok(image) => Some(image),
            Err(e) => {
                warn!(path = %checkbox.src.display(), error = %e, "cannot attach photo");
                self.service.notifier().report(&AppError::from(e), None);
                None
            }
        }
    }

    /// Generates subtasks for the current prompt and photo and shows them
    /// as a preview. Ignored unless idle.
    pub async fn go(&mut self) -> &PlannerState {
        if self.state != PlannerState::Idle {
            debug!(state = ?self.state, "generation ignored");
            return &self.state;
        }
        self.state = PlannerState::Generating;

        let prompt = self.prompt.clone();
        let image = self.current_image();
        let result = self
            .service
            .generate_subtasks(&format!("Provide a list of tasks to {}", prompt), &[], image.as_ref())
            .await;

        self.state = match result {
            Ok(GeneratedSubtasks { subtasks }) => PlannerState::Previewing(DraftPlan {
                maintask: Draft::maintask(prompt),
                subtasks: subtasks.into_iter().map(|subtask| Draft::subtask(subtask.title)).collect(),
            }),
            Err(_) => PlannerState::Idle,
        };
        &self.state
    }

    /// Like [`go`](Self::go), but lets the model name the main task.
    pub async fn go_freeform(&mut self) -> &PlannerState {
        if self.state != PlannerState::Idle {
            debug!(state = ?self.state, "generation ignored");
            return &self.state;
        }
        self.state = PlannerState::Generating;

        let prompt = self.prompt.clone();
        let image = self.current_image();
        let result = self.service.generate_task(&prompt, image.as_ref()).await;

        self.state = match result {
            Ok(generated) => PlannerState::Previewing(DraftPlan {
                maintask: Draft::maintask(generated.title),
                subtasks: generated.subtasks.into_iter().map(Draft::subtask).collect(),
            }),
            Err(_) => PlannerState::Idle,
        };
        &self.state
    }

    /// Stores the preview and appends it to the visible list. Returns
    /// `None` when there is no preview.
    pub async fn save(&mut self) -> Result<Option<TaskWithSubtasks>, AppError> {
        let plan = match std::mem::replace(&mut self.state, PlannerState::Idle) {
            PlannerState::Previewing(plan) => plan,
            other => {
                self.state = other;
                return Ok(None);
            }
        };

        let group = self
            .service
            .add_maintask_with_subtasks(&plan.maintask, &plan.subtasks)
            .await?;
        self.tasks.push(TaskCard::new(group.clone()));
        Ok(Some(group))
    }

    /// Discards the preview and restores the preset prompt.
    pub fn reset(&mut self) {
        self.state = PlannerState::Idle;
        self.prompt = self.context.preset_prompt().to_string();
    }

    /// Reloads the visible list from the store.
    pub async fn refresh(&mut self) -> Result<&[TaskCard<Task>], AppError> {
        let groups = self.service.load_tasks_with_subtasks().await?;
        self.tasks = groups.into_iter().map(TaskCard::new).collect();
        Ok(&self.tasks)
    }

    /// Reloads the visible list and starts a generation when it is empty.
    pub async fn load(&mut self) -> Result<&PlannerState, AppError> {
        self.refresh().await?;
        if self.tasks.is_empty() {
            debug!("no tasks stored, generating a first plan");
            return Ok(self.go().await);
        }
        Ok(&self.state)
    }

    /// Removes a main task from the list and deletes it with its subtasks.
    pub async fn delete(&mut self, id: &str) -> Result<Option<TaskCard<Task>>, AppError> {
        let removed = self
            .tasks
            .iter()
            .position(|card| card.id() == id)
            .map(|index| self.tasks.remove(index));
        self.service.delete_maintask_and_subtasks(id).await?;
        Ok(removed)
    }

    /// Sets the completion of a main task (and all its subtasks) or of a
    /// single subtask, and stores every changed task. Fails with
    /// [`AppError::TaskNotFound`] when no visible task has `id`.
    pub async fn set_completed(&mut self, id: &str, completed: bool) -> Result<Vec<Task>, AppError> {
        let changed = self
            .tasks
            .iter_mut()
            .map(|card| card.toggle(id, completed))
            .find(|changed| !changed.is_empty());
        let Some(changed) = changed else {
            let error = AppError::TaskNotFound(id.to_string());
            self.service.notifier().report(&error, None);
            return Err(error);
        };

        for task in &changed {
            self.service.update_task(task).await?;
        }
        Ok(changed)
    }
}
