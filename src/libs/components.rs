//! View models behind the task list.
//!
//! A [`TaskCard`] shows one main task with its subtasks. The same card is
//! used for stored tasks and for the unsaved preview of a generated plan,
//! which is why it is generic over the item type.

use super::generation::GenerationError;
use super::image::ImageFile;
use super::task::{Draft, DraftPlan, Task, TaskWithSubtasks};
use std::path::{Path, PathBuf};

/// A row of a task card.
pub trait CardItem {
    fn title(&self) -> &str;
    fn completed(&self) -> bool;
    fn set_completed(&mut self, completed: bool);
}

impl CardItem for Task {
    fn title(&self) -> &str {
        &self.title
    }

    fn completed(&self) -> bool {
        self.completed
    }

    fn set_completed(&mut self, completed: bool) {
        self.completed = completed;
    }
}

impl CardItem for Draft {
    fn title(&self) -> &str {
        &self.title
    }

    fn completed(&self) -> bool {
        self.completed
    }

    fn set_completed(&mut self, completed: bool) {
        self.completed = completed;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskCard<T> {
    pub maintask: T,
    pub subtasks: Vec<T>,
    pub can_delete: bool,
    pub show_generated_badge: bool,
}

impl<T: CardItem + Clone> TaskCard<T> {
    /// Sets `completed` on the main task and every subtask. Returns all
    /// of them, main task first.
    pub fn toggle_main(&mut self, completed: bool) -> Vec<T> {
        self.maintask.set_completed(completed);
        for subtask in &mut self.subtasks {
            subtask.set_completed(completed);
        }
        std::iter::once(self.maintask.clone()).chain(self.subtasks.iter().cloned()).collect()
    }

    /// Sets `completed` on one subtask only.
    pub fn toggle_subtask(&mut self, index: usize, completed: bool) -> Option<T> {
        let subtask = self.subtasks.get_mut(index)?;
        subtask.set_completed(completed);
        Some(subtask.clone())
    }

    pub fn main_button(&self) -> RoundButton {
        RoundButton::new(self.maintask.completed(), self.maintask.title(), false)
    }

    pub fn subtask_buttons(&self) -> impl Iterator<Item = RoundButton> + '_ {
        self.subtasks
            .iter()
            .map(|subtask| RoundButton::new(subtask.completed(), subtask.title(), true))
    }
}

impl TaskCard<Task> {
    pub fn new(group: TaskWithSubtasks) -> Self {
        Self {
            maintask: group.maintask,
            subtasks: group.subtasks,
            can_delete: true,
            show_generated_badge: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.maintask.id
    }

    /// Deletion request for the whole card, carrying the main task id.
    pub fn delete_clicked(&self) -> Option<String> {
        self.can_delete.then(|| self.maintask.id.clone())
    }

    /// Toggles the main task (cascading to its subtasks) or a single
    /// subtask by id. Returns the changed tasks, empty when `id` is not on
    /// this card.
    pub fn toggle(&mut self, id: &str, completed: bool) -> Vec<Task> {
        if self.maintask.id == id {
            return self.toggle_main(completed);
        }
        match self.subtasks.iter().position(|subtask| subtask.id == id) {
            Some(index) => self.toggle_subtask(index, completed).into_iter().collect(),
            None => Vec::new(),
        }
    }

    pub fn find(&self, id: &str) -> Option<&Task> {
        std::iter::once(&self.maintask)
            .chain(self.subtasks.iter())
            .find(|task| task.id == id)
    }

    pub fn to_group(&self) -> TaskWithSubtasks {
        TaskWithSubtasks::new(self.maintask.clone(), self.subtasks.clone())
    }
}

impl TaskCard<Draft> {
    /// Card of an unsaved plan: badged and not deletable.
    pub fn preview(plan: &DraftPlan) -> Self {
        Self {
            maintask: plan.maintask.clone(),
            subtasks: plan.subtasks.clone(),
            can_delete: false,
            show_generated_badge: true,
        }
    }
}

/// Completion toggle of a single task row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundButton {
    pub checked: bool,
    pub title: String,
    pub subtask: bool,
}

impl RoundButton {
    pub fn new(checked: bool, title: &str, subtask: bool) -> Self {
        Self {
            checked,
            title: title.to_string(),
            subtask,
        }
    }

    /// The new checked value requested by a click.
    pub fn click(&self) -> bool {
        !self.checked
    }

    pub fn glyph(&self) -> &'static str {
        match (self.checked, self.subtask) {
            (true, false) => "●",
            (false, false) => "○",
            (true, true) => "☑",
            (false, true) => "☐",
        }
    }
}

/// Selectable reference photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCheckbox {
    pub checked: bool,
    pub src: PathBuf,
}

impl ImageCheckbox {
    pub fn new(src: impl AsRef<Path>, checked: bool) -> Self {
        Self {
            checked,
            src: src.as_ref().to_path_buf(),
        }
    }

    /// The new checked value requested by a click.
    pub fn click(&self) -> bool {
        !self.checked
    }

    /// Loads the photo for a generation request.
    pub fn file(&self) -> Result<ImageFile, GenerationError> {
        ImageFile::open(&self.src)
    }
}
