//! Task data model.
//!
//! A [`Task`] is either a main task or a subtask. The distinction is carried
//! by [`TaskKind`], so a record can never hold a priority and a parent at the
//! same time. Serialized documents use the camelCase field names of the
//! `todos` collection (`createdTime`, `parentId`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Name of the document collection holding all tasks.
pub const COLLECTION: &str = "todos";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::None => "none",
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Priority::None),
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!("unknown priority '{}'", other)),
        }
    }
}

/// Main task or subtask specific fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TaskKind {
    Main {
        priority: Priority,
    },
    Subtask {
        #[serde(rename = "parentId")]
        parent_id: String,
        order: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "TaskRecord")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub completed: bool,
    pub owner: String,
    pub created_time: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: TaskKind,
}

/// Flat document shape, checked before it becomes a [`Task`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskRecord {
    id: String,
    title: String,
    #[serde(default)]
    completed: bool,
    owner: String,
    created_time: DateTime<Utc>,
    priority: Option<Priority>,
    parent_id: Option<String>,
    order: Option<u32>,
}

impl TryFrom<TaskRecord> for Task {
    type Error = String;

    fn try_from(record: TaskRecord) -> Result<Self, Self::Error> {
        let kind = match (record.priority, record.parent_id, record.order) {
            (Some(priority), None, None) => TaskKind::Main { priority },
            (None, Some(parent_id), Some(order)) => TaskKind::Subtask { parent_id, order },
            _ => {
                return Err(format!(
                    "task {}: either priority, or parentId with order, must be set",
                    record.id
                ))
            }
        };
        Ok(Task {
            id: record.id,
            title: record.title,
            completed: record.completed,
            owner: record.owner,
            created_time: record.created_time,
            kind,
        })
    }
}

impl Task {
    pub fn is_main(&self) -> bool {
        matches!(self.kind, TaskKind::Main { .. })
    }

    pub fn priority(&self) -> Option<Priority> {
        match self.kind {
            TaskKind::Main { priority } => Some(priority),
            TaskKind::Subtask { .. } => None,
        }
    }

    pub fn parent_id(&self) -> Option<&str> {
        match &self.kind {
            TaskKind::Subtask { parent_id, .. } => Some(parent_id),
            TaskKind::Main { .. } => None,
        }
    }

    pub fn order(&self) -> Option<u32> {
        match self.kind {
            TaskKind::Subtask { order, .. } => Some(order),
            TaskKind::Main { .. } => None,
        }
    }
}

/// A main task together with its subtasks, ordered by `order` ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskWithSubtasks {
    pub maintask: Task,
    pub subtasks: Vec<Task>,
}

impl TaskWithSubtasks {
    pub fn new(maintask: Task, mut subtasks: Vec<Task>) -> Self {
        subtasks.sort_by_key(|t| t.order().unwrap_or(u32::MAX));
        Self { maintask, subtasks }
    }

    /// Every task of the group, main task first.
    pub fn all_tasks(&self) -> impl Iterator<Item = &Task> {
        std::iter::once(&self.maintask).chain(self.subtasks.iter())
    }
}

/// An unsaved task: generated and previewed, not yet written to the store.
///
/// Identifier, owner, timestamp, parent and order are assigned on save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub title: String,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

impl Draft {
    pub fn maintask(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            completed: false,
            priority: Some(Priority::None),
        }
    }

    pub fn subtask(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            completed: false,
            priority: None,
        }
    }
}

/// The preview of a generated main task and its ordered subtasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftPlan {
    pub maintask: Draft,
    pub subtasks: Vec<Draft>,
}
