//! Document store abstraction over the `todos` collection.
//!
//! Two backends implement [`TaskStore`]: the Firestore REST client in
//! `api::firestore` and the local SQLite store in `db::todos`.

use super::task::Task;
use thiserror::Error;

/// Queryable task fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Priority,
    ParentId,
    CreatedTime,
    Order,
}

impl Field {
    /// Field name as stored in documents.
    pub fn path(&self) -> &'static str {
        match self {
            Field::Priority => "priority",
            Field::ParentId => "parentId",
            Field::CreatedTime => "createdTime",
            Field::Order => "order",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// The field is present on the document.
    Present(Field),
    /// The field equals the given string value.
    Equals(Field, String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// A filtered, optionally ordered query over the `todos` collection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Option<(Field, Direction)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, field: Field, direction: Direction) -> Self {
        self.order_by = Some((field, direction));
        self
    }

    /// All main tasks, unordered. Used for the cheap count.
    pub fn main_tasks() -> Self {
        Self::new().filter(Filter::Present(Field::Priority))
    }

    /// All main tasks, newest first.
    pub fn main_tasks_newest_first() -> Self {
        Self::main_tasks().order_by(Field::CreatedTime, Direction::Descending)
    }

    /// Subtasks of one main task, in their stored order.
    pub fn subtasks_of(main_id: &str) -> Self {
        Self::new()
            .filter(Filter::Equals(Field::ParentId, main_id.to_string()))
            .order_by(Field::Order, Direction::Ascending)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend needs a composite index for an ordered query.
    #[error("The query requires an index: {0}")]
    MissingIndex(String),

    #[error("Missing or insufficient permissions: {0}")]
    PermissionDenied(String),

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Store request failed ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Store request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Sqlite(rusqlite::Error),

    #[error("Malformed document {id}: {reason}")]
    Decode { id: String, reason: String },
}

impl From<rusqlite::Error> for StoreError {
    fn from(error: rusqlite::Error) -> Self {
        use rusqlite::ErrorCode;

        match error.sqlite_error_code() {
            Some(ErrorCode::PermissionDenied | ErrorCode::ReadOnly | ErrorCode::AuthorizationForStatementDenied) => {
                StoreError::PermissionDenied(error.to_string())
            }
            _ => StoreError::Sqlite(error),
        }
    }
}

/// CRUD and query operations of the `todos` document collection.
#[allow(async_fn_in_trait)]
pub trait TaskStore {
    /// Returns a fresh document identifier.
    fn new_id(&self) -> String;

    /// Number of documents matching `query`. Ordering is ignored.
    async fn count(&self, query: &Query) -> Result<usize, StoreError>;

    async fn query(&self, query: &Query) -> Result<Vec<Task>, StoreError>;

    async fn get(&self, id: &str) -> Result<Option<Task>, StoreError>;

    /// Writes `task` under `task.id`, replacing any existing document.
    async fn set(&self, task: &Task) -> Result<(), StoreError>;

    /// Merges the fields of `task` into the stored document `task.id`,
    /// creating it if missing. The stored owner is never replaced.
    async fn merge(&self, task: &Task) -> Result<(), StoreError>;

    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}

/// Document ids: 20 alphanumeric characters, like Firestore auto-ids.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..20].to_string()
}
