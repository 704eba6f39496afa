//! Local SQLite backend of the `todos` collection.
//!
//! Used when no Firebase project is configured. Queries are translated to
//! SQL; timestamps are stored as microseconds since the Unix epoch so that
//! ordering by creation time is exact.

use super::db::Db;
use crate::libs::store::{generate_id, Direction, Field, Filter, Query, StoreError, TaskStore};
use crate::libs::task::{Priority, Task, TaskKind};
use anyhow::Result;
use chrono::DateTime;
use parking_lot::Mutex;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;

const SELECT_TODOS: &str = "SELECT id, title, completed, owner, created_time, priority, sort_order, parent_id FROM todos";
const COUNT_TODOS: &str = "SELECT COUNT(*) FROM todos";
const SELECT_TODO_BY_ID: &str =
    "SELECT id, title, completed, owner, created_time, priority, sort_order, parent_id FROM todos WHERE id = ?1";
const REPLACE_TODO: &str = "INSERT OR REPLACE INTO todos (id, title, completed, owner, created_time, priority, sort_order, parent_id)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";
const MERGE_TODO: &str = "INSERT INTO todos (id, title, completed, owner, created_time, priority, sort_order, parent_id)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
    ON CONFLICT(id) DO UPDATE SET
        title = excluded.title,
        completed = excluded.completed,
        priority = COALESCE(excluded.priority, todos.priority),
        sort_order = COALESCE(excluded.sort_order, todos.sort_order),
        parent_id = COALESCE(excluded.parent_id, todos.parent_id)";
const DELETE_TODO: &str = "DELETE FROM todos WHERE id = ?1";

/// Raw column values of one `todos` row.
struct TodoRow {
    id: String,
    title: String,
    completed: bool,
    owner: String,
    created_time: i64,
    priority: Option<String>,
    sort_order: Option<u32>,
    parent_id: Option<String>,
}

impl TodoRow {
    fn read(row: &Row) -> rusqlite::Result<Self> {
        Ok(TodoRow {
            id: row.get(0)?,
            title: row.get(1)?,
            completed: row.get(2)?,
            owner: row.get(3)?,
            created_time: row.get(4)?,
            priority: row.get(5)?,
            sort_order: row.get(6)?,
            parent_id: row.get(7)?,
        })
    }

    fn into_task(self) -> Result<Task, StoreError> {
        let decode_error = |reason: String| StoreError::Decode {
            id: self.id.clone(),
            reason,
        };
        let created_time =
            DateTime::from_timestamp_micros(self.created_time).ok_or_else(|| decode_error("created_time out of range".into()))?;
        let kind = match (self.parent_id.clone(), self.priority.as_deref()) {
            (Some(parent_id), None) => TaskKind::Subtask {
                parent_id,
                order: self.sort_order.ok_or_else(|| decode_error("subtask without order".into()))?,
            },
            (None, Some(priority)) => TaskKind::Main {
                priority: priority.parse::<Priority>().map_err(decode_error)?,
            },
            _ => return Err(decode_error("exactly one of priority and parent_id must be set".into())),
        };

        Ok(Task {
            id: self.id,
            title: self.title,
            completed: self.completed,
            owner: self.owner,
            created_time,
            kind,
        })
    }
}

/// Column values bound when writing a task.
fn columns(task: &Task) -> (Option<&'static str>, Option<u32>, Option<&str>) {
    match &task.kind {
        TaskKind::Main { priority } => (Some(priority.as_str()), None, None),
        TaskKind::Subtask { parent_id, order } => (None, Some(*order), Some(parent_id.as_str())),
    }
}

fn column(field: Field) -> &'static str {
    match field {
        Field::Priority => "priority",
        Field::ParentId => "parent_id",
        Field::CreatedTime => "created_time",
        Field::Order => "sort_order",
    }
}

/// Renders the WHERE clause of `query` and the values it binds.
fn where_clause(query: &Query) -> (String, Vec<String>) {
    let mut clauses = Vec::new();
    let mut values = Vec::new();
    for filter in &query.filters {
        match filter {
            Filter::Present(field) => clauses.push(format!("{} IS NOT NULL", column(*field))),
            Filter::Equals(field, value) => {
                values.push(value.clone());
                clauses.push(format!("{} = ?{}", column(*field), values.len()));
            }
        }
    }
    if clauses.is_empty() {
        (String::new(), values)
    } else {
        (format!(" WHERE {}", clauses.join(" AND ")), values)
    }
}

pub struct Todos {
    conn: Mutex<Connection>,
}

impl Todos {
    /// Opens the task database in the application data directory.
    pub fn new() -> Result<Todos> {
        Ok(Self::from_db(Db::new()?))
    }

    pub fn open(path: &Path) -> Result<Todos> {
        Ok(Self::from_db(Db::open(path)?))
    }

    pub fn in_memory() -> Result<Todos> {
        Ok(Self::from_db(Db::in_memory()?))
    }

    fn from_db(db: Db) -> Todos {
        Todos { conn: Mutex::new(db.conn) }
    }

    fn select(&self, sql: &str, values: &[String]) -> Result<Vec<Task>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), TodoRow::read)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(TodoRow::into_task).collect()
    }

    fn write(&self, sql: &str, task: &Task) -> Result<(), StoreError> {
        let (priority, sort_order, parent_id) = columns(task);
        self.conn.lock().execute(
            sql,
            params![
                task.id,
                task.title,
                task.completed,
                task.owner,
                task.created_time.timestamp_micros(),
                priority,
                sort_order,
                parent_id
            ],
        )?;
        Ok(())
    }
}

impl TaskStore for Todos {
    fn new_id(&self) -> String {
        generate_id()
    }

    async fn count(&self, query: &Query) -> Result<usize, StoreError> {
        let (clause, values) = where_clause(query);
        let count: i64 = self
            .conn
            .lock()
            .query_row(&format!("{}{}", COUNT_TODOS, clause), params_from_iter(values.iter()), |row| row.get(0))?;
        Ok(count as usize)
    }

    async fn query(&self, query: &Query) -> Result<Vec<Task>, StoreError> {
        let (clause, values) = where_clause(query);
        let mut sql = format!("{}{}", SELECT_TODOS, clause);
        if let Some((field, direction)) = query.order_by {
            let direction = match direction {
                Direction::Ascending => "ASC",
                Direction::Descending => "DESC",
            };
            sql.push_str(&format!(" ORDER BY {} {}", column(field), direction));
        }
        self.select(&sql, &values)
    }

    async fn get(&self, id: &str) -> Result<Option<Task>, StoreError> {
        let row = self
            .conn
            .lock()
            .query_row(SELECT_TODO_BY_ID, params![id], TodoRow::read)
            .optional()?;
        row.map(TodoRow::into_task).transpose()
    }

    async fn set(&self, task: &Task) -> Result<(), StoreError> {
        self.write(REPLACE_TODO, task)
    }

    async fn merge(&self, task: &Task) -> Result<(), StoreError> {
        self.write(MERGE_TODO, task)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.conn.lock().execute(DELETE_TODO, params![id])?;
        Ok(())
    }
}
