//! Firestore REST backend of the `todos` collection.
//!
//! Documents are written with `PATCH` (a full replace, or a merge limited by
//! `updateMask.fieldPaths`), read with `runQuery` and counted with
//! `runAggregationQuery`. Requests carry the signed-in user's id token.
//!
//! Firestore rejects an ordered, filtered query when the composite index is
//! missing; that error is classified as [`StoreError::MissingIndex`].

use super::firebase::FirebaseConfig;
use super::ApiError;
use crate::libs::identity::User;
use crate::libs::store::{generate_id, Direction, Filter, Query, StoreError, TaskStore};
use crate::libs::task::{Priority, Task, TaskKind, COLLECTION};
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use tokio::sync::watch;
use tracing::{debug, warn};

const MISSING_INDEX_MARKER: &str = "The query requires an index";
const PERMISSION_MARKER: &str = "Missing or insufficient permissions";
const PERMISSION_STATUS: &str = "PERMISSION_DENIED";
const NOT_FOUND_STATUS: &str = "NOT_FOUND";

/// Fields written on merge. Owner and creation time are immutable.
const MERGE_FIELDS: [&str; 5] = ["title", "completed", "priority", "order", "parentId"];

/// A typed Firestore value, serialized as `{ "<type>Value": ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldValue {
    StringValue(String),
    BooleanValue(bool),
    /// 64-bit integers travel as decimal strings.
    IntegerValue(String),
    DoubleValue(f64),
    TimestampValue(String),
    NullValue(()),
}

impl FieldValue {
    fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::StringValue(s) => Some(s),
            _ => None,
        }
    }

    fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::BooleanValue(b) => Some(*b),
            _ => None,
        }
    }

    fn as_u32(&self) -> Option<u32> {
        match self {
            FieldValue::IntegerValue(s) => s.parse().ok(),
            FieldValue::DoubleValue(d) if *d >= 0.0 && d.fract() == 0.0 => Some(*d as u32),
            _ => None,
        }
    }

    fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::TimestampValue(s) => DateTime::parse_from_rfc3339(s).ok().map(|t| t.with_timezone(&Utc)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub fields: HashMap<String, FieldValue>,
}

/// Encodes a task as Firestore document fields.
pub fn encode_task(task: &Task) -> HashMap<String, FieldValue> {
    let mut fields = HashMap::from([
        ("id".to_string(), FieldValue::StringValue(task.id.clone())),
        ("title".to_string(), FieldValue::StringValue(task.title.clone())),
        ("completed".to_string(), FieldValue::BooleanValue(task.completed)),
        ("owner".to_string(), FieldValue::StringValue(task.owner.clone())),
        (
            "createdTime".to_string(),
            FieldValue::TimestampValue(task.created_time.to_rfc3339_opts(SecondsFormat::Micros, true)),
        ),
    ]);
    match &task.kind {
        TaskKind::Main { priority } => {
            fields.insert("priority".to_string(), FieldValue::StringValue(priority.to_string()));
        }
        TaskKind::Subtask { parent_id, order } => {
            fields.insert("parentId".to_string(), FieldValue::StringValue(parent_id.clone()));
            fields.insert("order".to_string(), FieldValue::IntegerValue(order.to_string()));
        }
    }
    fields
}

/// Decodes a Firestore document into a task. The id is the last segment
/// of the document name.
pub fn decode_task(document: &Document) -> Result<Task, StoreError> {
    let id = document.name.rsplit('/').next().unwrap_or_default().to_string();
    let decode_error = |reason: &str| StoreError::Decode {
        id: id.clone(),
        reason: reason.to_string(),
    };
    let field = |name: &str| document.fields.get(name).filter(|v| !matches!(v, FieldValue::NullValue(())));

    let title = field("title").and_then(FieldValue::as_str).ok_or_else(|| decode_error("missing title"))?;
    let owner = field("owner").and_then(FieldValue::as_str).ok_or_else(|| decode_error("missing owner"))?;
    let created_time = field("createdTime")
        .and_then(FieldValue::as_timestamp)
        .ok_or_else(|| decode_error("missing createdTime"))?;
    let completed = field("completed").and_then(FieldValue::as_bool).unwrap_or(false);

    let kind = match (field("parentId"), field("priority")) {
        (Some(parent_id), None) => TaskKind::Subtask {
            parent_id: parent_id.as_str().ok_or_else(|| decode_error("parentId is not a string"))?.to_string(),
            order: field("order").and_then(FieldValue::as_u32).ok_or_else(|| decode_error("missing order"))?,
        },
        (None, Some(priority)) => TaskKind::Main {
            priority: priority
                .as_str()
                .and_then(|p| p.parse::<Priority>().ok())
                .ok_or_else(|| decode_error("unknown priority"))?,
        },
        _ => return Err(decode_error("exactly one of priority and parentId must be set")),
    };

    Ok(Task {
        id: id.clone(),
        title: title.to_string(),
        completed,
        owner: owner.to_string(),
        created_time,
        kind,
    })
}

/// Builds the `structuredQuery` object for `query`.
pub fn structured_query(query: &Query) -> Value {
    let filters: Vec<Value> = query
        .filters
        .iter()
        .map(|filter| match filter {
            Filter::Present(field) => json!({
                "unaryFilter": { "op": "IS_NOT_NULL", "field": { "fieldPath": field.path() } }
            }),
            Filter::Equals(field, value) => json!({
                "fieldFilter": {
                    "field": { "fieldPath": field.path() },
                    "op": "EQUAL",
                    "value": { "stringValue": value }
                }
            }),
        })
        .collect();

    let mut structured = json!({ "from": [{ "collectionId": COLLECTION }] });
    match filters.len() {
        0 => {}
        1 => structured["where"] = filters.into_iter().next().unwrap_or(Value::Null),
        _ => structured["where"] = json!({ "compositeFilter": { "op": "AND", "filters": filters } }),
    }
    if let Some((field, direction)) = query.order_by {
        let direction = match direction {
            Direction::Ascending => "ASCENDING",
            Direction::Descending => "DESCENDING",
        };
        structured["orderBy"] = json!([{ "field": { "fieldPath": field.path() }, "direction": direction }]);
    }
    structured
}

/// Maps an API error to the store taxonomy.
pub fn classify(error: ApiError) -> StoreError {
    if error.message.contains(MISSING_INDEX_MARKER) {
        StoreError::MissingIndex(error.message)
    } else if error.code.as_deref() == Some(PERMISSION_STATUS) || error.message.contains(PERMISSION_MARKER) {
        StoreError::PermissionDenied(error.message)
    } else if error.code.as_deref() == Some(NOT_FOUND_STATUS) || error.status == StatusCode::NOT_FOUND.as_u16() {
        StoreError::NotFound(error.message)
    } else {
        StoreError::Api {
            status: error.status,
            message: error.message,
        }
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponseItem {
    document: Option<Document>,
}

/// Tasks of a `runQuery` answer. Documents that are not valid tasks are
/// logged and skipped so one bad record does not hide the others.
fn decode_documents(items: &[QueryResponseItem]) -> Vec<Task> {
    items
        .iter()
        .filter_map(|item| item.document.as_ref())
        .filter_map(|document| match decode_task(document) {
            Ok(task) => Some(task),
            Err(e) => {
                warn!(error = %e, "skipping malformed document");
                None
            }
        })
        .collect()
}

/// Query parameters of a document `PATCH`. An empty mask replaces the
/// whole document; otherwise only the masked fields are written, and only
/// if the document already exists.
fn patch_params<'a>(mask: &[&'a str]) -> Vec<(&'static str, &'a str)> {
    let mut params: Vec<(&'static str, &'a str)> = mask.iter().map(|field| ("updateMask.fieldPaths", *field)).collect();
    if !mask.is_empty() {
        params.push(("currentDocument.exists", "true"));
    }
    params
}

#[derive(Debug, Deserialize)]
struct AggregationResponseItem {
    result: Option<AggregationResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AggregationResult {
    #[serde(default)]
    aggregate_fields: HashMap<String, FieldValue>,
}

pub struct Firestore {
    client: Client,
    config: FirebaseConfig,
    user: watch::Receiver<Option<User>>,
}

impl Firestore {
    /// Creates the client. The id token is read from `user` on every
    /// request, so a later sign-in is picked up automatically.
    pub fn new(config: &FirebaseConfig, user: watch::Receiver<Option<User>>) -> Self {
        Self {
            client: Client::new(),
            config: config.clone(),
            user,
        }
    }

    fn documents_url(&self) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents",
            self.config.firestore_url.trim_end_matches('/'),
            self.config.project_id
        )
    }

    fn document_url(&self, id: &str) -> String {
        format!("{}/{}/{}", self.documents_url(), COLLECTION, id)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self.user.borrow().as_ref().and_then(|u| u.id_token.clone());
        match token {
            Some(token) => request.bearer_auth(token),
            None => request.query(&[("key", self.config.api_key.as_str())]),
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let response = self.authorized(request).send().await?;
        if response.status().is_success() {
            return Ok(response);
        }
        Err(classify(ApiError::from_response(response).await))
    }

    async fn patch(&self, task: &Task, mask: &[&str]) -> Result<(), StoreError> {
        let fields: HashMap<String, FieldValue> = encode_task(task)
            .into_iter()
            .filter(|(name, _)| mask.is_empty() || mask.contains(&name.as_str()))
            .collect();
        let request = self
            .client
            .patch(self.document_url(&task.id))
            .query(&patch_params(mask))
            .json(&Document {
                name: String::new(),
                fields,
            });
        self.send(request).await?;
        Ok(())
    }
}

impl TaskStore for Firestore {
    fn new_id(&self) -> String {
        generate_id()
    }

    async fn count(&self, query: &Query) -> Result<usize, StoreError> {
        let mut unordered = query.clone();
        unordered.order_by = None;
        let body = json!({
            "structuredAggregationQuery": {
                "structuredQuery": structured_query(&unordered),
                "aggregations": [{ "alias": "count", "count": {} }]
            }
        });
        let request = self.client.post(format!("{}:runAggregationQuery", self.documents_url())).json(&body);
        let items = self.send(request).await?.json::<Vec<AggregationResponseItem>>().await?;

        let count = items
            .into_iter()
            .filter_map(|item| item.result)
            .find_map(|result| result.aggregate_fields.get("count").and_then(FieldValue::as_u32))
            .unwrap_or(0);
        Ok(count as usize)
    }

    async fn query(&self, query: &Query) -> Result<Vec<Task>, StoreError> {
        debug!(?query, "runQuery");
        let body = json!({ "structuredQuery": structured_query(query) });
        let request = self.client.post(format!("{}:runQuery", self.documents_url())).json(&body);
        let items = self.send(request).await?.json::<Vec<QueryResponseItem>>().await?;

        Ok(decode_documents(&items))
    }

    async fn get(&self, id: &str) -> Result<Option<Task>, StoreError> {
        let response = self.authorized(self.client.get(self.document_url(id))).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(classify(ApiError::from_response(response).await));
        }
        let document = response.json::<Document>().await?;
        decode_task(&document).map(Some)
    }

    async fn set(&self, task: &Task) -> Result<(), StoreError> {
        self.patch(task, &[]).await
    }

    async fn merge(&self, task: &Task) -> Result<(), StoreError> {
        let present: Vec<&str> = MERGE_FIELDS
            .iter()
            .copied()
            .filter(|field| match (*field, &task.kind) {
                ("priority", TaskKind::Subtask { .. }) => false,
                ("order" | "parentId", TaskKind::Main { .. }) => false,
                _ => true,
            })
            .collect();
        match self.patch(task, &present).await {
            // A partial document would lack owner and creation time.
            Err(StoreError::NotFound(_)) => {
                debug!(id = %task.id, "merge target missing, writing the full document");
                self.patch(task, &[]).await
            }
            other => other,
        }
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.send(self.client.delete(self.document_url(id))).await?;
        Ok(())
    }
}
