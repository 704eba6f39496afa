#![allow(dead_code)]

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use taskgen::db::todos::Todos;
use taskgen::libs::generation::{GenerationError, GenerationRequest, Generator};
use taskgen::libs::identity::{AuthError, AuthProvider, User};
use taskgen::libs::notify::{Notification, Notifier};
use taskgen::libs::store::{Query, StoreError, TaskStore};
use taskgen::libs::task::Task;
use taskgen::libs::task_service::TaskService;
use tokio::sync::watch;

/// In-memory SQLite store that records every query and can fail on demand.
pub struct RecordingStore {
    inner: Todos,
    pub counts: Mutex<Vec<Query>>,
    pub queries: Mutex<Vec<Query>>,
    pub deleted: Mutex<Vec<String>>,
    pub merged: Mutex<Vec<Task>>,
    fail_query: Mutex<Option<StoreError>>,
    fail_merge: Mutex<Option<StoreError>>,
    fail_set_at: Mutex<Option<(usize, StoreError)>>,
    sets: AtomicUsize,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self {
            inner: Todos::in_memory().unwrap(),
            counts: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            merged: Mutex::new(Vec::new()),
            fail_query: Mutex::new(None),
            fail_merge: Mutex::new(None),
            fail_set_at: Mutex::new(None),
            sets: AtomicUsize::new(0),
        }
    }

    pub fn fail_next_query(&self, error: StoreError) {
        *self.fail_query.lock() = Some(error);
    }

    pub fn fail_next_merge(&self, error: StoreError) {
        *self.fail_merge.lock() = Some(error);
    }

    /// Fails the `index`-th write (0-based) from now on.
    pub fn fail_set_at(&self, index: usize, error: StoreError) {
        self.sets.store(0, Ordering::SeqCst);
        *self.fail_set_at.lock() = Some((index, error));
    }

    pub fn ordered_queries(&self) -> usize {
        self.queries.lock().iter().filter(|q| q.order_by.is_some()).count()
    }

    pub async fn all(&self) -> Vec<Task> {
        self.inner.query(&Query::new()).await.unwrap()
    }
}

impl TaskStore for RecordingStore {
    fn new_id(&self) -> String {
        self.inner.new_id()
    }

    async fn count(&self, query: &Query) -> Result<usize, StoreError> {
        self.counts.lock().push(query.clone());
        self.inner.count(query).await
    }

    async fn query(&self, query: &Query) -> Result<Vec<Task>, StoreError> {
        self.queries.lock().push(query.clone());
        if let Some(error) = self.fail_query.lock().take() {
            return Err(error);
        }
        self.inner.query(query).await
    }

    async fn get(&self, id: &str) -> Result<Option<Task>, StoreError> {
        self.inner.get(id).await
    }

    async fn set(&self, task: &Task) -> Result<(), StoreError> {
        let index = self.sets.fetch_add(1, Ordering::SeqCst);
        let mut failure = self.fail_set_at.lock();
        if failure.as_ref().is_some_and(|(at, _)| *at == index) {
            if let Some((_, error)) = failure.take() {
                return Err(error);
            }
        }
        drop(failure);
        self.inner.set(task).await
    }

    async fn merge(&self, task: &Task) -> Result<(), StoreError> {
        if let Some(error) = self.fail_merge.lock().take() {
            return Err(error);
        }
        self.merged.lock().push(task.clone());
        self.inner.merge(task).await
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.deleted.lock().push(id.to_string());
        self.inner.delete(id).await
    }
}

/// Generator answering with queued responses.
#[derive(Default)]
pub struct FakeGenerator {
    responses: Mutex<VecDeque<Result<String, GenerationError>>>,
    pub requests: Mutex<Vec<GenerationRequest>>,
}

impl FakeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, text: &str) -> Self {
        self.responses.lock().push_back(Ok(text.to_string()));
        self
    }

    pub fn fail(self, error: GenerationError) -> Self {
        self.responses.lock().push_back(Err(error));
        self
    }

    pub fn push(&self, text: &str) {
        self.responses.lock().push_back(Ok(text.to_string()));
    }
}

impl Generator for FakeGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.requests.lock().push(request.clone());
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::InvalidResponse("no response queued".to_string())))
    }
}

/// Identity provider that signs in as a fixed user, or always fails.
pub struct FakeAuth {
    user: Option<User>,
    state: watch::Sender<Option<User>>,
    pub attempts: AtomicUsize,
}

impl FakeAuth {
    pub fn signed_in(uid: &str) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            user: Some(User::new(uid)),
            state,
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        let (state, _) = watch::channel(None);
        Self {
            user: None,
            state,
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn publish(&self, user: Option<User>) {
        self.state.send_replace(user);
    }
}

impl AuthProvider for FakeAuth {
    async fn sign_in_anonymously(&self) -> Result<User, AuthError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let user = self.user.clone().ok_or(AuthError::NotConfigured)?;
        self.state.send_replace(Some(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.state.send_replace(None);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.state.subscribe()
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.notifications.lock().push(notification);
    }
}

pub type TestService = TaskService<RecordingStore, FakeGenerator, FakeAuth, RecordingNotifier>;

pub async fn service(generator: FakeGenerator, auth: FakeAuth) -> TestService {
    TaskService::new(RecordingStore::new(), generator, auth, RecordingNotifier::default()).await
}

pub async fn offline_service(generator: FakeGenerator) -> TestService {
    service(generator, FakeAuth::failing()).await
}
