//! In-memory map of live sessions
//!
//! Each session sits behind its own mutex so actions on one session are
//! serialized while other sessions proceed.

use super::Session;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

pub type SessionHandle = Arc<Mutex<Session>>;

#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, SessionHandle>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        let handle = Arc::new(Mutex::new(Session::new(id)));
        self.sessions.write().await.insert(id, handle);
        tracing::info!(session_id = %id, "Session created");
        id
    }

    pub async fn get(&self, id: Uuid) -> Option<SessionHandle> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Replace a session with a fresh one under the same id
    pub async fn reset(&self, id: Uuid) -> Option<SessionHandle> {
        let handle = self.get(id).await?;
        *handle.lock().await = Session::new(id);
        tracing::info!(session_id = %id, "Session reset");
        Some(handle)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
