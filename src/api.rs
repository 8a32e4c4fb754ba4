//! HTTP API for the ETA agent
//!
//! Each route is an explicit action on one session; the handlers are the
//! only place sessions are looked up or created.

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;

use crate::generator::MessageGenerator;
use crate::llm::ModelRegistry;
use crate::session::SessionStore;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub generator: MessageGenerator,
    pub llm_registry: Arc<ModelRegistry>,
}

impl AppState {
    pub fn new(llm_registry: Arc<ModelRegistry>) -> Self {
        Self {
            sessions: Arc::new(SessionStore::new()),
            generator: MessageGenerator::new(llm_registry.default()),
            llm_registry,
        }
    }
}
