//! API request and response types

use crate::audit::AuditRecord;
use crate::chat::ChatMessage;
use crate::llm::ModelInfo;
use crate::workflow::{DriverOutcome, SupportNeeded, WorkflowStage};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to report an anomaly and start the driver interaction
#[derive(Debug, Deserialize)]
pub struct AnomalyRequest {
    pub origin: String,
    pub destination: String,
    pub anomaly_timestamp: String,
}

/// Driver response as submitted by the client. `cause` is checked
/// against the allow-list before anything else happens.
#[derive(Debug, Deserialize)]
pub struct DriverResponseRequest {
    pub cause: String,
    pub new_route: String,
    pub base_eta: NaiveDateTime,
    #[serde(default)]
    pub support_needed: SupportNeeded,
}

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct StageResponse {
    pub stage: WorkflowStage,
}

#[derive(Debug, Serialize)]
pub struct DriverResponseResponse {
    pub stage: WorkflowStage,
    pub outcome: DriverOutcome,
    pub driver_summary: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CustomerMessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct AuditLogResponse {
    pub records: Vec<AuditRecord>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct ChatHistoryResponse {
    pub messages: Vec<ChatMessage>,
}

/// Persona metadata
#[derive(Debug, Serialize)]
pub struct PersonaInfo {
    pub id: &'static str,
    pub title: &'static str,
    pub welcome: &'static str,
}

#[derive(Debug, Serialize)]
pub struct PersonasResponse {
    pub personas: Vec<PersonaInfo>,
}

/// Response for model list
#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelInfo>,
    pub default: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub sessions: usize,
    pub model: Option<String>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
