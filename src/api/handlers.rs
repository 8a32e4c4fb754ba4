//! HTTP request handlers

use super::types::{
    AnomalyRequest, AuditLogResponse, ChatHistoryResponse, ChatRequest, ChatResponse,
    CreateSessionResponse, CustomerMessageResponse, DriverResponseRequest, DriverResponseResponse,
    ErrorResponse, ModelsResponse, PersonaInfo, PersonasResponse, StageResponse, StatusResponse,
};
use super::sse::chat_stream;
use super::AppState;
use crate::prompts::{Persona, PERSONAS};
use crate::session::{SessionError, SessionHandle, SessionSnapshot};
use crate::validation::{CauseKind, InvalidCause};
use crate::workflow::{AnomalyReport, DriverResponse, TransitionError};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{sse::Event, IntoResponse, Response, Sse},
    routing::{get, post},
    Json, Router,
};
use futures::stream::Stream;
use std::convert::Infallible;
use tokio::sync::mpsc;
use uuid::Uuid;

const STREAM_BUFFER: usize = 32;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Session lifecycle
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session))
        .route("/api/sessions/:id/reset", post(reset_session))
        // Anomaly workflow
        .route("/api/sessions/:id/anomaly", post(start_driver_chat))
        .route("/api/sessions/:id/driver-response", post(submit_driver_response))
        .route("/api/sessions/:id/customer-message", post(generate_customer_message))
        .route("/api/sessions/:id/audit", get(get_audit_log))
        // Persona chats
        .route(
            "/api/sessions/:id/chat/:persona",
            get(get_chat_history).post(send_chat),
        )
        .route("/api/sessions/:id/chat/:persona/stream", post(stream_chat))
        // Metadata
        .route("/api/personas", get(list_personas))
        .route("/api/models", get(list_models))
        .route("/api/status", get(get_status))
        .route("/version", get(get_version))
        .with_state(state)
}

async fn lookup(state: &AppState, id: Uuid) -> Result<SessionHandle, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
}

// ============================================================
// Session lifecycle
// ============================================================

async fn create_session(State(state): State<AppState>) -> Json<CreateSessionResponse> {
    let id = state.sessions.create().await;
    Json(CreateSessionResponse { id })
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let handle = lookup(&state, id).await?;
    let snapshot = handle.lock().await.snapshot();
    Ok(Json(snapshot))
}

async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StageResponse>, AppError> {
    let handle = state
        .sessions
        .reset(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;
    let stage = handle.lock().await.stage();
    Ok(Json(StageResponse { stage }))
}

// ============================================================
// Anomaly workflow
// ============================================================

async fn start_driver_chat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AnomalyRequest>,
) -> Result<Json<StageResponse>, AppError> {
    let handle = lookup(&state, id).await?;
    let mut session = handle.lock().await;

    let report = AnomalyReport {
        origin: req.origin,
        destination: req.destination,
        anomaly_timestamp: req.anomaly_timestamp,
    };
    session.start_driver_chat(report, &state.generator).await?;

    Ok(Json(StageResponse {
        stage: session.stage(),
    }))
}

async fn submit_driver_response(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<DriverResponseRequest>,
) -> Result<Json<DriverResponseResponse>, AppError> {
    let cause: CauseKind = req.cause.parse().map_err(|e: InvalidCause| {
        tracing::warn!(session_id = %id, cause = %req.cause, "Rejected driver response cause");
        e
    })?;

    let handle = lookup(&state, id).await?;
    let mut session = handle.lock().await;

    let response = DriverResponse {
        cause,
        new_route: req.new_route,
        base_eta: req.base_eta,
        support_needed: req.support_needed,
    };
    let outcome = session
        .submit_driver_response(response, &state.generator)
        .await?;

    Ok(Json(DriverResponseResponse {
        stage: session.stage(),
        outcome,
        driver_summary: session.context().driver_summary.clone(),
    }))
}

async fn generate_customer_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CustomerMessageResponse>, AppError> {
    let handle = lookup(&state, id).await?;
    let message = handle
        .lock()
        .await
        .generate_customer_message(&state.generator)
        .await?;
    Ok(Json(CustomerMessageResponse { message }))
}

async fn get_audit_log(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AuditLogResponse>, AppError> {
    let handle = lookup(&state, id).await?;
    let records = handle.lock().await.audit().records().to_vec();
    Ok(Json(AuditLogResponse { records }))
}

// ============================================================
// Persona chats
// ============================================================

async fn get_chat_history(
    State(state): State<AppState>,
    Path((id, persona)): Path<(Uuid, String)>,
) -> Result<Json<ChatHistoryResponse>, AppError> {
    let persona: Persona = persona.parse().map_err(AppError::NotFound)?;
    let handle = lookup(&state, id).await?;
    let history = handle.lock().await.chat(persona);
    Ok(Json(ChatHistoryResponse {
        messages: history.messages().to_vec(),
    }))
}

async fn send_chat(
    State(state): State<AppState>,
    Path((id, persona)): Path<(Uuid, String)>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let persona: Persona = persona.parse().map_err(AppError::NotFound)?;
    if req.text.trim().is_empty() {
        return Err(AppError::BadRequest("Message text is empty".to_string()));
    }

    let handle = lookup(&state, id).await?;
    let mut session = handle.lock().await;
    let reply = session.send_chat(persona, &req.text, &state.generator).await;

    Ok(Json(ChatResponse {
        reply,
        messages: session.chat(persona).messages().to_vec(),
    }))
}

/// Same turn as `send_chat`, with the reply delivered as SSE `delta`
/// events and a closing `done` event.
async fn stream_chat(
    State(state): State<AppState>,
    Path((id, persona)): Path<(Uuid, String)>,
    Json(req): Json<ChatRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let persona: Persona = persona.parse().map_err(AppError::NotFound)?;
    if req.text.trim().is_empty() {
        return Err(AppError::BadRequest("Message text is empty".to_string()));
    }
    let handle = lookup(&state, id).await?;

    let (tx, rx) = mpsc::channel(STREAM_BUFFER);
    let generator = state.generator.clone();
    tokio::spawn(async move {
        // Turns on one session stay serialized even while streaming
        let mut session = handle.lock_owned().await;
        session.stream_chat(persona, &req.text, &generator, &tx).await;
    });

    Ok(chat_stream(rx))
}

// ============================================================
// Metadata
// ============================================================

async fn list_personas() -> Json<PersonasResponse> {
    Json(PersonasResponse {
        personas: PERSONAS
            .iter()
            .map(|p| PersonaInfo {
                id: p.persona.as_str(),
                title: p.title,
                welcome: p.welcome,
            })
            .collect(),
    })
}

async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: state.llm_registry.describe_models(),
        default: state.llm_registry.default_model_id().to_string(),
    })
}

async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        sessions: state.sessions.len().await,
        model: state.generator.model_id().map(str::to_string),
    })
}

async fn get_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Unprocessable(String),
    Internal(String),
}

impl From<InvalidCause> for AppError {
    fn from(e: InvalidCause) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        let message = e.to_string();
        match e {
            SessionError::Transition(
                TransitionError::EtaNotInFuture { .. } | TransitionError::EtaOutOfRange { .. },
            ) => AppError::BadRequest(message),
            SessionError::Transition(TransitionError::BannedContent) => {
                AppError::Unprocessable(message)
            }
            SessionError::Transition(TransitionError::InvalidTransition { .. }) => {
                AppError::Conflict(message)
            }
            SessionError::MissingResult(_) => AppError::Internal(message),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
