//! Per-user session runtime
//!
//! A [`Session`] owns everything one user touches: the workflow stage and
//! context, the audit log and the persona chat histories. Actions feed
//! events through the pure [`transition`] function and execute the
//! returned effects here.

mod store;
#[cfg(test)]
pub mod testing;

pub use store::{SessionHandle, SessionStore};

use crate::audit::{AuditLog, AuditRecord};
use crate::chat::{ChatHistory, ChatRole, ChatStreamEvent};
use crate::generator::MessageGenerator;
use crate::prompts::{self, Persona, PERSONAS};
use crate::signals::{mock_traffic_delay, mock_weather_delay};
use crate::workflow::{
    transition, AnomalyReport, DriverOutcome, DriverResponse, Effect, Event, TransitionError,
    WorkflowContext, WorkflowStage,
};
use chrono::Local;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("Workflow finished without {0}")]
    MissingResult(&'static str),
}

/// Serializable view of a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub stage: WorkflowStage,
    #[serde(flatten)]
    pub context: WorkflowContext,
    pub audit_log: Vec<AuditRecord>,
    pub chats: Vec<ChatHistory>,
}

#[derive(Debug)]
pub struct Session {
    id: Uuid,
    stage: WorkflowStage,
    context: WorkflowContext,
    audit: AuditLog,
    chats: HashMap<Persona, ChatHistory>,
}

impl Session {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            stage: WorkflowStage::Idle,
            context: WorkflowContext::default(),
            audit: AuditLog::new(),
            chats: HashMap::new(),
        }
    }

    #[cfg(test)]
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn stage(&self) -> WorkflowStage {
        self.stage
    }

    pub fn context(&self) -> &WorkflowContext {
        &self.context
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Begin the driver interaction for a reported anomaly
    pub async fn start_driver_chat(
        &mut self,
        report: AnomalyReport,
        generator: &MessageGenerator,
    ) -> Result<(), SessionError> {
        self.apply(Event::StartDriverChat { report }, generator).await
    }

    /// Validate and accept the driver's response, moving to customer chat
    pub async fn submit_driver_response(
        &mut self,
        response: DriverResponse,
        generator: &MessageGenerator,
    ) -> Result<DriverOutcome, SessionError> {
        let event = Event::DriverResponseSubmitted {
            response,
            now: Local::now().naive_local(),
            traffic_delay_minutes: mock_traffic_delay(),
            weather_delay_minutes: mock_weather_delay(),
        };
        self.apply(event, generator).await?;
        self.context
            .outcome
            .clone()
            .ok_or(SessionError::MissingResult("driver outcome"))
    }

    /// Generate, screen and display a customer update
    pub async fn generate_customer_message(
        &mut self,
        generator: &MessageGenerator,
    ) -> Result<String, SessionError> {
        let displayed = self.context.customer_messages.len();
        self.apply(Event::CustomerMessageRequested, generator).await?;
        self.context
            .customer_messages
            .get(displayed)
            .cloned()
            .ok_or(SessionError::MissingResult("customer message"))
    }

    /// One turn of a persona chat; returns the AI reply
    pub async fn send_chat(
        &mut self,
        persona: Persona,
        text: &str,
        generator: &MessageGenerator,
    ) -> String {
        let prompt = self.begin_chat_turn(persona, text);
        let reply = generator.generate(&prompt).await;
        self.chat_mut(persona).push(ChatRole::Ai, reply.clone());
        reply
    }

    /// One persona chat turn with the reply streamed to `events`.
    ///
    /// Emits `Delta` events while the reply is generated, then a single
    /// `Done` once the reply is in the history.
    pub async fn stream_chat(
        &mut self,
        persona: Persona,
        text: &str,
        generator: &MessageGenerator,
        events: &mpsc::Sender<ChatStreamEvent>,
    ) -> String {
        let prompt = self.begin_chat_turn(persona, text);
        let reply = generator.generate_streaming(&prompt, events).await;
        self.chat_mut(persona).push(ChatRole::Ai, reply.clone());
        let _ = events
            .send(ChatStreamEvent::Done {
                reply: reply.clone(),
            })
            .await;
        reply
    }

    fn chat_mut(&mut self, persona: Persona) -> &mut ChatHistory {
        self.chats
            .entry(persona)
            .or_insert_with(|| ChatHistory::new(persona))
    }

    /// Record the human message and render the prompt for the reply
    fn begin_chat_turn(&mut self, persona: Persona, text: &str) -> String {
        let history = self.chat_mut(persona);
        history.push(ChatRole::Human, text);
        prompts::render_chat_prompt(persona, history.messages(), text)
    }

    /// Chat history for a persona, starting fresh if never used
    pub fn chat(&self, persona: Persona) -> ChatHistory {
        self.chats
            .get(&persona)
            .cloned()
            .unwrap_or_else(|| ChatHistory::new(persona))
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            stage: self.stage,
            context: self.context.clone(),
            audit_log: self.audit.records().to_vec(),
            chats: PERSONAS
                .iter()
                .filter_map(|p| self.chats.get(&p.persona).cloned())
                .collect(),
        }
    }

    /// Run an event and every follow-up event its effects produce.
    ///
    /// On a transition error the stage is left untouched; effects of
    /// earlier events in the same chain have already been applied.
    async fn apply(&mut self, event: Event, generator: &MessageGenerator) -> Result<(), SessionError> {
        let mut pending = VecDeque::from([event]);

        while let Some(event) = pending.pop_front() {
            let event_name = event.name();
            let result = transition(self.stage, &self.context, event).map_err(|e| {
                tracing::warn!(
                    session_id = %self.id,
                    stage = self.stage.as_str(),
                    event = event_name,
                    error = %e,
                    "Transition rejected"
                );
                e
            })?;

            if result.new_stage != self.stage {
                tracing::info!(
                    session_id = %self.id,
                    from = self.stage.as_str(),
                    to = result.new_stage.as_str(),
                    "Workflow stage changed"
                );
            }
            self.stage = result.new_stage;

            for effect in result.effects {
                if let Some(next) = self.execute(effect, generator).await {
                    pending.push_back(next);
                }
            }
        }

        Ok(())
    }

    async fn execute(&mut self, effect: Effect, generator: &MessageGenerator) -> Option<Event> {
        match effect {
            Effect::RecordReport { report } => {
                self.context.report = Some(report);
                None
            }
            Effect::RecordOutcome { outcome } => {
                self.context.outcome = Some(outcome);
                None
            }
            Effect::LogAudit {
                event_type,
                payload,
            } => {
                self.audit.log_event(event_type, payload);
                None
            }
            Effect::GenerateDriverSummary { outcome } => {
                let prompt = prompts::render_driver_summary(self.context.report.as_ref(), &outcome);
                self.context.driver_summary = Some(generator.generate(&prompt).await);
                None
            }
            Effect::GenerateCustomerMessage { cause, eta } => {
                let prompt =
                    prompts::render_customer_update(self.context.report.as_ref(), cause.as_str(), eta);
                let text = generator.generate(&prompt).await;
                Some(Event::CustomerMessageGenerated { text })
            }
            Effect::DisplayCustomerMessage { text } => {
                self.context.customer_messages.push(text);
                None
            }
        }
    }
}
