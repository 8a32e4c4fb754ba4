//! Pure stage transition function
//!
//! Given the same stage, context and event this always yields the same
//! result; clock readings and mock delays arrive inside the event.

use super::{DriverOutcome, Effect, Event, WorkflowContext, WorkflowStage};
use crate::audit::{CUSTOMER_MESSAGE, DRIVER_RESPONSE};
use crate::validation::{contains_banned_content, validate_eta_at};
use chrono::{Duration, NaiveDateTime};
use serde_json::json;
use thiserror::Error;

/// Fixed padding added to the driver's ETA before the mock delays
pub const ETA_ADJUSTMENT_MINUTES: i64 = 5;

/// Result of a stage transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_stage: WorkflowStage,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(stage: WorkflowStage) -> Self {
        Self {
            new_stage: stage,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Reasons a transition is refused. The stage never changes on error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("ETA {eta} is not in the future")]
    EtaNotInFuture { eta: NaiveDateTime },
    #[error("ETA {eta} is too far in the future to adjust")]
    EtaOutOfRange { eta: NaiveDateTime },
    #[error("Generated customer message was blocked for disallowed content")]
    BannedContent,
    #[error("Cannot handle {event} while in stage {stage}")]
    InvalidTransition {
        stage: &'static str,
        event: &'static str,
    },
}

/// Pure transition function
pub fn transition(
    stage: WorkflowStage,
    context: &WorkflowContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (stage, event) {
        (WorkflowStage::Idle, Event::StartDriverChat { report }) => {
            Ok(TransitionResult::new(WorkflowStage::DriverChat)
                .with_effect(Effect::RecordReport { report }))
        }

        (
            WorkflowStage::DriverChat,
            Event::DriverResponseSubmitted {
                response,
                now,
                traffic_delay_minutes,
                weather_delay_minutes,
            },
        ) => {
            // The driver's own ETA must be ahead of the clock, not just the padded one
            let base_eta = response.base_eta;
            if !validate_eta_at(base_eta, now) {
                return Err(TransitionError::EtaNotInFuture { eta: base_eta });
            }
            let out_of_range = || TransitionError::EtaOutOfRange { eta: base_eta };
            let candidate_eta = base_eta
                .checked_add_signed(Duration::minutes(ETA_ADJUSTMENT_MINUTES))
                .ok_or_else(out_of_range)?;
            let validated_eta = candidate_eta
                .checked_add_signed(Duration::minutes(traffic_delay_minutes))
                .and_then(|eta| eta.checked_add_signed(Duration::minutes(weather_delay_minutes)))
                .ok_or_else(out_of_range)?;

            let audit = Effect::log_audit(
                DRIVER_RESPONSE,
                json!({
                    "cause": response.cause.as_str(),
                    "new_route": response.new_route,
                    "base_eta": response.base_eta,
                    "candidate_eta": candidate_eta,
                    "support_needed": response.support_needed.as_str(),
                }),
            );

            let outcome = DriverOutcome {
                cause: response.cause,
                new_route: response.new_route,
                support_needed: response.support_needed,
                candidate_eta,
                traffic_delay_minutes,
                weather_delay_minutes,
                validated_eta,
            };

            Ok(TransitionResult::new(WorkflowStage::CustomerChat)
                .with_effect(audit)
                .with_effect(Effect::RecordOutcome {
                    outcome: outcome.clone(),
                })
                .with_effect(Effect::GenerateDriverSummary { outcome }))
        }

        (WorkflowStage::CustomerChat, Event::CustomerMessageRequested) => {
            let outcome = context.outcome.as_ref().ok_or(TransitionError::InvalidTransition {
                stage: stage.as_str(),
                event: "customer_message_requested",
            })?;
            Ok(TransitionResult::new(WorkflowStage::CustomerChat).with_effect(
                Effect::GenerateCustomerMessage {
                    cause: outcome.cause,
                    eta: outcome.validated_eta,
                },
            ))
        }

        (WorkflowStage::CustomerChat, Event::CustomerMessageGenerated { text }) => {
            if contains_banned_content(&text) {
                return Err(TransitionError::BannedContent);
            }
            let audit = Effect::log_audit(
                CUSTOMER_MESSAGE,
                json!({
                    "message": text,
                    "eta": context.outcome.as_ref().map(|o| o.validated_eta),
                }),
            );
            Ok(TransitionResult::new(WorkflowStage::CustomerChat)
                .with_effect(audit)
                .with_effect(Effect::DisplayCustomerMessage { text }))
        }

        (stage, event) => Err(TransitionError::InvalidTransition {
            stage: stage.as_str(),
            event: event.name(),
        }),
    }
}
