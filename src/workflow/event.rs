//! Events that drive the workflow

use super::state::{AnomalyReport, DriverResponse};
use chrono::NaiveDateTime;

/// External actions and generator results fed into [`super::transition`].
///
/// Anything non-deterministic (clock, mock delays, generated text) arrives
/// inside the event so the transition itself stays pure.
#[derive(Debug, Clone)]
pub enum Event {
    StartDriverChat {
        report: AnomalyReport,
    },
    DriverResponseSubmitted {
        response: DriverResponse,
        now: NaiveDateTime,
        traffic_delay_minutes: i64,
        weather_delay_minutes: i64,
    },
    CustomerMessageRequested,
    CustomerMessageGenerated {
        text: String,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::StartDriverChat { .. } => "start_driver_chat",
            Event::DriverResponseSubmitted { .. } => "driver_response_submitted",
            Event::CustomerMessageRequested => "customer_message_requested",
            Event::CustomerMessageGenerated { .. } => "customer_message_generated",
        }
    }
}
