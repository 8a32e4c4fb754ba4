//! Effects produced by workflow transitions

use super::state::{AnomalyReport, DriverOutcome};
use crate::validation::CauseKind;
use chrono::NaiveDateTime;
use serde_json::{Map, Value};

/// Effects to be executed, in order, after a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Store the anomaly report in the session
    RecordReport { report: AnomalyReport },

    /// Store the accepted driver outcome in the session
    RecordOutcome { outcome: DriverOutcome },

    /// Append an audit record
    LogAudit {
        event_type: &'static str,
        payload: Map<String, Value>,
    },

    /// Ask the generator for a driver-facing summary
    GenerateDriverSummary { outcome: DriverOutcome },

    /// Ask the generator for a customer-facing update
    GenerateCustomerMessage { cause: CauseKind, eta: NaiveDateTime },

    /// Expose an accepted customer message for display
    DisplayCustomerMessage { text: String },
}

impl Effect {
    pub fn log_audit(event_type: &'static str, payload: Value) -> Self {
        let payload = match payload {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        Effect::LogAudit {
            event_type,
            payload,
        }
    }
}
