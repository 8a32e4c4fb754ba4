//! Append-only audit log
//!
//! One log per session. Records are never mutated or removed.

use chrono::Local;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

pub const DRIVER_RESPONSE: &str = "driver_response";
pub const CUSTOMER_MESSAGE: &str = "customer_message";

/// A single audited event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditRecord {
    pub trace_id: Uuid,
    pub event_type: String,
    /// ISO-8601 local time, no offset
    pub timestamp: String,
    pub payload: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct AuditLog {
    records: Vec<AuditRecord>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event and return its trace id
    pub fn log_event(&mut self, event_type: &str, payload: Map<String, Value>) -> Uuid {
        let trace_id = Uuid::new_v4();
        let timestamp = Local::now().naive_local().format("%Y-%m-%dT%H:%M:%S%.6f").to_string();

        let payload_json = Value::Object(payload.clone());
        tracing::info!(
            trace_id = %trace_id,
            event_type = %event_type,
            payload = %payload_json,
            "Audit event"
        );

        self.records.push(AuditRecord {
            trace_id,
            event_type: event_type.to_string(),
            timestamp,
            payload,
        });
        trace_id
    }

    pub fn records(&self) -> &[AuditRecord] {
        &self.records
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records with the given event type
    #[cfg(test)]
    pub fn count_of(&self, event_type: &str) -> usize {
        self.records
            .iter()
            .filter(|r| r.event_type == event_type)
            .count()
    }
}
