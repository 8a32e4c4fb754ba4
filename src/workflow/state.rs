//! Workflow stage and the data gathered along the way

use crate::validation::CauseKind;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Point in the anomaly workflow. Only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    #[default]
    Idle,
    DriverChat,
    CustomerChat,
}

impl WorkflowStage {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowStage::Idle => "idle",
            WorkflowStage::DriverChat => "driver_chat",
            WorkflowStage::CustomerChat => "customer_chat",
        }
    }
}

/// Route anomaly reported before the driver interaction starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyReport {
    pub origin: String,
    pub destination: String,
    pub anomaly_timestamp: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportNeeded {
    #[default]
    None,
    TruckReplacement,
}

impl SupportNeeded {
    pub fn as_str(self) -> &'static str {
        match self {
            SupportNeeded::None => "none",
            SupportNeeded::TruckReplacement => "truck_replacement",
        }
    }
}

/// What the driver submitted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverResponse {
    pub cause: CauseKind,
    pub new_route: String,
    pub base_eta: NaiveDateTime,
    #[serde(default)]
    pub support_needed: SupportNeeded,
}

/// Accepted driver response with the adjusted arrival time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverOutcome {
    pub cause: CauseKind,
    pub new_route: String,
    pub support_needed: SupportNeeded,
    /// Base ETA plus the fixed adjustment
    pub candidate_eta: NaiveDateTime,
    pub traffic_delay_minutes: i64,
    pub weather_delay_minutes: i64,
    pub validated_eta: NaiveDateTime,
}

/// Data the workflow has accumulated so far
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkflowContext {
    pub report: Option<AnomalyReport>,
    pub outcome: Option<DriverOutcome>,
    pub driver_summary: Option<String>,
    pub customer_messages: Vec<String>,
}
