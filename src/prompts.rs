//! Prompt templates
//!
//! One table of persona templates for the free-form chats, plus the two
//! templates the anomaly workflow uses. Templates use `{name}` placeholders
//! filled by [`render`].

use crate::chat::ChatMessage;
use crate::workflow::{AnomalyReport, DriverOutcome};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::str::FromStr;

/// Who the assistant is talking to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    Customer,
    Driver,
    TravelRecommendation,
}

/// Static prompt data for one persona
#[derive(Debug)]
pub struct PersonaPrompt {
    pub persona: Persona,
    pub title: &'static str,
    pub welcome: &'static str,
    pub template: &'static str,
}

const CUSTOMER_TEMPLATE: &str = r"You are a helpful assistant for Customers who are waiting for their shipment.
You MUST provide status updates on the shipment and share the revised ETA and context.
You are capable of predicting shipment arrival times in the face of real-world anomalies like traffic jams, weather, and driver deviations.
You MUST ask for the shipment ID and simulate the estimated time of arrival by analyzing the traffic challenges of the route from New York to Montreal.
You MUST respond as if writing a transport report.
You MUST continue the conversation with follow-up questions like when the user needs the shipment, to coordinate with the driver.
Answer the following questions considering the history of the conversation:

Chat history: {chat_history}

User question: {user_question}";

const DRIVER_TEMPLATE: &str = r"You are a helpful assistant for Drivers who analyzes estimated travel times based on origin, destination and traffic issues.
You are capable of predicting shipment arrival times in the face of real-world anomalies like traffic jams, weather, and driver deviations.
You MUST ask for the cause of the deviation, the new planned route and the new estimated time of arrival.
You MUST continue the conversation with follow-up questions like what the driver could try to speed up the trip.
Answer the following questions considering the history of the conversation:

Chat history: {chat_history}

User question: {user_question}";

const TRAVEL_TEMPLATE: &str = r"You are a helpful travel assistant who generates travel recommendations for any city in the world.
You take into account traffic conditions, weather and the time of day when recommending routes and departure times.
You MUST ask for the origin and the destination if they are missing.
You MUST continue the conversation with follow-up questions about the traveller's preferences.
Answer the following questions considering the history of the conversation:

Chat history: {chat_history}

User question: {user_question}";

pub const PERSONAS: &[PersonaPrompt] = &[
    PersonaPrompt {
        persona: Persona::Customer,
        title: "Customer chat",
        welcome: "Welcome! 🤖 let me know your shipment ID to track the state and the traffic challenges of your shipment",
        template: CUSTOMER_TEMPLATE,
    },
    PersonaPrompt {
        persona: Persona::Driver,
        title: "Driver chat",
        welcome: "Welcome! 🤖 let me know your origin, destination and traffic issue to estimate the new time of arrival",
        template: DRIVER_TEMPLATE,
    },
    PersonaPrompt {
        persona: Persona::TravelRecommendation,
        title: "Travel recommendations",
        welcome: "Welcome! 🤖 tell me where you are travelling from and to, and I will suggest the best way to get there",
        template: TRAVEL_TEMPLATE,
    },
];

const DRIVER_SUMMARY_TEMPLATE: &str = r"You are a dispatcher assisting a truck driver after a route anomaly.
Trip: {origin} to {destination} (anomaly reported at {anomaly_timestamp}).
Cause of deviation: {cause}
New route: {new_route}
Support needed: {support_needed}
Revised ETA: {eta}
Write a short confirmation for the driver summarizing the new plan and the revised ETA.";

const CUSTOMER_UPDATE_TEMPLATE: &str = r"You are a customer service agent for a logistics company.
A customer's shipment from {origin} to {destination} has been delayed.
Cause of delay: {cause}
Revised ETA: {eta}
Write a short, polite status update for the customer explaining the delay and the revised ETA.";

const ETA_FORMAT: &str = "%Y-%m-%d %H:%M";

impl Persona {
    pub fn as_str(self) -> &'static str {
        match self {
            Persona::Customer => "customer",
            Persona::Driver => "driver",
            Persona::TravelRecommendation => "travel_recommendation",
        }
    }

    pub fn prompt(self) -> &'static PersonaPrompt {
        // PERSONAS holds one entry per variant, in declaration order
        match self {
            Persona::Customer => &PERSONAS[0],
            Persona::Driver => &PERSONAS[1],
            Persona::TravelRecommendation => &PERSONAS[2],
        }
    }
}

impl FromStr for Persona {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PERSONAS
            .iter()
            .map(|p| p.persona)
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("Unknown persona: {s}"))
    }
}

/// Replace each `{key}` in `template` with its value
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{key}}}"), value)
    })
}

fn format_history(history: &[ChatMessage]) -> String {
    let mut out = String::new();
    for message in history {
        let _ = writeln!(out, "{}: {}", message.role.label(), message.content);
    }
    out.trim_end().to_string()
}

/// Prompt for one turn of a persona chat
pub fn render_chat_prompt(persona: Persona, history: &[ChatMessage], question: &str) -> String {
    let history = format_history(history);
    render(
        persona.prompt().template,
        &[
            ("chat_history", history.as_str()),
            ("user_question", question),
        ],
    )
}

fn report_vars(report: Option<&AnomalyReport>) -> [(&'static str, &str); 3] {
    match report {
        Some(r) => [
            ("origin", r.origin.as_str()),
            ("destination", r.destination.as_str()),
            ("anomaly_timestamp", r.anomaly_timestamp.as_str()),
        ],
        None => [
            ("origin", "unknown origin"),
            ("destination", "unknown destination"),
            ("anomaly_timestamp", "an unknown time"),
        ],
    }
}

/// Prompt summarizing an accepted driver response for the driver
pub fn render_driver_summary(report: Option<&AnomalyReport>, outcome: &DriverOutcome) -> String {
    let eta = outcome.validated_eta.format(ETA_FORMAT).to_string();
    let mut vars = report_vars(report).to_vec();
    vars.extend([
        ("cause", outcome.cause.as_str()),
        ("new_route", outcome.new_route.as_str()),
        ("support_needed", outcome.support_needed.as_str()),
        ("eta", eta.as_str()),
    ]);
    render(DRIVER_SUMMARY_TEMPLATE, &vars)
}

/// Prompt for the customer-facing delay update
pub fn render_customer_update(
    report: Option<&AnomalyReport>,
    cause: &str,
    eta: NaiveDateTime,
) -> String {
    let eta = eta.format(ETA_FORMAT).to_string();
    let mut vars = report_vars(report).to_vec();
    vars.extend([("cause", cause), ("eta", eta.as_str())]);
    render(CUSTOMER_UPDATE_TEMPLATE, &vars)
}
