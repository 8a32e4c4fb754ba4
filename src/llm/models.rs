//! Model definitions
//!
//! Every model the service can talk to, in one table.

use super::openai::{OpenAIModel, OpenAIService};
use super::LlmService;
use serde::Serialize;
use std::sync::Arc;

/// Model definition with metadata
#[derive(Debug, Clone)]
pub struct ModelDef {
    /// User-facing model ID
    pub id: &'static str,
    /// Human-readable description
    pub description: &'static str,
    pub model: OpenAIModel,
}

/// Public view of a configured model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    pub id: String,
    pub description: Option<&'static str>,
}

impl ModelDef {
    pub fn create(&self, api_key: &str, gateway: Option<&str>) -> Result<Arc<dyn LlmService>, String> {
        // Accept any non-empty key (including "implicit" for gateway mode)
        if api_key.is_empty() {
            return Err(format!("{} requires OPENAI_API_KEY or gateway", self.id));
        }
        let service = OpenAIService::new(api_key.to_string(), self.model, gateway)?;
        Ok(Arc::new(service))
    }
}

/// Get all available model definitions
pub fn all_models() -> &'static [ModelDef] {
    &[
        ModelDef {
            id: "gpt-4o-mini",
            description: "GPT-4o Mini (fast, efficient)",
            model: OpenAIModel::GPT4oMini,
        },
        ModelDef {
            id: "gpt-4o",
            description: "GPT-4o (balanced)",
            model: OpenAIModel::GPT4o,
        },
        ModelDef {
            id: "gpt-3.5-turbo",
            description: "GPT-3.5 Turbo (legacy chat model)",
            model: OpenAIModel::GPT35Turbo,
        },
    ]
}
