//! Message generation through the LLM
//!
//! Generation never fails from the caller's point of view: any LLM error is
//! folded into the returned text.

use crate::chat::ChatStreamEvent;
use crate::llm::{LlmError, LlmRequest, LlmService};
use std::sync::Arc;
use tokio::sync::mpsc;

const CHUNK_BUFFER: usize = 32;

const MAX_TOKENS: u32 = 600;

#[derive(Clone)]
pub struct MessageGenerator {
    llm: Option<Arc<dyn LlmService>>,
}

impl MessageGenerator {
    pub fn new(llm: Option<Arc<dyn LlmService>>) -> Self {
        Self { llm }
    }

    pub fn model_id(&self) -> Option<&str> {
        self.llm.as_deref().map(|llm| llm.model_id())
    }

    /// Send `prompt` as a single user turn and return the reply text
    pub async fn generate(&self, prompt: &str) -> String {
        match self.try_generate(prompt).await {
            Ok(text) => text,
            Err(e) => Self::failure_text(&e),
        }
    }

    /// Like [`Self::generate`], but forwards text deltas to `events` while
    /// the reply is produced. Failures are folded into the returned text.
    pub async fn generate_streaming(
        &self,
        prompt: &str,
        events: &mpsc::Sender<ChatStreamEvent>,
    ) -> String {
        let llm = match self.model() {
            Ok(llm) => Arc::clone(llm),
            Err(e) => return Self::failure_text(&e),
        };
        let request = Self::request(prompt);

        let (chunk_tx, mut chunk_rx) = mpsc::channel(CHUNK_BUFFER);
        // chunk_tx is dropped when the call finishes, which ends the forwarder
        let call = async move { llm.complete_streaming(&request, &chunk_tx).await };
        let forward = async {
            while let Some(text) = chunk_rx.recv().await {
                let _ = events.send(ChatStreamEvent::Delta { text }).await;
            }
        };

        match tokio::join!(call, forward).0 {
            Ok(response) => response.text.trim().to_string(),
            Err(e) => Self::failure_text(&e),
        }
    }

    fn failure_text(e: &LlmError) -> String {
        tracing::warn!(error = %e, kind = ?e.kind, "Message generation failed");
        format!("Error generating message: {e}")
    }

    fn model(&self) -> Result<&Arc<dyn LlmService>, LlmError> {
        self.llm
            .as_ref()
            .ok_or_else(|| LlmError::unavailable("no LLM model configured"))
    }

    fn request(prompt: &str) -> LlmRequest {
        let mut request = LlmRequest::prompt(prompt);
        request.max_tokens = Some(MAX_TOKENS);
        request
    }

    async fn try_generate(&self, prompt: &str) -> Result<String, LlmError> {
        let llm = self.model()?;
        let response = llm.complete(&Self::request(prompt)).await?;
        if !response.end_turn {
            tracing::debug!(model = %llm.model_id(), "Generated message may be truncated");
        }
        Ok(response.text.trim().to_string())
    }
}
