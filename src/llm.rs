//! LLM provider abstraction
//!
//! Provides a common interface for the hosted chat-completion API.

mod error;
mod models;
mod openai;
mod registry;
mod types;

pub use error::LlmError;
pub use models::ModelInfo;
pub use registry::{LlmConfig, ModelRegistry};
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

/// Common interface for LLM providers
#[async_trait]
pub trait LlmService: Send + Sync {
    /// Make a completion request
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Make a completion request, sending text deltas to `chunks` as they
    /// arrive. The returned response carries the assembled text.
    ///
    /// Providers without streaming send the whole reply as one chunk.
    async fn complete_streaming(
        &self,
        request: &LlmRequest,
        chunks: &mpsc::Sender<String>,
    ) -> Result<LlmResponse, LlmError> {
        let response = self.complete(request).await?;
        // A closed receiver only means nobody is listening any more
        let _ = chunks.send(response.text.clone()).await;
        Ok(response)
    }

    /// Get the model ID
    fn model_id(&self) -> &str;
}

/// Logging wrapper for LLM services
pub struct LoggingService {
    inner: Arc<dyn LlmService>,
    model_id: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn LlmService>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }

    fn log_outcome(
        &self,
        mode: &'static str,
        request: &LlmRequest,
        started: Instant,
        result: &Result<LlmResponse, LlmError>,
    ) {
        let duration_ms = started.elapsed().as_millis();
        let prompt_chars: usize = request.messages.iter().map(|m| m.text.len()).sum();

        match result {
            Ok(response) => tracing::info!(
                model = %self.model_id,
                mode,
                prompt_chars,
                max_tokens = ?request.max_tokens,
                duration_ms = %duration_ms,
                reply_chars = response.text.len(),
                end_turn = response.end_turn,
                input_tokens = response.usage.input_tokens,
                output_tokens = response.usage.output_tokens,
                "Generated reply"
            ),
            Err(e) => tracing::error!(
                model = %self.model_id,
                mode,
                prompt_chars,
                duration_ms = %duration_ms,
                error = %e.message,
                kind = ?e.kind,
                "Reply generation failed"
            ),
        }
    }
}

#[async_trait]
impl LlmService for LoggingService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let started = Instant::now();
        let result = self.inner.complete(request).await;
        self.log_outcome("complete", request, started, &result);
        result
    }

    async fn complete_streaming(
        &self,
        request: &LlmRequest,
        chunks: &mpsc::Sender<String>,
    ) -> Result<LlmResponse, LlmError> {
        let started = Instant::now();
        let result = self.inner.complete_streaming(request, chunks).await;
        self.log_outcome("stream", request, started, &result);
        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
