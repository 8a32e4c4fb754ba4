//! `OpenAI` and `OpenAI`-compatible provider implementation

use super::types::{LlmMessage, LlmRequest, LlmResponse, MessageRole, Usage};
use super::{LlmError, LlmService};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// `OpenAI` chat models
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenAIModel {
    GPT35Turbo,
    GPT4o,
    GPT4oMini,
}

impl OpenAIModel {
    pub fn api_name(self) -> &'static str {
        match self {
            OpenAIModel::GPT35Turbo => "gpt-3.5-turbo",
            OpenAIModel::GPT4o => "gpt-4o",
            OpenAIModel::GPT4oMini => "gpt-4o-mini",
        }
    }
}

/// OpenAI-compatible service implementation
pub struct OpenAIService {
    client: Client,
    api_key: String,
    model: OpenAIModel,
    base_url: String,
}

impl OpenAIService {
    pub fn new(api_key: String, model: OpenAIModel, gateway: Option<&str>) -> Result<Self, String> {
        let base_url = match gateway {
            Some(gw) => format!("{}/openai/v1/chat/completions", gw.trim_end_matches('/')),
            None => "https://api.openai.com/v1/chat/completions".to_string(),
        };

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {e}"))?;

        Ok(Self {
            client,
            api_key,
            model,
            base_url,
        })
    }

    fn translate_request(&self, request: &LlmRequest, stream: bool) -> OpenAIRequest {
        OpenAIRequest {
            model: self.model.api_name().to_string(),
            messages: request.messages.iter().map(Self::translate_message).collect(),
            max_tokens: request.max_tokens,
            stream,
            stream_options: stream.then_some(StreamOptions {
                include_usage: true,
            }),
        }
    }

    fn translate_message(msg: &LlmMessage) -> OpenAIMessage {
        let role = match msg.role {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        };
        OpenAIMessage {
            role: role.to_string(),
            content: Some(msg.text.clone()),
        }
    }

    /// POST the request and return the response once the status is known good
    async fn send(&self, body: &OpenAIRequest) -> Result<reqwest::Response, LlmError> {
        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    LlmError::network(format!("Connection failed: {e}"))
                } else {
                    LlmError::unknown(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .map_err(|e| LlmError::network(format!("Failed to read response: {e}")))?;
        if let Ok(error_resp) = serde_json::from_str::<OpenAIErrorResponse>(&body) {
            return Err(LlmError::from_status(status.as_u16(), &error_resp.error.message));
        }
        Err(LlmError::unknown(format!("HTTP {status} error: {body}")))
    }

    fn normalize_response(resp: OpenAIResponse) -> Result<LlmResponse, LlmError> {
        let choice = resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::unknown("No choices in response"))?;

        Ok(LlmResponse {
            text: choice.message.content.unwrap_or_default(),
            end_turn: choice.finish_reason.as_deref() == Some("stop"),
            usage: resp.usage.map(Usage::from).unwrap_or_default(),
        })
    }
}

#[async_trait]
impl LlmService for OpenAIService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let response = self.send(&self.translate_request(request, false)).await?;
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::network(format!("Failed to read response: {e}")))?;

        let openai_response: OpenAIResponse = serde_json::from_str(&body).map_err(|e| {
            LlmError::unknown(format!("Failed to parse response: {e} - body: {body}"))
        })?;

        Self::normalize_response(openai_response)
    }

    async fn complete_streaming(
        &self,
        request: &LlmRequest,
        chunks: &mpsc::Sender<String>,
    ) -> Result<LlmResponse, LlmError> {
        let response = self.send(&self.translate_request(request, true)).await?;
        let mut bytes = response.bytes_stream();
        let mut decoder = StreamDecoder::default();

        while let Some(chunk) = bytes.next().await {
            let chunk = chunk.map_err(|e| LlmError::network(format!("Stream interrupted: {e}")))?;
            for delta in decoder.push(&chunk)? {
                let _ = chunks.send(delta).await;
            }
            if decoder.done {
                break;
            }
        }

        Ok(decoder.finish())
    }

    fn model_id(&self) -> &str {
        self.model.api_name()
    }
}

/// Incremental parser for the `data:` lines of a streamed completion.
///
/// Lines may be split across network chunks, so bytes are buffered until a
/// newline arrives.
#[derive(Debug, Default)]
struct StreamDecoder {
    buffer: Vec<u8>,
    text: String,
    finish_reason: Option<String>,
    usage: Usage,
    done: bool,
}

impl StreamDecoder {
    /// Feed raw bytes; returns the text deltas completed by them
    fn push(&mut self, bytes: &[u8]) -> Result<Vec<String>, LlmError> {
        self.buffer.extend_from_slice(bytes);
        let mut deltas = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            if let Some(delta) = self.handle_line(line.trim())? {
                deltas.push(delta);
            }
        }
        Ok(deltas)
    }

    fn handle_line(&mut self, line: &str) -> Result<Option<String>, LlmError> {
        let Some(data) = line.strip_prefix("data:").map(str::trim_start) else {
            return Ok(None);
        };
        if data == "[DONE]" {
            self.done = true;
            return Ok(None);
        }

        let chunk: OpenAIStreamChunk = serde_json::from_str(data)
            .map_err(|e| LlmError::unknown(format!("Failed to parse stream chunk: {e}")))?;
        if let Some(usage) = chunk.usage {
            self.usage = usage.into();
        }

        let Some(choice) = chunk.choices.into_iter().next() else {
            return Ok(None);
        };
        if choice.finish_reason.is_some() {
            self.finish_reason = choice.finish_reason;
        }
        match choice.delta.content {
            Some(content) if !content.is_empty() => {
                self.text.push_str(&content);
                Ok(Some(content))
            }
            _ => Ok(None),
        }
    }

    fn finish(self) -> LlmResponse {
        LlmResponse {
            text: self.text,
            end_turn: self.finish_reason.as_deref() == Some("stop"),
            usage: self.usage,
        }
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream_options: Option<StreamOptions>,
}

#[derive(Debug, Serialize)]
struct StreamOptions {
    include_usage: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIStreamChunk {
    #[serde(default)]
    choices: Vec<OpenAIStreamChoice>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIStreamChoice {
    delta: OpenAIDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
#[allow(clippy::struct_field_names)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

impl From<OpenAIUsage> for Usage {
    fn from(u: OpenAIUsage) -> Self {
        Usage {
            input_tokens: u64::from(u.prompt_tokens),
            output_tokens: u64::from(u.completion_tokens),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorResponse {
    error: OpenAIError,
}

#[derive(Debug, Deserialize)]
struct OpenAIError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn service(gateway: Option<&str>) -> OpenAIService {
        OpenAIService::new("test-key".to_string(), OpenAIModel::GPT4oMini, gateway).unwrap()
    }

    fn delta_line(text: &str) -> String {
        let chunk = json!({ "choices": [{ "delta": { "content": text }, "finish_reason": null }] });
        format!("data: {chunk}\n\n")
    }

    #[test]
    fn test_base_url_direct_and_gateway() {
        assert_eq!(
            service(None).base_url,
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            service(Some("https://gw.example.com/llm/")).base_url,
            "https://gw.example.com/llm/openai/v1/chat/completions"
        );
    }

    #[test]
    fn test_translate_request() {
        let request = LlmRequest {
            messages: vec![LlmMessage::user("Where is truck 7?"), LlmMessage::assistant("On I-87.")],
            max_tokens: Some(200),
        };
        let value = serde_json::to_value(service(None).translate_request(&request, false)).unwrap();

        assert_eq!(value["model"], "gpt-4o-mini");
        assert_eq!(value["max_tokens"], 200);
        assert_eq!(value["stream"], false);
        assert!(value.get("stream_options").is_none());
        assert_eq!(
            value["messages"],
            json!([
                { "role": "user", "content": "Where is truck 7?" },
                { "role": "assistant", "content": "On I-87." },
            ])
        );
    }

    #[test]
    fn test_streaming_request_asks_for_usage() {
        let value =
            serde_json::to_value(service(None).translate_request(&LlmRequest::prompt("hi"), true))
                .unwrap();
        assert_eq!(value["stream"], true);
        assert_eq!(value["stream_options"]["include_usage"], true);
    }

    #[test]
    fn test_normalize_response() {
        let resp: OpenAIResponse = serde_json::from_value(json!({
            "choices": [{
                "message": { "role": "assistant", "content": "ETA 14:35" },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 12, "completion_tokens": 4, "total_tokens": 16 }
        }))
        .unwrap();

        let normalized = OpenAIService::normalize_response(resp).unwrap();
        assert_eq!(normalized.text, "ETA 14:35");
        assert!(normalized.end_turn);
        assert_eq!(normalized.usage.input_tokens, 12);
        assert_eq!(normalized.usage.output_tokens, 4);
    }

    #[test]
    fn test_normalize_response_without_choices() {
        let resp: OpenAIResponse = serde_json::from_value(json!({ "choices": [] })).unwrap();
        let err = OpenAIService::normalize_response(resp).unwrap_err();
        assert_eq!(err.message, "No choices in response");
    }

    #[test]
    fn test_stream_decoder_assembles_deltas() {
        let mut decoder = StreamDecoder::default();
        let mut body = String::from(": keep-alive\n\n");
        body.push_str(&delta_line("Your shipment "));
        body.push_str(&delta_line("is late."));
        body.push_str(
            "data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n\
             data: {\"choices\":[],\"usage\":{\"prompt_tokens\":9,\"completion_tokens\":5}}\n\n\
             data: [DONE]\n\n",
        );

        let deltas = decoder.push(body.as_bytes()).unwrap();
        assert_eq!(deltas, ["Your shipment ", "is late."]);
        assert!(decoder.done);

        let response = decoder.finish();
        assert_eq!(response.text, "Your shipment is late.");
        assert!(response.end_turn);
        assert_eq!(response.usage.input_tokens, 9);
        assert_eq!(response.usage.output_tokens, 5);
    }

    #[test]
    fn test_stream_decoder_handles_split_lines() {
        let mut decoder = StreamDecoder::default();
        let line = delta_line("Café délai");
        let bytes = line.as_bytes();
        // Split inside the multi-byte 'é'
        let split = line.find('é').unwrap() + 1;

        assert!(decoder.push(&bytes[..split]).unwrap().is_empty());
        assert_eq!(decoder.push(&bytes[split..]).unwrap(), ["Café délai"]);
        assert!(!decoder.done);
    }

    #[test]
    fn test_stream_decoder_rejects_garbage() {
        let mut decoder = StreamDecoder::default();
        let err = decoder.push(b"data: {not json}\n").unwrap_err();
        assert!(err.message.starts_with("Failed to parse stream chunk"));
    }
}
