//! Anthropic Messages API adapter.

use super::stream::{sse_event_stream, EventStream, Frame};
use super::transport::{HttpRequest, Transport};
use super::{complete_request, kind_for_code, kind_for_status, LlmAdapter};
use crate::config::{EffectiveConfig, ProviderKind};
use crate::error::{ErrorKind, ProviderError};
use crate::summary::PromptRequest;
use async_trait::async_trait;
use eventsource_stream::Event;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Deserialize)]
struct MessageResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct StreamPayload {
    #[serde(rename = "type")]
    kind: Option<String>,
    delta: Option<TextDelta>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct TextDelta {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    message: String,
}

impl From<ApiError> for ProviderError {
    fn from(error: ApiError) -> Self {
        let kind = kind_for_code(&error.kind).unwrap_or(ErrorKind::UnknownProviderError);
        ProviderError::new(kind, error.message)
    }
}

/// Talks to `/messages` with `x-api-key` authentication.
pub struct AnthropicAdapter {
    transport: Arc<dyn Transport>,
}

impl AnthropicAdapter {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    fn build_request(
        &self,
        request: &PromptRequest,
        config: &EffectiveConfig,
        stream: bool,
    ) -> HttpRequest {
        let body = json!({
            "model": config.model,
            "max_tokens": config.max_tokens,
            "system": request.system_prompt(),
            "messages": [{"role": "user", "content": request.user_message()}],
            "stream": stream,
        });

        HttpRequest::new(format!("{}/messages", config.base_url), body)
            .header("x-api-key", &config.api_key)
            .header("anthropic-version", API_VERSION)
    }
}

fn classify(status: u16, body: &str) -> ProviderError {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        let api = envelope.error;
        let kind = kind_for_code(&api.kind).unwrap_or_else(|| status_kind(status));
        return ProviderError::new(kind, api.message);
    }
    ProviderError::new(status_kind(status), format!("HTTP {}: {}", status, body.trim()))
}

fn status_kind(status: u16) -> ErrorKind {
    match status {
        // overloaded
        529 => ErrorKind::RateLimited,
        _ => kind_for_status(status),
    }
}

fn parse_completion(body: &str) -> Result<String, ProviderError> {
    let response: MessageResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::unknown(format!("Malformed response: {}", e)))?;

    let text: String = response
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .map(|block| block.text)
        .collect();

    if text.is_empty() {
        return Err(ProviderError::unknown("Empty response"));
    }
    Ok(text)
}

fn decode_frame(event: &Event) -> Result<Frame, ProviderError> {
    let payload: StreamPayload = serde_json::from_str(&event.data)
        .map_err(|e| ProviderError::unknown(format!("Malformed stream event: {}", e)))?;

    // unnamed events arrive as "message"; fall back to the payload type
    let name = Some(event.event.as_str()).filter(|n| !n.is_empty() && *n != "message");
    let kind = name.or(payload.kind.as_deref());
    match kind {
        Some("content_block_delta") => Ok(payload
            .delta
            .and_then(|d| d.text)
            .map(Frame::Text)
            .unwrap_or(Frame::Ignore)),
        Some("message_stop") => Ok(Frame::Stop),
        Some("error") => Err(payload
            .error
            .map(ProviderError::from)
            .unwrap_or_else(|| ProviderError::unknown("Stream error"))),
        _ => Ok(Frame::Ignore),
    }
}

#[async_trait]
impl LlmAdapter for AnthropicAdapter {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    async fn complete(
        &self,
        request: &PromptRequest,
        config: &EffectiveConfig,
    ) -> Result<String, ProviderError> {
        let http = self.build_request(request, config, false);
        complete_request(self.transport.as_ref(), http, parse_completion, classify).await
    }

    fn stream(&self, request: &PromptRequest, config: &EffectiveConfig) -> EventStream {
        let http = self.build_request(request, config, true);
        sse_event_stream(self.transport.clone(), http, decode_frame, classify)
    }
}
