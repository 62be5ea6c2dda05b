//! Wire format shared by OpenAI-compatible chat completion endpoints.

use super::stream::Frame;
use super::{kind_for_code, kind_for_status};
use crate::error::{ErrorKind, ProviderError};
use eventsource_stream::Event;
use serde::Deserialize;

const DONE_MARKER: &str = "[DONE]";

#[derive(Debug, Deserialize)]
struct Completion {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    delta: Option<Delta>,
}

#[derive(Debug, Deserialize)]
struct Delta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiError {
    #[serde(default)]
    pub message: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Some backends send a string code, others the HTTP status as a number.
    pub code: Option<serde_json::Value>,
}

impl ApiError {
    /// Classification carried in the payload itself, if any.
    pub(crate) fn classify(&self) -> Option<ErrorKind> {
        let from_code = match &self.code {
            Some(serde_json::Value::String(code)) => kind_for_code(code),
            Some(serde_json::Value::Number(n)) => n
                .as_u64()
                .and_then(|n| u16::try_from(n).ok())
                .map(kind_for_status)
                .filter(|k| *k != ErrorKind::UnknownProviderError),
            _ => None,
        };
        from_code.or_else(|| self.kind.as_deref().and_then(kind_for_code))
    }

    fn into_provider_error(self) -> ProviderError {
        let kind = self.classify().unwrap_or(ErrorKind::UnknownProviderError);
        ProviderError::new(kind, self.message)
    }
}

/// Parse the error object out of a failed response body.
pub(crate) fn parse_error_body(body: &str) -> Option<ApiError> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error)
}

/// Status and body to a classified error. Codes in the body win over the status.
pub(crate) fn classify(status: u16, body: &str) -> ProviderError {
    match parse_error_body(body) {
        Some(error) => {
            let kind = error.classify().unwrap_or_else(|| kind_for_status(status));
            let message = if error.message.is_empty() {
                format!("HTTP {}", status)
            } else {
                error.message
            };
            ProviderError::new(kind, message)
        }
        None => ProviderError::new(kind_for_status(status), fallback_message(status, body)),
    }
}

fn fallback_message(status: u16, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        format!("HTTP {}", status)
    } else {
        format!("HTTP {}: {}", status, body)
    }
}

/// Pull the assistant text out of a non-streaming response.
pub(crate) fn parse_completion(body: &str) -> Result<String, ProviderError> {
    let completion: Completion = serde_json::from_str(body)
        .map_err(|e| ProviderError::unknown(format!("Malformed response: {}", e)))?;

    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .filter(|content| !content.is_empty())
        .ok_or_else(|| ProviderError::unknown("Empty response"))
}

/// Decode one `data:` line of a chat completion stream.
pub(crate) fn decode_frame(event: &Event) -> Result<Frame, ProviderError> {
    let data = event.data.trim();
    if data == DONE_MARKER {
        return Ok(Frame::Stop);
    }
    if data.is_empty() {
        return Ok(Frame::Ignore);
    }

    let chunk: Chunk = serde_json::from_str(data)
        .map_err(|e| ProviderError::unknown(format!("Malformed stream chunk: {}", e)))?;

    if let Some(error) = chunk.error {
        return Err(error.into_provider_error());
    }

    let text = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta)
        .and_then(|delta| delta.content);

    Ok(match text {
        Some(text) => Frame::Text(text),
        None => Frame::Ignore,
    })
}
