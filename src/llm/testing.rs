//! Scripted transport and provider payloads for tests.

use super::transport::{ByteStream, HttpRequest, HttpResponse, StreamingResponse, Transport};
use crate::config::{EffectiveConfig, ProviderKind};
use crate::error::ProviderError;
use crate::summary::{PromptRequest, VideoRef};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde_json::json;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

pub(crate) fn config(provider: ProviderKind) -> EffectiveConfig {
    let model = match provider {
        ProviderKind::OpenAi => "gpt-4o",
        ProviderKind::Anthropic => "claude-sonnet-4-5-20250929",
        ProviderKind::OpenRouter => "anthropic/claude-sonnet-4.5",
    };
    EffectiveConfig {
        provider,
        model: model.to_string(),
        api_key: "sk-test".to_string(),
        stream_enabled: true,
        max_tokens: 3000,
        base_url: provider.default_base_url().to_string(),
    }
}

pub(crate) fn request() -> PromptRequest {
    PromptRequest::new(
        VideoRef::new("abc123def45", "https://www.youtube.com/watch?v=abc123def45"),
        "[00:00] Alice explains recursion for ten minutes.",
    )
    .expect("non-empty transcript")
}

/// Non-streaming success body in the provider's wire format.
pub(crate) fn completion_body(provider: ProviderKind, text: &str) -> String {
    match provider {
        ProviderKind::OpenAi | ProviderKind::OpenRouter => json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": text},
                "finish_reason": "stop"
            }]
        })
        .to_string(),
        ProviderKind::Anthropic => json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "content": [{"type": "text", "text": text}],
            "stop_reason": "end_turn"
        })
        .to_string(),
    }
}

/// Streaming body, one network chunk per SSE event.
pub(crate) fn sse_body(provider: ProviderKind, pieces: &[&str]) -> Vec<Vec<u8>> {
    let mut events: Vec<String> = Vec::new();
    match provider {
        ProviderKind::OpenAi | ProviderKind::OpenRouter => {
            if provider == ProviderKind::OpenRouter {
                events.push(": OPENROUTER PROCESSING\n\n".to_string());
            }
            events.push(format!(
                "data: {}\n\n",
                json!({"choices": [{"index": 0, "delta": {"role": "assistant", "content": ""}}]})
            ));
            for piece in pieces {
                events.push(format!(
                    "data: {}\n\n",
                    json!({"choices": [{
                        "index": 0,
                        "delta": {"content": piece},
                        "finish_reason": null
                    }]})
                ));
            }
            events.push(format!(
                "data: {}\n\n",
                json!({"choices": [{"index": 0, "delta": {}, "finish_reason": "stop"}]})
            ));
            events.push("data: [DONE]\n\n".to_string());
        }
        ProviderKind::Anthropic => {
            events.push(format!(
                "event: message_start\ndata: {}\n\n",
                json!({"type": "message_start", "message": {"id": "msg_1", "content": []}})
            ));
            events.push(format!(
                "event: content_block_start\ndata: {}\n\n",
                json!({
                    "type": "content_block_start",
                    "index": 0,
                    "content_block": {"type": "text", "text": ""}
                })
            ));
            for piece in pieces {
                events.push(format!(
                    "event: content_block_delta\ndata: {}\n\n",
                    json!({
                        "type": "content_block_delta",
                        "index": 0,
                        "delta": {"type": "text_delta", "text": piece}
                    })
                ));
            }
            events.push(format!(
                "event: content_block_stop\ndata: {}\n\n",
                json!({"type": "content_block_stop", "index": 0})
            ));
            events.push(format!(
                "event: message_stop\ndata: {}\n\n",
                json!({"type": "message_stop"})
            ));
        }
    }
    events.into_iter().map(String::into_bytes).collect()
}

enum ScriptedStream {
    /// Chunks, then end of body.
    Finite(u16, Vec<Vec<u8>>),
    /// Chunks, then the connection stays open.
    Open(u16, Vec<Vec<u8>>),
    /// Chunks, then a transport error.
    Broken(Vec<Vec<u8>>, ProviderError),
    /// The request itself fails.
    Refused(ProviderError),
}

/// Transport returning scripted responses and recording usage.
pub(crate) struct FakeTransport {
    completion: Mutex<Option<HttpResponse>>,
    stream: Mutex<Option<ScriptedStream>>,
    post_calls: AtomicUsize,
    stream_calls: AtomicUsize,
    closes: Arc<AtomicUsize>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl FakeTransport {
    pub(crate) fn new() -> Self {
        Self {
            completion: Mutex::new(None),
            stream: Mutex::new(None),
            post_calls: AtomicUsize::new(0),
            stream_calls: AtomicUsize::new(0),
            closes: Arc::new(AtomicUsize::new(0)),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_completion(self, status: u16, body: impl Into<String>) -> Self {
        *self.completion.lock().unwrap() = Some(HttpResponse {
            status,
            body: body.into(),
        });
        self
    }

    pub(crate) fn with_stream(self, status: u16, chunks: Vec<Vec<u8>>) -> Self {
        *self.stream.lock().unwrap() = Some(ScriptedStream::Finite(status, chunks));
        self
    }

    pub(crate) fn with_open_stream(self, status: u16, chunks: Vec<Vec<u8>>) -> Self {
        *self.stream.lock().unwrap() = Some(ScriptedStream::Open(status, chunks));
        self
    }

    pub(crate) fn with_broken_stream(self, chunks: Vec<Vec<u8>>, error: ProviderError) -> Self {
        *self.stream.lock().unwrap() = Some(ScriptedStream::Broken(chunks, error));
        self
    }

    pub(crate) fn with_stream_error(self, error: ProviderError) -> Self {
        *self.stream.lock().unwrap() = Some(ScriptedStream::Refused(error));
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.post_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn stream_calls(&self) -> usize {
        self.stream_calls.load(Ordering::SeqCst)
    }

    /// Number of streaming bodies that have been dropped.
    pub(crate) fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub(crate) fn last_request(&self) -> Option<HttpRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    fn tracked(&self, status: u16, body: ByteStream) -> StreamingResponse {
        StreamingResponse {
            status,
            body: TrackedBody {
                inner: body,
                closes: self.closes.clone(),
            }
            .boxed(),
        }
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse, ProviderError> {
        self.post_calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);
        self.completion
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ProviderError::network("no scripted completion"))
    }

    async fn post_streaming(
        &self,
        request: HttpRequest,
    ) -> Result<StreamingResponse, ProviderError> {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);
        let script = self
            .stream
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| ProviderError::network("no scripted stream"))?;

        let ok = |chunks: Vec<Vec<u8>>| futures::stream::iter(chunks.into_iter().map(Ok));
        Ok(match script {
            ScriptedStream::Finite(status, chunks) => self.tracked(status, ok(chunks).boxed()),
            ScriptedStream::Open(status, chunks) => {
                self.tracked(status, ok(chunks).chain(futures::stream::pending()).boxed())
            }
            ScriptedStream::Broken(chunks, error) => self.tracked(
                200,
                ok(chunks)
                    .chain(futures::stream::once(async move { Err(error) }))
                    .boxed(),
            ),
            ScriptedStream::Refused(error) => return Err(error),
        })
    }
}

/// Body wrapper that records when the connection is released.
struct TrackedBody {
    inner: ByteStream,
    closes: Arc<AtomicUsize>,
}

impl Stream for TrackedBody {
    type Item = Result<Vec<u8>, ProviderError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl Drop for TrackedBody {
    fn drop(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}
