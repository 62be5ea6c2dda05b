//! Uniform event stream shared by all adapters.
//!
//! Contract:
//! - zero or more `TextDelta` events, in the order the provider emitted them;
//! - exactly one terminal event, `Done` or `Failed`;
//! - nothing after the terminal event.

use super::transport::{HttpRequest, Transport};
use crate::error::{ErrorKind, ProviderError};
use async_stream::stream;
use eventsource_stream::{Event, EventStreamError, Eventsource};
use futures::stream::BoxStream;
use futures::StreamExt;
use std::sync::Arc;
use tracing::debug;

/// A unit of provider output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Incremental content.
    TextDelta(String),
    /// Terminal success with every delta concatenated.
    Done(String),
    /// Terminal failure.
    Failed(ErrorKind, String),
}

impl StreamEvent {
    pub fn failed(error: ProviderError) -> Self {
        StreamEvent::Failed(error.kind, error.message)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done(_) | StreamEvent::Failed(..))
    }

    pub fn as_text_delta(&self) -> Option<&str> {
        match self {
            StreamEvent::TextDelta(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// Lazy, finite, non-restartable sequence of events.
pub type EventStream = BoxStream<'static, StreamEvent>;

/// What one SSE event means to a particular provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Frame {
    Text(String),
    Stop,
    Ignore,
}

pub(crate) type FrameDecoder = fn(&Event) -> Result<Frame, ProviderError>;
pub(crate) type StatusClassifier = fn(u16, &str) -> ProviderError;

/// A stream that fails immediately without touching the network.
pub(crate) fn failed_stream(error: ProviderError) -> EventStream {
    futures::stream::once(async move { StreamEvent::failed(error) }).boxed()
}

/// Open a streaming request and translate its SSE body into [`StreamEvent`]s.
///
/// Nothing is sent until the returned stream is first polled. Dropping the stream
/// drops the response body, which closes the connection.
pub(crate) fn sse_event_stream(
    transport: Arc<dyn Transport>,
    request: HttpRequest,
    decode: FrameDecoder,
    classify: StatusClassifier,
) -> EventStream {
    Box::pin(stream! {
        let response = match transport.post_streaming(request).await {
            Ok(response) => response,
            Err(e) => {
                yield StreamEvent::failed(e);
                return;
            }
        };

        if !response.is_success() {
            let status = response.status;
            let body = response.text().await;
            yield StreamEvent::failed(classify(status, &body));
            return;
        }

        let mut events = response.body.eventsource();
        let mut full_text = String::new();
        let mut deltas = 0usize;

        while let Some(event) = events.next().await {
            let event = match event {
                Ok(event) => event,
                Err(e) => {
                    yield StreamEvent::failed(stream_error(e));
                    return;
                }
            };

            match decode(&event) {
                Ok(Frame::Text(text)) => {
                    if text.is_empty() {
                        continue;
                    }
                    full_text.push_str(&text);
                    deltas += 1;
                    yield StreamEvent::TextDelta(text);
                }
                Ok(Frame::Stop) => {
                    debug!(deltas, "Stream finished");
                    yield StreamEvent::Done(full_text);
                    return;
                }
                Ok(Frame::Ignore) => {}
                Err(e) => {
                    yield StreamEvent::failed(e);
                    return;
                }
            }
        }

        // Connection closed without an explicit stop marker.
        debug!(deltas, "Stream closed by provider");
        yield StreamEvent::Done(full_text);
    })
}

fn stream_error(error: EventStreamError<ProviderError>) -> ProviderError {
    match error {
        EventStreamError::Transport(e) => e,
        other => ProviderError::unknown(format!("Malformed event stream: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::chat_completions;
    use crate::llm::testing::FakeTransport;
    use serde_json::json;

    fn content(text: &str) -> String {
        format!("data: {}", json!({"choices": [{"index": 0, "delta": {"content": text}}]}))
    }

    async fn run(chunks: Vec<Vec<u8>>) -> Vec<StreamEvent> {
        let transport = Arc::new(FakeTransport::new().with_stream(200, chunks));
        let request = HttpRequest::new("http://localhost/chat/completions", json!({}));
        sse_event_stream(
            transport,
            request,
            chat_completions::decode_frame,
            chat_completions::classify,
        )
        .collect()
        .await
    }

    #[test]
    fn test_event_helpers() {
        let delta = StreamEvent::TextDelta("hi".into());
        assert!(!delta.is_terminal());
        assert_eq!(delta.as_text_delta(), Some("hi"));

        let failed = StreamEvent::failed(ProviderError::network("reset"));
        assert!(failed.is_terminal());
        assert_eq!(failed, StreamEvent::Failed(ErrorKind::NetworkError, "reset".into()));
    }

    #[test]
    fn test_failed_stream_yields_one_event() {
        let events: Vec<StreamEvent> = tokio_test::block_on(
            failed_stream(ProviderError::unknown("nope")).collect(),
        );
        assert_eq!(events.len(), 1);
        assert!(events[0].is_terminal());
    }

    #[tokio::test]
    async fn test_carriage_return_line_endings() {
        let body = format!("{}\r\rdata: [DONE]\r\r", content("hello"));
        let events = run(vec![body.into_bytes()]).await;
        assert_eq!(
            events,
            vec![
                StreamEvent::TextDelta("hello".into()),
                StreamEvent::Done("hello".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_leading_byte_order_mark() {
        let body = format!("\u{feff}{}\n\ndata: [DONE]\n\n", content("first"));
        let events = run(vec![body.into_bytes()]).await;
        assert_eq!(
            events,
            vec![
                StreamEvent::TextDelta("first".into()),
                StreamEvent::Done("first".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_event_split_across_chunks() {
        let body = format!("{}\n\n", content("café")).into_bytes();
        // split inside the two-byte 'é'
        let split = body.iter().position(|b| *b == 0xC3).unwrap() + 1;
        let chunks = vec![
            b": keep-alive\n\n".to_vec(),
            body[..split].to_vec(),
            body[split..].to_vec(),
        ];

        let events = run(chunks).await;
        assert_eq!(
            events,
            vec![
                StreamEvent::TextDelta("café".into()),
                StreamEvent::Done("café".into()),
            ]
        );
    }
}
