//! Summarization orchestrator.
//!
//! Drives one request from prompt to [`SummaryResult`]: picks the adapter,
//! consumes the event stream, forwards deltas to the caller and honours
//! cancellation.

use crate::config::EffectiveConfig;
use crate::error::{ProviderError, Result, SummariserError};
use crate::llm::{Adapter, LlmAdapter, ReqwestTransport, StreamEvent, Transport};
use crate::summary::{PromptRequest, SummaryResult};
use crate::youtube;
use chrono::Local;
use futures::StreamExt;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Callback receiving each piece of text as it arrives.
pub type DeltaSink<'a> = &'a mut (dyn FnMut(&str) + Send);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Requesting,
    Streaming,
    Completed,
    Failed,
}

struct PhaseTracker {
    phase: Phase,
}

impl PhaseTracker {
    fn new() -> Self {
        Self { phase: Phase::Idle }
    }

    fn advance(&mut self, next: Phase) {
        if self.phase != next {
            debug!(from = ?self.phase, to = ?next, "Summarization phase");
            self.phase = next;
        }
    }
}

/// Runs summarization requests against the configured provider.
pub struct Orchestrator {
    transport: Arc<dyn Transport>,
}

impl Orchestrator {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Orchestrator backed by a real HTTP client.
    pub fn with_default_transport() -> Result<Self> {
        let transport = ReqwestTransport::new()?;
        Ok(Self::new(Arc::new(transport)))
    }

    /// Summarize, running to completion or failure.
    pub async fn summarize(
        &self,
        request: &PromptRequest,
        config: &EffectiveConfig,
        on_delta: Option<DeltaSink<'_>>,
    ) -> Result<SummaryResult> {
        self.summarize_with_cancel(request, config, on_delta, std::future::pending())
            .await?
            .ok_or_else(|| ProviderError::unknown("Summarization stopped unexpectedly").into())
    }

    /// Summarize until done, failed, or `cancel` resolves.
    ///
    /// Cancellation drops the provider stream (closing the connection) and
    /// returns `Ok(None)`.
    #[instrument(
        skip_all,
        fields(
            video_id = %request.video.id,
            provider = %config.provider,
            model = %config.model,
        )
    )]
    pub async fn summarize_with_cancel<C>(
        &self,
        request: &PromptRequest,
        config: &EffectiveConfig,
        mut on_delta: Option<DeltaSink<'_>>,
        cancel: C,
    ) -> Result<Option<SummaryResult>>
    where
        C: Future<Output = ()>,
    {
        let started = Instant::now();
        let adapter = Adapter::new(config.provider, self.transport.clone());
        let mut tracker = PhaseTracker::new();
        tokio::pin!(cancel);

        info!(stream = config.stream_enabled, "Requesting summary");
        tracker.advance(Phase::Requesting);

        let text = if config.stream_enabled {
            let mut stream = adapter.stream(request, config);
            let mut partial = String::new();

            loop {
                let event = tokio::select! {
                    biased;
                    _ = &mut cancel => {
                        drop(stream);
                        info!(received = partial.len(), "Summarization cancelled");
                        return Ok(None);
                    }
                    event = stream.next() => event,
                };

                match event {
                    Some(StreamEvent::TextDelta(delta)) => {
                        tracker.advance(Phase::Streaming);
                        partial.push_str(&delta);
                        if let Some(sink) = on_delta.as_deref_mut() {
                            sink(&delta);
                        }
                    }
                    Some(StreamEvent::Done(full_text)) => break full_text,
                    Some(StreamEvent::Failed(kind, message)) => {
                        tracker.advance(Phase::Failed);
                        warn!(%kind, "Provider request failed: {}", message);
                        return Err(SummariserError::Provider {
                            source: ProviderError::new(kind, message),
                            partial_text: partial,
                        });
                    }
                    None => {
                        tracker.advance(Phase::Failed);
                        return Err(SummariserError::Provider {
                            source: ProviderError::unknown("Stream ended without a result"),
                            partial_text: partial,
                        });
                    }
                }
            }
        } else {
            let outcome = tokio::select! {
                biased;
                _ = &mut cancel => {
                    info!("Summarization cancelled");
                    return Ok(None);
                }
                outcome = adapter.complete(request, config) => outcome,
            };

            match outcome {
                Ok(text) => {
                    if let Some(sink) = on_delta.as_deref_mut() {
                        sink(&text);
                    }
                    text
                }
                Err(e) => {
                    tracker.advance(Phase::Failed);
                    warn!(kind = %e.kind, "Provider request failed: {}", e.message);
                    return Err(e.into());
                }
            }
        };

        if text.trim().is_empty() {
            tracker.advance(Phase::Failed);
            return Err(ProviderError::unknown("Empty response").into());
        }

        tracker.advance(Phase::Completed);
        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!(elapsed_ms, chars = text.len(), "Summary complete");

        Ok(Some(SummaryResult {
            text,
            model_used: config.model_used(),
            generated_at: Local::now(),
            video_id: request.video.id.clone(),
            video_url: request.video.url.clone(),
            elapsed_ms,
        }))
    }
}

/// Resolve a URL to a prompt request: video id, transcript, and title/duration
/// when available.
#[instrument]
pub async fn prepare_request(input: &str) -> Result<PromptRequest> {
    let video = youtube::video_ref(input)?;

    let metadata = match youtube::fetch_metadata(&video.id).await {
        Ok(metadata) => Some(metadata),
        Err(e @ SummariserError::ToolNotFound(_)) => return Err(e),
        Err(e) => {
            warn!("Could not fetch video metadata: {}", e);
            None
        }
    };

    let transcript = youtube::fetch_transcript(&video.id).await?;
    let mut request = PromptRequest::new(video, transcript)?;

    if let Some(metadata) = metadata {
        info!(title = %metadata.title, "Fetched video metadata");
        request = request.with_title(metadata.title);
        if let Some(duration) = metadata.duration {
            request = request.with_duration(duration);
        }
    }
    Ok(request)
}
