//! Provider adapters for summarization.
//!
//! Every backend is reached through the same [`LlmAdapter`] surface: a blocking
//! `complete` and a lazy `stream` of [`StreamEvent`]s. The set of backends is
//! closed; [`Adapter`] picks one by matching on [`ProviderKind`].

mod anthropic;
mod chat_completions;
mod openai;
mod openrouter;
mod stream;
#[cfg(test)]
pub(crate) mod testing;
pub mod transport;

pub use anthropic::AnthropicAdapter;
pub use openai::OpenAiAdapter;
pub use openrouter::OpenRouterAdapter;
pub use stream::{EventStream, StreamEvent};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, StreamingResponse, Transport};

use crate::config::{EffectiveConfig, ProviderKind};
use crate::error::{ErrorKind, ProviderError};
use crate::summary::PromptRequest;
use async_trait::async_trait;
use std::sync::Arc;
use stream::StatusClassifier;

/// Uniform capability offered by every provider.
#[async_trait]
pub trait LlmAdapter: Send + Sync {
    fn provider(&self) -> ProviderKind;

    /// Send the request and wait for the complete text.
    async fn complete(
        &self,
        request: &PromptRequest,
        config: &EffectiveConfig,
    ) -> Result<String, ProviderError>;

    /// Start a streaming request. Nothing is sent until the stream is polled.
    fn stream(&self, request: &PromptRequest, config: &EffectiveConfig) -> EventStream;
}

/// The closed set of supported adapters.
pub enum Adapter {
    OpenAi(OpenAiAdapter),
    Anthropic(AnthropicAdapter),
    OpenRouter(OpenRouterAdapter),
}

impl Adapter {
    pub fn new(provider: ProviderKind, transport: Arc<dyn Transport>) -> Self {
        match provider {
            ProviderKind::OpenAi => Adapter::OpenAi(OpenAiAdapter::new(transport)),
            ProviderKind::Anthropic => Adapter::Anthropic(AnthropicAdapter::new(transport)),
            ProviderKind::OpenRouter => Adapter::OpenRouter(OpenRouterAdapter::new(transport)),
        }
    }
}

#[async_trait]
impl LlmAdapter for Adapter {
    fn provider(&self) -> ProviderKind {
        match self {
            Adapter::OpenAi(a) => a.provider(),
            Adapter::Anthropic(a) => a.provider(),
            Adapter::OpenRouter(a) => a.provider(),
        }
    }

    async fn complete(
        &self,
        request: &PromptRequest,
        config: &EffectiveConfig,
    ) -> Result<String, ProviderError> {
        match self {
            Adapter::OpenAi(a) => a.complete(request, config).await,
            Adapter::Anthropic(a) => a.complete(request, config).await,
            Adapter::OpenRouter(a) => a.complete(request, config).await,
        }
    }

    fn stream(&self, request: &PromptRequest, config: &EffectiveConfig) -> EventStream {
        match self {
            Adapter::OpenAi(a) => a.stream(request, config),
            Adapter::Anthropic(a) => a.stream(request, config),
            Adapter::OpenRouter(a) => a.stream(request, config),
        }
    }
}

/// Send a non-streaming request and parse the provider's response body.
pub(crate) async fn complete_request(
    transport: &dyn Transport,
    request: HttpRequest,
    parse: fn(&str) -> Result<String, ProviderError>,
    classify: StatusClassifier,
) -> Result<String, ProviderError> {
    let response = transport.post(request).await?;
    if !response.is_success() {
        return Err(classify(response.status, &response.body));
    }
    parse(&response.body)
}

/// Baseline mapping from HTTP status to error kind.
pub(crate) fn kind_for_status(status: u16) -> ErrorKind {
    match status {
        401 | 403 => ErrorKind::AuthError,
        429 => ErrorKind::RateLimited,
        404 => ErrorKind::ModelNotFound,
        408 | 502 | 503 | 504 => ErrorKind::NetworkError,
        _ => ErrorKind::UnknownProviderError,
    }
}

/// Mapping from provider error codes/types that several backends share.
pub(crate) fn kind_for_code(code: &str) -> Option<ErrorKind> {
    match code {
        "invalid_api_key"
        | "authentication_error"
        | "permission_error"
        | "invalid_authentication" => Some(ErrorKind::AuthError),
        "rate_limit_exceeded" | "rate_limit_error" | "insufficient_quota" | "overloaded_error" => {
            Some(ErrorKind::RateLimited)
        }
        "model_not_found" | "not_found_error" => Some(ErrorKind::ModelNotFound),
        _ => None,
    }
}
