//! OpenRouter adapter.
//!
//! OpenRouter speaks the OpenAI chat completions format but routes to many
//! backends, so models are namespaced as `provider/model-name`.

use super::chat_completions;
use super::stream::{failed_stream, sse_event_stream, EventStream};
use super::transport::{HttpRequest, Transport};
use super::{complete_request, LlmAdapter};
use crate::config::{EffectiveConfig, ProviderKind};
use crate::error::{ErrorKind, ProviderError};
use crate::summary::PromptRequest;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

const APP_TITLE: &str = "youtube-summariser";

pub struct OpenRouterAdapter {
    transport: Arc<dyn Transport>,
}

impl OpenRouterAdapter {
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
            "messages": [
                {"role": "system", "content": request.system_prompt()},
                {"role": "user", "content": request.user_message()},
            ],
            "max_tokens": config.max_tokens,
            "stream": stream,
        });

        HttpRequest::new(format!("{}/chat/completions", config.base_url), body)
            .header("Authorization", format!("Bearer {}", config.api_key))
            .header("X-Title", APP_TITLE)
    }
}

/// Check that a model id looks like `provider/model-name`.
pub(crate) fn validate_model(model: &str) -> Result<(), ProviderError> {
    let well_formed = match model.split_once('/') {
        Some((vendor, name)) => {
            !vendor.is_empty()
                && !name.is_empty()
                && !model.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if well_formed {
        Ok(())
    } else {
        Err(ProviderError::new(
            ErrorKind::ModelNotFound,
            format!(
                "Invalid OpenRouter model '{}': expected 'provider/model-name'",
                model
            ),
        ))
    }
}

fn classify(status: u16, body: &str) -> ProviderError {
    let mut error = chat_completions::classify(status, body);
    if error.message.contains("not a valid model") {
        error.kind = ErrorKind::ModelNotFound;
    }
    error
}

#[async_trait]
impl LlmAdapter for OpenRouterAdapter {
    fn provider(&self) -> ProviderKind {
        ProviderKind::OpenRouter
    }

    async fn complete(
        &self,
        request: &PromptRequest,
        config: &EffectiveConfig,
    ) -> Result<String, ProviderError> {
        validate_model(&config.model)?;
        let http = self.build_request(request, config, false);
        complete_request(
            self.transport.as_ref(),
            http,
            chat_completions::parse_completion,
            classify,
        )
        .await
    }

    fn stream(&self, request: &PromptRequest, config: &EffectiveConfig) -> EventStream {
        if let Err(e) = validate_model(&config.model) {
            return failed_stream(e);
        }
        let http = self.build_request(request, config, true);
        sse_event_stream(
            self.transport.clone(),
            http,
            chat_completions::decode_frame,
            classify,
        )
    }
}
