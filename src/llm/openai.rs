//! OpenAI chat completions adapter.

use super::chat_completions;
use super::stream::{failed_stream, sse_event_stream, EventStream};
use super::transport::{HttpRequest, Transport};
use super::{complete_request, LlmAdapter};
use crate::config::{EffectiveConfig, ProviderKind};
use crate::error::{ErrorKind, ProviderError};
use crate::summary::PromptRequest;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Talks to `/chat/completions` on api.openai.com or a compatible base URL.
pub struct OpenAiAdapter {
    transport: Arc<dyn Transport>,
}

impl OpenAiAdapter {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    fn build_request(
        &self,
        request: &PromptRequest,
        config: &EffectiveConfig,
        stream: bool,
    ) -> Result<HttpRequest, ProviderError> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(request.system_prompt())
                .build()
                .map_err(|e| ProviderError::unknown(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.user_message())
                .build()
                .map_err(|e| ProviderError::unknown(e.to_string()))?
                .into(),
        ];

        let body = CreateChatCompletionRequestArgs::default()
            .model(&config.model)
            .messages(messages)
            .max_completion_tokens(config.max_tokens)
            .stream(stream)
            .build()
            .map_err(|e| ProviderError::unknown(e.to_string()))?;

        let body = serde_json::to_value(body)
            .map_err(|e| ProviderError::unknown(format!("Failed to encode request: {}", e)))?;

        Ok(HttpRequest::new(format!("{}/chat/completions", config.base_url), body)
            .header("Authorization", format!("Bearer {}", config.api_key)))
    }
}

fn classify(status: u16, body: &str) -> ProviderError {
    let mut error = chat_completions::classify(status, body);
    // OpenAI answers unknown models with 404 and code model_not_found, but also
    // with 400 on some older endpoints.
    if error.message.contains("does not exist") && error.kind == ErrorKind::UnknownProviderError {
        error.kind = ErrorKind::ModelNotFound;
    }
    error
}

#[async_trait]
impl LlmAdapter for OpenAiAdapter {
    fn provider(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    async fn complete(
        &self,
        request: &PromptRequest,
        config: &EffectiveConfig,
    ) -> Result<String, ProviderError> {
        let http = self.build_request(request, config, false)?;
        complete_request(
            self.transport.as_ref(),
            http,
            chat_completions::parse_completion,
            classify,
        )
        .await
    }

    fn stream(&self, request: &PromptRequest, config: &EffectiveConfig) -> EventStream {
        match self.build_request(request, config, true) {
            Ok(http) => sse_event_stream(
                self.transport.clone(),
                http,
                chat_completions::decode_frame,
                classify,
            ),
            Err(e) => failed_stream(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::{self, completion_body, FakeTransport};
    use crate::llm::StreamEvent;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_request_shape() {
        let transport = Arc::new(
            FakeTransport::new().with_completion(200, completion_body(ProviderKind::OpenAi, "ok")),
        );
        let adapter = OpenAiAdapter::new(transport.clone());
        let config = testing::config(ProviderKind::OpenAi);
        adapter.complete(&testing::request(), &config).await.unwrap();

        let sent = transport.last_request().unwrap();
        assert_eq!(sent.url, "https://api.openai.com/v1/chat/completions");
        assert!(sent
            .headers
            .contains(&("Authorization".to_string(), "Bearer sk-test".to_string())));
        assert_eq!(sent.body["model"], "gpt-4o");
        assert_eq!(sent.body["max_completion_tokens"], 3000);
        assert_eq!(sent.body["stream"], false);
        assert_eq!(sent.body["messages"][0]["role"], "system");
        assert_eq!(sent.body["messages"][1]["role"], "user");
        assert!(sent.body["messages"][1]["content"]
            .as_str()
            .unwrap()
            .contains("Alice explains recursion"));
    }

    #[tokio::test]
    async fn test_auth_error() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error","code":"invalid_api_key"}}"#;
        let transport = Arc::new(FakeTransport::new().with_completion(401, body));
        let adapter = OpenAiAdapter::new(transport);
        let err = adapter
            .complete(&testing::request(), &testing::config(ProviderKind::OpenAi))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::AuthError);
        assert_eq!(err.message, "Incorrect API key provided");
    }

    #[tokio::test]
    async fn test_unknown_model_in_stream() {
        let body = r#"{"error":{"message":"The model `gpt-9` does not exist","type":"invalid_request_error","code":"model_not_found"}}"#;
        let transport = Arc::new(
            FakeTransport::new().with_stream(404, vec![body.as_bytes().to_vec()]),
        );
        let adapter = OpenAiAdapter::new(transport.clone());
        let events: Vec<StreamEvent> = adapter
            .stream(&testing::request(), &testing::config(ProviderKind::OpenAi))
            .collect()
            .await;
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            StreamEvent::Failed(ErrorKind::ModelNotFound, m) if m.contains("gpt-9")
        ));
        assert_eq!(transport.closes(), 1);
    }

    #[test]
    fn test_classify_does_not_exist() {
        let body = r#"{"error":{"message":"The model `x` does not exist or you do not have access to it."}}"#;
        assert_eq!(classify(400, body).kind, ErrorKind::ModelNotFound);
    }
}
