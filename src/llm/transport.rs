//! HTTP transport used by the provider adapters.
//!
//! Adapters describe a request and interpret the response; the transport only moves
//! bytes. Tests swap in a scripted transport.

use crate::error::ProviderError;
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use std::time::Duration;
use tracing::debug;

/// Default timeout for non-streaming requests (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;
/// Connect timeout, also applied to streaming requests.
const CONNECT_TIMEOUT_SECS: u64 = 30;
/// Longest silence tolerated between reads of a response body.
const IDLE_TIMEOUT_SECS: u64 = 120;

/// A JSON POST request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: serde_json::Value,
}

impl HttpRequest {
    pub fn new(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            body,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// A fully read response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Response body delivered incrementally. Dropping it closes the connection.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, ProviderError>>;

/// A response whose body is still arriving.
pub struct StreamingResponse {
    pub status: u16,
    pub body: ByteStream,
}

impl StreamingResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Read the rest of the body as text (used for error payloads).
    pub async fn text(mut self) -> String {
        let mut bytes = Vec::new();
        while let Some(Ok(chunk)) = self.body.next().await {
            bytes.extend_from_slice(&chunk);
        }
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

/// Moves requests to a provider and responses back.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and read the whole response.
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse, ProviderError>;

    /// Send a request and return as soon as the response headers arrive.
    async fn post_streaming(&self, request: HttpRequest)
        -> Result<StreamingResponse, ProviderError>;
}

/// Transport backed by `reqwest`.
pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Create a transport with the default timeout.
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a transport with a custom timeout for non-streaming requests.
    ///
    /// Streaming requests are not bounded by it, since long videos can stream
    /// for minutes. They fail once the provider stays silent for too long.
    pub fn with_timeout(timeout: Duration) -> Result<Self, ProviderError> {
        Self::with_timeouts(timeout, Duration::from_secs(IDLE_TIMEOUT_SECS))
    }

    /// Create a transport with a total timeout for non-streaming requests and an
    /// idle timeout between body reads.
    pub fn with_timeouts(timeout: Duration, idle: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .read_timeout(idle)
            .build()
            .map_err(|e| ProviderError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, timeout })
    }

    fn build(&self, request: &HttpRequest) -> reqwest::RequestBuilder {
        let mut builder = self.client.post(&request.url).json(&request.body);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
    }
}

fn network_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::network(format!("Request timed out: {}", e))
    } else if e.is_connect() {
        ProviderError::network(format!("Connection failed: {}", e))
    } else {
        ProviderError::network(e.to_string())
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse, ProviderError> {
        debug!(url = %request.url, "POST");
        let response = self
            .build(&request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(network_error)?;
        Ok(HttpResponse { status, body })
    }

    async fn post_streaming(
        &self,
        request: HttpRequest,
    ) -> Result<StreamingResponse, ProviderError> {
        debug!(url = %request.url, "POST (streaming)");
        let response = self
            .build(&request)
            .header("Accept", "text/event-stream")
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status().as_u16();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map(|b| b.to_vec()).map_err(network_error))
            .boxed();

        Ok(StreamingResponse { status, body })
    }
}
