//! Web interface: a small form page plus JSON and SSE summary endpoints.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{ConfigResolver, EffectiveConfig, Overrides};
use crate::error::SummariserError;
use crate::orchestrator::{prepare_request, Orchestrator};
use crate::summary::{PromptRequest, SummaryResult};
use async_stream::stream;
use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Html, IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

const INDEX_HTML: &str = include_str!("../../../assets/index.html");

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
    config_path: PathBuf,
}

/// Run the web server.
pub async fn run_serve(host: &str, port: u16, config_path: PathBuf) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Serve) {
        Output::warning(&format!("{} Summaries will fail until it is installed.", e));
    }

    // Report configuration problems at start-up; requests resolve again so edits
    // to the config file apply without a restart.
    if let Err(e) = ConfigResolver::standard(Some(&config_path))?.resolve(&Overrides::default()) {
        Output::warning(&e.to_string());
    }

    let state = Arc::new(AppState {
        orchestrator: Orchestrator::with_default_transport()?,
        config_path,
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/summarize", post(summarize))
        .route("/summarize/stream", post(summarize_stream))
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("youtube-summariser web");
    Output::success(&format!("Listening on http://{}", addr));
    eprintln!();
    eprintln!("Endpoints:");
    Output::kv("Form", "GET  /");
    Output::kv("Health", "GET  /health");
    Output::kv("Summarize", "POST /summarize");
    Output::kv("Stream", "POST /summarize/stream");
    eprintln!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Debug, Deserialize)]
struct SummarizeRequest {
    /// YouTube URL or video ID
    url: String,
    #[serde(default)]
    provider: Option<String>,
    #[serde(default)]
    model: Option<String>,
}

impl SummarizeRequest {
    /// Blank form fields mean "use the configured value".
    fn overrides(&self) -> Overrides {
        let non_blank = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        Overrides {
            provider: non_blank(&self.provider),
            model: non_blank(&self.model),
            stream: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct SummarizeResponse {
    summary: String,
    video_id: String,
    video_url: String,
    model: String,
    generated_at: String,
    elapsed_ms: u64,
}

impl From<SummaryResult> for SummarizeResponse {
    fn from(result: SummaryResult) -> Self {
        Self {
            summary: result.text,
            video_id: result.video_id,
            video_url: result.video_url,
            model: result.model_used,
            generated_at: result.generated_at.to_rfc3339(),
            elapsed_ms: result.elapsed_ms,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
}

impl From<&SummariserError> for ErrorResponse {
    fn from(e: &SummariserError) -> Self {
        Self {
            error: e.to_string(),
            kind: e.kind().map(|k| k.to_string()),
        }
    }
}

/// HTTP status for a failed summary.
fn error_status(e: &SummariserError) -> StatusCode {
    let code = match e {
        SummariserError::InvalidInput(_)
        | SummariserError::Transcript(_)
        | SummariserError::VideoNotFound(_) => 400,
        SummariserError::Provider { source, .. } => source.kind.http_status(),
        _ => 500,
    };
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

fn error_response(e: &SummariserError) -> Response {
    (error_status(e), Json(ErrorResponse::from(e))).into_response()
}

// === Handlers ===

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Resolve settings, then fetch the transcript.
async fn prepare(
    state: &AppState,
    req: &SummarizeRequest,
) -> crate::Result<(EffectiveConfig, PromptRequest)> {
    let config = ConfigResolver::standard(Some(&state.config_path))?.resolve(&req.overrides())?;
    let request = prepare_request(&req.url).await?;
    Ok((config, request))
}

async fn summarize(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SummarizeRequest>,
) -> Response {
    info!(url = %req.url, "Summary requested");

    let (config, request) = match prepare(&state, &req).await {
        Ok(prepared) => prepared,
        Err(e) => {
            warn!("Summary request rejected: {}", e);
            return error_response(&e);
        }
    };

    match state.orchestrator.summarize(&request, &config, None).await {
        Ok(result) => Json(SummarizeResponse::from(result)).into_response(),
        Err(e) => {
            warn!("Summary failed: {}", e);
            error_response(&e)
        }
    }
}

/// Streams `delta` events, then one `done` or `error` event.
///
/// Closing the connection cancels the provider request.
async fn summarize_stream(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SummarizeRequest>,
) -> Response {
    info!(url = %req.url, "Streaming summary requested");

    let (config, request) = match prepare(&state, &req).await {
        Ok(prepared) => prepared,
        Err(e) => {
            warn!("Summary request rejected: {}", e);
            return error_response(&e);
        }
    };

    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();

    tokio::spawn(async move {
        let delta_tx = tx.clone();
        let mut sink = move |delta: &str| {
            let event = Event::default()
                .event("delta")
                .data(json!({ "text": delta }).to_string());
            let _ = delta_tx.send(event);
        };

        let outcome = state
            .orchestrator
            .summarize_with_cancel(&request, &config, Some(&mut sink), tx.closed())
            .await;

        let event = match outcome {
            Ok(Some(result)) => Event::default()
                .event("done")
                .json_data(SummarizeResponse::from(result)),
            Ok(None) => {
                info!("Client disconnected, summary cancelled");
                return;
            }
            Err(e) => {
                warn!("Summary failed: {}", e);
                let body = ErrorResponse::from(&e);
                Event::default().event("error").json_data(json!({
                    "error": body.error,
                    "kind": body.kind,
                    "status": error_status(&e).as_u16(),
                }))
            }
        };
        let event = match event {
            Ok(event) => event,
            Err(e) => {
                warn!("Failed to encode event: {}", e);
                return;
            }
        };
        let _ = tx.send(event);
    });

    let events = stream! {
        while let Some(event) = rx.recv().await {
            yield Ok::<_, Infallible>(event);
        }
    };

    Sse::new(events).keep_alive(KeepAlive::default()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, ProviderError};

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (SummariserError::InvalidInput("bad url".into()), 400),
            (SummariserError::Transcript("none".into()), 400),
            (SummariserError::Config("no keys".into()), 500),
            (ProviderError::new(ErrorKind::AuthError, "x").into(), 401),
            (ProviderError::new(ErrorKind::RateLimited, "x").into(), 429),
            (ProviderError::new(ErrorKind::ModelNotFound, "x").into(), 404),
            (ProviderError::network("x").into(), 502),
        ];
        for (error, status) in cases {
            assert_eq!(error_status(&error).as_u16(), status, "{error}");
        }
    }

    #[test]
    fn test_blank_fields_are_not_overrides() {
        let req: SummarizeRequest = serde_json::from_str(
            r#"{"url": "https://youtu.be/dQw4w9WgXcQ", "provider": " ", "model": "gpt-4o-mini"}"#,
        )
        .unwrap();
        let overrides = req.overrides();
        assert!(overrides.provider.is_none());
        assert_eq!(overrides.model.as_deref(), Some("gpt-4o-mini"));
        assert!(overrides.stream.is_none());
    }

    #[test]
    fn test_error_body_carries_kind() {
        let error: SummariserError = ProviderError::new(ErrorKind::RateLimited, "slow down").into();
        let body = serde_json::to_value(ErrorResponse::from(&error)).unwrap();
        assert_eq!(body["kind"], "rate limited");
        assert_eq!(body["error"], "rate limited: slow down");

        let config_error = SummariserError::Config("x".into());
        let body = serde_json::to_value(ErrorResponse::from(&config_error)).unwrap();
        assert!(body.get("kind").is_none());
    }

    #[tokio::test]
    async fn test_index_page_has_form() {
        let Html(page) = index().await;
        assert!(page.contains("<form"));
        assert!(page.contains("/summarize/stream"));
    }
}
