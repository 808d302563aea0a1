//! Router, request handlers and the JSON error body.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Form, Json, Router,
    extract::{FromRequest, Request, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use tailor_core::SilentProgress;
use tailor_core::classify::ClassifyOptions;
use tailor_core::frontmatter::extract_metadata;
use tailor_core::generate::ExampleGenerator;
use tailor_core::pipeline::{PipelineOutcome, SingleShotPipeline};
use tailor_shared::{TailorError, UNKNOWN_VENUE};

use crate::backends::Backends;
use crate::pages;

/// Shared, read-only state behind every handler.
pub(crate) struct AppState {
    pub backends: Box<dyn Backends>,
    pub generator: ExampleGenerator,
    pub classify: ClassifyOptions,
    pub default_model: String,
}

pub(crate) fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/about", get(about))
        .route("/generate", post(generate))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

async fn home(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(pages::render_home(&state.default_model))
}

async fn about() -> Html<String> {
    Html(pages::render_about())
}

// ---------------------------------------------------------------------------
// POST /generate
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateRequest {
    url: String,
    #[serde(default)]
    model: Option<String>,
    #[serde(default = "default_force", alias = "force_generate")]
    force: bool,
}

fn default_force() -> bool {
    true
}

/// A [`GenerateRequest`] read from either a JSON or a form body.
pub(crate) struct GenerateInput(GenerateRequest);

impl<S: Send + Sync> FromRequest<S> for GenerateInput {
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/json"));

        if is_json {
            let Json(body) = Json::<GenerateRequest>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self(body))
        } else {
            let Form(body) = Form::<GenerateRequest>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self(body))
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct GenerateResponse {
    success: bool,
    generated_content: String,
    metadata: ResponseMetadata,
}

#[derive(Debug, Serialize)]
pub(crate) struct ResponseMetadata {
    title: String,
    authors: Vec<String>,
    date: Option<String>,
    venue: Option<String>,
    url: String,
}

impl ResponseMetadata {
    /// Frontmatter values win; the scraped article fills the gaps.
    fn new(outcome: &PipelineOutcome, url: &str) -> Self {
        let generated = extract_metadata(&outcome.example);
        let article = &outcome.article;
        Self {
            title: generated.title.unwrap_or_else(|| article.title.clone()),
            authors: generated.authors.unwrap_or_else(|| article.authors.clone()),
            date: generated.date,
            venue: (article.venue != UNKNOWN_VENUE).then(|| article.venue.clone()),
            url: url.to_string(),
        }
    }
}

#[instrument(skip_all, fields(url = %request.url, force = request.force))]
async fn generate(
    State(state): State<Arc<AppState>>,
    GenerateInput(request): GenerateInput,
) -> Result<Json<GenerateResponse>, ApiError> {
    let model = request
        .model
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| state.default_model.clone());

    let agent = state.backends.agent(&model)?;
    let scraper = state.backends.scraper(&request.url)?;
    let pipeline = SingleShotPipeline {
        agent: agent.as_ref(),
        scraper: scraper.as_ref(),
        source: state.backends.documents(),
        generator: &state.generator,
        classify: state.classify.clone(),
    };

    let output = scratch_path();
    let result = pipeline
        .run(&request.url, &output, request.force, &SilentProgress)
        .await;
    if let Err(e) = tokio::fs::remove_file(&output).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %output.display(), error = %e, "could not remove scratch file");
        }
    }
    let outcome = result?;

    info!(title = %outcome.article.title, %model, "example generated");
    Ok(Json(GenerateResponse {
        success: true,
        metadata: ResponseMetadata::new(&outcome, &request.url),
        generated_content: outcome.example,
    }))
}

fn scratch_path() -> PathBuf {
    std::env::temp_dir().join(format!("tailor-web-{}.md", Uuid::now_v7()))
}

/// Any pipeline failure, reported as HTTP 500 with a `detail` message.
pub(crate) struct ApiError(TailorError);

impl From<TailorError> for ApiError {
    fn from(e: TailorError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!(error = %self.0, "generate request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "detail": format!("Error: {}", self.0) })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::Request as HttpRequest;
    use tower::ServiceExt;

    use tailor_agent::{Agent, AskOptions};
    use tailor_core::classify::CLASSIFY_MAX_TOKENS;
    use tailor_crawler::Scraper;
    use tailor_document::DocumentSource;
    use tailor_shared::{Article, Result};

    const EXAMPLE: &str = "---
title: Scheduling Healthcare Vehicles
authors:
    - Sarah Thomson
date: 2024-07-14
link: _No link available_
id: 1
---

# Scheduling Healthcare Vehicles
";

    struct FakeAgent {
        verdict: &'static str,
    }

    #[async_trait]
    impl Agent for FakeAgent {
        async fn ask(&self, _document: &str, _question: &str, options: &AskOptions) -> Result<String> {
            if options.max_tokens == CLASSIFY_MAX_TOKENS {
                Ok(self.verdict.to_string())
            } else {
                Ok(EXAMPLE.to_string())
            }
        }
    }

    struct EmptyListing;

    #[async_trait]
    impl Scraper for EmptyListing {
        async fn scrape(&self) -> Result<Vec<Article>> {
            Err(TailorError::ScrapeFailure("no entries".into()))
        }
    }

    struct FakeDocuments {
        text: String,
    }

    #[async_trait]
    impl DocumentSource for FakeDocuments {
        async fn download(&self, _url: &str) -> Result<Vec<u8>> {
            Ok(self.text.clone().into_bytes())
        }

        fn extract_text(&self, bytes: &[u8]) -> Result<String> {
            Ok(String::from_utf8_lossy(bytes).into_owned())
        }
    }

    struct FakeBackends {
        verdict: &'static str,
        documents: FakeDocuments,
        keyless: bool,
    }

    impl Backends for FakeBackends {
        fn agent(&self, _model: &str) -> Result<Box<dyn Agent>> {
            if self.keyless {
                return Err(TailorError::config("Anthropic API key not configured"));
            }
            Ok(Box::new(FakeAgent {
                verdict: self.verdict,
            }))
        }

        fn scraper(&self, _url: &str) -> Result<Box<dyn Scraper>> {
            Ok(Box::new(EmptyListing))
        }

        fn documents(&self) -> &dyn DocumentSource {
            &self.documents
        }
    }

    fn app(verdict: &'static str, text_len: usize, keyless: bool) -> Router {
        router(Arc::new(AppState {
            backends: Box::new(FakeBackends {
                verdict,
                documents: FakeDocuments {
                    text: "x".repeat(text_len),
                },
                keyless,
            }),
            generator: ExampleGenerator::default(),
            classify: ClassifyOptions::default(),
            default_model: "test-model".into(),
        }))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn form_post(body: &str) -> Request {
        HttpRequest::post("/generate")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn pages_render() {
        let home = app("", 0, false)
            .oneshot(HttpRequest::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(home.status(), StatusCode::OK);
        let html = to_bytes(home.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8_lossy(&html);
        assert!(html.contains("action=\"/generate\""));
        assert!(html.contains("test-model"));

        let about = app("", 0, false)
            .oneshot(HttpRequest::get("/about").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(about.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn form_request_generates_without_classifying() {
        let response = app("", 10, false)
            .oneshot(form_post("url=https%3A%2F%2Fexample.org%2Fpaper.pdf"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["generated_content"], EXAMPLE);
        assert_eq!(json["metadata"]["title"], "Scheduling Healthcare Vehicles");
        assert_eq!(json["metadata"]["authors"][0], "Sarah Thomson");
        assert_eq!(json["metadata"]["date"], "2024-07-14");
        assert!(json["metadata"]["venue"].is_null());
        assert_eq!(json["metadata"]["url"], "https://example.org/paper.pdf");
    }

    #[tokio::test]
    async fn json_request_honours_classification() {
        let request = HttpRequest::post("/generate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                r#"{"url": "https://example.org/paper.pdf", "force": false}"#,
            ))
            .unwrap();

        let response = app(
            r#"{"is_real_world_application": false, "reason": "theory only"}"#,
            6000,
            false,
        )
        .oneshot(request)
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        let detail = json["detail"].as_str().unwrap();
        assert!(detail.starts_with("Error: "));
        assert!(detail.contains("theory only"));
    }

    #[tokio::test]
    async fn missing_api_key_is_a_server_error() {
        let response = app("", 10, true)
            .oneshot(form_post("url=https%3A%2F%2Fexample.org%2Fpaper.pdf&force_generate=true"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert!(json["detail"].as_str().unwrap().contains("API key"));
    }
}
