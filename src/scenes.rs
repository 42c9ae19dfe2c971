//! Scene art: forwards a free-text prompt to the Gemini `generateContent` API.

use anyhow::{Context, anyhow};
use axum::{
    Json, Router, debug_handler,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    routing::post,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::{AppError, AppResult, AppState, config::Config};

const PREAMBLE: &str = "Create a high-quality, detailed image for a RPG scene with the following description:";
const STYLE: &str = "The image should be realistic, with atmospheric lighting and rich details suitable for a fantasy RPG setting.";

#[derive(Debug, Deserialize)]
pub struct SceneRequest {
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneResponse {
    pub image_url: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Clone)]
pub struct SceneClient {
    http: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
}

impl SceneClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: config.google_api_key.clone(),
            endpoint: format!(
                "{}/v1beta/models/{}:generateContent",
                config.gemini_api_base.trim_end_matches('/'),
                config.gemini_model
            ),
        }
    }

    pub async fn generate(&self, prompt: &str) -> AppResult<String> {
        let Some(api_key) = &self.api_key else {
            return Err(AppError::new(
                StatusCode::SERVICE_UNAVAILABLE,
                anyhow!("image generation is not configured (GOOGLE_API_KEY is missing)"),
            ));
        };

        let body = json!({
            "contents": [{
                "parts": [{ "text": PREAMBLE }, { "text": prompt }, { "text": STYLE }]
            }]
        });

        self.request(api_key, &body)
            .await
            .map_err(|e| AppError::new(StatusCode::BAD_GATEWAY, e))
    }

    async fn request(&self, api_key: &str, body: &serde_json::Value) -> anyhow::Result<String> {
        let response = self
            .http
            .post(&self.endpoint)
            .header("x-goog-api-key", api_key)
            .json(body)
            .send()
            .await
            .context("image provider unreachable")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(anyhow!("image provider returned {status}: {detail}"));
        }

        let parsed: GenerateContentResponse = response.json().await.context("unreadable provider response")?;
        parsed
            .candidates
            .into_iter()
            .filter_map(|candidate| candidate.content)
            .flat_map(|content| content.parts)
            .find_map(|part| part.text)
            .ok_or_else(|| anyhow!("image provider returned no content"))
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/generate-image", post(generate_image))
}

#[debug_handler(state = crate::AppState)]
pub async fn generate_image(
    State(scenes): State<SceneClient>,
    request: Result<Json<SceneRequest>, JsonRejection>,
) -> AppResult<Json<SceneResponse>> {
    let Json(SceneRequest { prompt }) = request.map_err(|e| AppError::new(e.status(), e))?;
    if prompt.trim().is_empty() {
        return Err(AppError::bad_request("prompt is required"));
    }

    info!(%prompt, "generating scene image");
    let image_url = scenes.generate(&prompt).await?;

    Ok(Json(SceneResponse { image_url }))
}
