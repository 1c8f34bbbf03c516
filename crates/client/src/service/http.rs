use anyhow::Result;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};
use vidcraft_engine::{Asset, AssetId, MergeResult, StudioError, StudioResult};

use crate::config::Config;
use crate::service::{Generation, MediaService, TrimOutcome};

/// `MediaService` over the Flask-style JSON API.
pub struct HttpMediaService {
    config: Arc<Config>,
    client: Client,
}

#[derive(Deserialize)]
struct MergeResponse {
    video_url: String,
    #[serde(default)]
    merged_id: Option<String>,
}

impl HttpMediaService {
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(HttpMediaService { config, client })
    }

    async fn json<T: serde::de::DeserializeOwned>(&self, response: Response, failure: &str) -> StudioResult<T> {
        let response = check(response, failure).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| StudioError::transport(format!("Invalid response from server: {}", e)))
    }
}

fn transport(e: reqwest::Error) -> StudioError {
    if e.is_timeout() {
        StudioError::transport("The media service did not respond in time")
    } else if e.is_connect() {
        StudioError::transport("Could not reach the media service")
    } else {
        StudioError::transport(e.to_string())
    }
}

/// Turn a non-success status into the server's `{"error": ...}` message when it sent one.
async fn check(response: Response, failure: &str) -> StudioResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body: Option<Value> = response.json().await.ok();
    let message = body
        .as_ref()
        .and_then(|b| b.get("error"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| {
            format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or(failure)
            )
        });
    debug!("[Service] {} ({}): {}", failure, status, message);
    Err(StudioError::Transport(message))
}

#[async_trait::async_trait]
impl MediaService for HttpMediaService {
    async fn generate(&self, prompt: &str) -> StudioResult<Generation> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(StudioError::validation("prompt is empty"));
        }
        info!("[Service] Sending prompt: {}", prompt);
        let response = self
            .client
            .post(self.config.endpoint("/generate"))
            .json(&serde_json::json!({ "prompt": prompt }))
            .send()
            .await
            .map_err(transport)?;
        let generation: Generation = self.json(response, "Generation failed").await?;
        info!(
            "[Service] Generation returned {} UI actions",
            generation.ui_actions.len()
        );
        Ok(generation)
    }

    async fn list_assets(&self) -> StudioResult<Vec<Asset>> {
        let response = self
            .client
            .get(self.config.endpoint("/videos"))
            .send()
            .await
            .map_err(transport)?;
        self.json(response, "Failed to fetch videos").await
    }

    async fn delete_asset(&self, id: &AssetId) -> StudioResult<()> {
        let response = self
            .client
            .delete(self.config.endpoint(&format!("/videos/{}.mp4", id)))
            .send()
            .await
            .map_err(transport)?;
        check(response, "Failed to delete video").await?;
        Ok(())
    }

    async fn delete_all_assets(&self) -> StudioResult<()> {
        let response = self
            .client
            .delete(self.config.endpoint("/videos"))
            .send()
            .await
            .map_err(transport)?;
        check(response, "Failed to delete all videos").await?;
        Ok(())
    }

    async fn trim(&self, id: &AssetId, start_seconds: f64, end_seconds: f64) -> StudioResult<TrimOutcome> {
        let response = self
            .client
            .post(self.config.endpoint(&format!("/videos/{}/trim", id)))
            .json(&serde_json::json!({
                "startTime": start_seconds,
                "endTime": end_seconds,
            }))
            .send()
            .await
            .map_err(transport)?;
        self.json(response, "Failed to trim video").await
    }

    async fn merge(&self, ids: &[AssetId]) -> StudioResult<MergeResult> {
        if ids.len() < 2 {
            return Err(StudioError::validation(
                "At least 2 videos are required for merging",
            ));
        }
        let response = self
            .client
            .post(self.config.endpoint("/videos/merge"))
            .json(&serde_json::json!({ "videoIds": ids }))
            .send()
            .await
            .map_err(transport)?;
        let merged: MergeResponse = self.json(response, "Failed to merge videos").await?;
        // older servers omit merged_id; the file stem is the id
        let id = merged.merged_id.unwrap_or_else(|| stem_of(&merged.video_url));
        Ok(MergeResult {
            id: AssetId::new(id),
            url: merged.video_url,
        })
    }

    async fn capabilities(&self) -> StudioResult<Value> {
        let response = self
            .client
            .get(self.config.endpoint("/capabilities"))
            .send()
            .await
            .map_err(transport)?;
        self.json(response, "Failed to fetch capabilities").await
    }
}

fn stem_of(url: &str) -> String {
    let file = url.rsplit('/').next().unwrap_or(url);
    file.split('.').next().unwrap_or(file).to_string()
}
