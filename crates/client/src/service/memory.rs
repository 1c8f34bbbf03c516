use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;
use vidcraft_engine::{Asset, AssetId, MergeResult, StudioError, StudioResult};

use crate::service::{Generation, MediaService, TrimOutcome};

#[derive(Default)]
struct Inner {
    assets: Vec<Asset>,
    calls: Vec<String>,
    failing: HashSet<&'static str>,
    generation: Generation,
    revisions: u64,
    trim_delay: Duration,
}

/// In-process stand-in for the transcode service. Records every call by name.
#[derive(Default)]
pub struct InMemoryMediaService {
    inner: Mutex<Inner>,
}

impl InMemoryMediaService {
    pub fn with_assets(ids: &[&str]) -> Self {
        let service = Self::default();
        service.inner.lock().assets = ids
            .iter()
            .map(|id| Asset::new(*id, format!("/videos/{}.mp4", id)).with_name(*id))
            .collect();
        service
    }

    pub fn fail(&self, operation: &'static str) {
        self.inner.lock().failing.insert(operation);
    }

    pub fn respond_with(&self, generation: Generation) {
        self.inner.lock().generation = generation;
    }

    pub fn delay_trims(&self, delay: Duration) {
        self.inner.lock().trim_delay = delay;
    }

    pub fn calls(&self, operation: &str) -> usize {
        self.inner.lock().calls.iter().filter(|c| *c == operation).count()
    }

    fn record(&self, operation: &'static str) -> StudioResult<()> {
        let mut inner = self.inner.lock();
        inner.calls.push(operation.to_string());
        if inner.failing.contains(operation) {
            return Err(StudioError::transport(format!("{} unavailable", operation)));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl MediaService for InMemoryMediaService {
    async fn generate(&self, _prompt: &str) -> StudioResult<Generation> {
        self.record("generate")?;
        Ok(self.inner.lock().generation.clone())
    }

    async fn list_assets(&self) -> StudioResult<Vec<Asset>> {
        self.record("list")?;
        Ok(self.inner.lock().assets.clone())
    }

    async fn delete_asset(&self, id: &AssetId) -> StudioResult<()> {
        self.record("delete")?;
        self.inner.lock().assets.retain(|a| &a.id != id);
        Ok(())
    }

    async fn delete_all_assets(&self) -> StudioResult<()> {
        self.record("delete_all")?;
        self.inner.lock().assets.clear();
        Ok(())
    }

    async fn trim(&self, id: &AssetId, _start: f64, _end: f64) -> StudioResult<TrimOutcome> {
        let delay = self.inner.lock().trim_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.record("trim")?;
        let mut inner = self.inner.lock();
        inner.revisions += 1;
        let url = format!("/videos/{}.mp4?rev={}", id, inner.revisions);
        if let Some(asset) = inner.assets.iter_mut().find(|a| &a.id == id) {
            asset.url = url.clone();
        }
        Ok(TrimOutcome {
            video_url: url,
            message: Some("Video trimmed successfully".to_string()),
        })
    }

    async fn merge(&self, ids: &[AssetId]) -> StudioResult<MergeResult> {
        if ids.len() < 2 {
            return Err(StudioError::validation(
                "At least 2 videos are required for merging",
            ));
        }
        self.record("merge")?;
        let mut inner = self.inner.lock();
        inner.revisions += 1;
        let id = format!("merged-{}", inner.revisions);
        let url = format!("/videos/{}.mp4", id);
        inner.assets.push(Asset::new(id.as_str(), url.as_str()));
        Ok(MergeResult {
            id: AssetId::new(id),
            url,
        })
    }

    async fn capabilities(&self) -> StudioResult<Value> {
        self.record("capabilities")?;
        Ok(serde_json::json!({ "tools": ["open_burger_menu", "open_video_editor"] }))
    }
}
