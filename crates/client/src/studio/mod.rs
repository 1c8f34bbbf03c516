use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};
use vidcraft_engine::{
    summarize, ActionSummary, Asset, AssetCatalog, AssetId, EditSession, Notice, PlaybackState,
    SelectionSet, StudioError, StudioResult,
};

use crate::config::Config;
use crate::panels::{PanelController, PanelVisibility};
use crate::service::{Generation, MediaService};

pub mod editor;
pub mod library;

pub use library::LibraryWorker;

/// Everything the studio mutates. One lock; never held across an await.
#[derive(Debug, Default)]
pub struct StudioState {
    pub catalog: AssetCatalog,
    pub selection: SelectionSet,
    pub session: EditSession,
    pub generation: Option<Generation>,
    pub last_error: Option<String>,
    pub generating: bool,
}

/// Top-level client session: owns the catalog, the library selection and the edit
/// session, and talks to the media service on their behalf.
#[derive(Clone)]
pub struct Studio {
    config: Arc<Config>,
    service: Arc<dyn MediaService>,
    panels: Arc<PanelController>,
    state: Arc<Mutex<StudioState>>,
}

impl Studio {
    pub fn new(config: Arc<Config>, service: Arc<dyn MediaService>) -> (Self, LibraryWorker) {
        let (panels, refresh_rx) = PanelController::new();
        let studio = Studio {
            config,
            service,
            panels: Arc::new(panels),
            state: Arc::new(Mutex::new(StudioState::default())),
        };
        let worker = LibraryWorker::new(studio.clone(), refresh_rx);
        (studio, worker)
    }

    /// Build a studio and spawn its library worker on the current runtime.
    pub fn start(config: Arc<Config>, service: Arc<dyn MediaService>) -> Self {
        let (studio, worker) = Self::new(config, service);
        tokio::spawn(worker.run());
        studio
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn panels(&self) -> &PanelController {
        &self.panels
    }

    /// Run `f` against the locked state.
    pub fn with_state<T>(&self, f: impl FnOnce(&mut StudioState) -> T) -> T {
        f(&mut self.state.lock())
    }

    /// Send a prompt to the planner. The caller feeds the returned actions to the interpreter.
    pub async fn submit_prompt(&self, prompt: &str) -> StudioResult<Generation> {
        self.with_state(|state| {
            state.generating = true;
            state.last_error = None;
            state.generation = None;
        });
        info!("[Studio] Submitting prompt: {}", prompt.trim());
        let result = self.service.generate(prompt).await;
        self.with_state(|state| {
            state.generating = false;
            match &result {
                Ok(generation) => state.generation = Some(generation.clone()),
                Err(e) => state.last_error = Some(e.to_string()),
            }
        });
        match &result {
            Ok(generation) => {
                for (index, action) in generation.actions().iter().enumerate() {
                    info!(
                        "[Studio]   Action {}: {} - {}",
                        index + 1,
                        action.kind.as_str(),
                        action.reasoning
                    );
                }
            }
            Err(e) => error!("[Studio] Generation failed: {}", e),
        }
        result
    }

    pub async fn capabilities(&self) -> StudioResult<Value> {
        self.service.capabilities().await
    }

    /// Clear `notice_id` after `lifetime`, unless a newer notice replaced it.
    fn expire_notice_after(&self, notice_id: u64, lifetime: Duration) {
        let state = self.state.clone();
        tokio::spawn(async move {
            tokio::time::sleep(lifetime).await;
            if state.lock().session.expire_notice(notice_id) {
                debug!("[Studio] Notice {} expired", notice_id);
            }
        });
    }

    pub fn snapshot(&self) -> StudioSnapshot {
        let state = self.state.lock();
        let cache_key = chrono::Utc::now().timestamp_millis();
        let view = |asset: &Asset| AssetView {
            id: asset.id.clone(),
            name: asset.display_name().to_string(),
            media_url: self.config.media_url(&asset.url),
            created_at: asset.created_at.to_rfc3339(),
            duration_seconds: asset.duration_seconds,
        };
        let focus = state.session.focus().and_then(|id| state.catalog.get(id));
        let actions = state
            .generation
            .as_ref()
            .map(|g| g.actions())
            .unwrap_or_default();

        StudioSnapshot {
            panels: self.panels.visibility(),
            catalog: state.catalog.assets().iter().map(view).collect(),
            selection: state.selection.ids().to_vec(),
            sequence: state.session.resolved(&state.catalog).into_iter().map(view).collect(),
            focus: focus.map(view),
            player_url: focus.map(|asset| self.config.player_url(&asset.url, cache_key)),
            playback: state.session.playback().clone(),
            last_merge: state.session.last_merge().map(|merge| MergeView {
                id: merge.id.clone(),
                media_url: self.config.media_url(&merge.url),
                download_name: state.session.merge_download_name().unwrap_or_default(),
            }),
            notice: state.session.notice().cloned(),
            processing: state.session.is_processing(),
            generating: state.generating,
            generation: state.generation.clone(),
            action_summary: summarize(&actions),
            tool_summary: state
                .generation
                .as_ref()
                .filter(|g| !g.tools_used.is_empty())
                .map(Generation::tool_summary),
            last_error: state.last_error.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AssetView {
    pub id: AssetId,
    pub name: String,
    pub media_url: String,
    pub created_at: String,
    pub duration_seconds: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MergeView {
    pub id: AssetId,
    pub media_url: String,
    pub download_name: String,
}

/// Read model for the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct StudioSnapshot {
    pub panels: PanelVisibility,
    pub catalog: Vec<AssetView>,
    pub selection: Vec<AssetId>,
    pub sequence: Vec<AssetView>,
    pub focus: Option<AssetView>,
    pub player_url: Option<String>,
    pub playback: PlaybackState,
    pub last_merge: Option<MergeView>,
    pub notice: Option<Notice>,
    pub processing: bool,
    pub generating: bool,
    pub generation: Option<Generation>,
    pub action_summary: Option<ActionSummary>,
    pub tool_summary: Option<String>,
    pub last_error: Option<String>,
}

/// Log a failure the user does not need to see, or pass it on.
pub(crate) fn absorb_stale(context: &str, error: StudioError) -> StudioResult<()> {
    if error.is_silent() {
        debug!("[Studio] {}: {}", context, error);
        Ok(())
    } else {
        Err(error)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::service::memory::InMemoryMediaService;

    pub fn studio_with(ids: &[&str]) -> (Studio, Arc<InMemoryMediaService>) {
        let service = Arc::new(InMemoryMediaService::with_assets(ids));
        let studio = Studio::start(Arc::new(Config::default()), service.clone());
        (studio, service)
    }

    /// Refresh the catalog and wait for the worker to apply it.
    pub async fn loaded(ids: &[&str]) -> (Studio, Arc<InMemoryMediaService>) {
        let (studio, service) = studio_with(ids);
        let ticket = studio.panels().request_refresh();
        studio.panels().wait_refreshed(ticket).await;
        (studio, service)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use serde_json::json;

    #[tokio::test(start_paused = true)]
    async fn prompt_result_is_kept_for_display() {
        let (studio, service) = loaded(&["a"]).await;
        service.respond_with(Generation {
            tools_used: vec!["open_burger_menu".to_string()],
            ui_actions: vec![json!({ "type": "open_burger_menu", "reasoning": "show" })],
            ..Generation::default()
        });
        let generation = studio.submit_prompt("show my videos").await.unwrap();
        assert_eq!(generation.actions().len(), 1);

        let snapshot = studio.snapshot();
        assert!(!snapshot.generating);
        assert_eq!(snapshot.action_summary.unwrap().summary, "Will open the library");
        assert_eq!(
            snapshot.tool_summary.as_deref(),
            Some("Planner selected 1 tools: open_burger_menu")
        );
        assert_eq!(snapshot.catalog[0].media_url, "http://localhost:5000/videos/a.mp4");
    }

    #[tokio::test(start_paused = true)]
    async fn failed_prompt_surfaces_a_single_message() {
        let (studio, service) = loaded(&[]).await;
        service.fail("generate");
        let err = studio.submit_prompt("anything").await.unwrap_err();
        assert_eq!(studio.snapshot().last_error, Some(err.to_string()));
        assert!(studio.snapshot().generation.is_none());
    }
}
