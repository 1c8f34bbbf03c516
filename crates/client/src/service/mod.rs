use serde::{Deserialize, Serialize};
use serde_json::Value;
use vidcraft_engine::{Action, Asset, AssetId, MergeResult, StudioResult};

pub mod http;
#[cfg(test)]
pub mod memory;

/// Response of the planner/generation endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub tools_used: Vec<String>,
    #[serde(default)]
    pub reasoning: Vec<String>,
    #[serde(default)]
    pub tool_selection_log: Vec<String>,
    /// Kept raw so one malformed entry cannot fail the whole response.
    #[serde(default)]
    pub ui_actions: Vec<Value>,
}

impl Generation {
    pub fn actions(&self) -> Vec<Action> {
        self.ui_actions.iter().map(Action::from_wire).collect()
    }

    pub fn tool_summary(&self) -> String {
        format!(
            "Planner selected {} tools: {}",
            self.tools_used.len(),
            self.tools_used.join(" → ")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrimOutcome {
    pub video_url: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// The remote generation/transcode service. Every call is awaited before dependent state
/// changes; none of them retry.
#[async_trait::async_trait]
pub trait MediaService: Send + Sync {
    async fn generate(&self, prompt: &str) -> StudioResult<Generation>;

    async fn list_assets(&self) -> StudioResult<Vec<Asset>>;

    async fn delete_asset(&self, id: &AssetId) -> StudioResult<()>;

    async fn delete_all_assets(&self) -> StudioResult<()>;

    /// Replaces the asset's payload in place; the id is unchanged.
    async fn trim(&self, id: &AssetId, start_seconds: f64, end_seconds: f64) -> StudioResult<TrimOutcome>;

    /// Concatenates the assets in order into a new asset.
    async fn merge(&self, ids: &[AssetId]) -> StudioResult<MergeResult>;

    async fn capabilities(&self) -> StudioResult<Value>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vidcraft_engine::ActionKind;

    #[test]
    fn generation_tolerates_missing_fields_and_odd_actions() {
        let generation: Generation = serde_json::from_value(json!({
            "code": "class Scene: ...",
            "video_url": "/videos/scene.mp4",
            "tools_used": ["generate_manim_code", "render_video"],
            "ui_actions": [
                { "type": "open_burger_menu", "reasoning": "show videos" },
                "not an object"
            ]
        }))
        .unwrap();

        let actions = generation.actions();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].kind, ActionKind::OpenLibrary);
        assert!(matches!(actions[1].kind, ActionKind::Unknown(_)));
        assert_eq!(
            generation.tool_summary(),
            "Planner selected 2 tools: generate_manim_code → render_video"
        );
    }
}
