use serde::Serialize;
use serde_json::Value;

use crate::asset::AssetId;

/// Planner-issued UI commands. Kinds the client does not know are carried through as
/// `Unknown` so the interpreter can report and skip them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    OpenLibrary,
    OpenEditor,
    Unknown(String),
}

impl ActionKind {
    pub fn from_wire(kind: &str) -> Self {
        match kind {
            "open_burger_menu" | "open_library" => ActionKind::OpenLibrary,
            "open_video_editor" | "open_editor" => ActionKind::OpenEditor,
            other => ActionKind::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ActionKind::OpenLibrary => "open_burger_menu",
            ActionKind::OpenEditor => "open_video_editor",
            ActionKind::Unknown(kind) => kind,
        }
    }

    pub fn label(&self) -> String {
        match self {
            ActionKind::OpenLibrary => "open the library".to_string(),
            ActionKind::OpenEditor => "open the editor".to_string(),
            ActionKind::Unknown(kind) => kind.replace('_', " "),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Action {
    pub kind: ActionKind,
    pub parameters: Value,
    pub reasoning: String,
}

impl Action {
    pub fn new(kind: ActionKind) -> Self {
        Action {
            kind,
            parameters: Value::Null,
            reasoning: String::new(),
        }
    }

    pub fn with_suggested(mut self, ids: &[&str]) -> Self {
        self.parameters = serde_json::json!({ "suggested_videos": ids });
        self
    }

    /// Parse one entry of `ui_actions`. Never fails: malformed entries become `Unknown`.
    pub fn from_wire(value: &Value) -> Self {
        let kind = match value.get("type").and_then(Value::as_str) {
            Some(kind) => ActionKind::from_wire(kind),
            None => ActionKind::Unknown(String::new()),
        };
        Action {
            kind,
            parameters: value.get("parameters").cloned().unwrap_or(Value::Null),
            reasoning: value
                .get("reasoning")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        }
    }

    /// Suggested asset ids; non-string entries are skipped.
    pub fn suggested_asset_ids(&self) -> Vec<AssetId> {
        ["suggested_videos", "suggestedAssetIds"]
            .iter()
            .find_map(|key| self.parameters.get(*key).and_then(Value::as_array))
            .map(|ids| {
                ids.iter()
                    .filter_map(Value::as_str)
                    .map(AssetId::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The planner's `parameters.reason`, falling back to the step reasoning.
    pub fn reason(&self) -> &str {
        self.parameters
            .get("reason")
            .and_then(Value::as_str)
            .unwrap_or(&self.reasoning)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionSummary {
    pub count: usize,
    pub kinds: Vec<String>,
    pub summary: String,
}

pub fn summarize(actions: &[Action]) -> Option<ActionSummary> {
    if actions.is_empty() {
        return None;
    }
    let kinds: Vec<String> = actions.iter().map(|a| a.kind.label()).collect();
    Some(ActionSummary {
        count: actions.len(),
        summary: format!("Will {}", kinds.join(" and ")),
        kinds,
    })
}
