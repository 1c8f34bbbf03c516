use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use vidcraft_engine::{summarize, ActionSummary};

use crate::api::{api_error, ApiResult, AppState};
use crate::service::Generation;

#[derive(Deserialize)]
pub struct PromptRequest {
    prompt: String,
}

#[derive(Serialize)]
pub struct PromptResponse {
    generation: Generation,
    action_summary: Option<ActionSummary>,
    run_id: Option<Uuid>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/prompt", post(submit_prompt))
        .route("/capabilities", get(capabilities))
        .with_state(state)
}

/// Generate, then hand the planner's actions to the interpreter without waiting for them.
async fn submit_prompt(
    State(state): State<AppState>,
    Json(req): Json<PromptRequest>,
) -> ApiResult<PromptResponse> {
    let generation = state
        .studio
        .submit_prompt(&req.prompt)
        .await
        .map_err(api_error)?;

    let actions = generation.actions();
    let action_summary = summarize(&actions);
    let run_id = if actions.is_empty() {
        None
    } else {
        Some(state.interpreter.run(actions).run_id)
    };

    Ok(Json(PromptResponse {
        generation,
        action_summary,
        run_id,
    }))
}

async fn capabilities(State(state): State<AppState>) -> ApiResult<Value> {
    state.studio.capabilities().await.map(Json).map_err(api_error)
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::*;
    use crate::service::Generation;
    use axum::http::StatusCode;
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn prompt_runs_returned_actions() {
        let (app, state, service) = app(&["a", "b"]).await;
        service.respond_with(Generation {
            video_url: Some("/videos/b.mp4".to_string()),
            ui_actions: vec![json!({
                "type": "open_video_editor",
                "parameters": { "suggested_videos": ["b"] },
                "reasoning": "User wants to trim"
            })],
            ..Generation::default()
        });

        let (status, body) = call(&app, "POST", "/prompt", Some(json!({ "prompt": "trim b" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["action_summary"]["count"], 1);
        assert!(body["run_id"].is_string());

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(state.studio.panels().visibility().editor);
        let (_, snapshot) = call(&app, "GET", "/state", None).await;
        assert_eq!(snapshot["sequence"][0]["id"], "b");
    }

    #[tokio::test(start_paused = true)]
    async fn failed_generation_is_a_bad_gateway() {
        let (app, _state, service) = app(&[]).await;
        service.fail("generate");
        let (status, body) = call(&app, "POST", "/prompt", Some(json!({ "prompt": "x" }))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "generate unavailable");
    }
}
