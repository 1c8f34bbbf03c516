use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use serde::Serialize;
use std::sync::Arc;
use vidcraft_engine::StudioError;

use crate::interpreter::ActionInterpreter;
use crate::studio::{Studio, StudioSnapshot};

pub mod editor;
pub mod library;
pub mod prompt;

#[derive(Clone)]
pub struct AppState {
    pub studio: Studio,
    pub interpreter: Arc<ActionInterpreter>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    error: String,
}

pub type ApiError = (StatusCode, Json<ErrorBody>);

pub type ApiResult<T> = Result<Json<T>, ApiError>;

pub fn api_error(error: StudioError) -> ApiError {
    let status = match &error {
        StudioError::Validation(_) | StudioError::UnknownActionKind(_) => StatusCode::BAD_REQUEST,
        StudioError::StaleReference(_) => StatusCode::NOT_FOUND,
        StudioError::Transport(_) => StatusCode::BAD_GATEWAY,
    };
    (
        status,
        Json(ErrorBody {
            error: error.to_string(),
        }),
    )
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/state", get(get_state))
        .with_state(state.clone())
        .merge(prompt::router(state.clone()))
        .merge(library::router(state.clone()))
        .merge(editor::router(state))
}

async fn get_state(State(state): State<AppState>) -> Json<StudioSnapshot> {
    Json(state.studio.snapshot())
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn state_lists_the_catalog() {
        let (app, _state, _service) = app(&["a", "b"]).await;
        let (status, body) = call(&app, "GET", "/state", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["catalog"].as_array().unwrap().len(), 2);
        assert_eq!(body["panels"]["library"], false);
    }

    #[test]
    fn errors_map_to_statuses_with_a_single_message() {
        let (status, Json(body)) = api_error(StudioError::StaleReference("a".into()));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error, "Video a is no longer available");
        assert_eq!(api_error(StudioError::transport("down")).0, StatusCode::BAD_GATEWAY);
    }
}
