use axum::{
    body::Bytes,
    extract::{Path, State},
    response::Json,
    routing::{delete, post},
    Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use vidcraft_engine::{AssetId, StudioError};

use crate::api::{api_error, ApiError, ApiResult, AppState};
use crate::studio::StudioSnapshot;

#[derive(Deserialize)]
pub struct MetadataRequest {
    duration: f64,
}

#[derive(Deserialize)]
pub struct TrimRangeRequest {
    start: f64,
    end: f64,
}

#[derive(Deserialize)]
pub struct SeekRequest {
    position: f64,
}

/// Without a body the focused asset is trimmed to the current trim range.
#[derive(Deserialize)]
pub struct TrimBody {
    id: AssetId,
    start: f64,
    end: f64,
}

/// Without a body the current sequence is merged in order.
#[derive(Deserialize)]
pub struct MergeBody {
    ids: Vec<AssetId>,
}

#[derive(Serialize)]
pub struct MoveResponse {
    changed: bool,
    snapshot: StudioSnapshot,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/editor/open", post(open_editor))
        .route("/editor/close", post(close_editor))
        .route("/editor/move-up/:index", post(move_up))
        .route("/editor/move-down/:index", post(move_down))
        .route("/editor/remove/:index", post(remove))
        .route("/editor/focus/:id", post(focus))
        .route("/editor/metadata", post(load_metadata))
        .route("/editor/trim-range", post(set_trim_range))
        .route("/editor/seek", post(seek))
        .route("/editor/play", post(toggle_play))
        .route("/editor/trim", post(trim))
        .route("/editor/merge", post(merge))
        .route("/editor/notice", delete(dismiss_notice))
        .with_state(state)
}

async fn open_editor(State(state): State<AppState>) -> Json<StudioSnapshot> {
    state.studio.open_editor();
    Json(state.studio.snapshot())
}

async fn close_editor(State(state): State<AppState>) -> Json<StudioSnapshot> {
    state.studio.close_editor();
    Json(state.studio.snapshot())
}

async fn move_up(State(state): State<AppState>, Path(index): Path<usize>) -> Json<MoveResponse> {
    let changed = state.studio.move_up(index);
    Json(MoveResponse {
        changed,
        snapshot: state.studio.snapshot(),
    })
}

async fn move_down(State(state): State<AppState>, Path(index): Path<usize>) -> Json<MoveResponse> {
    let changed = state.studio.move_down(index);
    Json(MoveResponse {
        changed,
        snapshot: state.studio.snapshot(),
    })
}

async fn remove(State(state): State<AppState>, Path(index): Path<usize>) -> Json<MoveResponse> {
    let changed = state.studio.remove_from_sequence(index).is_some();
    Json(MoveResponse {
        changed,
        snapshot: state.studio.snapshot(),
    })
}

async fn focus(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StudioSnapshot> {
    state
        .studio
        .focus(&AssetId::new(id))
        .map_err(api_error)?;
    Ok(Json(state.studio.snapshot()))
}

async fn load_metadata(
    State(state): State<AppState>,
    Json(req): Json<MetadataRequest>,
) -> ApiResult<StudioSnapshot> {
    state.studio.load_metadata(req.duration).map_err(api_error)?;
    Ok(Json(state.studio.snapshot()))
}

async fn set_trim_range(
    State(state): State<AppState>,
    Json(req): Json<TrimRangeRequest>,
) -> Json<StudioSnapshot> {
    state.studio.set_trim_range(req.start, req.end);
    Json(state.studio.snapshot())
}

async fn seek(State(state): State<AppState>, Json(req): Json<SeekRequest>) -> Json<StudioSnapshot> {
    state.studio.seek(req.position);
    Json(state.studio.snapshot())
}

async fn toggle_play(State(state): State<AppState>) -> Json<StudioSnapshot> {
    state.studio.toggle_play();
    Json(state.studio.snapshot())
}

/// An empty body selects the default target; anything else must parse completely.
fn optional_body<T: DeserializeOwned>(body: &Bytes) -> Result<Option<T>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| api_error(StudioError::validation(format!("Invalid request body: {}", e))))
}

async fn trim(State(state): State<AppState>, body: Bytes) -> ApiResult<StudioSnapshot> {
    let result = match optional_body::<TrimBody>(&body)? {
        Some(req) => state.studio.trim(&req.id, req.start, req.end).await,
        None => state.studio.trim_focused().await,
    };
    result.map_err(api_error)?;
    Ok(Json(state.studio.snapshot()))
}

async fn merge(State(state): State<AppState>, body: Bytes) -> ApiResult<StudioSnapshot> {
    let result = match optional_body::<MergeBody>(&body)? {
        Some(req) => state.studio.merge(&req.ids).await,
        None => state.studio.merge_sequence().await,
    };
    result.map_err(api_error)?;
    Ok(Json(state.studio.snapshot()))
}

async fn dismiss_notice(State(state): State<AppState>) -> Json<StudioSnapshot> {
    state.studio.dismiss_notice();
    Json(state.studio.snapshot())
}
