use axum::{
    extract::{Path, State},
    response::Json,
    routing::{delete, post},
    Router,
};
use serde::Serialize;
use vidcraft_engine::AssetId;

use crate::api::{api_error, ApiResult, AppState};
use crate::studio::StudioSnapshot;

#[derive(Serialize)]
pub struct SelectResponse {
    id: AssetId,
    selected: bool,
}

#[derive(Serialize)]
pub struct DeleteResponse {
    deleted: usize,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/library/open", post(open_library))
        .route("/library/close", post(close_library))
        .route("/library/refresh", post(refresh_library))
        .route("/library/select/:id", post(toggle_selection))
        .route("/library/selection", delete(clear_selection))
        .route("/library/selected", delete(delete_selected))
        .route("/assets", delete(delete_all))
        .with_state(state)
}

async fn open_library(State(state): State<AppState>) -> Json<StudioSnapshot> {
    let ticket = state.studio.open_library();
    state.studio.panels().wait_refreshed(ticket).await;
    Json(state.studio.snapshot())
}

async fn close_library(State(state): State<AppState>) -> Json<StudioSnapshot> {
    state.studio.close_library();
    Json(state.studio.snapshot())
}

async fn refresh_library(State(state): State<AppState>) -> Json<StudioSnapshot> {
    let ticket = state.studio.panels().request_refresh();
    state.studio.panels().wait_refreshed(ticket).await;
    Json(state.studio.snapshot())
}

async fn toggle_selection(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<SelectResponse> {
    let id = AssetId::new(id);
    let selected = state.studio.toggle_selection(id.clone());
    Json(SelectResponse { id, selected })
}

async fn clear_selection(State(state): State<AppState>) -> Json<StudioSnapshot> {
    state.studio.clear_selection();
    Json(state.studio.snapshot())
}

async fn delete_selected(State(state): State<AppState>) -> ApiResult<DeleteResponse> {
    let deleted = state.studio.delete_selected().await.map_err(api_error)?;
    Ok(Json(DeleteResponse { deleted }))
}

async fn delete_all(State(state): State<AppState>) -> ApiResult<StudioSnapshot> {
    state.studio.delete_all().await.map_err(api_error)?;
    Ok(Json(state.studio.snapshot()))
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::*;
    use axum::http::StatusCode;

    #[tokio::test(start_paused = true)]
    async fn select_then_delete_selected() {
        let (app, _state, service) = app(&["a", "b"]).await;
        let (_, body) = call(&app, "POST", "/library/select/a", None).await;
        assert_eq!(body["selected"], true);

        let (status, body) = call(&app, "DELETE", "/library/selected", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deleted"], 1);
        assert_eq!(service.calls("delete"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn clearing_the_selection_deletes_nothing() {
        let (app, _state, service) = app(&["a", "b"]).await;
        call(&app, "POST", "/library/select/a", None).await;
        call(&app, "POST", "/library/select/b", None).await;

        let (status, body) = call(&app, "DELETE", "/library/selection", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["selection"].as_array().unwrap().len(), 0);

        let (_, body) = call(&app, "DELETE", "/library/selected", None).await;
        assert_eq!(body["deleted"], 0);
        assert_eq!(service.calls("delete"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn open_returns_refreshed_catalog() {
        let (app, _state, service) = app(&["a"]).await;
        let (status, body) = call(&app, "POST", "/library/open", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["panels"]["library"], true);
        assert_eq!(service.calls("list"), 2);
    }
}
