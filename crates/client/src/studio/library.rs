use futures::future::join_all;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use vidcraft_engine::{AssetId, StudioResult};

use crate::panels::RefreshRequest;
use crate::studio::Studio;

/// Listens for refresh requests and applies catalog snapshots, one at a time in ticket order,
/// so the last snapshot to complete is also the last one requested.
pub struct LibraryWorker {
    studio: Studio,
    requests: mpsc::UnboundedReceiver<RefreshRequest>,
}

impl LibraryWorker {
    pub fn new(studio: Studio, requests: mpsc::UnboundedReceiver<RefreshRequest>) -> Self {
        LibraryWorker { studio, requests }
    }

    pub async fn run(mut self) {
        info!("[Library] Worker started");
        while let Some(request) = self.requests.recv().await {
            self.studio.refresh_catalog().await;
            self.studio.panels().mark_refreshed(request.ticket);
        }
        info!("[Library] Worker stopped");
    }
}

impl Studio {
    /// Show the library and ask for its data, as a click on the menu button does.
    pub fn open_library(&self) -> u64 {
        self.panels().set_library_visible(true);
        self.panels().request_refresh()
    }

    pub fn close_library(&self) {
        self.panels().set_library_visible(false);
    }

    /// Fetch the listing and replace the catalog with it.
    pub(crate) async fn refresh_catalog(&self) {
        let requested_at = self.with_state(|state| state.catalog.begin_refresh());
        match self.service.list_assets().await {
            Ok(assets) => {
                let count = assets.len();
                self.with_state(|state| {
                    let kept = state.catalog.apply_snapshot(requested_at, assets);
                    state.selection.retain_existing(&state.catalog);
                    let dropped = state.session.reconcile(&state.catalog);
                    if kept > 0 {
                        info!("[Library] Kept {} newer local edits over the listing", kept);
                    }
                    if dropped > 0 {
                        info!("[Library] Dropped {} deleted videos from the edit sequence", dropped);
                    }
                });
                info!("[Library] Loaded {} videos", count);
            }
            Err(e) => error!("[Library] Failed to fetch videos: {}", e),
        }
    }

    /// Returns whether `id` is selected afterwards.
    pub fn toggle_selection(&self, id: AssetId) -> bool {
        self.with_state(|state| state.selection.toggle(id))
    }

    pub fn install_selection(&self, ids: Vec<AssetId>) {
        info!("[Library] Selecting {} suggested videos", ids.len());
        self.with_state(|state| state.selection.install(ids));
    }

    pub fn clear_selection(&self) {
        self.with_state(|state| state.selection.clear());
    }

    /// Delete every selected asset concurrently, then clear the selection and refresh.
    /// The first failure is returned; assets that were deleted stay deleted.
    pub async fn delete_selected(&self) -> StudioResult<usize> {
        let ids = self.with_state(|state| state.selection.ids().to_vec());
        if ids.is_empty() {
            return Ok(0);
        }
        let results = join_all(ids.iter().map(|id| self.service.delete_asset(id))).await;

        let mut deleted = 0;
        let mut first_error = None;
        self.with_state(|state| {
            for (id, result) in ids.iter().zip(results) {
                match result {
                    Ok(()) => {
                        state.catalog.remove(id);
                        deleted += 1;
                    }
                    Err(e) => {
                        warn!("[Library] Failed to delete {}: {}", id, e);
                        first_error.get_or_insert(e);
                    }
                }
            }
            state.selection.clear();
            state.session.reconcile(&state.catalog);
            if let Some(e) = &first_error {
                state.last_error = Some(e.to_string());
            }
        });
        self.panels().request_refresh();
        match first_error {
            Some(e) => Err(e),
            None => Ok(deleted),
        }
    }

    pub async fn delete_all(&self) -> StudioResult<()> {
        if let Err(e) = self.service.delete_all_assets().await {
            error!("[Library] Failed to delete all videos: {}", e);
            self.with_state(|state| state.last_error = Some(e.to_string()));
            return Err(e);
        }
        self.with_state(|state| {
            state.catalog.clear();
            state.selection.clear();
            state.session.reconcile(&state.catalog);
        });
        info!("[Library] Deleted all videos");
        Ok(())
    }
}
