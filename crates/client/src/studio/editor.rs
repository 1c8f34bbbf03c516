use tracing::{debug, info, warn};
use vidcraft_engine::{AssetId, StudioError, StudioResult};

use crate::studio::{absorb_stale, Studio, StudioState};

impl Studio {
    /// Manual open. With nothing to edit the library is shown instead.
    pub fn open_editor(&self) -> bool {
        let nothing_to_edit =
            self.with_state(|state| state.catalog.is_empty() && state.selection.is_empty());
        if nothing_to_edit {
            info!("[Editor] No videos available, opening the library instead");
            self.open_library();
            return false;
        }
        self.open_editor_seeded();
        true
    }

    /// Seed the edit sequence from the selection (or the whole catalog) and show the editor.
    pub fn open_editor_seeded(&self) {
        let seeded = self.with_state(|state| {
            state.session.seed(&state.selection, &state.catalog);
            state.session.sequence().len()
        });
        info!("[Editor] Opened with {} videos", seeded);
        self.panels().set_editor_visible(true);
    }

    pub fn close_editor(&self) {
        self.with_state(|state| state.session.pause());
        self.panels().set_editor_visible(false);
    }

    pub fn move_up(&self, index: usize) -> bool {
        self.with_state(|state| state.session.move_up(index))
    }

    pub fn move_down(&self, index: usize) -> bool {
        self.with_state(|state| state.session.move_down(index))
    }

    pub fn remove_from_sequence(&self, index: usize) -> Option<AssetId> {
        self.with_state(|state| state.session.remove(index))
    }

    pub fn focus(&self, id: &AssetId) -> StudioResult<()> {
        self.with_state(|state| state.session.select_focus(id))
    }

    pub fn load_metadata(&self, duration_seconds: f64) -> StudioResult<()> {
        self.with_state(|state| {
            let StudioState { session, catalog, .. } = state;
            session.load_metadata(duration_seconds, catalog)
        })
    }

    pub fn set_trim_range(&self, start_seconds: f64, end_seconds: f64) {
        self.with_state(|state| state.session.set_trim_range(start_seconds, end_seconds));
    }

    pub fn seek(&self, position_seconds: f64) {
        self.with_state(|state| state.session.seek(position_seconds));
    }

    pub fn toggle_play(&self) -> bool {
        self.with_state(|state| state.session.toggle_play())
    }

    pub fn dismiss_notice(&self) {
        self.with_state(|state| state.session.dismiss_notice());
    }

    /// Trim the focused asset to the current trim range.
    pub async fn trim_focused(&self) -> StudioResult<()> {
        let (focus, start, end) = self.with_state(|state| {
            let playback = state.session.playback();
            (
                state.session.focus().cloned(),
                playback.trim_start,
                playback.trim_end,
            )
        });
        let id = focus.ok_or_else(|| StudioError::validation("No video is selected"))?;
        self.trim(&id, start, end).await
    }

    /// Replace an asset's content with the `[start, end]` cut of itself.
    ///
    /// Rejections and transport failures only change the notice; the sequence, focus and
    /// catalog stay as they were. A result for an asset deleted meanwhile is dropped.
    pub async fn trim(&self, id: &AssetId, start_seconds: f64, end_seconds: f64) -> StudioResult<()> {
        let request = self.with_state(|state| {
            let StudioState { session, catalog, .. } = state;
            session
                .begin_trim(id, start_seconds, end_seconds, catalog)
                .inspect_err(|e| {
                    session.reject("Trim", e);
                })
        });
        let request = match request {
            Ok(request) => request,
            Err(e) => {
                warn!("[Editor] Trim rejected: {}", e);
                return Err(e);
            }
        };

        info!(
            "[Editor] Trimming {} to {:.2}s..{:.2}s",
            request.id, request.start_seconds, request.end_seconds
        );
        let outcome = self
            .service
            .trim(&request.id, request.start_seconds, request.end_seconds)
            .await;

        let applied = self.with_state(|state| {
            let StudioState { session, catalog, .. } = state;
            match outcome {
                Ok(trimmed) => session.complete_trim(&request.id, &trimmed.video_url, catalog),
                Err(e) => {
                    session.fail("Trim", &e);
                    Err(e)
                }
            }
        });

        match applied {
            Ok(notice) => {
                info!("[Editor] Trimmed {}", request.id);
                self.expire_notice_after(notice, self.config.timing.trim_notice);
                self.panels().request_refresh();
                Ok(())
            }
            Err(e) if e.is_silent() => absorb_stale("Dropping trim result", e),
            Err(e) => {
                warn!("[Editor] Trim failed: {}", e);
                Err(e)
            }
        }
    }

    /// Merge the edit sequence in its current order.
    pub async fn merge_sequence(&self) -> StudioResult<()> {
        let ids = self.with_state(|state| state.session.sequence().to_vec());
        self.merge(&ids).await
    }

    /// Concatenate `ids` into a new asset. The working sequence is not changed.
    pub async fn merge(&self, ids: &[AssetId]) -> StudioResult<()> {
        let accepted = self.with_state(|state| {
            let StudioState { session, catalog, .. } = state;
            session.begin_merge(ids, catalog).inspect_err(|e| {
                session.reject("Merge", e);
            })
        });
        if let Err(e) = accepted {
            warn!("[Editor] Merge rejected: {}", e);
            return Err(e);
        }

        info!("[Editor] Merging {} videos", ids.len());
        let outcome = self.service.merge(ids).await;

        let applied = self.with_state(|state| {
            let StudioState { session, catalog, .. } = state;
            match outcome {
                Ok(merged) => Ok(session.complete_merge(merged, catalog)),
                Err(e) => {
                    session.fail("Merge", &e);
                    Err(e)
                }
            }
        });

        match applied {
            Ok(notice) => {
                debug!("[Editor] Merge finished, notice {}", notice);
                self.expire_notice_after(notice, self.config.timing.merge_notice);
                self.panels().request_refresh();
                Ok(())
            }
            Err(e) => {
                warn!("[Editor] Merge failed: {}", e);
                Err(e)
            }
        }
    }
}
