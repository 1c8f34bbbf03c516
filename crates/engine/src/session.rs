use serde::Serialize;

use crate::asset::{Asset, AssetId};
use crate::catalog::AssetCatalog;
use crate::error::{StudioError, StudioResult};
use crate::selection::SelectionSet;

pub const TRIM_SUCCESS: &str = "Video trimmed successfully! The original video has been replaced.";
pub const MERGE_SUCCESS: &str =
    "Videos merged successfully! Click the download button to save the merged video.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Transient message shown above the editor. `id` lets a delayed clear target only the
/// notice it was scheduled for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub id: u64,
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlaybackState {
    pub position: f64,
    pub duration: f64,
    pub trim_start: f64,
    pub trim_end: f64,
    pub playing: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeResult {
    pub id: AssetId,
    pub url: String,
}

/// What a transcode call needs once the session has accepted it.
#[derive(Debug, Clone, PartialEq)]
pub struct TrimRequest {
    pub id: AssetId,
    pub start_seconds: f64,
    pub end_seconds: f64,
}

/// The editor's working state: an ordered sequence of asset ids, the focused asset,
/// player state, the last merge output and the notice channel.
///
/// The sequence holds ids only; asset data is always resolved against the catalog.
#[derive(Debug, Clone, Default)]
pub struct EditSession {
    sequence: Vec<AssetId>,
    focus: Option<AssetId>,
    playback: PlaybackState,
    last_merge: Option<MergeResult>,
    notice: Option<Notice>,
    processing: bool,
    next_notice_id: u64,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sequence(&self) -> &[AssetId] {
        &self.sequence
    }

    pub fn focus(&self) -> Option<&AssetId> {
        self.focus.as_ref()
    }

    pub fn playback(&self) -> &PlaybackState {
        &self.playback
    }

    pub fn last_merge(&self) -> Option<&MergeResult> {
        self.last_merge.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    /// Sequence members resolved against the catalog, in order. Members missing from the
    /// catalog are skipped.
    pub fn resolved<'a>(&self, catalog: &'a AssetCatalog) -> Vec<&'a Asset> {
        self.sequence.iter().filter_map(|id| catalog.get(id)).collect()
    }

    /// Seed from the selection when it is non-empty, otherwise from the whole catalog.
    pub fn seed(&mut self, selection: &SelectionSet, catalog: &AssetCatalog) {
        let mut sequence: Vec<AssetId> = Vec::new();
        let source = if selection.is_empty() {
            catalog.ids()
        } else {
            selection.ids().to_vec()
        };
        for id in source {
            if catalog.contains(&id) && !sequence.contains(&id) {
                sequence.push(id);
            }
        }
        self.focus = sequence.first().cloned();
        self.sequence = sequence;
        self.playback = PlaybackState::default();
        self.last_merge = None;
        self.notice = None;
    }

    pub fn move_up(&mut self, index: usize) -> bool {
        if index == 0 || index >= self.sequence.len() {
            return false;
        }
        self.sequence.swap(index - 1, index);
        true
    }

    pub fn move_down(&mut self, index: usize) -> bool {
        if index + 1 >= self.sequence.len() {
            return false;
        }
        self.sequence.swap(index, index + 1);
        true
    }

    /// Remove the member at `index`. Removing the focused asset moves focus to the new
    /// first member.
    pub fn remove(&mut self, index: usize) -> Option<AssetId> {
        if index >= self.sequence.len() {
            return None;
        }
        let removed = self.sequence.remove(index);
        if self.focus.as_ref() == Some(&removed) {
            let next = self.sequence.first().cloned();
            self.set_focus(next);
        }
        Some(removed)
    }

    /// Focusing an asset outside the sequence is refused without mutation.
    pub fn select_focus(&mut self, id: &AssetId) -> StudioResult<()> {
        if !self.sequence.contains(id) {
            return Err(StudioError::StaleReference(id.clone()));
        }
        if self.focus.as_ref() != Some(id) {
            self.set_focus(Some(id.clone()));
        }
        Ok(())
    }

    /// Drop members that left the catalog and repair the focus pointer.
    pub fn reconcile(&mut self, catalog: &AssetCatalog) -> usize {
        let before = self.sequence.len();
        self.sequence.retain(|id| catalog.contains(id));
        let focus_valid = self
            .focus
            .as_ref()
            .is_some_and(|id| self.sequence.contains(id));
        if !focus_valid {
            let next = self.sequence.first().cloned();
            if next != self.focus {
                self.set_focus(next);
            }
        }
        before - self.sequence.len()
    }

    /// The player finished loading the focused asset's metadata.
    pub fn load_metadata(&mut self, duration: f64, catalog: &mut AssetCatalog) -> StudioResult<()> {
        if !duration.is_finite() || duration < 0.0 {
            return Err(StudioError::validation("Invalid video duration"));
        }
        let id = self
            .focus
            .clone()
            .ok_or_else(|| StudioError::validation("No video is selected"))?;
        catalog.set_duration(&id, duration)?;
        self.playback.duration = duration;
        self.playback.trim_start = 0.0;
        self.playback.trim_end = duration;
        Ok(())
    }

    /// Clamp a slider range into `[0, duration]`.
    pub fn set_trim_range(&mut self, start: f64, end: f64) {
        let duration = self.playback.duration;
        self.playback.trim_start = start.clamp(0.0, duration);
        self.playback.trim_end = end.clamp(0.0, duration);
    }

    pub fn seek(&mut self, position: f64) {
        self.playback.position = position.clamp(0.0, self.playback.duration);
    }

    pub fn toggle_play(&mut self) -> bool {
        if self.focus.is_some() {
            self.playback.playing = !self.playback.playing;
        }
        self.playback.playing
    }

    pub fn pause(&mut self) {
        self.playback.playing = false;
    }

    /// Validate a trim and mark the session busy. Nothing else changes on rejection.
    pub fn begin_trim(
        &mut self,
        id: &AssetId,
        start_seconds: f64,
        end_seconds: f64,
        catalog: &AssetCatalog,
    ) -> StudioResult<TrimRequest> {
        self.ensure_idle()?;
        if !(start_seconds >= 0.0 && start_seconds < end_seconds) {
            return Err(StudioError::validation("Start time must be less than end time"));
        }
        let asset = catalog
            .get(id)
            .ok_or_else(|| StudioError::StaleReference(id.clone()))?;
        if !asset.has_playable_duration() {
            return Err(StudioError::validation(
                "Video duration is not known yet; wait for the video to load",
            ));
        }
        self.processing = true;
        Ok(TrimRequest {
            id: id.clone(),
            start_seconds,
            end_seconds,
        })
    }

    /// Apply a successful trim. An asset that left the catalog while the call was in flight
    /// is not resurrected: the result is reported as stale and nothing changes.
    pub fn complete_trim(
        &mut self,
        id: &AssetId,
        new_url: &str,
        catalog: &mut AssetCatalog,
    ) -> StudioResult<u64> {
        self.processing = false;
        catalog.replace_url(id, new_url)?;
        if self.focus.as_ref() == Some(id) {
            self.playback = PlaybackState::default();
        }
        Ok(self.post(NoticeLevel::Success, TRIM_SUCCESS))
    }

    pub fn begin_merge(&mut self, ids: &[AssetId], catalog: &AssetCatalog) -> StudioResult<()> {
        self.ensure_idle()?;
        if ids.len() < 2 {
            return Err(StudioError::validation(
                "At least 2 videos are required for merging",
            ));
        }
        if let Some(missing) = ids.iter().find(|id| !catalog.contains(id)) {
            return Err(StudioError::StaleReference(missing.clone()));
        }
        self.processing = true;
        Ok(())
    }

    /// Record the merge output. The working sequence is left alone.
    pub fn complete_merge(&mut self, result: MergeResult, catalog: &mut AssetCatalog) -> u64 {
        self.processing = false;
        catalog.insert(Asset::new(result.id.clone(), result.url.clone()).with_name(result.id.as_str()));
        self.last_merge = Some(result);
        self.post(NoticeLevel::Success, MERGE_SUCCESS)
    }

    /// A transcode call that was in flight failed. Only the busy flag and the notice change.
    pub fn fail(&mut self, operation: &str, error: &StudioError) -> u64 {
        self.processing = false;
        self.reject(operation, error)
    }

    /// A transcode request was refused before it started. A call already in flight stays busy.
    pub fn reject(&mut self, operation: &str, error: &StudioError) -> u64 {
        self.post(NoticeLevel::Error, &format!("{} failed: {}", operation, error))
    }

    /// Clear the notice only if it is still the one `id` refers to.
    pub fn expire_notice(&mut self, id: u64) -> bool {
        if self.notice.as_ref().is_some_and(|n| n.id == id) {
            self.notice = None;
            return true;
        }
        false
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn merge_download_name(&self) -> Option<String> {
        self.last_merge
            .as_ref()
            .map(|merge| format!("merged_video_{}.mp4", merge.id))
    }

    fn ensure_idle(&self) -> StudioResult<()> {
        if self.processing {
            return Err(StudioError::validation(
                "Another edit is still processing",
            ));
        }
        Ok(())
    }

    fn set_focus(&mut self, focus: Option<AssetId>) {
        self.focus = focus;
        self.playback = PlaybackState::default();
        self.last_merge = None;
    }

    fn post(&mut self, level: NoticeLevel, message: &str) -> u64 {
        self.next_notice_id += 1;
        self.notice = Some(Notice {
            id: self.next_notice_id,
            level,
            message: message.to_string(),
        });
        self.next_notice_id
    }
}
