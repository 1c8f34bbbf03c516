use std::collections::{HashMap, HashSet};

use crate::asset::{Asset, AssetId};
use crate::error::{StudioError, StudioResult};

/// Client-side cache of every asset the transcode service knows about.
///
/// Refreshes replace the whole list (the last snapshot to complete wins), with one
/// exception: local writes made *after* a snapshot was requested survive that snapshot.
/// Every optimistic write bumps `epoch` and stamps the asset; `begin_refresh` hands out the
/// epoch a snapshot is requested at, and `apply_snapshot` keeps local state stamped later.
#[derive(Debug, Clone, Default)]
pub struct AssetCatalog {
    assets: Vec<Asset>,
    epoch: u64,
    local_writes: HashMap<AssetId, u64>,
    tombstones: HashMap<AssetId, u64>,
}

impl AssetCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_assets(assets: Vec<Asset>) -> Self {
        let mut catalog = Self::new();
        catalog.apply_snapshot(0, assets);
        catalog
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn ids(&self) -> Vec<AssetId> {
        self.assets.iter().map(|a| a.id.clone()).collect()
    }

    pub fn get(&self, id: &AssetId) -> Option<&Asset> {
        self.assets.iter().find(|a| &a.id == id)
    }

    pub fn contains(&self, id: &AssetId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Stamp for a snapshot about to be requested from the listing endpoint.
    pub fn begin_refresh(&self) -> u64 {
        self.epoch
    }

    /// Replace the catalog with a listing requested at `requested_at`.
    /// Returns the number of assets whose local state outlived the snapshot.
    pub fn apply_snapshot(&mut self, requested_at: u64, snapshot: Vec<Asset>) -> usize {
        let mut seen = HashSet::new();
        let mut kept_local = 0;
        let mut next = Vec::with_capacity(snapshot.len());

        for mut incoming in snapshot {
            if !seen.insert(incoming.id.clone()) {
                continue;
            }
            if self.removed_after(&incoming.id, requested_at) {
                continue;
            }
            if let Some(local) = self.get(&incoming.id) {
                if self.written_after(&incoming.id, requested_at) {
                    incoming = local.clone();
                    kept_local += 1;
                } else if incoming.duration_seconds.is_none() && incoming.url == local.url {
                    // the listing never reports durations; keep what the player observed
                    incoming.duration_seconds = local.duration_seconds;
                }
            }
            next.push(incoming);
        }

        for local in &self.assets {
            if !seen.contains(&local.id) && self.written_after(&local.id, requested_at) {
                next.push(local.clone());
                kept_local += 1;
            }
        }

        self.local_writes.retain(|_, at| *at > requested_at);
        self.tombstones.retain(|_, at| *at > requested_at);
        self.assets = next;
        kept_local
    }

    /// Optimistically point an asset at new content. The duration becomes unknown until
    /// the new payload is loaded.
    pub fn replace_url(&mut self, id: &AssetId, url: impl Into<String>) -> StudioResult<()> {
        let index = self
            .assets
            .iter()
            .position(|a| &a.id == id)
            .ok_or_else(|| StudioError::StaleReference(id.clone()))?;
        let stamp = self.bump();
        let asset = &mut self.assets[index];
        asset.url = url.into();
        asset.duration_seconds = None;
        self.local_writes.insert(id.clone(), stamp);
        Ok(())
    }

    /// Optimistically add an asset the service just produced.
    pub fn insert(&mut self, asset: Asset) {
        let stamp = self.bump();
        self.local_writes.insert(asset.id.clone(), stamp);
        self.tombstones.remove(&asset.id);
        match self.assets.iter_mut().find(|a| a.id == asset.id) {
            Some(existing) => *existing = asset,
            None => self.assets.push(asset),
        }
    }

    /// Record a duration observed by the player. Not a content change, so no stamp.
    pub fn set_duration(&mut self, id: &AssetId, seconds: f64) -> StudioResult<()> {
        let asset = self
            .assets
            .iter_mut()
            .find(|a| &a.id == id)
            .ok_or_else(|| StudioError::StaleReference(id.clone()))?;
        asset.duration_seconds = Some(seconds);
        Ok(())
    }

    pub fn remove(&mut self, id: &AssetId) -> Option<Asset> {
        let index = self.assets.iter().position(|a| &a.id == id)?;
        let stamp = self.bump();
        self.local_writes.remove(id);
        self.tombstones.insert(id.clone(), stamp);
        Some(self.assets.remove(index))
    }

    pub fn clear(&mut self) {
        let stamp = self.bump();
        for asset in self.assets.drain(..) {
            self.tombstones.insert(asset.id, stamp);
        }
        self.local_writes.clear();
    }

    fn bump(&mut self) -> u64 {
        self.epoch += 1;
        self.epoch
    }

    fn written_after(&self, id: &AssetId, requested_at: u64) -> bool {
        self.local_writes.get(id).is_some_and(|at| *at > requested_at)
    }

    fn removed_after(&self, id: &AssetId, requested_at: u64) -> bool {
        self.tombstones.get(id).is_some_and(|at| *at > requested_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(id: &str) -> Asset {
        Asset::new(id, format!("/videos/{}.mp4", id))
    }

    fn catalog(ids: &[&str]) -> AssetCatalog {
        AssetCatalog::from_assets(ids.iter().map(|id| asset(id)).collect())
    }

    #[test]
    fn snapshot_replaces_contents_and_drops_duplicate_ids() {
        let mut catalog = catalog(&["x", "y"]);
        let stamp = catalog.begin_refresh();
        catalog.apply_snapshot(stamp, vec![asset("z"), asset("y"), asset("z")]);
        assert_eq!(catalog.ids(), vec![AssetId::from("z"), AssetId::from("y")]);
    }

    #[test]
    fn older_snapshot_does_not_undo_optimistic_url() {
        let mut catalog = catalog(&["a"]);
        let requested_at = catalog.begin_refresh();
        catalog.replace_url(&"a".into(), "/videos/a.mp4?rev=2").unwrap();

        let kept = catalog.apply_snapshot(requested_at, vec![asset("a")]);
        assert_eq!(kept, 1);
        assert_eq!(catalog.get(&"a".into()).unwrap().url, "/videos/a.mp4?rev=2");

        // a snapshot requested after the write is authoritative again
        let later = catalog.begin_refresh();
        catalog.apply_snapshot(later, vec![asset("a")]);
        assert_eq!(catalog.get(&"a".into()).unwrap().url, "/videos/a.mp4");
    }

    #[test]
    fn older_snapshot_does_not_resurrect_removed_asset() {
        let mut catalog = catalog(&["a", "b"]);
        let requested_at = catalog.begin_refresh();
        catalog.remove(&"a".into());
        catalog.apply_snapshot(requested_at, vec![asset("a"), asset("b")]);
        assert_eq!(catalog.ids(), vec![AssetId::from("b")]);
    }

    #[test]
    fn inserted_asset_survives_snapshot_taken_before_it() {
        let mut catalog = catalog(&["a"]);
        let requested_at = catalog.begin_refresh();
        catalog.insert(asset("merged"));
        catalog.apply_snapshot(requested_at, vec![asset("a")]);
        assert!(catalog.contains(&"merged".into()));
    }

    #[test]
    fn observed_duration_survives_refresh_while_url_is_unchanged() {
        let mut catalog = catalog(&["a"]);
        catalog.set_duration(&"a".into(), 12.0).unwrap();
        let stamp = catalog.begin_refresh();
        catalog.apply_snapshot(stamp, vec![asset("a")]);
        assert_eq!(catalog.get(&"a".into()).unwrap().duration_seconds, Some(12.0));
    }

    #[test]
    fn replace_url_on_missing_asset_is_stale() {
        let mut catalog = catalog(&["a"]);
        let epoch = catalog.epoch();
        let err = catalog.replace_url(&"gone".into(), "/videos/x.mp4").unwrap_err();
        assert_eq!(err, StudioError::StaleReference("gone".into()));
        assert_eq!(catalog.get(&"a".into()).unwrap().url, "/videos/a.mp4");
        assert_eq!(catalog.epoch(), epoch);
    }
}
