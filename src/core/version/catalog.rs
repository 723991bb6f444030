// ─── Version Catalog ───
// Shared read-only snapshot of the manifest. A refresh builds a complete new
// manifest and swaps it in; readers never see a half-filled list.

use std::sync::{Arc, RwLock};

use tracing::info;

use crate::core::error::LauncherResult;

use super::manifest::{VersionManifest, VersionSummary};

#[derive(Debug, Default)]
pub struct VersionCatalog {
    current: RwLock<Arc<VersionManifest>>,
}

impl VersionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot; cheap to clone and safe to hold across awaits.
    pub fn snapshot(&self) -> Arc<VersionManifest> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Publishes `manifest` as the new snapshot.
    pub fn replace(&self, manifest: VersionManifest) -> Arc<VersionManifest> {
        let next = Arc::new(manifest);
        match self.current.write() {
            Ok(mut guard) => *guard = Arc::clone(&next),
            Err(poisoned) => *poisoned.into_inner() = Arc::clone(&next),
        }
        next
    }

    /// Fetches the manifest and publishes it. On failure the previous
    /// snapshot stays in place.
    pub async fn refresh(
        &self,
        client: &reqwest::Client,
        url: &str,
    ) -> LauncherResult<Arc<VersionManifest>> {
        let manifest = VersionManifest::fetch(client, url).await?;
        let snapshot = self.replace(manifest);
        info!(
            "Version catalog refreshed: {} entries, {} releases",
            snapshot.versions.len(),
            snapshot.releases().len()
        );
        Ok(snapshot)
    }

    pub fn find(&self, id: &str) -> Option<VersionSummary> {
        self.snapshot().find_version(id).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().versions.is_empty()
    }
}
