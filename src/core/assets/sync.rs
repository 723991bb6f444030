// ─── Asset Synchronizer ───
// Diffs the content-addressed object store against an index and fetches the
// missing objects on a bounded pool.

use std::sync::atomic::{AtomicUsize, Ordering};

use futures_util::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::core::downloader::Downloader;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::pipeline::LaunchReporter;
use crate::core::state::{GameLayout, LauncherSettings};

use super::asset_index::AssetIndex;

/// Result of fetching one missing object.
#[derive(Debug)]
pub struct AssetFetchOutcome {
    pub hash: String,
    pub result: LauncherResult<u64>,
}

#[derive(Debug, Default)]
pub struct AssetSyncReport {
    /// Distinct objects in the index.
    pub total: usize,
    /// Objects already present before the pass.
    pub cached: usize,
    /// One outcome per dispatched fetch, in completion order.
    pub outcomes: Vec<AssetFetchOutcome>,
}

impl AssetSyncReport {
    pub fn fetched(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.fetched()
    }

    /// True when every object was already cached.
    pub fn already_cached(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// `<base>/<hash[0:2]>/<hash>` with exactly one slash after the base.
pub fn object_url(resources_url: &str, hash: &str) -> String {
    let prefix = hash.get(..2).unwrap_or(hash);
    format!("{}/{}/{}", resources_url.trim_end_matches('/'), prefix, hash)
}

pub struct AssetSynchronizer<'a> {
    downloader: &'a Downloader,
    layout: &'a GameLayout,
    settings: &'a LauncherSettings,
}

impl<'a> AssetSynchronizer<'a> {
    pub fn new(
        downloader: &'a Downloader,
        layout: &'a GameLayout,
        settings: &'a LauncherSettings,
    ) -> Self {
        Self {
            downloader,
            layout,
            settings,
        }
    }

    /// Hashes of `index` whose object file is absent, in index order.
    pub fn missing(&self, index: &AssetIndex) -> Vec<String> {
        index
            .hashes
            .iter()
            .filter(|hash| !self.layout.asset_object(hash).exists())
            .cloned()
            .collect()
    }

    /// Fetches every missing object of `index`.
    ///
    /// The call returns once every dispatched fetch has finished. Failures
    /// are logged and recorded without cancelling siblings; nothing is
    /// retried. Once `cancel` fires no new fetch starts and in-flight ones
    /// resolve as [`LauncherError::Cancelled`].
    pub async fn sync(
        &self,
        index: &AssetIndex,
        reporter: &dyn LaunchReporter,
        cancel: &CancellationToken,
    ) -> AssetSyncReport {
        let needed = self.missing(index);
        let mut report = AssetSyncReport {
            total: index.len(),
            cached: index.len() - needed.len(),
            outcomes: Vec::new(),
        };

        if needed.is_empty() {
            reporter.log("All assets already cached.");
            return report;
        }

        let pool = self.settings.asset_pool_size(needed.len());
        let every = self.settings.progress_every.max(1);
        let wanted = needed.len();
        reporter.log(&format!("Downloading {wanted} assets..."));
        info!(
            "Asset sync {}: {} missing of {}, pool={}",
            index.id, wanted, report.total, pool
        );

        let done = AtomicUsize::new(0);
        report.outcomes = stream::iter(needed)
            .map(|hash| {
                let done = &done;
                async move {
                    let result = self.fetch_one(&hash, cancel).await;
                    if let Err(e) = &result {
                        if !matches!(e, LauncherError::Cancelled) {
                            warn!("Asset {} failed: {}", hash, e);
                            reporter.log(&format!("  Asset download failed: {e}"));
                        }
                    }
                    let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                    if finished % every == 0 {
                        reporter.log(&format!("  Assets: {finished}/{wanted}"));
                    }
                    AssetFetchOutcome { hash, result }
                }
            })
            .buffer_unordered(pool)
            .collect()
            .await;

        info!(
            "Asset sync {} finished: {} fetched, {} failed",
            index.id,
            report.fetched(),
            report.failed()
        );
        reporter.log("Assets download complete.");
        report
    }

    async fn fetch_one(&self, hash: &str, cancel: &CancellationToken) -> LauncherResult<u64> {
        if cancel.is_cancelled() {
            return Err(LauncherError::Cancelled);
        }
        let url = object_url(&self.settings.resources_url, hash);
        let dest = self.layout.asset_object(hash);
        tokio::select! {
            _ = cancel.cancelled() => Err(LauncherError::Cancelled),
            result = self.downloader.download_file(&url, &dest) => result,
        }
    }
}
