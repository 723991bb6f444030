// ─── Library Resolver ───
// Walks a descriptor's library list in order, applies platform rules and
// fetches missing artifacts and native classifiers into the libraries root.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::downloader::Downloader;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::pipeline::LaunchReporter;
use crate::core::state::GameLayout;
use crate::core::version::{Artifact, LibraryEntry, Platform};

/// One artifact that could not be fetched. Its path stays in the resolved
/// set; later stages decide whether the gap matters.
#[derive(Debug)]
pub struct LibraryFailure {
    pub library: String,
    pub url: String,
    pub error: LauncherError,
}

/// Output of [`LibraryResolver::resolve`].
#[derive(Debug, Default)]
pub struct LibraryResolution {
    /// Every resolved local path in descriptor order, first occurrence kept.
    pub paths: Vec<PathBuf>,
    /// The native-classifier subset of `paths`.
    pub natives: Vec<PathBuf>,
    pub failures: Vec<LibraryFailure>,
}

impl LibraryResolution {
    fn push(&mut self, path: PathBuf, seen: &mut HashSet<PathBuf>, native: bool) {
        if !seen.insert(path.clone()) {
            return;
        }
        if native {
            self.natives.push(path.clone());
        }
        self.paths.push(path);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArtifactKind {
    Library,
    Native,
}

impl ArtifactKind {
    fn label(self) -> &'static str {
        match self {
            ArtifactKind::Library => "library",
            ArtifactKind::Native => "native",
        }
    }
}

pub struct LibraryResolver<'a> {
    downloader: &'a Downloader,
    layout: &'a GameLayout,
    platform: Platform,
}

impl<'a> LibraryResolver<'a> {
    pub fn new(downloader: &'a Downloader, layout: &'a GameLayout) -> Self {
        Self {
            downloader,
            layout,
            platform: Platform::current(),
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Resolves `libraries` sequentially.
    ///
    /// Individual fetch failures are logged and collected; only cancellation
    /// aborts the walk.
    pub async fn resolve(
        &self,
        libraries: &[LibraryEntry],
        reporter: &dyn LaunchReporter,
        cancel: &CancellationToken,
    ) -> LauncherResult<LibraryResolution> {
        let mut resolution = LibraryResolution::default();
        let mut seen = HashSet::new();
        let mut skipped = 0usize;

        for entry in libraries {
            if cancel.is_cancelled() {
                return Err(LauncherError::Cancelled);
            }

            // ── Evaluate OS rules ──
            if !entry.is_allowed_on(self.platform) {
                debug!("Skipping library (OS rule): {}", entry.display_name());
                skipped += 1;
                continue;
            }

            // ── Main artifact ──
            if let Some(artifact) = &entry.artifact {
                let path = self
                    .fetch_missing(entry, artifact, ArtifactKind::Library, reporter, &mut resolution)
                    .await;
                resolution.push(path, &mut seen, false);
            }

            // ── Native classifier ──
            if let Some(native) = entry.native_artifact(self.platform) {
                let path = self
                    .fetch_missing(entry, native, ArtifactKind::Native, reporter, &mut resolution)
                    .await;
                resolution.push(path, &mut seen, true);
            }
        }

        info!(
            "Resolved {} library paths ({} natives, {} skipped by rules, {} failed)",
            resolution.paths.len(),
            resolution.natives.len(),
            skipped,
            resolution.failures.len()
        );
        Ok(resolution)
    }

    /// Local path of `artifact`, downloading it first when absent.
    async fn fetch_missing(
        &self,
        entry: &LibraryEntry,
        artifact: &Artifact,
        kind: ArtifactKind,
        reporter: &dyn LaunchReporter,
        resolution: &mut LibraryResolution,
    ) -> PathBuf {
        let dest = self.layout.library_path(&artifact.path);
        if dest.exists() {
            return dest;
        }

        let Some(url) = artifact.url.as_deref() else {
            warn!(
                "No download URL for {} {} ({})",
                kind.label(),
                entry.display_name(),
                artifact.path
            );
            return dest;
        };

        match self.downloader.download_file(url, &dest).await {
            Ok(_) => {
                reporter.log(&format!("  Downloaded {}: {}", kind.label(), file_name(&dest)));
            }
            Err(error) => {
                warn!("Failed to download {} {}: {}", kind.label(), url, error);
                reporter.log(&format!("  Failed to download {}: {}", kind.label(), error));
                resolution.failures.push(LibraryFailure {
                    library: entry.display_name().to_string(),
                    url: url.to_string(),
                    error,
                });
            }
        }
        dest
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}
