// ─── Launch Pipeline ───
// One sequential attempt per launch: descriptor → client jar → libraries →
// assets → natives → command → process. Every stage reports through a
// `LaunchReporter`; any error ends the attempt and leaves the launcher ready
// for the next one.

mod lock;
mod reporter;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::core::assets::{AssetIndex, AssetSynchronizer};
use crate::core::auth::IdentityProvider;
use crate::core::downloader::Downloader;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::build_http_client;
use crate::core::launch::{build_command, extract_natives, probe_java, CommandInputs, GameProcess};
use crate::core::libraries::LibraryResolver;
use crate::core::state::{GameLayout, LauncherSettings};
use crate::core::version::{Platform, VersionCatalog, VersionDescriptor};

pub use lock::{acquire_version_lock, VersionLockGuard};
pub use reporter::{LaunchReporter, RecordingReporter, ReportEvent, TracingReporter};

pub const STATUS_PREPARING: &str = "Preparing...";
pub const STATUS_READY: &str = "Ready";
pub const STATUS_FAILED: &str = "Launch failed";

/// Progress value reported after each stage.
pub mod milestones {
    pub const DESCRIPTOR: u8 = 10;
    pub const CLIENT_JAR: u8 = 20;
    pub const LIBRARIES: u8 = 55;
    pub const ASSETS: u8 = 65;
    pub const NATIVES: u8 = 75;
    pub const COMMAND: u8 = 90;
    pub const SPAWNED: u8 = 100;
    pub const EXITED: u8 = 0;
}

/// Owns everything shared between launch attempts.
pub struct Launcher {
    settings: LauncherSettings,
    layout: GameLayout,
    client: reqwest::Client,
    downloader: Downloader,
    catalog: VersionCatalog,
    platform: Platform,
}

impl Launcher {
    pub fn new(settings: LauncherSettings, data_dir: impl AsRef<Path>) -> LauncherResult<Self> {
        let layout = GameLayout::new(data_dir.as_ref());
        layout.ensure()?;
        let client = build_http_client(&settings)?;
        let downloader = Downloader::new(client.clone());
        Ok(Self {
            settings,
            layout,
            client,
            downloader,
            catalog: VersionCatalog::new(),
            platform: Platform::current(),
        })
    }

    /// Overrides the detected platform; rules and JVM flags follow it.
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn settings(&self) -> &LauncherSettings {
        &self.settings
    }

    pub fn layout(&self) -> &GameLayout {
        &self.layout
    }

    pub fn catalog(&self) -> &VersionCatalog {
        &self.catalog
    }

    /// Fetches the manifest and returns the release ids offered for launch.
    pub async fn refresh_versions(&self) -> LauncherResult<Vec<String>> {
        self.catalog
            .refresh(&self.client, &self.settings.manifest_url)
            .await?;
        let releases = self.release_ids();
        if releases.is_empty() {
            warn!("Manifest contained no release versions");
        }
        Ok(releases)
    }

    /// Release ids from the current catalog snapshot, in manifest order.
    pub fn release_ids(&self) -> Vec<String> {
        self.catalog.snapshot().release_ids()
    }

    /// Runs one launch attempt to completion and returns the game's exit
    /// code.
    ///
    /// `version_id` may name any manifest entry; the release filter of
    /// [`Launcher::release_ids`] only applies to what is offered for
    /// selection.
    ///
    /// Failures are reported as `Launch failed` and returned; the launcher
    /// stays usable either way.
    pub async fn launch(
        &self,
        version_id: &str,
        identity: &dyn IdentityProvider,
        reporter: &dyn LaunchReporter,
        cancel: &CancellationToken,
    ) -> LauncherResult<Option<i32>> {
        reporter.status(STATUS_PREPARING);
        reporter.log(&format!("=== Starting launch for {version_id} ==="));

        match self.run_attempt(version_id, identity, reporter, cancel).await {
            Ok(code) => {
                reporter.status(STATUS_READY);
                reporter.progress(milestones::EXITED);
                Ok(code)
            }
            Err(err) => {
                error!("Launch of {} failed ({:?}): {}", version_id, err.category(), err);
                reporter.log(&format!("Launch error: {err}"));
                reporter.status(STATUS_FAILED);
                Err(err)
            }
        }
    }

    /// Submits [`Launcher::launch`] to the runtime and returns immediately.
    pub fn spawn_launch(
        self: &Arc<Self>,
        version_id: String,
        identity: Arc<dyn IdentityProvider>,
        reporter: Arc<dyn LaunchReporter>,
        cancel: CancellationToken,
    ) -> JoinHandle<LauncherResult<Option<i32>>> {
        let launcher = Arc::clone(self);
        tokio::spawn(async move {
            launcher
                .launch(&version_id, identity.as_ref(), reporter.as_ref(), &cancel)
                .await
        })
    }

    async fn run_attempt(
        &self,
        version_id: &str,
        identity: &dyn IdentityProvider,
        reporter: &dyn LaunchReporter,
        cancel: &CancellationToken,
    ) -> LauncherResult<Option<i32>> {
        let identity = identity.identity().await?;

        if self.catalog.is_empty() {
            self.refresh_versions().await?;
        }
        let summary = self
            .catalog
            .find(version_id)
            .ok_or_else(|| LauncherError::VersionNotFound(version_id.to_string()))?;

        let lock = acquire_version_lock(
            &self.layout.version_lock(version_id),
            version_id,
            self.settings.version_lock_stale_secs,
            Duration::from_secs(self.settings.version_lock_wait_secs),
            cancel,
        )
        .await?;

        // ── Descriptor ──
        if !self.layout.descriptor_path(version_id).exists() {
            reporter.log("Downloading version JSON...");
        }
        let descriptor =
            VersionDescriptor::load_or_fetch(&self.client, &self.layout, &summary).await?;
        reporter.progress(milestones::DESCRIPTOR);

        // ── Client jar ──
        let jar_path = self.layout.client_jar(version_id);
        if !jar_path.exists() {
            let url = descriptor.client_download_url(self.settings.legacy_client_base.as_deref())?;
            reporter.log("Downloading client JAR...");
            self.downloader.download_file(&url, &jar_path).await?;
        }
        let jar_size = tokio::fs::metadata(&jar_path)
            .await
            .map_err(|e| LauncherError::io(&jar_path, e))?
            .len();
        reporter.log(&format!("Client size: {} KB", jar_size / 1024));
        reporter.progress(milestones::CLIENT_JAR);
        ensure_active(cancel)?;

        // ── Libraries ──
        reporter.log("Resolving libraries...");
        let libraries = LibraryResolver::new(&self.downloader, &self.layout)
            .with_platform(self.platform)
            .resolve(&descriptor.libraries, reporter, cancel)
            .await?;
        reporter.progress(milestones::LIBRARIES);

        // ── Assets ──
        reporter.log("Downloading assets...");
        match &descriptor.asset_index {
            Some(index_ref) => {
                let index = AssetIndex::load_or_fetch(&self.client, &self.layout, index_ref).await?;
                AssetSynchronizer::new(&self.downloader, &self.layout, &self.settings)
                    .sync(&index, reporter, cancel)
                    .await;
            }
            None => info!("{} has no asset index; using legacy assets", version_id),
        }
        ensure_active(cancel)?;
        reporter.progress(milestones::ASSETS);

        // ── Natives ──
        reporter.log("Extracting natives...");
        let natives_dir = self.layout.natives_dir(version_id);
        extract_natives(&libraries.paths, &natives_dir, reporter).await?;
        reporter.progress(milestones::NATIVES);

        // ── Command ──
        let runtime = probe_java(&self.settings.java_path).await;
        if runtime.is_none() {
            warn!("Java runtime probe failed for {:?}", self.settings.java_path);
        }
        let command = build_command(&CommandInputs {
            java: &self.settings.java_path,
            platform: self.platform,
            runtime_version: runtime.as_ref().map(|r| r.version.as_str()),
            max_memory: &self.settings.max_memory,
            min_memory: &self.settings.min_memory,
            layout: &self.layout,
            descriptor: &descriptor,
            identity: &identity,
            library_paths: &libraries.paths,
        });
        reporter.log(&format!("Launch command: {}", command.display()));
        reporter.progress(milestones::COMMAND);
        ensure_active(cancel)?;

        // ── Process ──
        let process = GameProcess::spawn(&command)?;
        drop(lock);
        reporter.progress(milestones::SPAWNED);
        match process.pid() {
            Some(pid) => reporter.status(&format!("Game running (PID {pid})")),
            None => reporter.status("Game running"),
        }

        let exit = process
            .supervise(reporter, cancel, self.settings.kill_on_cancel)
            .await?;
        match exit.code {
            Some(code) => reporter.log(&format!("Game exited with code {code}")),
            None => reporter.log("Game exited without an exit code"),
        }
        if exit.killed {
            return Err(LauncherError::Cancelled);
        }
        Ok(exit.code)
    }
}

fn ensure_active(cancel: &CancellationToken) -> LauncherResult<()> {
    if cancel.is_cancelled() {
        return Err(LauncherError::Cancelled);
    }
    Ok(())
}
