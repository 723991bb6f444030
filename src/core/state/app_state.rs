use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::error::{LauncherError, LauncherResult};

const APP_DIR_NAME: &str = "catclient";
const SETTINGS_FILE: &str = "launcher_settings.json";
const HOME_ENV: &str = "CATCLIENT_HOME";

pub const DEFAULT_MANIFEST_URL: &str =
    "https://launchermeta.mojang.com/mc/game/version_manifest_v2.json";
pub const DEFAULT_RESOURCES_URL: &str = "https://resources.download.minecraft.net/";
pub const DEFAULT_LEGACY_CLIENT_BASE: &str = "https://s3.amazonaws.com/Minecraft.Download/versions";

/// Upper bound for the asset fetch pool, whatever the settings say.
pub const MAX_ASSET_CONCURRENCY: usize = 8;

/// Persisted launcher settings (`launcher_settings.json` in the data root).
///
/// Every field has a default so older or partial files keep loading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LauncherSettings {
    pub manifest_url: String,
    /// Base for asset objects; `<hash[0:2]>/<hash>` is appended.
    pub resources_url: String,
    /// Base for client jars of descriptors without `downloads.client.url`.
    pub legacy_client_base: Option<String>,
    pub java_path: PathBuf,
    pub max_memory: String,
    pub min_memory: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub asset_concurrency: usize,
    /// Asset progress is reported every this many completions.
    pub progress_every: usize,
    /// Kill the game process when a running launch is cancelled.
    pub kill_on_cancel: bool,
    /// A version lock older than this is considered abandoned.
    pub version_lock_stale_secs: i64,
    /// How long a launch waits for another launch of the same version.
    pub version_lock_wait_secs: u64,
}

impl Default for LauncherSettings {
    fn default() -> Self {
        Self {
            manifest_url: DEFAULT_MANIFEST_URL.into(),
            resources_url: DEFAULT_RESOURCES_URL.into(),
            legacy_client_base: Some(DEFAULT_LEGACY_CLIENT_BASE.into()),
            java_path: PathBuf::from("java"),
            max_memory: "2G".into(),
            min_memory: "512M".into(),
            connect_timeout_secs: 15,
            request_timeout_secs: 60,
            asset_concurrency: MAX_ASSET_CONCURRENCY,
            progress_every: 50,
            kill_on_cancel: true,
            version_lock_stale_secs: 60 * 10,
            version_lock_wait_secs: 30,
        }
    }
}

impl LauncherSettings {
    /// Effective pool size for `needed` missing objects.
    pub fn asset_pool_size(&self, needed: usize) -> usize {
        self.asset_concurrency
            .clamp(1, MAX_ASSET_CONCURRENCY)
            .min(needed)
    }

    /// Loads settings from `data_dir`, falling back to defaults when the
    /// file is missing or unreadable.
    pub fn load(data_dir: &Path) -> Self {
        let path = data_dir.join(SETTINGS_FILE);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(_) => {
                debug!("No settings at {:?}, using defaults", path);
                return Self::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Ignoring unreadable settings {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    pub fn save(&self, data_dir: &Path) -> LauncherResult<()> {
        std::fs::create_dir_all(data_dir).map_err(|e| LauncherError::io(data_dir, e))?;
        let path = data_dir.join(SETTINGS_FILE);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json).map_err(|e| LauncherError::io(path, e))
    }
}

/// Root directory holding versions, libraries, assets and natives.
///
/// `CATCLIENT_HOME` wins; otherwise `%APPDATA%/.catclient` on Windows,
/// `~/Library/Application Support/catclient` on macOS and `~/.catclient`
/// elsewhere.
pub fn default_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }

    if cfg!(target_os = "windows") {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(format!(".{APP_DIR_NAME}"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME)
    } else {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(format!(".{APP_DIR_NAME}"))
    }
}
