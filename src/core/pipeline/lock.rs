// ─── Version Lock ───
// Advisory lock file that keeps two launches from installing the same
// version at once. Holds `{pid, timestamp}` so abandoned locks can be reaped.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::error::{LauncherError, LauncherResult};

const RETRY_DELAY: Duration = Duration::from_millis(250);

/// Removes the lock file when dropped.
#[derive(Debug)]
pub struct VersionLockGuard {
    path: PathBuf,
}

impl VersionLockGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for VersionLockGuard {
    fn drop(&mut self) {
        if let Err(source) = std::fs::remove_file(&self.path) {
            warn!("Failed to remove lock {:?}: {}", self.path, source);
        }
    }
}

/// Takes the lock at `lock_path`, waiting up to `wait` for a live holder.
///
/// Fails with [`LauncherError::Busy`] when the wait runs out and with
/// [`LauncherError::Cancelled`] when `cancel` fires first.
pub async fn acquire_version_lock(
    lock_path: &Path,
    version_id: &str,
    stale_after_secs: i64,
    wait: Duration,
    cancel: &CancellationToken,
) -> LauncherResult<VersionLockGuard> {
    if let Some(parent) = lock_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| LauncherError::io(parent, e))?;
    }

    let started = Instant::now();
    let mut attempts = 0_u32;
    loop {
        attempts += 1;
        match tokio::fs::OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(lock_path)
            .await
        {
            Ok(mut file) => {
                let payload = serde_json::json!({
                    "pid": std::process::id(),
                    "timestamp": Utc::now().timestamp(),
                });
                file.write_all(payload.to_string().as_bytes())
                    .await
                    .map_err(|source| LauncherError::io(lock_path, source))?;
                debug!("Acquired version lock {:?}", lock_path);
                return Ok(VersionLockGuard {
                    path: lock_path.to_path_buf(),
                });
            }
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                if cleanup_stale_lock(lock_path, stale_after_secs).await {
                    continue;
                }
                if started.elapsed() >= wait {
                    return Err(LauncherError::Busy(version_id.to_string()));
                }
                if attempts % 20 == 0 {
                    info!("Waiting for version lock at {:?}", lock_path);
                }
                tokio::select! {
                    _ = cancel.cancelled() => return Err(LauncherError::Cancelled),
                    _ = tokio::time::sleep(RETRY_DELAY) => {}
                }
            }
            Err(source) => return Err(LauncherError::io(lock_path, source)),
        }
    }
}

/// Deletes the lock when its holder is gone or it is older than
/// `stale_after_secs`. Returns whether it was removed.
async fn cleanup_stale_lock(lock_path: &Path, stale_after_secs: i64) -> bool {
    let Ok(content) = tokio::fs::read_to_string(lock_path).await else {
        return false;
    };
    let Ok(value) = serde_json::from_str::<serde_json::Value>(&content) else {
        // Holder may still be writing its payload; only age can tell.
        if lock_file_age_secs(lock_path).await > stale_after_secs {
            warn!("Removing unreadable stale version lock {:?}", lock_path);
            return tokio::fs::remove_file(lock_path).await.is_ok();
        }
        return false;
    };

    let pid = value
        .get("pid")
        .and_then(|v| v.as_u64())
        .unwrap_or_default() as u32;
    let timestamp = value
        .get("timestamp")
        .and_then(|v| v.as_i64())
        .unwrap_or_default();
    let expired = Utc::now().timestamp().saturating_sub(timestamp) > stale_after_secs;

    #[cfg(target_os = "linux")]
    let dead = !PathBuf::from(format!("/proc/{pid}")).exists();
    #[cfg(not(target_os = "linux"))]
    let dead = false;

    if expired || dead {
        warn!("Removing stale version lock {:?} (pid {})", lock_path, pid);
        return tokio::fs::remove_file(lock_path).await.is_ok();
    }
    false
}

/// Seconds since the lock file was last modified; 0 when unknown.
async fn lock_file_age_secs(lock_path: &Path) -> i64 {
    let Ok(modified) = tokio::fs::metadata(lock_path)
        .await
        .and_then(|meta| meta.modified())
    else {
        return 0;
    };
    let modified: DateTime<Utc> = modified.into();
    Utc::now().timestamp().saturating_sub(modified.timestamp())
}
