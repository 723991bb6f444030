use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};

/// File downloader over a shared HTTP client.
///
/// Every file is streamed into a uniquely named `.part` sibling and renamed
/// into place once complete, so a destination path either is absent or holds
/// a whole response body.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
}

impl Downloader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    // ── Single file download ────────────────────────────

    /// Download `url` to `dest`, creating parent directories as needed.
    ///
    /// Returns the number of bytes written. Non-2xx statuses fail with
    /// [`LauncherError::DownloadFailed`] and leave `dest` untouched.
    pub async fn download_file(&self, url: &str, dest: &Path) -> LauncherResult<u64> {
        create_parent(dest).await?;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let part = part_path(dest);
        let written = match stream_to(&part, response).await {
            Ok(n) => n,
            Err(e) => {
                let _ = tokio::fs::remove_file(&part).await;
                return Err(e);
            }
        };
        promote(&part, dest).await?;

        debug!("Downloaded: {} -> {:?} ({} bytes)", url, dest, written);
        Ok(written)
    }
}

/// Writes `bytes` to `dest` through a `.part` sibling and a rename.
pub async fn write_atomic(dest: &Path, bytes: &[u8]) -> LauncherResult<()> {
    create_parent(dest).await?;
    let part = part_path(dest);
    if let Err(e) = tokio::fs::write(&part, bytes).await {
        let _ = tokio::fs::remove_file(&part).await;
        return Err(LauncherError::io(&part, e));
    }
    promote(&part, dest).await
}

async fn create_parent(dest: &Path) -> LauncherResult<()> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| LauncherError::io(parent, e))?;
    }
    Ok(())
}

/// Unique per call so concurrent writers of one path never share a file.
fn part_path(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "download".to_string());
    dest.with_file_name(format!(".{name}.{}.part", uuid::Uuid::new_v4().simple()))
}

async fn stream_to(part: &Path, response: reqwest::Response) -> LauncherResult<u64> {
    let mut file = tokio::fs::File::create(part)
        .await
        .map_err(|e| LauncherError::io(part, e))?;
    let mut body = response.bytes_stream();
    let mut written = 0u64;
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)
            .await
            .map_err(|e| LauncherError::io(part, e))?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(|e| LauncherError::io(part, e))?;
    // Handle must be closed before the rename on Windows.
    drop(file);
    Ok(written)
}

async fn promote(part: &Path, dest: &Path) -> LauncherResult<()> {
    if let Err(e) = tokio::fs::rename(part, dest).await {
        let _ = tokio::fs::remove_file(part).await;
        return Err(LauncherError::io(dest, e));
    }
    Ok(())
}
