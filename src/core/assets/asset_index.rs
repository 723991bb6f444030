use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::core::downloader::write_atomic;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::get_text;
use crate::core::state::GameLayout;
use crate::core::version::AssetIndexRef;

/// Content hashes referenced by one asset index.
///
/// Hashes are collected by scanning the raw text for every `"hash": "<40
/// hex>"` pair rather than walking the object map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetIndex {
    pub id: String,
    /// Distinct hashes in first-occurrence order.
    pub hashes: Vec<String>,
}

fn hash_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r#""hash"\s*:\s*"([0-9a-f]{40})""#).ok())
        .as_ref()
}

impl AssetIndex {
    pub fn from_raw(id: impl Into<String>, raw: &str) -> Self {
        let id = id.into();
        let Some(pattern) = hash_pattern() else {
            warn!("Asset hash pattern unavailable; index {} treated as empty", id);
            return Self { id, hashes: Vec::new() };
        };

        let mut seen = HashSet::new();
        let hashes = pattern
            .captures_iter(raw)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
            .filter(|hash| seen.insert(hash.clone()))
            .collect();
        Self { id, hashes }
    }

    /// Reads `assets/indexes/<id>.json`, downloading it first when absent.
    pub async fn load_or_fetch(
        client: &reqwest::Client,
        layout: &GameLayout,
        index: &AssetIndexRef,
    ) -> LauncherResult<Self> {
        let path = layout.asset_index_path(&index.id);
        if !path.exists() {
            info!("Fetching asset index {} from {}", index.id, index.url);
            let raw = get_text(client, &index.url).await?;
            write_atomic(&path, raw.as_bytes()).await?;
        } else {
            debug!("Using cached asset index {:?}", path);
        }

        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| LauncherError::io(&path, e))?;
        let parsed = Self::from_raw(index.id.clone(), &raw);
        info!("Asset index {}: {} objects", parsed.id, parsed.hashes.len());
        Ok(parsed)
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}
