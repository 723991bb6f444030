// ─── Version Descriptor ───
// Per-version JSON: client download, libraries, asset index reference and
// launch hints. Read with the structural scanner, cached on disk by id.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::core::downloader::write_atomic;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::get_text;
use crate::core::scanner::{
    iterate_top_level_objects, lookup_nested_scalar, lookup_object, lookup_scalar, object_entries,
    scalar_text,
};
use crate::core::state::GameLayout;

use super::manifest::VersionSummary;
use super::rules::{arch_bits, rules_allow, Platform, PlatformRule};

/// Index id used when a descriptor names no asset index.
pub const LEGACY_ASSET_INDEX: &str = "legacy";

/// A downloadable file with its cache-relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// `/`-separated, relative to the libraries root.
    pub path: String,
    pub url: Option<String>,
}

impl Artifact {
    fn parse(raw: &str) -> Option<Self> {
        Some(Self {
            path: lookup_scalar(raw, "path")?,
            url: lookup_scalar(raw, "url").filter(|u| !u.is_empty()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetIndexRef {
    pub id: String,
    pub url: String,
}

// ─── Library Entry ───

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryEntry {
    pub name: Option<String>,
    /// Empty when the entry carries no rules.
    pub rules: Vec<PlatformRule>,
    pub artifact: Option<Artifact>,
    /// OS name to classifier key, possibly containing `${arch}`.
    pub natives: BTreeMap<String, String>,
    /// `downloads.classifiers`, keyed by classifier.
    pub classifiers: BTreeMap<String, Artifact>,
}

impl LibraryEntry {
    pub fn parse(raw: &str) -> Self {
        let rules = iterate_top_level_objects(raw, "rules")
            .filter_map(PlatformRule::parse)
            .collect();

        let downloads = lookup_object(raw, "downloads");
        let artifact = downloads
            .and_then(|d| lookup_object(d, "artifact"))
            .and_then(Artifact::parse);
        let classifiers = downloads
            .and_then(|d| lookup_object(d, "classifiers"))
            .map(|c| {
                object_entries(c)
                    .into_iter()
                    .filter_map(|(key, value)| Artifact::parse(value).map(|a| (key, a)))
                    .collect()
            })
            .unwrap_or_default();
        let natives = lookup_object(raw, "natives")
            .map(|n| {
                object_entries(n)
                    .into_iter()
                    .filter_map(|(os, value)| scalar_text(value).map(|c| (os, c)))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            name: lookup_scalar(raw, "name"),
            rules,
            artifact,
            natives,
            classifiers,
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed library>")
    }

    pub fn is_allowed_on(&self, platform: Platform) -> bool {
        rules_allow(&self.rules, platform)
    }

    /// Classifier key selected for `platform`: the `natives` mapping with
    /// `${arch}` substituted, else `natives-<os>`.
    pub fn native_classifier(&self, platform: Platform) -> String {
        match self.natives.get(platform.as_str()) {
            Some(key) => key.replace("${arch}", arch_bits()),
            None => platform.default_native_classifier(),
        }
    }

    /// Native archive to fetch on `platform`, if the entry ships one.
    pub fn native_artifact(&self, platform: Platform) -> Option<&Artifact> {
        let key = self.native_classifier(platform);
        self.classifiers.get(&key).or_else(|| {
            if platform == Platform::Osx && !self.natives.contains_key("osx") {
                self.classifiers.get("natives-macos")
            } else {
                None
            }
        })
    }
}

// ─── Descriptor ───

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDescriptor {
    pub id: String,
    pub version_type: Option<String>,
    pub client_url: Option<String>,
    pub libraries: Vec<LibraryEntry>,
    pub asset_index: Option<AssetIndexRef>,
    pub main_class: Option<String>,
    /// Legacy space-separated `minecraftArguments`.
    pub minecraft_arguments: Option<String>,
}

impl VersionDescriptor {
    /// Parses a descriptor document. `fallback_id` names the version when
    /// the document has no `id` of its own.
    pub fn parse(fallback_id: &str, text: &str) -> LauncherResult<Self> {
        if !text.trim_start().starts_with('{') {
            return Err(LauncherError::Parse(format!(
                "descriptor for {fallback_id} is not a JSON object"
            )));
        }

        let asset_index = match (
            lookup_nested_scalar(text, &["assetIndex", "id"]),
            lookup_nested_scalar(text, &["assetIndex", "url"]),
        ) {
            (Some(id), Some(url)) => Some(AssetIndexRef { id, url }),
            _ => None,
        };

        Ok(Self {
            id: lookup_scalar(text, "id").unwrap_or_else(|| fallback_id.to_string()),
            version_type: lookup_scalar(text, "type"),
            client_url: lookup_nested_scalar(text, &["downloads", "client", "url"]),
            libraries: iterate_top_level_objects(text, "libraries")
                .map(LibraryEntry::parse)
                .collect(),
            asset_index,
            main_class: lookup_scalar(text, "mainClass"),
            minecraft_arguments: lookup_scalar(text, "minecraftArguments"),
        })
    }

    /// Loads the cached descriptor for `summary`, downloading it first when
    /// the cache has none. A cached copy is never refetched.
    pub async fn load_or_fetch(
        client: &reqwest::Client,
        layout: &GameLayout,
        summary: &VersionSummary,
    ) -> LauncherResult<Self> {
        let path = layout.descriptor_path(&summary.id);
        if !path.exists() {
            info!("Fetching descriptor for {}", summary.id);
            let raw = get_text(client, &summary.descriptor_url).await?;
            write_atomic(&path, raw.as_bytes()).await?;
        } else {
            debug!("Using cached descriptor {:?}", path);
        }

        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| LauncherError::io(&path, e))?;
        let mut descriptor = Self::parse(&summary.id, &raw)?;
        // Cache paths, jar and natives are keyed on the manifest id.
        if descriptor.id != summary.id {
            debug!(
                "Descriptor id {} differs from manifest id {}; using the latter",
                descriptor.id, summary.id
            );
            descriptor.id = summary.id.clone();
        }
        info!(
            "Descriptor {}: {} libraries, asset index {}",
            descriptor.id,
            descriptor.libraries.len(),
            descriptor.asset_index_id()
        );
        Ok(descriptor)
    }

    /// Client jar URL, falling back to `<legacy_base>/<id>/<id>.jar`.
    pub fn client_download_url(&self, legacy_base: Option<&str>) -> LauncherResult<String> {
        if let Some(url) = self.client_url.as_ref().filter(|u| !u.is_empty()) {
            return Ok(url.clone());
        }
        match legacy_base {
            Some(base) => Ok(format!(
                "{}/{id}/{id}.jar",
                base.trim_end_matches('/'),
                id = self.id
            )),
            None => Err(LauncherError::Parse(format!(
                "descriptor for {} has no client download URL",
                self.id
            ))),
        }
    }

    pub fn asset_index_id(&self) -> &str {
        self.asset_index
            .as_ref()
            .map(|index| index.id.as_str())
            .unwrap_or(LEGACY_ASSET_INDEX)
    }
}
