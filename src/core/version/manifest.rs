// ─── Version Manifest ───
// Fetches the version manifest and reads its entries with the structural
// scanner. Entries missing `id`, `type` or `url` are skipped.

use tracing::{debug, info};

use crate::core::error::LauncherResult;
use crate::core::http::get_text;
use crate::core::scanner::{iterate_top_level_objects, lookup_nested_scalar, lookup_scalar};

/// Release channel of a manifest entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VersionType {
    Release,
    Snapshot,
    OldBeta,
    OldAlpha,
    Other(String),
}

impl VersionType {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "release" => VersionType::Release,
            "snapshot" => VersionType::Snapshot,
            "old_beta" => VersionType::OldBeta,
            "old_alpha" => VersionType::OldAlpha,
            other => VersionType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            VersionType::Release => "release",
            VersionType::Snapshot => "snapshot",
            VersionType::OldBeta => "old_beta",
            VersionType::OldAlpha => "old_alpha",
            VersionType::Other(raw) => raw,
        }
    }
}

/// A single entry in the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSummary {
    pub id: String,
    pub version_type: VersionType,
    pub descriptor_url: String,
}

impl VersionSummary {
    fn parse(raw: &str) -> Option<Self> {
        Some(Self {
            id: lookup_scalar(raw, "id")?,
            version_type: VersionType::parse(&lookup_scalar(raw, "type")?),
            descriptor_url: lookup_scalar(raw, "url")?,
        })
    }

    pub fn is_release(&self) -> bool {
        self.version_type == VersionType::Release
    }
}

/// Parsed manifest, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionManifest {
    pub latest_release: Option<String>,
    pub latest_snapshot: Option<String>,
    pub versions: Vec<VersionSummary>,
}

impl VersionManifest {
    /// Reads the `versions` array of a manifest document.
    ///
    /// Malformed or truncated input yields whatever complete entries precede
    /// the damage; a document without `versions` yields an empty manifest.
    pub fn parse(text: &str) -> Self {
        let versions: Vec<VersionSummary> = iterate_top_level_objects(text, "versions")
            .filter_map(|raw| {
                let summary = VersionSummary::parse(raw);
                if summary.is_none() {
                    debug!("Skipping incomplete manifest entry");
                }
                summary
            })
            .collect();

        Self {
            latest_release: lookup_nested_scalar(text, &["latest", "release"]),
            latest_snapshot: lookup_nested_scalar(text, &["latest", "snapshot"]),
            versions,
        }
    }

    /// Fetch the version manifest from `url` using a shared HTTP client.
    pub async fn fetch(client: &reqwest::Client, url: &str) -> LauncherResult<Self> {
        info!("Fetching version manifest from {}", url);
        let raw = get_text(client, url).await?;
        let manifest = Self::parse(&raw);
        info!("Loaded {} versions from manifest", manifest.versions.len());
        Ok(manifest)
    }

    /// Find a specific version entry by ID (e.g. "1.20.4").
    pub fn find_version(&self, id: &str) -> Option<&VersionSummary> {
        self.versions.iter().find(|v| v.id == id)
    }

    /// Release entries only, in manifest order.
    pub fn releases(&self) -> Vec<&VersionSummary> {
        self.versions.iter().filter(|v| v.is_release()).collect()
    }

    pub fn release_ids(&self) -> Vec<String> {
        self.releases().into_iter().map(|v| v.id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"{
        "latest": { "release": "1.20.1", "snapshot": "23w10a" },
        "versions": [
            { "id": "1.20.1", "type": "release", "url": "https://meta.test/1.20.1.json", "releaseTime": "2023-06-12T13:25:51+00:00" },
            { "id": "23w10a", "type": "snapshot", "url": "https://meta.test/23w10a.json" },
            { "id": "b1.7.3", "type": "old_beta", "url": "https://meta.test/b1.7.3.json" }
        ]
    }"#;

    #[test]
    fn manifest_entries_keep_document_order() {
        let manifest = VersionManifest::parse(MANIFEST);
        let ids: Vec<&str> = manifest.versions.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, ["1.20.1", "23w10a", "b1.7.3"]);
        assert_eq!(manifest.versions[2].version_type, VersionType::OldBeta);
        assert_eq!(manifest.latest_release.as_deref(), Some("1.20.1"));
        assert_eq!(manifest.latest_snapshot.as_deref(), Some("23w10a"));
    }

    #[test]
    fn release_filter_drops_snapshots() {
        let manifest = VersionManifest::parse(MANIFEST);
        assert_eq!(manifest.release_ids(), vec!["1.20.1".to_string()]);
        assert_eq!(
            manifest.find_version("23w10a").map(|v| v.descriptor_url.as_str()),
            Some("https://meta.test/23w10a.json")
        );
        assert!(manifest.find_version("1.99").is_none());
    }

    #[test]
    fn incomplete_entries_are_skipped() {
        let manifest = VersionManifest::parse(
            r#"{"versions":[{"id":"1.0","type":"release"},{"id":"1.1","type":"release","url":"u"}]}"#,
        );
        assert_eq!(manifest.versions.len(), 1);
        assert_eq!(manifest.versions[0].id, "1.1");
    }

    #[test]
    fn truncated_manifest_keeps_complete_entries() {
        let cut = r#"{"versions":[{"id":"1.20.1","type":"release","url":"a"},{"id":"1.19","ty"#;
        let manifest = VersionManifest::parse(cut);
        assert_eq!(manifest.release_ids(), vec!["1.20.1".to_string()]);
    }

    #[test]
    fn unknown_types_are_preserved() {
        assert_eq!(
            VersionType::parse("pending"),
            VersionType::Other("pending".into())
        );
        assert_eq!(VersionType::parse("pending").as_str(), "pending");
        assert_eq!(VersionType::OldAlpha.as_str(), "old_alpha");
    }

    #[test]
    fn non_manifest_text_is_empty() {
        assert!(VersionManifest::parse("<html>502</html>").versions.is_empty());
    }
}
