pub mod catalog;
pub mod descriptor;
pub mod manifest;
pub mod rules;

pub use catalog::VersionCatalog;
pub use descriptor::{AssetIndexRef, Artifact, LibraryEntry, VersionDescriptor, LEGACY_ASSET_INDEX};
pub use manifest::{VersionManifest, VersionSummary, VersionType};
pub use rules::{arch_bits, rules_allow, Platform, PlatformRule, RuleAction};
