use std::path::{Path, PathBuf};

use crate::core::error::{LauncherError, LauncherResult};

/// On-disk cache layout rooted at the launcher data directory.
///
/// ```text
/// versions/<id>/<id>.json
/// versions/<id>/<id>.jar
/// libraries/<artifact path>
/// assets/indexes/<asset index id>.json
/// assets/objects/<hash[0:2]>/<hash>
/// natives/<id>/
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameLayout {
    root: PathBuf,
}

impl GameLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.root.join("versions")
    }

    pub fn version_dir(&self, id: &str) -> PathBuf {
        self.versions_dir().join(id_component(id))
    }

    pub fn descriptor_path(&self, id: &str) -> PathBuf {
        self.version_dir(id).join(format!("{}.json", id_component(id)))
    }

    pub fn client_jar(&self, id: &str) -> PathBuf {
        self.version_dir(id).join(format!("{}.jar", id_component(id)))
    }

    pub fn version_lock(&self, id: &str) -> PathBuf {
        self.version_dir(id).join(".launch.lock")
    }

    pub fn libraries_dir(&self) -> PathBuf {
        self.root.join("libraries")
    }

    /// Local path of a library given its `/`-separated artifact path.
    pub fn library_path(&self, artifact_path: &str) -> PathBuf {
        artifact_path
            .split('/')
            .filter(|segment| !segment.is_empty() && *segment != "..")
            .fold(self.libraries_dir(), |acc, segment| acc.join(segment))
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.root.join("assets")
    }

    pub fn asset_index_path(&self, index_id: &str) -> PathBuf {
        self.assets_dir()
            .join("indexes")
            .join(format!("{}.json", id_component(index_id)))
    }

    pub fn objects_dir(&self) -> PathBuf {
        self.assets_dir().join("objects")
    }

    /// `objects/<hash[0:2]>/<hash>`; fully determined by the hash.
    pub fn asset_object(&self, hash: &str) -> PathBuf {
        let prefix = hash.get(..2).unwrap_or(hash);
        self.objects_dir().join(prefix).join(hash)
    }

    pub fn natives_dir(&self, id: &str) -> PathBuf {
        self.root.join("natives").join(id_component(id))
    }

    /// Creates the top-level cache directories.
    pub fn ensure(&self) -> LauncherResult<()> {
        for dir in [
            self.versions_dir(),
            self.libraries_dir(),
            self.assets_dir().join("indexes"),
            self.objects_dir(),
            self.root.join("natives"),
        ] {
            std::fs::create_dir_all(&dir).map_err(|e| LauncherError::io(dir, e))?;
        }
        Ok(())
    }
}

/// Version and index ids come from remote documents; reduce them to a
/// single path component so they cannot leave their directory.
fn id_component(id: &str) -> String {
    let component = id
        .split(['/', '\\'])
        .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
        .collect::<Vec<_>>()
        .join("_")
        .replace(':', "_");
    if component.is_empty() {
        "_".to_string()
    } else {
        component
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_files_live_under_their_id() {
        let layout = GameLayout::new("/data");
        assert_eq!(
            layout.descriptor_path("1.20.1"),
            Path::new("/data/versions/1.20.1/1.20.1.json")
        );
        assert_eq!(
            layout.client_jar("1.20.1"),
            Path::new("/data/versions/1.20.1/1.20.1.jar")
        );
        assert_eq!(layout.natives_dir("1.8.9"), Path::new("/data/natives/1.8.9"));
    }

    #[test]
    fn asset_objects_are_sharded_by_hash_prefix() {
        let layout = GameLayout::new("/data");
        let hash = "bdf48ef6b5d0d23bbb02e17d04865216179f510a";
        assert_eq!(
            layout.asset_object(hash),
            Path::new("/data/assets/objects/bd/bdf48ef6b5d0d23bbb02e17d04865216179f510a")
        );
        assert_eq!(
            layout.asset_index_path("17"),
            Path::new("/data/assets/indexes/17.json")
        );
    }

    #[test]
    fn library_paths_stay_inside_the_libraries_root() {
        let layout = GameLayout::new("/data");
        assert_eq!(
            layout.library_path("org/lwjgl/lwjgl/3.3.1/lwjgl-3.3.1.jar"),
            Path::new("/data/libraries/org/lwjgl/lwjgl/3.3.1/lwjgl-3.3.1.jar")
        );
        assert_eq!(
            layout.library_path("../../etc/passwd"),
            Path::new("/data/libraries/etc/passwd")
        );
    }

    #[test]
    fn remote_ids_cannot_escape_their_directories() {
        let layout = GameLayout::new("/data");
        assert_eq!(
            layout.descriptor_path("../../x"),
            Path::new("/data/versions/x/x.json")
        );
        assert_eq!(
            layout.client_jar("a/../b"),
            Path::new("/data/versions/a_b/a_b.jar")
        );
        assert_eq!(
            layout.version_lock(".."),
            Path::new("/data/versions/_/.launch.lock")
        );
        assert_eq!(layout.natives_dir("..\\..\\x"), Path::new("/data/natives/x"));
        assert_eq!(
            layout.asset_index_path("../indexes/../../escape"),
            Path::new("/data/assets/indexes/indexes_escape.json")
        );
        assert_eq!(layout.natives_dir("1.8.9"), Path::new("/data/natives/1.8.9"));
    }

    #[test]
    fn ensure_creates_cache_directories() {
        let temp = tempfile::tempdir().unwrap();
        let layout = GameLayout::new(temp.path());
        layout.ensure().unwrap();
        assert!(layout.versions_dir().is_dir());
        assert!(layout.libraries_dir().is_dir());
        assert!(layout.objects_dir().is_dir());
        assert!(layout.assets_dir().join("indexes").is_dir());
        assert!(temp.path().join("natives").is_dir());
    }
}
