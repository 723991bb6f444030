use std::path::{Path, PathBuf};
use std::process::Stdio;

use tracing::{debug, warn};

/// A Java runtime as reported by `<java> -version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaRuntime {
    pub path: PathBuf,
    /// The quoted version string, e.g. `21.0.2` or `1.8.0_392`.
    pub version: String,
}

impl JavaRuntime {
    pub fn major(&self) -> Option<u32> {
        parse_major_version(&self.version)
    }

    pub fn needs_native_access_flag(&self) -> bool {
        native_access_required(&self.version)
    }
}

/// Runs `<path> -version` and reads the version banner. `None` when the
/// binary cannot be run or prints nothing recognisable.
pub async fn probe_java(path: &Path) -> Option<JavaRuntime> {
    let output = match tokio::process::Command::new(path)
        .arg("-version")
        .stdin(Stdio::null())
        .output()
        .await
    {
        Ok(output) => output,
        Err(e) => {
            warn!("Cannot run {:?} -version: {}", path, e);
            return None;
        }
    };

    let banner = format!(
        "{}\n{}",
        String::from_utf8_lossy(&output.stderr),
        String::from_utf8_lossy(&output.stdout)
    );
    debug!("Probing {:?}: {}", path, banner.lines().next().unwrap_or(""));

    parse_version_string(&banner).map(|version| JavaRuntime {
        path: path.to_path_buf(),
        version,
    })
}

/// First double-quoted token of the banner.
pub fn parse_version_string(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let start = line.find('"')?;
        let rest = &line[start + 1..];
        let end = rest.find('"')?;
        Some(rest[..end].to_string())
    })
}

/// `1.8.0_392` → 8, `17.0.9` → 17.
pub fn parse_major_version(version: &str) -> Option<u32> {
    let mut parts = version.split(|c: char| !c.is_ascii_digit());
    let first: u32 = parts.next()?.parse().ok()?;
    if first == 1 {
        parts.next().and_then(|minor| minor.parse().ok())
    } else {
        Some(first)
    }
}

/// Whether `--enable-native-access=ALL-UNNAMED` should be passed.
///
/// Legacy `1.x` and `8` runtimes never get it. Otherwise the leading number
/// must be at least 21; a version whose leading number cannot be read is
/// assumed to be modern.
pub fn native_access_required(version: &str) -> bool {
    let version = version.trim();
    if version.starts_with("1.") || version.starts_with('8') {
        return false;
    }
    let leading = version
        .split(|c: char| !c.is_ascii_digit())
        .next()
        .unwrap_or("");
    match leading.parse::<u32>() {
        Ok(major) => major >= 21,
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_comes_from_the_banner() {
        let banner = "openjdk version \"21.0.2\" 2024-01-16\nOpenJDK Runtime Environment Temurin-21.0.2+13";
        assert_eq!(parse_version_string(banner).as_deref(), Some("21.0.2"));
        assert_eq!(parse_version_string("no quotes here"), None);
    }

    #[test]
    fn java_major_detection() {
        assert_eq!(parse_major_version("1.8.0_392"), Some(8));
        assert_eq!(parse_major_version("17.0.9"), Some(17));
        assert_eq!(parse_major_version("21-ea"), Some(21));
        assert_eq!(parse_major_version("ea"), None);
    }

    #[test]
    fn native_access_flag_threshold() {
        assert!(!native_access_required("1.8.0_392"));
        assert!(!native_access_required("8"));
        assert!(!native_access_required("17.0.9"));
        assert!(native_access_required("21.0.2"));
        assert!(native_access_required("22"));
        assert!(native_access_required("ea-build"));
    }

    #[tokio::test]
    async fn probing_a_missing_binary_yields_none() {
        let temp = tempfile::tempdir().unwrap();
        assert!(probe_java(&temp.path().join("no-such-java")).await.is_none());
    }
}
