// ─── Native Extractor ───
// Copies platform shared libraries out of resolved native-classifier jars
// into `natives/<version>/`.

use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::pipeline::LaunchReporter;

/// File suffixes treated as platform shared libraries.
pub const NATIVE_SUFFIXES: [&str; 4] = [".dll", ".so", ".dylib", ".jnilib"];

#[derive(Debug, Default)]
pub struct NativeExtraction {
    /// Archives that were opened.
    pub archives: usize,
    /// Files written by this pass.
    pub extracted: Vec<PathBuf>,
    /// Archives that failed, with the reason.
    pub failures: Vec<(PathBuf, LauncherError)>,
}

pub fn is_native_library(entry_name: &str) -> bool {
    NATIVE_SUFFIXES
        .iter()
        .any(|suffix| entry_name.ends_with(suffix))
}

/// Extract shared libraries from every existing path mentioning `natives`.
///
/// Destinations that already exist are left alone, so repeated passes are
/// idempotent and the first writer of a basename wins. A broken archive is
/// logged and skipped.
pub async fn extract_natives(
    library_paths: &[PathBuf],
    natives_dir: &Path,
    reporter: &dyn LaunchReporter,
) -> LauncherResult<NativeExtraction> {
    tokio::fs::create_dir_all(natives_dir)
        .await
        .map_err(|e| LauncherError::io(natives_dir, e))?;

    let mut outcome = NativeExtraction::default();
    let candidates = library_paths
        .iter()
        .filter(|path| path.to_string_lossy().contains("natives") && path.exists());

    for jar in candidates {
        let jar_path = jar.clone();
        let dest_dir = natives_dir.to_path_buf();
        let result = tokio::task::spawn_blocking(move || extract_archive(&jar_path, &dest_dir))
            .await
            .map_err(|e| LauncherError::Other(format!("Task join error: {}", e)))?;

        outcome.archives += 1;
        match result {
            Ok(mut written) => outcome.extracted.append(&mut written),
            Err(error) => {
                warn!("Cannot extract natives from {:?}: {}", jar, error);
                reporter.log(&format!(
                    "Error extracting natives from {}: {}",
                    jar.display(),
                    error
                ));
                outcome.failures.push((jar.clone(), error));
            }
        }
    }

    info!(
        "Natives: {} archives, {} files extracted into {:?}",
        outcome.archives,
        outcome.extracted.len(),
        natives_dir
    );
    Ok(outcome)
}

fn extract_archive(jar: &Path, dest_dir: &Path) -> LauncherResult<Vec<PathBuf>> {
    let file = std::fs::File::open(jar).map_err(|e| LauncherError::io(jar, e))?;
    let mut archive = zip::ZipArchive::new(file)?;
    let mut written = Vec::new();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() || !is_native_library(entry.name()) {
            continue;
        }
        let Some(base) = Path::new(entry.name()).file_name().map(|n| n.to_os_string()) else {
            continue;
        };
        let dest = dest_dir.join(base);

        let mut out = match OpenOptions::new().write(true).create_new(true).open(&dest) {
            Ok(out) => out,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(LauncherError::io(&dest, e)),
        };
        if let Err(e) = std::io::copy(&mut entry, &mut out) {
            drop(out);
            let _ = std::fs::remove_file(&dest);
            return Err(LauncherError::Archive {
                path: jar.to_path_buf(),
                message: format!("copying {}: {}", entry.name(), e),
            });
        }
        debug!("Extracted native: {:?}", dest);
        written.push(dest);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pipeline::RecordingReporter;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn write_jar(path: &Path, entries: &[(&str, &[u8])]) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let file = std::fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        for (name, body) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(body).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn native_suffixes_are_recognised() {
        assert!(is_native_library("liblwjgl.so"));
        assert!(is_native_library("org/lwjgl/lwjgl.dll"));
        assert!(is_native_library("libjinput-osx.jnilib"));
        assert!(!is_native_library("META-INF/MANIFEST.MF"));
        assert!(!is_native_library("liblwjgl.so.sha1"));
    }

    #[tokio::test]
    async fn only_native_entries_of_native_jars_are_extracted() {
        let temp = tempfile::tempdir().unwrap();
        let natives_jar = temp.path().join("libraries/lwjgl-natives-linux.jar");
        let plain_jar = temp.path().join("libraries/lwjgl.jar");
        write_jar(
            &natives_jar,
            &[
                ("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0"),
                ("linux/x64/liblwjgl.so", b"elf"),
                ("libopenal.so", b"elf2"),
            ],
        );
        write_jar(&plain_jar, &[("libshould-not-appear.so", b"x")]);
        let missing = temp.path().join("libraries/missing-natives-linux.jar");

        let dir = temp.path().join("natives/1.8.9");
        let outcome = extract_natives(
            &[plain_jar, natives_jar, missing],
            &dir,
            &RecordingReporter::new(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.archives, 1);
        assert_eq!(outcome.extracted.len(), 2);
        assert_eq!(std::fs::read(dir.join("liblwjgl.so")).unwrap(), b"elf");
        assert!(dir.join("libopenal.so").exists());
        assert!(!dir.join("libshould-not-appear.so").exists());
        assert!(!dir.join("MANIFEST.MF").exists());
    }

    #[tokio::test]
    async fn existing_files_win_and_reruns_are_idempotent() {
        let temp = tempfile::tempdir().unwrap();
        let first = temp.path().join("a-natives.jar");
        let second = temp.path().join("b-natives.jar");
        write_jar(&first, &[("lib.dll", b"first")]);
        write_jar(&second, &[("x/lib.dll", b"second")]);

        let dir = temp.path().join("natives");
        let reporter = RecordingReporter::new();
        let paths = vec![first, second];
        let outcome = extract_natives(&paths, &dir, &reporter).await.unwrap();
        assert_eq!(outcome.extracted.len(), 1);
        assert_eq!(std::fs::read(dir.join("lib.dll")).unwrap(), b"first");

        let again = extract_natives(&paths, &dir, &reporter).await.unwrap();
        assert!(again.extracted.is_empty());
        assert_eq!(std::fs::read(dir.join("lib.dll")).unwrap(), b"first");
    }

    #[tokio::test]
    async fn broken_archive_is_logged_and_skipped() {
        let temp = tempfile::tempdir().unwrap();
        let broken = temp.path().join("broken-natives.jar");
        std::fs::write(&broken, b"not a zip").unwrap();
        let good = temp.path().join("good-natives.jar");
        write_jar(&good, &[("libgood.dylib", b"macho")]);

        let dir = temp.path().join("natives");
        let reporter = RecordingReporter::new();
        let outcome = extract_natives(&[broken.clone(), good], &dir, &reporter)
            .await
            .unwrap();

        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].0, broken);
        assert!(dir.join("libgood.dylib").exists());
        assert!(reporter
            .logs()
            .iter()
            .any(|l| l.starts_with("Error extracting natives from")));
    }
}
