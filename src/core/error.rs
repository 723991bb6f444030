use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the launcher core.
/// Every module returns `Result<T, LauncherError>`.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Transport ───────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    // ── Parse ───────────────────────────────────────────
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Version not found in manifest: {0}")]
    VersionNotFound(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Archive ─────────────────────────────────────────
    #[error("Zip extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Archive error at {path:?}: {message}")]
    Archive { path: PathBuf, message: String },

    // ── Process ─────────────────────────────────────────
    #[error("Failed to spawn {program}: {source}")]
    ProcessSpawn {
        program: String,
        source: std::io::Error,
    },

    // ── Pipeline ────────────────────────────────────────
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Launch cancelled")]
    Cancelled,

    #[error("Another launch is preparing {0}")]
    Busy(String),

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

/// Coarse grouping used for status lines and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Transport,
    Parse,
    Archive,
    Process,
    Io,
    Auth,
    Cancelled,
    Other,
}

impl LauncherError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LauncherError::Http(_) | LauncherError::DownloadFailed { .. } => {
                ErrorCategory::Transport
            }
            LauncherError::Parse(_) | LauncherError::VersionNotFound(_) | LauncherError::Json(_) => {
                ErrorCategory::Parse
            }
            LauncherError::Zip(_) | LauncherError::Archive { .. } => ErrorCategory::Archive,
            LauncherError::ProcessSpawn { .. } => ErrorCategory::Process,
            LauncherError::Io { .. } => ErrorCategory::Io,
            LauncherError::Auth(_) => ErrorCategory::Auth,
            LauncherError::Cancelled => ErrorCategory::Cancelled,
            LauncherError::Busy(_) | LauncherError::Other(_) => ErrorCategory::Other,
        }
    }

    pub fn is_transport(&self) -> bool {
        self.category() == ErrorCategory::Transport
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LauncherError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<std::io::Error> for LauncherError {
    fn from(source: std::io::Error) -> Self {
        LauncherError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}
