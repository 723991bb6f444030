use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::auth::{IdentityProvider, LaunchIdentity, StaticIdentity, OFFLINE_ACCESS_TOKEN, OFFLINE_UUID};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::pipeline::{LaunchReporter, Launcher};
use crate::core::state::{default_data_dir, LauncherSettings};

#[derive(Parser)]
#[command(name = "catclient")]
#[command(about = "Install and launch game versions from the version manifest", version)]
pub struct Cli {
    /// Data directory (default: CATCLIENT_HOME or the per-OS location)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh the manifest and list release versions
    Versions,

    /// Install (if needed) and launch a version
    Launch {
        /// Version id, e.g. 1.20.1. Any manifest id is accepted, including
        /// snapshots and old betas that `versions` does not list.
        version: String,

        /// Player name
        #[arg(long)]
        username: String,

        /// Player UUID (hyphens optional)
        #[arg(long, default_value = OFFLINE_UUID)]
        uuid: String,

        /// Access token from the authentication provider
        #[arg(long, default_value = OFFLINE_ACCESS_TOKEN)]
        access_token: String,

        /// Java executable overriding the configured one
        #[arg(long)]
        java: Option<PathBuf>,
    },
}

/// Terminal front end: log lines on stdout, status changes on stderr.
struct TerminalReporter;

impl LaunchReporter for TerminalReporter {
    fn log(&self, message: &str) {
        println!("{message}");
    }

    fn status(&self, status: &str) {
        eprintln!("[{status}]");
    }

    fn progress(&self, value: u8) {
        debug!("progress {}%", value);
    }
}

pub async fn dispatch(cli: Cli) -> LauncherResult<ExitCode> {
    let data_dir = cli.data_dir.unwrap_or_else(default_data_dir);
    let settings = LauncherSettings::load(&data_dir);
    info!("Data directory: {:?}", data_dir);

    match cli.command {
        Commands::Versions => {
            let launcher = Launcher::new(settings, &data_dir)?;
            list_versions(&launcher).await
        }
        Commands::Launch {
            version,
            username,
            uuid,
            access_token,
            java,
        } => {
            let mut settings = settings;
            if let Some(java) = java {
                settings.java_path = java;
            }
            let launcher = Arc::new(Launcher::new(settings, &data_dir)?);
            let identity = StaticIdentity(LaunchIdentity::new(username, uuid, access_token));
            launch_version(launcher, version, Arc::new(identity)).await
        }
    }
}

async fn list_versions(launcher: &Launcher) -> LauncherResult<ExitCode> {
    let releases = launcher.refresh_versions().await?;
    if releases.is_empty() {
        return Err(LauncherError::Parse(
            "No release versions found in manifest.".into(),
        ));
    }
    for id in &releases {
        println!("{id}");
    }
    info!("Successfully loaded {} release versions.", releases.len());
    Ok(ExitCode::SUCCESS)
}

async fn launch_version(
    launcher: Arc<Launcher>,
    version: String,
    identity: Arc<dyn IdentityProvider>,
) -> LauncherResult<ExitCode> {
    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; cancelling launch");
            on_ctrl_c.cancel();
        }
    });

    let handle = launcher.spawn_launch(version, identity, Arc::new(TerminalReporter), cancel);
    let code = handle
        .await
        .map_err(|e| LauncherError::Other(format!("Task join error: {}", e)))??;

    Ok(match code {
        Some(0) => ExitCode::SUCCESS,
        Some(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        None => ExitCode::FAILURE,
    })
}
