mod commands;
pub mod core;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

pub use crate::core::auth::{IdentityProvider, LaunchIdentity, StaticIdentity};
pub use crate::core::error::{LauncherError, LauncherResult};
pub use crate::core::pipeline::{LaunchReporter, Launcher, TracingReporter};
pub use crate::core::state::{default_data_dir, LauncherSettings};

pub fn run() -> ExitCode {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,catclient_lib=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = commands::Cli::parse();
    tracing::info!("CatClient launcher starting...");

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Cannot start async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(commands::dispatch(cli)) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
