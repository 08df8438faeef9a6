use std::process::ExitCode;

use clap::Parser;
use gemimg::app::{client_settings, execute, prepare};
use gemimg::cli::CliOptions;
use gemimg::config::{base_dir, load_env_files, setup_logging};
use gemimg::error::GemimgError;
use gemimg::gemini::GeminiClient;
use tracing::{debug, error, info};

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl-C, stopping");
}

async fn run(cli: &CliOptions) -> Result<bool, GemimgError> {
    let settings = client_settings(cli)?;
    let base = base_dir(cli.cwd.as_deref());
    debug!("Resolving paths against {}", base.display());

    let prepared = prepare(cli, &base)?;
    info!("Model: {}", settings.model);
    let client = GeminiClient::new(settings)?;

    let report = execute(&client, &prepared, shutdown_signal()).await;
    Ok(report.is_success())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let env_files = load_env_files();
    let cli = CliOptions::parse();

    if setup_logging(cli.debug).is_err() {
        return ExitCode::FAILURE;
    }
    for path in env_files {
        debug!("Loaded environment from {}", path.display());
    }

    match run(&cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!("{}", err);
            if let Some(guidance) = err.guidance() {
                error!("{}", guidance);
            }
            ExitCode::FAILURE
        }
    }
}
