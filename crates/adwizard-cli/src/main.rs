//! `adwizard` entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use adwizard_cli::RunError;
use adwizard_core::error::WizardError;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr; stdout carries only the detail URL.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let Some(script_path) = std::env::args_os().nth(1).map(PathBuf::from) else {
        eprintln!("usage: adwizard <listing.yaml>");
        return ExitCode::from(64);
    };

    match adwizard_cli::run_from_env(&script_path).await {
        Ok(detail_url) => {
            println!("{detail_url}");
            ExitCode::SUCCESS
        }
        Err(RunError::Wizard(WizardError::PublishRejected(errors))) => {
            tracing::error!(errors = errors.len(), "publish rejected");
            match serde_json::to_string_pretty(&errors) {
                Ok(json) => eprintln!("{json}"),
                Err(_) => {
                    for err in &errors {
                        eprintln!("{}: {} ({})", err.field, err.message, err.code);
                    }
                }
            }
            ExitCode::from(2)
        }
        Err(err) => {
            tracing::error!(error = %err, "listing run failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
