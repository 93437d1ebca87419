use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use covup::{GpgTrustStore, Pipeline, TaskInputs, TaskResult};
use covup_fetch::ReqwestClient;
use covup_platform::ProcessEnv;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let inputs = TaskInputs::parse();
    init_tracing(inputs.verbose);

    match run(inputs).await {
        Ok(TaskResult::Succeeded(message)) => {
            println!("{message}");
            ExitCode::SUCCESS
        }
        Ok(TaskResult::Failed(message)) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(inputs: TaskInputs) -> anyhow::Result<TaskResult> {
    let working_dir = std::env::current_dir().context("cannot determine the working directory")?;
    let settings = inputs
        .into_settings(working_dir)
        .context("invalid task inputs")?;
    let client = ReqwestClient::new().context("failed to build HTTP client")?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling");
            on_signal.cancel();
        }
    });

    Ok(Pipeline::new(client, GpgTrustStore::new(), ProcessEnv, settings)
        .cancel_token(cancel)
        .run()
        .await)
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
