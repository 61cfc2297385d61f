//! wahelper: WhatsApp helper.
//!
//! `run` and `tool` are the caller side: they start a detached `worker`
//! process for the request and poll its status file. `worker` holds the
//! device's session lock, connects through the bridge daemon, runs the
//! operation and publishes the result.
//!
//! Configuration is read from the environment (and `.env`); see
//! [`config::Config::from_env`].

mod cli;
mod config;
mod logging;

use std::error::Error;
use std::sync::Arc;

use clap::Parser;
use coordination::{lock, Caller, DevicePaths, Request, StatusMessage};
use sync_engine::run_worker;
use tracing::{error, info, warn};
use wa_bridge::{BridgeClient, Provider};
use wa_tools::default_registry;

use crate::cli::{Cli, Command};
use crate::config::Config;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Command::Worker(args) => worker(config, args.into()).await,
        Command::Run(args) => run(config, args.into()).await,
        Command::Tool { name, args } => {
            logging::init_cli();
            let registry = default_registry(Arc::new(caller(&config)?));
            let output = registry.execute_json(&name, &args).await?;
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Command::Tools => {
            let registry = default_registry(Arc::new(caller(&config)?));
            println!("{}", serde_json::to_string_pretty(&registry.definitions())?);
            Ok(())
        }
    }
}

fn caller(config: &Config) -> std::io::Result<Caller> {
    Ok(Caller::new(config.caller_config(), config.worker_command()?))
}

/// Start a worker, wait for it and print the final status as JSON.
async fn run(config: Config, request: Request) -> Result<(), Box<dyn Error>> {
    logging::init_cli();

    let status = caller(&config)?
        .run_with_progress(&request, |record| {
            if record.message == StatusMessage::PairingCodeRequired {
                if let Some(code) = record.data.as_str() {
                    eprintln!("Link this device in WhatsApp with the pairing code {}", code);
                }
            }
        })
        .await;

    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

/// Worker role. Exits non-zero when no result could be published.
async fn worker(config: Config, request: Request) -> Result<(), Box<dyn Error>> {
    std::fs::create_dir_all(&config.data_dir)?;
    let paths = DevicePaths::new(
        &config.data_dir,
        request.device_number(&config.country_code),
    );
    let _log_guard = logging::init_worker(&paths.log_path())?;

    info!(
        "Worker {} started for {} ({})",
        std::process::id(),
        paths.device(),
        request.action
    );

    let provider: Arc<dyn Provider> = Arc::new(BridgeClient::new(config.bridge_config())?);

    let outcome: Result<(), Box<dyn Error>> = tokio::select! {
        result = run_worker(&request, Arc::clone(&provider), config.engine_config(), &config.data_dir) => {
            match result {
                Ok(Some(record)) => {
                    info!("Published {}", record.message);
                    Ok(())
                }
                Ok(None) => Err("session closed without a result".into()),
                Err(e) => Err(e.into()),
            }
        }
        _ = shutdown_signal() => {
            warn!("Shutdown signal received; stopping worker");
            if let Err(e) = provider.end().await {
                warn!("Failed to end provider session: {}", e);
            }
            Ok(())
        }
    };

    match lock::sweep_stale(&paths) {
        Ok(0) => {}
        Ok(n) => info!("Removed {} leftover lock file(s)", n),
        Err(e) => warn!("Failed to sweep locks: {}", e),
    }

    if let Err(e) = &outcome {
        error!("Worker failed: {}", e);
    }
    outcome
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
