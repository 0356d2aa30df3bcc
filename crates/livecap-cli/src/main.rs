mod record;
mod telemetry;

use anyhow::{Context, Result};
use capconf::LiveConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// livecap - record a live stream into size-rotated files
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file used instead of ./livecap.toml
    #[arg(long, global = true, env = "LIVECAP_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Capture a live stream until it ends or Ctrl-C
    Capture(record::CaptureArgs),

    /// Print the effective configuration and where it came from
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, sources) = LiveConfig::load_with_sources_from(cli.config.as_deref())
        .context("Failed to load configuration")?;

    telemetry::init(&config.telemetry.log_level);

    match cli.command {
        Commands::Capture(args) => {
            let cancel = CancellationToken::new();
            tokio::spawn(cancel_on_signal(cancel.clone()));
            record::run(args, &config, cancel).await?;
        }
        Commands::Config => {
            for file in &sources.files {
                println!("# loaded {}", file.display());
            }
            for var in &sources.env_overrides {
                println!("# env {}", var);
            }
            print!("{}", config.to_toml());
        }
    }

    Ok(())
}

async fn cancel_on_signal(cancel: CancellationToken) {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received SIGINT, finishing current segment...");
        }
        _ = terminate() => {
            tracing::info!("Received SIGTERM, finishing current segment...");
        }
    }
    cancel.cancel();
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            tracing::warn!("Failed to install SIGTERM handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}
