// src/bin/arbiter.rs
use arbiter::{
    api,
    config::ArbiterConfig,
    providers,
    scheduler::Scheduler,
    scoring::Scorer,
};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "arbiter", about = "Ranks derivatives exchanges per pair and serves the ranking")]
struct Args {
    /// TOML config file; defaults plus environment when omitted
    #[arg(long, env = "ARBITER_CONFIG")]
    config: Option<PathBuf>,
    /// Overrides `api_port` / APP_PORT
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let mut cfg = ArbiterConfig::load(args.config.as_deref())?;
    if let Some(port) = args.port {
        cfg.api_port = port;
    }
    tracing::info!(pairs = ?cfg.pairs, exchanges = ?cfg.exchanges, "config loaded");

    let sources = providers::build(&cfg)?;
    let scorer = Scorer::new(sources, cfg.http_timeout());
    let mut scheduler = Scheduler::new(scorer, cfg.pairs.clone(), cfg.refresh_interval())
        .with_parallel_pairs(cfg.parallel_pairs);

    scheduler.start().await?;

    let served = api::serve(scheduler.cache(), cfg.api_port, shutdown_signal()).await;

    scheduler.stop().await;
    served
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "ctrl-c handler failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "SIGTERM handler failed");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
