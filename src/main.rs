use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use flatserve::config::{Cli, LoggingConfig};
use flatserve::server::Server;
use tracing::level_filters::LevelFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = cli.load_config()?;

    init_logging(&cfg.logging)?;

    let (handle, mut task) = Server::bind(&cfg.server).await?.spawn();

    tokio::select! {
        res = &mut task => res??,

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
            handle.stop();
            task.await??;
        }
    }

    Ok(())
}

fn init_logging(cfg: &LoggingConfig) -> anyhow::Result<()> {
    let level: LevelFilter = cfg
        .level
        .parse()
        .with_context(|| format!("invalid log level {:?}", cfg.level))?;

    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(level);

    match &cfg.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.init(),
    }

    Ok(())
}
