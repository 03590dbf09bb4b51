use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use keyrev_server::{KeyrevServer, ServerConfig};
use keyrev_store::InMemoryStorage;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    match cli.command {
        Command::Serve(args) => cmd_serve(config, args).await,
        Command::Config(_) => cmd_config(&config),
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<ServerConfig> {
    match &cli.config {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(ServerConfig::default()),
    }
}

async fn cmd_serve(mut config: ServerConfig, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    println!(
        "{} keyrev on {} (latest suffix {}, gzip level {})",
        "▶".green().bold(),
        config.bind_addr.to_string().bold(),
        config.archival.latest_suffix.yellow(),
        config.archival.effective_gzip_level(),
    );
    tracing::warn!("storage backend is in-memory; data is lost on exit");
    KeyrevServer::new(config, Arc::new(InMemoryStorage::new()))
        .serve()
        .await?;
    Ok(())
}

fn cmd_config(config: &ServerConfig) -> anyhow::Result<()> {
    print!("{}", config.to_toml()?);
    Ok(())
}
