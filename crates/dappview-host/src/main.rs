//! DappView host daemon
//!
//! Serves the Web3 bridge for the embedding browser shell over a Unix socket.

use anyhow::Result;
use clap::Parser;
use dappview_core::storage::{init_data_dir, ConfigStorage};
use dappview_host::wallet::ChainRegistry;
use dappview_host::{ApiHandler, ConfigManager, HostServices, IpcServer, Upstream};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "dappviewd")]
#[command(about = "DappView host - Web3 bridge for browser tabs", long_about = None)]
struct Args {
    /// Socket path for IPC (overrides the config file)
    #[arg(short, long)]
    socket: Option<String>,

    /// Log level (overrides the config file)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Config file to use instead of the user config directory
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_manager = Arc::new(match args.config {
        Some(path) => ConfigManager::with_storage(ConfigStorage::with_path(path))?,
        None => ConfigManager::new()?,
    });
    let config = config_manager
        .override_host(args.socket, args.log_level)
        .await?;

    // Initialize data directory and log file
    let data_dir = init_data_dir()?;
    let log_file_path = data_dir.join("daemon.log");
    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)?;

    // Write to both file and stdout
    use tracing_subscriber::fmt::writer::MakeWriterExt;
    let stdout_writer = std::io::stdout.with_max_level(tracing::Level::INFO);
    let file_writer = log_file.with_max_level(tracing::Level::DEBUG);

    tracing_subscriber::fmt()
        .with_writer(stdout_writer.and(file_writer))
        .with_env_filter(&config.host.log_level)
        .with_ansi(false)
        .init();

    tracing::info!("DappView host starting...");
    tracing::info!("Config file: {}", config_manager.path().display());
    tracing::info!("Socket path: {}", config.host.socket_path);
    tracing::info!("Log file: {}", log_file_path.display());

    let upstream = Upstream::from_config(&config)?;
    let services = HostServices::new(&config, upstream);
    tracing::info!(
        "Active chain: {}",
        services.registry.active_chain().await.chain_name
    );

    let api_handler = Arc::new(ApiHandler::new(services, config_manager));
    let ipc_server = Arc::new(IpcServer::new(config.host.socket_path.clone(), api_handler));

    let server_handle = {
        let server = ipc_server.clone();
        tokio::spawn(async move {
            if let Err(e) = server.start().await {
                tracing::error!("IPC server error: {}", e);
            }
        })
    };

    tracing::info!("Host ready and listening");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");

    server_handle.abort();
    let _ = fs::remove_file(ipc_server.socket_path());

    Ok(())
}
