use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, anyhow};
use axum::Router;
use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{info, warn};

use waav_call_bridge::config::TlsConfig;
use waav_call_bridge::{AppState, ServerConfig, create_app};

/// Calls still in flight get this long to finish after a shutdown signal
/// when serving over TLS.
const TLS_SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// WaaV Call Bridge - phone calls to a realtime conversational AI service
#[derive(Parser, Debug)]
#[command(name = "waav-call-bridge")]
#[command(version, about, long_about = None)]
struct Cli {
    /// YAML configuration file; environment variables fill in the rest
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate the configuration and print it with secrets redacted
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env must be loaded before the environment layer is read
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // The AI leg is wss://, so a provider has to be in place before any call
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install default crypto provider"))?;

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    if let Some(Commands::CheckConfig) = cli.command {
        println!("Configuration is valid:\n{config:#?}");
        return Ok(());
    }

    let socket_addr: SocketAddr = config
        .address()
        .parse()
        .with_context(|| format!("Invalid server address '{}'", config.address()))?;
    let tls = config.tls.clone();

    info!(
        media_stream_path = %config.media_stream_path,
        model = %config.openai_model,
        audio_format = %config.audio_format,
        greeting = %config.greeting,
        loopback_enabled = config.loopback_enabled,
        "Starting call bridge"
    );
    let app = create_app(AppState::new(config));

    match tls {
        Some(tls) => serve_tls(app, socket_addr, &tls).await,
        None => serve_plain(app, socket_addr).await,
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<ServerConfig> {
    match path {
        Some(path) => {
            info!(path = %path.display(), "Loading configuration file");
            ServerConfig::from_file(path)
                .with_context(|| format!("Invalid configuration in {}", path.display()))
        }
        None => ServerConfig::from_env().context("Invalid configuration from environment"),
    }
}

async fn serve_plain(app: Router, socket_addr: SocketAddr) -> anyhow::Result<()> {
    let listener = TcpListener::bind(socket_addr)
        .await
        .with_context(|| format!("Failed to bind {socket_addr}"))?;
    info!("Listening on http://{}", socket_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}

async fn serve_tls(app: Router, socket_addr: SocketAddr, tls: &TlsConfig) -> anyhow::Result<()> {
    let rustls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
        .await
        .with_context(|| {
            format!(
                "Failed to load TLS certificate {} and key {}",
                tls.cert_path.display(),
                tls.key_path.display()
            )
        })?;

    let handle = Handle::new();
    let shutdown = handle.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.graceful_shutdown(Some(TLS_SHUTDOWN_GRACE));
    });

    info!("Listening on https://{} (TLS enabled)", socket_addr);
    axum_server::bind_rustls(socket_addr, rustls_config)
        .handle(handle)
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .context("TLS server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
