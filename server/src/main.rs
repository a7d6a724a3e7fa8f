use anyhow::Result;
use clap::Parser;
use revindex::{TokenizerConfig, DEFAULT_TRIM_CHARS};
use server::{build_app, build_metrics_app, AppState, DEFAULT_MAX_BODY_BYTES};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Host to bind the index listener
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port for load and search requests
    #[arg(long, default_value_t = 9999)]
    port: u16,
    /// Host to bind the metrics listener
    #[arg(long, default_value = "127.0.0.1")]
    metrics_host: String,
    /// Port for /healthz
    #[arg(long, default_value_t = 9001)]
    metrics_port: u16,
    /// Characters trimmed from both ends of every token
    #[arg(long, default_value = DEFAULT_TRIM_CHARS)]
    trim_chars: String,
    /// Largest accepted /load body in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_BODY_BYTES)]
    max_body_bytes: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let state = AppState::new(TokenizerConfig::with_trim_chars(args.trim_chars))?.with_max_body_bytes(args.max_body_bytes);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let metrics_addr: SocketAddr = format!("{}:{}", args.metrics_host, args.metrics_port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    let metrics_listener = TcpListener::bind(metrics_addr).await?;
    tracing::info!(%addr, %metrics_addr, "server listening");

    let app = build_app(state.clone());
    let metrics_app = build_metrics_app(state);
    let index_server = async { axum::serve(listener, app).await };
    let metrics_server = async { axum::serve(metrics_listener, metrics_app).await };
    tokio::try_join!(index_server, metrics_server)?;
    Ok(())
}
