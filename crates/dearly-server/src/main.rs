use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod error;
mod handlers;
mod routes;
mod upstream;

use upstream::ModelClient;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Client for the hosted generative-language API.
    pub model: Arc<ModelClient>,
}

#[derive(Parser, Debug)]
#[command(name = "dearly-server")]
#[command(about = "Model gateways for the Dearly diary companion")]
#[command(version)]
struct Cli {
    /// Port to listen on
    #[arg(short, long, env = "DEARLY_SERVER_PORT", default_value = "8787")]
    port: u16,

    /// Address to bind to
    #[arg(short, long, env = "DEARLY_SERVER_BIND", default_value = "0.0.0.0")]
    bind: String,

    /// API key for the hosted model; requests fail with 500 when unset
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Base URL of the hosted model API
    #[arg(
        long,
        env = "GEMINI_BASE_URL",
        default_value = "https://generativelanguage.googleapis.com"
    )]
    upstream: String,

    /// Model to request
    #[arg(long, env = "GEMINI_MODEL", default_value = "gemini-2.0-flash-exp")]
    model: String,

    /// Enable verbose logging
    #[arg(short, long, env = "DEARLY_SERVER_VERBOSE")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "dearly_server=debug,tower_http=debug"
    } else {
        "dearly_server=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if cli.api_key.is_none() {
        warn!("GEMINI_API_KEY is not configured; gateway requests will fail");
    }

    let state = AppState {
        model: Arc::new(ModelClient::new(cli.upstream, cli.model, cli.api_key)),
    };

    let app = routes::create_router(state);

    let addr: SocketAddr = format!("{}:{}", cli.bind, cli.port).parse()?;
    info!("Starting dearly-server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
