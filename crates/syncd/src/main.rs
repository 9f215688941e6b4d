mod app;
mod cli;
mod cmd;
mod http;

use std::sync::Arc;

use clap::Parser;
use sync_core::Settings;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(cli.effective_log_level()).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let mut settings = Settings::from_env("SYNCD");
    if let Some(config_path) = &cli.config {
        settings.config_path = config_path.clone();
    }

    match cli.command {
        Some(Commands::Handlers { action }) => {
            let code = cmd::handlers::run(settings, action, cli.format).await?;
            std::process::exit(code);
        }
        None => serve(settings).await,
    }
}

async fn serve(settings: Settings) -> anyhow::Result<()> {
    let bind_addr =
        std::env::var("SYNCD_BIND").unwrap_or_else(|_| "127.0.0.1:8000".to_string());

    let state = Arc::new(app::AppState::bootstrap(settings).await?);
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "syncd listening");
    axum::serve(listener, router).await?;
    Ok(())
}
