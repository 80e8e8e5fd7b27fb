use anyhow::{Context, Result};
use clap::Parser;
use filebrowser::api::{self, AppState, ServerOptions};
use filebrowser::core::config::{Args, RootDirectory};
use filebrowser::core::telemetry::logging::init_logging;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let root = RootDirectory::new(args.root_or_default()).context("invalid root directory")?;
    tracing::info!("Serving files from {}", root.path().display());

    let options = ServerOptions {
        static_dir: args.static_dir.clone(),
        max_upload_bytes: args.max_upload_bytes,
    };
    let app = api::router(AppState::new(&root), &options);

    let listener = TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;
    tracing::info!("Listening on http://{}", args.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
