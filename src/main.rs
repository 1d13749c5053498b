//! switchyard server binary.
//!
//! Serves a small router tree: a health endpoint and, optionally, a static directory.

use axum::http::StatusCode;
use clap::Parser;
use serde_json::json;
use std::path::PathBuf;

use switchyard::config::watcher::ConfigWatcher;
use switchyard::lifecycle::{signals, startup};
use switchyard::{ConfigHandle, CorsOptions, HttpServer, Router, RouterError, Shutdown};

#[derive(Debug, Parser)]
#[command(name = "switchyard", version, about = "Hierarchical HTTP router server")]
struct Cli {
    /// Configuration file (TOML or JSON). Reloaded when it changes.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory served under /static.
    #[arg(long)]
    static_dir: Option<String>,

    /// Enable CORS with the default policy.
    #[arg(long)]
    cors: bool,
}

fn build_router(config: ConfigHandle, cli: &Cli) -> Result<Router, RouterError> {
    let router = Router::new(config);
    if cli.cors {
        router.cors(CorsOptions::default());
    }

    router
        .get("/health", |response, _| {
            response.json(StatusCode::OK, &json!({ "status": "ok" }))
        })?
        .name("health")?;

    if let Some(directory) = &cli.static_dir {
        router
            .static_files("/static", directory.clone(), false)?
            .name("static")?;
    }
    Ok(router)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = startup::load_or_default(cli.config.as_deref())?;
    startup::init_observability(&config);

    tracing::info!(
        name = %config.app.name,
        protocol = %config.server.protocol,
        bind_address = %config.server.bind_address(),
        "Configuration loaded"
    );

    let handle = ConfigHandle::new(config.clone());
    let router = build_router(handle.clone(), &cli)?;

    let _watcher = match &cli.config {
        Some(path) => Some(ConfigWatcher::new(path, handle).run()?),
        None => None,
    };

    let listener = startup::bind_listener(&config.server).await?;
    let shutdown = Shutdown::new();
    let server = HttpServer::new(router);
    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    signals::shutdown_on_signal(&shutdown).await;
    server_task.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
