use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use weekquiz_core::config_file;
use weekquiz_web::{ServerSettings, report_dataset, router};

/// Serve the quiz dataset and front end with permissive CORS headers
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Port to listen on (default: 8000)
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory to serve (default: current directory)
    #[arg(long)]
    root: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let settings = ServerSettings::resolve(
        args.port,
        args.root,
        std::env::var("WEEKQUIZ_PORT").ok(),
        std::env::var("WEEKQUIZ_ROOT").ok(),
        &config_file::load_config(),
    )?;

    if !settings.root.is_dir() {
        anyhow::bail!("{} is not a directory", settings.root.display());
    }
    report_dataset(&settings.root);

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(root = %settings.root.display(), "serving at http://localhost:{}", settings.port);

    axum::serve(listener, router(&settings.root))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl-C");
    }
}
