use anyhow::Context;
use clap::Parser;
use seithi_core::ArticleStorage;
use seithi_web::{create_app, serve, AppState};
use std::sync::Arc;
use tracing::info;

mod config;
mod logging;

use config::{Cli, Commands};

fn format_avg(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.3}", v))
}

async fn check_storage(storage: &Arc<dyn ArticleStorage>, storage_type: &str) -> anyhow::Result<()> {
    let stats = storage
        .get_stats()
        .await
        .with_context(|| format!("storage health check failed ({})", storage_type))?;

    info!(
        "🏦 {} articles (facts {}, calm {}, deep {}) using {}",
        stats.total_articles,
        format_avg(stats.avg_facts_score),
        format_avg(stats.avg_calm_score),
        format_avg(stats.avg_deep_score),
        storage_type
    );
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("🛑 Shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging();
    let cli = Cli::parse();

    let storage_config = cli.storage_config();
    info!("💾 Connecting to storage ({})...", storage_config.kind());
    let storage = seithi_storage::create_storage(&storage_config)
        .await
        .context("failed to open storage")?;

    let result = match cli.selected_command() {
        Commands::Check => check_storage(&storage, storage_config.kind()).await,
        Commands::Serve => {
            let app = create_app(AppState::new(storage.clone()));
            serve(app, cli.listen_addr(), shutdown_signal())
                .await
                .context("server error")
        }
    };

    storage.close().await;
    result
}
