use anyhow::Result;
use clap::Parser;
use kizuna_lib::application::services::MatchService;
use kizuna_lib::infrastructure::database::{ConnectionPool, SqliteRepository};
use kizuna_lib::shared::config::DatabaseConfig;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "kizuna-rebuild")]
#[command(about = "Rebuild all match scores from current user tags", long_about = None)]
struct Cli {
    /// Database URL
    #[arg(long, default_value = "sqlite://kizuna.db", env = "DATABASE_URL")]
    database_url: String,

    /// Owners processed per progress batch
    #[arg(long, default_value_t = 200, env = "REBUILD_BATCH_SIZE")]
    batch_size: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", env = "LOG_LEVEL")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long, env = "JSON_LOGS")]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level, cli.json_logs)?;

    info!("Starting match score rebuild v{}", env!("CARGO_PKG_VERSION"));

    let config = DatabaseConfig {
        url: cli.database_url.clone(),
        ..DatabaseConfig::default()
    };
    let pool = ConnectionPool::new(&config).await?;
    pool.migrate().await?;

    let repository = Arc::new(SqliteRepository::new(pool.clone()));
    let service = MatchService::new(repository.clone(), repository);

    let stats = service
        .full_rebuild(cli.batch_size.max(1), |progress| {
            info!(
                processed = progress.processed,
                total = progress.total,
                "rebuild progress"
            );
        })
        .await?;

    info!(
        total = stats.total,
        processed = stats.processed,
        created = stats.created,
        updated = stats.updated,
        removed = stats.removed,
        failed = stats.failed,
        "rebuild finished"
    );

    pool.close().await;

    if stats.failed > 0 {
        tracing::warn!(
            failed = stats.failed,
            "rebuild completed with per-owner failures; see logs above"
        );
    }

    Ok(())
}

fn init_logging(log_level: &str, json_logs: bool) -> Result<()> {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    Ok(())
}
