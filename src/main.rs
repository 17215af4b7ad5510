use clap::Parser;
use directory_router::api::build_app;
use directory_router::config::{Cli, Command, Settings, StorageTarget};
use directory_router::demo;
use directory_router::router::router::Router;
use directory_router::storage::client::StorageClient;
use directory_router::storage::memory::MemoryStore;
use directory_router::storage::sqlite::SqliteStore;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_cli(Cli::parse())?;

    let level = if settings.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    // 1. Storage:
    let store: Arc<dyn StorageClient> = match &settings.storage {
        StorageTarget::Sqlite(path) => {
            tracing::info!("Using SQLite database {}", path.display());
            Arc::new(SqliteStore::open(&path.to_string_lossy())?)
        }
        StorageTarget::Memory => {
            tracing::info!("Using in-memory tables");
            Arc::new(MemoryStore::new())
        }
    };

    // 2. Router:
    let router = Arc::new(Router::new(store));
    router.bootstrap().await?;

    match settings.command {
        // 3a. HTTP server:
        Command::Serve { bind } => {
            let app = build_app(router, settings.hot_ratio);

            tracing::info!("HTTP server listening on {}", bind);
            tracing::info!("Default hot ratio {}", settings.hot_ratio.value());
            tracing::info!("Press Ctrl+C to shutdown");

            let listener = tokio::net::TcpListener::bind(bind).await?;
            axum::serve(listener, app).await?;
        }
        // 3b. Demo run:
        Command::Demo { products, truncate } => {
            let mut rng = StdRng::from_entropy();
            let report = demo::run(&router, products, settings.hot_ratio, truncate, &mut rng)
                .await
                .map_err(|e| anyhow::anyhow!("Product generation failed: {}", e))?;
            println!("{}", report.render());
        }
    }

    Ok(())
}
