use std::sync::Arc;
use actix_web::{middleware, web, App, HttpServer};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use freight_ops::api::{api_routes, input_config};
use freight_ops::app::AppState;
use freight_ops::auth::SessionStore;
use freight_ops::config::Config;
use freight_ops::directory::InMemoryDirectory;
use freight_ops::metrics::{metrics_routes, Metrics};
use freight_ops::seed::seed_demo;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize structured logging with environment-based filtering
    // --log / FREIGHT_OPS_LOG wins, then RUST_LOG, then the default below
    let filter = match &config.log {
        Some(directives) => EnvFilter::try_new(directives)?,
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,freight_ops=debug")),
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(filter)
        .init();

    tracing::info!("Starting freight-ops");

    // === 1. Prometheus metrics ===
    let metrics = Arc::new(Metrics::new()?);
    tracing::info!("Metrics registry created with {} metrics", metrics.registry().gather().len());

    // === 2. Directory & sessions ===
    let directory = Arc::new(InMemoryDirectory::new());
    let sessions = Arc::new(SessionStore::new());
    if config.seed_demo {
        let tokens = seed_demo(&directory, &sessions).await;
        tracing::info!(count = tokens.len(), "Demo bearer tokens issued");
        tracing::debug!(tokens = ?tokens, "Demo bearer tokens");
    }

    // === 3. Components ===
    let state = web::Data::new(
        AppState::new(directory, sessions, metrics.clone()).with_default_limit(config.default_limit),
    );
    let metrics_data = web::Data::new(metrics);

    // === 4. HTTP server ===
    let addr = config.socket_addr()?;
    let expose_metrics = config.metrics;
    tracing::info!(%addr, metrics = expose_metrics, "Listening");

    HttpServer::new(move || {
        let app = App::new()
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .app_data(metrics_data.clone())
            .configure(input_config)
            .configure(api_routes);

        if expose_metrics {
            app.configure(metrics_routes)
        } else {
            app
        }
    })
    .bind(addr)?
    .run()
    .await?;

    tracing::info!("freight-ops stopped");
    Ok(())
}
