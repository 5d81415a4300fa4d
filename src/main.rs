use anyhow::Result;
use axum::Router;
use std::{io::ErrorKind, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod config;
mod errors;
mod handlers;
mod models;
mod routes;
mod services;

use services::{collection_service::CollectionService, prober::Prober, s3_gateway::S3Connector};

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bucket_usage_exporter=info".into()),
        )
        .init();

    // --- Parse config ---
    let cfg = config::AppConfig::from_env_and_args()?;

    tracing::info!("Starting bucket-usage-exporter with config: {:?}", cfg);
    if cfg.accounts.is_empty() {
        tracing::warn!("No accounts configured; scrapes will be empty");
    }

    // --- Initialize collection service ---
    let service = CollectionService::new(
        Arc::new(S3Connector),
        cfg.accounts.clone(),
        Prober::new(cfg.probe_key.clone(), cfg.probe_timeout),
        cfg.probe_concurrency,
    );

    // --- Build router ---
    let app: Router = routes::routes::routes().with_state(service);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Exporter listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
