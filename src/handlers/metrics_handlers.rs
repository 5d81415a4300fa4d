//! HTTP handlers that run a collection and publish its snapshot.
//! Every request triggers a fresh scrape; nothing is cached between requests.

use crate::{
    errors::AppError,
    models::{bucket::BucketStatus, snapshot::CollectionSnapshot},
    services::{
        collection_service::{CollectionService, ScrapeReport},
        metrics_format::{render_metrics, scrape_metrics},
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Run the scrape on its own task so a panic surfaces as a 500, not a dropped connection.
async fn run_scrape(service: CollectionService) -> Result<ScrapeReport, AppError> {
    Ok(tokio::spawn(async move { service.scrape().await }).await?)
}

/// `GET /metrics`: Prometheus text exposition of a fresh scrape.
pub async fn metrics(
    State(service): State<CollectionService>,
) -> Result<impl IntoResponse, AppError> {
    let report = run_scrape(service).await?;
    let body = render_metrics(&scrape_metrics(&report));

    Ok(([(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)], body))
}

/// `GET /buckets`: the snapshot as JSON.
pub async fn list_buckets(
    State(service): State<CollectionService>,
) -> Result<Json<CollectionSnapshot>, AppError> {
    let report = run_scrape(service).await?;
    Ok(Json(report.snapshot))
}

/// `GET /buckets/{name}`: one bucket record, 404 when the scrape did not report it.
pub async fn get_bucket(
    State(service): State<CollectionService>,
    Path(name): Path<String>,
) -> Result<Json<BucketStatus>, AppError> {
    let report = run_scrape(service).await?;

    report
        .snapshot
        .get(&name)
        .cloned()
        .map(Json)
        .ok_or(AppError::BucketNotReported(name))
}
