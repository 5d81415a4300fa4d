//! Defines routes for metrics exposition and health checks.
//!
//! ## Structure
//! - `GET /metrics`        : Prometheus text exposition of a fresh scrape
//! - `GET /buckets`        : the same snapshot as JSON
//! - `GET /buckets/{name}` : a single bucket record
//! - `GET /healthz`        : liveness
//! - `GET /readyz`         : readiness (accounts configured)

use crate::{
    handlers::{
        health_handlers::{healthz, readyz},
        metrics_handlers::{get_bucket, list_buckets, metrics},
    },
    services::collection_service::CollectionService,
};
use axum::{Router, routing::get};

/// Build and return the router.
///
/// The router carries shared state (`CollectionService`) to all handlers.
pub fn routes() -> Router<CollectionService> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/buckets", get(list_buckets))
        .route("/buckets/{name}", get(get_bucket))
}
