//! Health & readiness handlers.
//!
//! - GET /healthz  -> simple liveness ("ok")
//! - GET /readyz   -> readiness that checks at least one account is configured

use crate::services::collection_service::CollectionService;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::collections::HashMap;

/// `GET /healthz`
///
/// Very small liveness probe, always returns 200 OK with a plain JSON body.
/// This endpoint should be cheap and never talk to the remote service.
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

/// `GET /readyz`
///
/// HTTP 200 when accounts are configured, HTTP 503 otherwise: without accounts
/// every scrape would be empty.
pub async fn readyz(State(service): State<CollectionService>) -> impl IntoResponse {
    let configured = service.accounts().len();
    let accounts_check = if configured > 0 {
        CheckStatus {
            ok: true,
            error: None,
        }
    } else {
        CheckStatus {
            ok: false,
            error: Some("no accounts configured".into()),
        }
    };
    let overall_ok = accounts_check.ok;

    let mut checks = HashMap::new();
    checks.insert("accounts", accounts_check);

    let body = ReadyResponse {
        status: if overall_ok {
            "ok".into()
        } else {
            "error".into()
        },
        accounts: configured,
        checks,
    };

    let status = if overall_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: String,
    accounts: usize,
    checks: HashMap<&'static str, CheckStatus>,
}

#[derive(Serialize)]
struct CheckStatus {
    ok: bool,
    error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{
        fake_gateway::{FakeConnector, credential},
        prober::Prober,
    };
    use std::sync::Arc;

    fn service(accounts: Vec<crate::models::account::AccountCredential>) -> CollectionService {
        CollectionService::new(Arc::new(FakeConnector::new()), accounts, Prober::default(), 1)
    }

    #[tokio::test]
    async fn healthz_is_ok() {
        let response = healthz().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn readyz_requires_accounts() {
        let response = readyz(State(service(Vec::new()))).await.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = readyz(State(service(vec![credential("http://a")])))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
