use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tokio::task::JoinError;

/// Failures an HTTP request can surface. Collection itself never fails; a
/// request only fails when the scrape task dies or the asked-for bucket is absent.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("bucket `{0}` not reported by the scrape")]
    BucketNotReported(String),
    #[error("scrape task failed: {0}")]
    ScrapeAborted(#[from] JoinError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BucketNotReported(_) => StatusCode::NOT_FOUND,
            AppError::ScrapeAborted(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        }

        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16()
        }));
        (status, body).into_response()
    }
}
