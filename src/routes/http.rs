// GET handlers: root, version, monitor

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;

use super::AppState;
use super::api_error::ApiError;
use crate::query::resolve_range;
use crate::version::{DESCRIPTION, NAME, VERSION};

pub const NO_DATA_MESSAGE: &str = "No monitor data available for the specified time range";

/// GET /: plain banner.
pub(super) async fn root_handler() -> &'static str {
    "hostmon: host metrics at /monitor"
}

/// GET /version: service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
        "description": DESCRIPTION,
    }))
}

#[derive(Debug, Deserialize)]
pub(super) struct MonitorParams {
    start_time: Option<String>,
    end_time: Option<String>,
}

/// GET /monitor?start_time=<RFC3339>&end_time=<RFC3339>
pub(super) async fn monitor_handler(
    State(state): State<AppState>,
    params: Result<Query<MonitorParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params.map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected monitor query string");
        ApiError::BadRequest(rejection.body_text())
    })?;
    let offset = state.sample_repo.offset();
    let range = resolve_range(
        params.start_time.as_deref(),
        params.end_time.as_deref(),
        offset,
        Utc::now().with_timezone(&offset),
    )
    .inspect_err(|e| tracing::debug!(error = %e, "rejected monitor range"))?;

    let samples = state
        .sample_repo
        .query(Some(range.start), Some(range.end))
        .await
        .inspect_err(|e| {
            tracing::error!(error = %e, operation = "query", "monitor query failed")
        })?;

    if samples.is_empty() {
        return Ok(Json(serde_json::json!({ "message": NO_DATA_MESSAGE })).into_response());
    }
    Ok(Json(samples).into_response())
}
