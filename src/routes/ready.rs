//! Readiness probe.
//!
//! The gating switches are re-read from the environment source on every
//! request; the startup flag comes from the readiness timer.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::config::ProbeFlags;
use crate::readiness;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

/// Readiness handler for `GET /readyz`: 200 when ready, 503 with a reason
/// otherwise.
pub async fn readyz(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let flags = ProbeFlags::read(state.env.as_ref());

    match readiness::evaluate(flags, state.readiness.is_set()) {
        Ok(()) => (
            StatusCode::OK,
            Json(ReadyResponse {
                ready: true,
                reason: None,
            }),
        ),
        Err(reason) => {
            tracing::debug!(reason = reason.as_str(), "Not ready");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadyResponse {
                    ready: false,
                    reason: Some(reason.as_str()),
                }),
            )
        }
    }
}
