//! Liveness probe.
//!
//! Returns 200 whenever the process can answer HTTP. It never looks at the
//! readiness flag; a pod that is alive but not ready must not be restarted.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub uptime_seconds: u64,
}

/// Liveness handler for `GET /healthz`.
pub async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        uptime_seconds: state.uptime_seconds(),
    })
}
