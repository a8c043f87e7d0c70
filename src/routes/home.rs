//! Root page: uptime and a snapshot of the demo's configuration.
//!
//! `?json=1` returns the same data as JSON; anything else renders HTML. When
//! `json` is repeated only the first value counts.

use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::instrument;

use crate::config::{EnvSnapshot, FLAG_ON, ROOT_MESSAGE, ROOT_TITLE};
use crate::error::AppError;
use crate::state::AppState;
use crate::templates::INDEX_TEMPLATE;

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub message: &'static str,
    pub uptime_seconds: u64,
    pub env: EnvSnapshot,
}

#[instrument(name = "home::index", skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let uptime_seconds = state.uptime_seconds();
    let env = EnvSnapshot::read(state.env.as_ref());

    if wants_json(&query) {
        return Ok(Json(IndexResponse {
            message: ROOT_MESSAGE,
            uptime_seconds,
            env,
        })
        .into_response());
    }

    let mut context = tera::Context::new();
    context.insert("title", ROOT_TITLE);
    context.insert("uptime_seconds", &uptime_seconds);
    context.insert("started_at", &state.started_at.to_rfc3339());
    context.insert("env", &env);

    let html = state.tera.render(INDEX_TEMPLATE, &context)?;
    Ok(Html(html).into_response())
}

/// First `json` parameter equals `1`.
fn wants_json(query: &[(String, String)]) -> bool {
    query
        .iter()
        .find(|(key, _)| key == "json")
        .is_some_and(|(_, value)| value == FLAG_ON)
}
