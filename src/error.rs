use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use std::io;
use std::path::PathBuf;

/// Fatal conditions detected before the server binds. Each one ends the
/// process with exit status 1.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("missing required env {0}")]
    MissingEnv(&'static str),

    #[error("failed to load config file: {} does not exist", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("failed to read config file {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("panic: simulated crash requested (FAIL_MODE={0})")]
    SimulatedCrash(String),

    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

/// Errors raised while handling a request.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Template rendering error: {0}")]
    Template(#[from] tera::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = ?self, "Request failed");
        let status = StatusCode::INTERNAL_SERVER_ERROR;

        let body = format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <title>Error {}</title>
</head>
<body>
    <h1>Error {}</h1>
    <p>Internal server error</p>
    <a href="/">Return to homepage</a>
</body>
</html>"#,
            status.as_u16(),
            status.as_u16(),
        );

        (status, Html(body)).into_response()
    }
}
