//! Crash-on-start checks.
//!
//! Runs before anything else is started. Each check models a way a
//! deployment can be misconfigured, and a failed check is fatal.

use std::path::Path;

use crate::config::{StartupConfig, ENV_REQUIRED_VAR};
use crate::error::StartupError;

/// `FAIL_MODE` values that request a crash, matched case-insensitively.
pub const CRASH_MODES: [&str; 3] = ["panic", "crash", "exit1"];

/// Run the startup checks in order: required env, config file, fail mode.
pub fn check(config: &StartupConfig) -> Result<(), StartupError> {
    if config.require_env {
        match config.required_var.as_deref() {
            Some(value) if !value.is_empty() => {}
            _ => return Err(StartupError::MissingEnv(ENV_REQUIRED_VAR)),
        }
    }

    if config.require_config {
        load_config_file(&config.config_path)?;
        tracing::info!(path = %config.config_path.display(), "Config file loaded");
    }

    if is_crash_mode(&config.fail_mode) {
        return Err(StartupError::SimulatedCrash(config.fail_mode.clone()));
    }

    Ok(())
}

/// Whether a `FAIL_MODE` value asks for a simulated crash.
pub fn is_crash_mode(mode: &str) -> bool {
    let mode = mode.to_lowercase();
    CRASH_MODES.contains(&mode.as_str())
}

/// Check that the config file exists and holds a valid JSON document.
/// The contents are otherwise unused.
fn load_config_file(path: &Path) -> Result<serde_json::Value, StartupError> {
    if !path.exists() {
        return Err(StartupError::ConfigNotFound(path.to_path_buf()));
    }

    let contents = std::fs::read_to_string(path).map_err(|source| StartupError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&contents).map_err(|source| StartupError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}
