//! Configuration loading and constants.
//!
//! Everything the service does is driven by environment variables. Lookups go
//! through [`EnvSource`] so the same parsing code serves the real process
//! environment and the fixed maps used in tests.
//!
//! Two views are built from a source:
//! - [`StartupConfig`]: typed settings parsed once before the server binds.
//!   Parse failures are fatal.
//! - [`ProbeFlags`] and [`EnvSnapshot`]: re-read on every request so the
//!   readiness probe and the root page follow the live environment.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::error::StartupError;

// =============================================================================
// Environment Variable Names
// =============================================================================

pub const ENV_PORT: &str = "PORT";
pub const ENV_REQUIRE_ENV: &str = "REQUIRE_ENV";
pub const ENV_REQUIRED_VAR: &str = "VAR_X";
pub const ENV_REQUIRE_CONFIG: &str = "REQUIRE_CONFIG";
pub const ENV_CONFIG_PATH: &str = "CONFIG_PATH";
pub const ENV_FAIL_MODE: &str = "FAIL_MODE";
pub const ENV_STARTUP_DELAY_SECONDS: &str = "STARTUP_DELAY_SECONDS";
pub const ENV_FORCE_NOT_READY: &str = "FORCE_NOT_READY";
pub const ENV_DEPENDENCY_REQUIRED: &str = "DEPENDENCY_REQUIRED";
pub const ENV_DEPENDENCY_OK: &str = "DEPENDENCY_OK";
pub const ENV_MEMORY_HOG_MB: &str = "MEMORY_HOG_MB";
pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";

/// Value a boolean switch must have to be considered on
pub const FLAG_ON: &str = "1";

// =============================================================================
// Defaults
// =============================================================================

pub const DEFAULT_PORT: &str = "8080";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_SWITCH: &str = "0";
pub const DEFAULT_DEPENDENCY_OK: &str = "1";
pub const DEFAULT_CONFIG_PATH: &str = "/config/config.json";
pub const DEFAULT_STARTUP_DELAY_SECONDS: &str = "0";
pub const DEFAULT_MEMORY_HOG_MB: &str = "0";

/// Default log filter when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = "devops_demo=info,tower_http=info";

/// Default log format (text or json)
pub const DEFAULT_LOG_FORMAT: &str = "text";

/// How long in-flight requests may drain after SIGTERM/SIGINT
pub const SHUTDOWN_GRACE_SECS: u64 = 10;

// =============================================================================
// Memory Ramp
// =============================================================================

/// Size of each block allocated by the memory ramp (1 MiB)
pub const MEMORY_BLOCK_BYTES: usize = 1024 * 1024;

/// Progress is logged, and the ramp pauses, every this many blocks
pub const MEMORY_PROGRESS_EVERY: u64 = 10;

/// Pause after each progress line so growth is gradual to outside observers
pub const MEMORY_PROGRESS_PAUSE_MS: u64 = 20;

/// Sleep period of the hold loop once the ramp is finished
pub const MEMORY_HOLD_TICK_SECS: u64 = 1;

// =============================================================================
// HTTP Responses
// =============================================================================

/// Probes must never be answered from a cache
pub const CACHE_CONTROL_PROBES: &str = "no-store";

/// Root page is cheap to regenerate and reflects live state
pub const CACHE_CONTROL_ROOT: &str = "no-cache";

pub const ROOT_MESSAGE: &str = "agentic-devops-demo-app";
pub const ROOT_TITLE: &str = "Agentic DevOps Demo App";

/// Seconds in a minute
pub const SECONDS_PER_MINUTE: u64 = 60;
/// Seconds in an hour
pub const SECONDS_PER_HOUR: u64 = 3600;

/// Lookup of environment-style variables.
pub trait EnvSource: Send + Sync {
    fn var(&self, name: &str) -> Option<String>;

    /// Returns the value, or `default` when the variable is absent.
    /// A variable set to the empty string is returned as-is.
    fn var_or(&self, name: &str, default: &str) -> String {
        self.var(name).unwrap_or_else(|| default.to_string())
    }

    /// True when the variable equals [`FLAG_ON`].
    fn switch(&self, name: &str) -> bool {
        self.var_or(name, DEFAULT_SWITCH) == FLAG_ON
    }
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Typed settings parsed once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupConfig {
    pub port: u16,
    /// `REQUIRE_ENV=1`: `VAR_X` must be present and non-empty
    pub require_env: bool,
    /// Value of `VAR_X`, if any
    pub required_var: Option<String>,
    pub require_config: bool,
    pub config_path: PathBuf,
    /// Raw `FAIL_MODE` value (not yet interpreted)
    pub fail_mode: String,
    pub startup_delay: Duration,
    /// Memory ramp target in megabytes; 0 disables the ramp
    pub memory_hog_mb: u64,
}

impl StartupConfig {
    /// Parse startup settings from the given source.
    ///
    /// Negative delays and memory targets are clamped to zero. Anything that
    /// is not an integer is rejected.
    pub fn from_env(env: &dyn EnvSource) -> Result<Self, StartupError> {
        let port = parse_number::<i64>(env, ENV_PORT, DEFAULT_PORT)?;
        let port = u16::try_from(port).map_err(|_| StartupError::InvalidValue {
            name: ENV_PORT,
            value: port.to_string(),
        })?;

        let delay_secs =
            parse_number::<i64>(env, ENV_STARTUP_DELAY_SECONDS, DEFAULT_STARTUP_DELAY_SECONDS)?;
        let memory_hog_mb = parse_number::<i64>(env, ENV_MEMORY_HOG_MB, DEFAULT_MEMORY_HOG_MB)?;

        Ok(Self {
            port,
            require_env: env.switch(ENV_REQUIRE_ENV),
            required_var: env.var(ENV_REQUIRED_VAR),
            require_config: env.switch(ENV_REQUIRE_CONFIG),
            config_path: PathBuf::from(env.var_or(ENV_CONFIG_PATH, DEFAULT_CONFIG_PATH)),
            fail_mode: env.var_or(ENV_FAIL_MODE, ""),
            startup_delay: Duration::from_secs(delay_secs.max(0) as u64),
            memory_hog_mb: memory_hog_mb.max(0) as u64,
        })
    }
}

fn parse_number<T: std::str::FromStr>(
    env: &dyn EnvSource,
    name: &'static str,
    default: &str,
) -> Result<T, StartupError> {
    let raw = env.var_or(name, default);
    raw.trim()
        .parse::<T>()
        .map_err(|_| StartupError::InvalidValue { name, value: raw })
}

/// Switches consulted by the readiness probe on every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProbeFlags {
    pub force_not_ready: bool,
    pub dependency_required: bool,
    pub dependency_ok: bool,
}

impl ProbeFlags {
    pub fn read(env: &dyn EnvSource) -> Self {
        Self {
            force_not_ready: env.switch(ENV_FORCE_NOT_READY),
            dependency_required: env.switch(ENV_DEPENDENCY_REQUIRED),
            dependency_ok: env.var_or(ENV_DEPENDENCY_OK, DEFAULT_DEPENDENCY_OK) == FLAG_ON,
        }
    }
}

/// Configuration values shown to operators on the root page.
///
/// Values are the raw strings as configured, with defaults filled in for
/// variables that are not set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvSnapshot {
    #[serde(rename = "FAIL_MODE")]
    pub fail_mode: String,
    #[serde(rename = "REQUIRE_ENV")]
    pub require_env: String,
    #[serde(rename = "REQUIRE_CONFIG")]
    pub require_config: String,
    #[serde(rename = "CONFIG_PATH")]
    pub config_path: String,
    #[serde(rename = "STARTUP_DELAY_SECONDS")]
    pub startup_delay_seconds: String,
    #[serde(rename = "FORCE_NOT_READY")]
    pub force_not_ready: String,
    #[serde(rename = "DEPENDENCY_REQUIRED")]
    pub dependency_required: String,
    #[serde(rename = "DEPENDENCY_OK")]
    pub dependency_ok: String,
    #[serde(rename = "MEMORY_HOG_MB")]
    pub memory_hog_mb: String,
}

impl EnvSnapshot {
    pub fn read(env: &dyn EnvSource) -> Self {
        Self {
            fail_mode: env.var_or(ENV_FAIL_MODE, ""),
            require_env: env.var_or(ENV_REQUIRE_ENV, DEFAULT_SWITCH),
            require_config: env.var_or(ENV_REQUIRE_CONFIG, DEFAULT_SWITCH),
            config_path: env.var_or(ENV_CONFIG_PATH, DEFAULT_CONFIG_PATH),
            startup_delay_seconds: env
                .var_or(ENV_STARTUP_DELAY_SECONDS, DEFAULT_STARTUP_DELAY_SECONDS),
            force_not_ready: env.var_or(ENV_FORCE_NOT_READY, DEFAULT_SWITCH),
            dependency_required: env.var_or(ENV_DEPENDENCY_REQUIRED, DEFAULT_SWITCH),
            dependency_ok: env.var_or(ENV_DEPENDENCY_OK, DEFAULT_DEPENDENCY_OK),
            memory_hog_mb: env.var_or(ENV_MEMORY_HOG_MB, DEFAULT_MEMORY_HOG_MB),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl LogFormat {
    /// Resolve the format from `LOG_FORMAT`, falling back to text for
    /// anything unrecognized.
    pub fn from_env(env: &dyn EnvSource) -> Self {
        let format = env
            .var_or(ENV_LOG_FORMAT, DEFAULT_LOG_FORMAT)
            .to_ascii_lowercase();
        match format.as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}
