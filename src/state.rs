//! Shared application state for request handlers.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tera::Tera;

use crate::config::{EnvSource, ProcessEnv};
use crate::readiness::ReadinessFlag;

/// Process boot time, captured once at the top of `main`.
#[derive(Debug, Clone, Copy)]
pub struct BootTime {
    /// Monotonic reference for uptime
    pub instant: Instant,
    /// Wall-clock time shown on the root page
    pub wall: DateTime<Utc>,
}

impl BootTime {
    pub fn now() -> Self {
        Self {
            instant: Instant::now(),
            wall: Utc::now(),
        }
    }
}

/// Shared application state, cloneable across handlers via Arc-wrapped fields.
///
/// Holds the boot time, the readiness flag written by the startup timer, the
/// environment source consulted on every request, and the compiled templates.
#[derive(Clone)]
pub struct AppState {
    pub booted_at: Instant,
    pub started_at: DateTime<Utc>,
    pub readiness: ReadinessFlag,
    pub env: Arc<dyn EnvSource>,
    pub tera: Arc<Tera>,
}

impl AppState {
    pub fn new(
        boot: BootTime,
        readiness: ReadinessFlag,
        env: Arc<dyn EnvSource>,
        tera: Tera,
    ) -> Self {
        Self {
            booted_at: boot.instant,
            started_at: boot.wall,
            readiness,
            env,
            tera: Arc::new(tera),
        }
    }

    /// State backed by the real process environment.
    pub fn from_process(boot: BootTime, readiness: ReadinessFlag, tera: Tera) -> Self {
        Self::new(boot, readiness, Arc::new(ProcessEnv), tera)
    }

    /// Whole seconds since boot. Monotonic.
    pub fn uptime_seconds(&self) -> u64 {
        self.booted_at.elapsed().as_secs()
    }
}
