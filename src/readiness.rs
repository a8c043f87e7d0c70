//! Readiness state and the delayed-readiness timer.
//!
//! The flag has a single writer (the timer, exactly once) and is read by every
//! `/readyz` request, so an atomic with release/acquire ordering is enough.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::ProbeFlags;

/// Process-wide readiness flag. Starts false and only ever moves to true.
#[derive(Debug, Clone, Default)]
pub struct ReadinessFlag(Arc<AtomicBool>);

impl ReadinessFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn set(&self) {
        self.0.store(true, Ordering::Release);
    }
}

/// Start the readiness timer.
///
/// A zero delay sets the flag before returning, so there is no not-ready
/// window once the server starts accepting. Otherwise a detached task sleeps
/// for `delay` and then sets the flag. Must be called from within a tokio
/// runtime.
pub fn start_timer(flag: &ReadinessFlag, delay: Duration) {
    if delay.is_zero() {
        flag.set();
        tracing::info!("Ready");
        return;
    }

    tracing::info!(delay_secs = delay.as_secs(), "Delaying readiness");
    let flag = flag.clone();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        flag.set();
        tracing::info!(delay_secs = delay.as_secs(), "Ready after startup delay");
    });
}

/// Why `/readyz` is reporting not ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotReadyReason {
    Forced,
    DependencyFailed,
    StartupDelay,
}

impl NotReadyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotReadyReason::Forced => "forced",
            NotReadyReason::DependencyFailed => "dependency check failed",
            NotReadyReason::StartupDelay => "startup delay",
        }
    }
}

/// Evaluate readiness. The first failing gate wins: forced, then the
/// dependency gate, then the startup delay.
pub fn evaluate(flags: ProbeFlags, started: bool) -> Result<(), NotReadyReason> {
    if flags.force_not_ready {
        return Err(NotReadyReason::Forced);
    }
    if flags.dependency_required && !flags.dependency_ok {
        return Err(NotReadyReason::DependencyFailed);
    }
    if !started {
        return Err(NotReadyReason::StartupDelay);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_CLEAR: ProbeFlags = ProbeFlags {
        force_not_ready: false,
        dependency_required: false,
        dependency_ok: true,
    };

    #[test]
    fn test_ready_when_started_and_no_gates() {
        assert_eq!(evaluate(ALL_CLEAR, true), Ok(()));
    }

    #[test]
    fn test_startup_delay_when_not_started() {
        assert_eq!(evaluate(ALL_CLEAR, false), Err(NotReadyReason::StartupDelay));
    }

    #[test]
    fn test_forced_wins_over_everything() {
        let flags = ProbeFlags {
            force_not_ready: true,
            dependency_required: true,
            dependency_ok: false,
        };
        assert_eq!(evaluate(flags, false), Err(NotReadyReason::Forced));
        assert_eq!(evaluate(flags, true), Err(NotReadyReason::Forced));
    }

    #[test]
    fn test_dependency_gate() {
        let failing = ProbeFlags {
            dependency_required: true,
            dependency_ok: false,
            ..ALL_CLEAR
        };
        assert_eq!(evaluate(failing, true), Err(NotReadyReason::DependencyFailed));
        assert_eq!(evaluate(failing, false), Err(NotReadyReason::DependencyFailed));

        let passing = ProbeFlags {
            dependency_required: true,
            ..ALL_CLEAR
        };
        assert_eq!(evaluate(passing, true), Ok(()));

        // dependency_ok only matters when the gate is on
        let ungated = ProbeFlags {
            dependency_ok: false,
            ..ALL_CLEAR
        };
        assert_eq!(evaluate(ungated, true), Ok(()));
    }

    #[test]
    fn test_reason_strings() {
        assert_eq!(NotReadyReason::Forced.as_str(), "forced");
        assert_eq!(NotReadyReason::DependencyFailed.as_str(), "dependency check failed");
        assert_eq!(NotReadyReason::StartupDelay.as_str(), "startup delay");
    }

    #[tokio::test]
    async fn test_zero_delay_sets_flag_immediately() {
        let flag = ReadinessFlag::new();
        start_timer(&flag, Duration::ZERO);
        assert!(flag.is_set());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_sets_flag_after_elapsed() {
        let flag = ReadinessFlag::new();
        start_timer(&flag, Duration::from_secs(5));
        assert!(!flag.is_set());

        tokio::time::sleep(Duration::from_millis(4900)).await;
        assert!(!flag.is_set());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(flag.is_set());
    }
}
