//! Inactivity tracking for active sessions.
//!
//! `InactivityTimer` is a deadline state machine polled against the injected
//! clock, so tests advance virtual time instead of sleeping. Deployments
//! that want wall-clock enforcement spawn an `InactivityDriver`, which polls
//! the engine on a tokio interval.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use recall_core::time::elapsed_ms;

use crate::engine::SessionEngine;

/// What a poll observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InactivitySignal {
    /// The warning threshold has passed; `remaining_ms` is the time left
    /// before auto-pause.
    Warning { remaining_ms: u64 },
    /// The grace period has also passed; the session should pause.
    Expired,
}

#[derive(Debug)]
struct Armed {
    last_activity: DateTime<Utc>,
    warning_emitted: bool,
}

/// Single logical timer owned by the engine while a session is active.
///
/// Disarmed means fully stopped: a disarmed timer never yields a signal, no
/// matter how far the clock advances.
#[derive(Debug)]
pub(crate) struct InactivityTimer {
    warning_after_ms: u64,
    grace_period_ms: u64,
    armed: Option<Armed>,
}

impl InactivityTimer {
    pub(crate) fn new(warning_after_ms: u64, grace_period_ms: u64) -> Self {
        Self {
            warning_after_ms,
            grace_period_ms,
            armed: None,
        }
    }

    /// Start tracking idle time from `now`.
    pub(crate) fn arm(&mut self, now: DateTime<Utc>) {
        self.armed = Some(Armed {
            last_activity: now,
            warning_emitted: false,
        });
    }

    /// Qualifying activity: push the deadlines out and re-enable the
    /// warning. No effect while disarmed.
    pub(crate) fn reset(&mut self, now: DateTime<Utc>) {
        if let Some(state) = self.armed.as_mut() {
            state.last_activity = now;
            state.warning_emitted = false;
        }
    }

    /// Stop the timer entirely.
    pub(crate) fn disarm(&mut self) {
        self.armed = None;
    }

    pub(crate) fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Check the deadlines against `now`.
    ///
    /// Yields `Warning` exactly once per idle stretch, then `Expired` once
    /// the grace period has also elapsed. Expiry disarms the timer.
    pub(crate) fn poll(&mut self, now: DateTime<Utc>) -> Option<InactivitySignal> {
        let state = self.armed.as_mut()?;
        let idle_ms = elapsed_ms(state.last_activity, now);
        let expiry_ms = self.warning_after_ms + self.grace_period_ms;

        if state.warning_emitted {
            if idle_ms >= expiry_ms {
                self.armed = None;
                return Some(InactivitySignal::Expired);
            }
            return None;
        }

        if idle_ms >= self.warning_after_ms {
            state.warning_emitted = true;
            return Some(InactivitySignal::Warning {
                remaining_ms: expiry_ms.saturating_sub(idle_ms),
            });
        }

        None
    }
}

//
// ─── DRIVER ────────────────────────────────────────────────────────────────────
//

/// Background task that polls a shared engine's inactivity timer.
///
/// The engine's `tick` is a no-op whenever the timer is disarmed, so a
/// driver that outlives a session does nothing until the next one starts.
pub struct InactivityDriver {
    handle: JoinHandle<()>,
}

impl InactivityDriver {
    /// Spawn the polling task on the current tokio runtime.
    #[must_use]
    pub fn spawn(engine: Arc<tokio::sync::Mutex<SessionEngine>>, poll_every: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                engine.lock().await.tick();
            }
        });
        Self { handle }
    }

    /// Stop the polling task.
    pub fn shutdown(self) {
        self.handle.abort();
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
