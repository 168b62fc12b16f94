//! Gateway health state and in-flight call tracking for graceful shutdown.
//!
//! Health state lives in an `ArcSwap` so probes read it without locking.
//! Each admitted CCIP call holds a [`CallGuard`]; draining waits for the
//! guard count to reach zero.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;

/// Gateway health state.
///
/// State machine: Starting -> Ready -> Draining -> Stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    /// Listener not yet serving.
    Starting,
    /// Serving calls.
    Ready,
    /// Shutdown requested; new calls are refused, admitted ones finish.
    Draining,
    /// All admitted calls have completed.
    Stopped,
}

impl HealthState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Ready => "ready",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        }
    }

    /// Whether new CCIP calls may be admitted in this state.
    #[must_use]
    pub fn admits_calls(self) -> bool {
        matches!(self, Self::Starting | Self::Ready)
    }
}

/// Tracks health state and admitted calls for one gateway instance.
#[derive(Debug)]
pub struct ShutdownController {
    state: ArcSwap<HealthState>,
    in_flight: Arc<AtomicU64>,
}

impl ShutdownController {
    /// Creates a controller in the `Starting` state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: ArcSwap::from_pointee(HealthState::Starting),
            in_flight: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn set_ready(&self) {
        self.state.store(Arc::new(HealthState::Ready));
    }

    /// Moves to `Draining`. Calls already admitted keep running.
    pub fn trigger_shutdown(&self) {
        self.state.store(Arc::new(HealthState::Draining));
    }

    #[must_use]
    pub fn health_state(&self) -> HealthState {
        **self.state.load()
    }

    /// Admits a call, returning `None` once draining has begun.
    ///
    /// The call is counted before the state is checked, so a drain that has
    /// already observed a zero count never misses an admitted call. A refused
    /// call backs its count out again.
    #[must_use]
    pub fn begin_call(&self) -> Option<CallGuard> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let guard = CallGuard {
            in_flight: Arc::clone(&self.in_flight),
        };
        if self.health_state().admits_calls() {
            Some(guard)
        } else {
            drop(guard);
            None
        }
    }

    #[must_use]
    pub fn in_flight_count(&self) -> u64 {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Waits up to `timeout` for admitted calls to finish.
    ///
    /// Returns `true` and moves to `Stopped` on success; returns `false` and
    /// stays `Draining` if calls are still running at the deadline.
    pub async fn wait_for_drain(&self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;

        while self.in_flight_count() > 0 {
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        self.state.store(Arc::new(HealthState::Stopped));
        true
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts one admitted call; decrements on drop, including during unwinding.
#[derive(Debug)]
pub struct CallGuard {
    in_flight: Arc<AtomicU64>,
}

impl Drop for CallGuard {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
