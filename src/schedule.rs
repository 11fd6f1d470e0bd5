//! Adaptive renewal scheduling.
//!
//! The schedule tracks the period of the background renewal timer. It starts
//! at a randomized large value and is retuned each time a fetch reveals the
//! ticket's actual lifetime.

use rand::Rng;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::{self, Instant, Interval};

/// Lifetime changes within this tolerance do not restart the timer on a
/// scheduler tick.
const RETUNE_TOLERANCE: Duration = Duration::from_secs(2);

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// The current renewal period, shared between the coordinator loop and the
/// server handles that report it.
#[derive(Debug, Clone)]
pub(crate) struct RenewalSchedule {
    period_secs: Arc<AtomicU64>,
}

impl RenewalSchedule {
    /// Seed the period uniformly across roughly 100 to 300 days.
    ///
    /// Processes started together then learn the real lifetime at different
    /// times instead of hitting the issuer in lockstep.
    pub fn desynchronized() -> Self {
        let days = rand::thread_rng().gen_range(100..300u64);
        Self::with_period(Duration::from_secs(days * SECS_PER_DAY))
    }

    /// Seed the period explicitly.
    pub fn with_period(period: Duration) -> Self {
        Self {
            period_secs: Arc::new(AtomicU64::new(period.as_secs())),
        }
    }

    /// The current ticking period.
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period_secs.load(Ordering::Relaxed))
    }

    /// Build a ticker whose first tick is one full period from now.
    pub fn ticker(&self) -> Interval {
        let period = self.period();
        time::interval_at(Instant::now() + period, period)
    }

    /// Reset the period to a freshly learned lifetime and restart the timer.
    ///
    /// Used after every successful caller-forced refresh: the old period
    /// assumption is known wrong, so the reset is unconditional.
    pub fn retune(&self, expires_in: Duration) -> Interval {
        self.period_secs
            .store(expires_in.as_secs(), Ordering::Relaxed);
        tracing::debug!(period_secs = expires_in.as_secs(), "renewal period retuned");
        self.ticker()
    }

    /// Tick-path reset: skip the restart when the learned lifetime is within
    /// [`RETUNE_TOLERANCE`] of the current period.
    pub fn maybe_retune(&self, expires_in: Duration) -> Option<Interval> {
        let current = self.period();
        let drift = if expires_in > current {
            expires_in - current
        } else {
            current - expires_in
        };
        if drift > RETUNE_TOLERANCE {
            Some(self.retune(expires_in))
        } else {
            None
        }
    }
}
