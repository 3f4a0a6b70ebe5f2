//! Era watchdog timer.
//!
//! Replaces the SIGALRM-style watchdog with a timer future: if no era
//! change is observed within the period, the reporter force-reconnects
//! the relay client and rearms.

use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// A rearmed deadline the reporter races against its monitoring tick.
pub struct Watchdog {
    period: Duration,
    deadline: Mutex<Instant>,
}

impl Watchdog {
    /// Create a watchdog armed `period` from now.
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            deadline: Mutex::new(Instant::now() + period),
        }
    }

    /// Push the deadline a full period into the future.
    pub fn rearm(&self) {
        *self.deadline.lock() = Instant::now() + self.period;
    }

    /// Resolves when the deadline passes. Cancel-safe: dropping the
    /// future has no effect on the deadline.
    pub async fn expired(&self) {
        let deadline = *self.deadline.lock();
        tokio::time::sleep_until(deadline).await;
    }
}
