//! Per-endpoint failure tracking and the recovery-mode arbiter.
//!
//! Every RPC outcome is reported here. An endpoint whose consecutive
//! failure count exceeds the configured threshold is blacklisted for the
//! cooldown period and the daemon flips into recovery mode. Blacklists
//! are re-checked on every monitoring tick using monotonic time.

use eralink_metrics::oracle as metrics;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Which chain an endpoint belongs to, for exception accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainTag {
    /// Relay chain (source of staking truth).
    Relay,
    /// Parachain (destination of reports).
    Para,
}

#[derive(Debug)]
struct EndpointStateInner {
    consecutive_failures: u32,
    blacklisted_until: Option<Instant>,
}

/// Failure state of a single RPC endpoint.
///
/// Shared between the WebSocket session that reports call outcomes and
/// the [`FailureArbiter`] that expires cooldowns.
#[derive(Debug)]
pub struct EndpointHealth {
    url: String,
    chain: ChainTag,
    threshold: u32,
    cooldown: Duration,
    state: Mutex<EndpointStateInner>,
    shared: Arc<ArbiterShared>,
}

impl EndpointHealth {
    /// Endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Chain this endpoint serves.
    pub fn chain(&self) -> ChainTag {
        self.chain
    }

    /// Current consecutive failure count.
    pub fn consecutive_failures(&self) -> u32 {
        self.state.lock().consecutive_failures
    }

    /// Remaining cooldown, if the endpoint is currently blacklisted.
    pub fn blacklist_remaining(&self) -> Option<Duration> {
        let state = self.state.lock();
        state
            .blacklisted_until
            .and_then(|until| until.checked_duration_since(Instant::now()))
    }

    /// True while the cooldown deadline lies in the future.
    pub fn is_blacklisted(&self) -> bool {
        self.blacklist_remaining().is_some()
    }

    /// Record a successful call: resets the failure counter and, while in
    /// recovery, marks the probe requirement satisfied.
    pub fn record_success(&self) {
        self.state.lock().consecutive_failures = 0;
        if self.shared.in_recovery.load(Ordering::SeqCst) {
            self.shared.probe_succeeded.store(true, Ordering::SeqCst);
        }
    }

    /// Record a failed call. Crossing the threshold blacklists the
    /// endpoint and switches the daemon into recovery mode.
    pub fn record_failure(&self) {
        match self.chain {
            ChainTag::Relay => metrics::RELAY_EXCEPTIONS_COUNT.inc(),
            ChainTag::Para => metrics::PARA_EXCEPTIONS_COUNT.inc(),
        }

        let mut state = self.state.lock();
        state.consecutive_failures += 1;
        if state.consecutive_failures > self.threshold && state.blacklisted_until.is_none() {
            warn!(
                url = %self.url,
                failures = state.consecutive_failures,
                cooldown_secs = self.cooldown.as_secs(),
                "endpoint blacklisted"
            );
            state.blacklisted_until = Some(Instant::now() + self.cooldown);
            drop(state);
            self.shared.enter_recovery();
        }
    }

    /// Clear an elapsed cooldown. The failure counter restarts from zero
    /// so the endpoint gets a full budget after the cooldown.
    fn expire_if_elapsed(&self) {
        let mut state = self.state.lock();
        if let Some(until) = state.blacklisted_until {
            if Instant::now() >= until {
                info!(url = %self.url, "endpoint blacklist expired");
                state.blacklisted_until = None;
                state.consecutive_failures = 0;
            }
        }
    }
}

#[derive(Debug, Default)]
struct ArbiterShared {
    in_recovery: AtomicBool,
    probe_succeeded: AtomicBool,
}

impl ArbiterShared {
    fn enter_recovery(&self) {
        if !self.in_recovery.swap(true, Ordering::SeqCst) {
            self.probe_succeeded.store(false, Ordering::SeqCst);
            metrics::IS_RECOVERY_MODE_ACTIVE.set(1.0);
            warn!("entering recovery mode");
        }
    }

    fn exit_recovery(&self) {
        if self.in_recovery.swap(false, Ordering::SeqCst) {
            metrics::IS_RECOVERY_MODE_ACTIVE.set(0.0);
            info!("recovery mode completed");
        }
    }
}

/// Tracks all endpoints of both chains and owns the recovery-mode flag.
#[derive(Debug)]
pub struct FailureArbiter {
    threshold: u32,
    cooldown: Duration,
    endpoints: Mutex<Vec<Arc<EndpointHealth>>>,
    shared: Arc<ArbiterShared>,
}

impl FailureArbiter {
    /// Create an arbiter with the blacklist threshold
    /// (`MAX_NUMBER_OF_FAILURE_REQUESTS`) and cooldown (`TIMEOUT`).
    pub fn new(threshold: u32, cooldown: Duration) -> Self {
        Self {
            threshold,
            cooldown,
            endpoints: Mutex::new(Vec::new()),
            shared: Arc::new(ArbiterShared::default()),
        }
    }

    /// Register an endpoint and return its shared health handle.
    pub fn register(&self, chain: ChainTag, url: &str) -> Arc<EndpointHealth> {
        let health = Arc::new(EndpointHealth {
            url: url.to_string(),
            chain,
            threshold: self.threshold,
            cooldown: self.cooldown,
            state: Mutex::new(EndpointStateInner {
                consecutive_failures: 0,
                blacklisted_until: None,
            }),
            shared: self.shared.clone(),
        });
        self.endpoints.lock().push(health.clone());
        health
    }

    /// Expire elapsed cooldowns and, when no endpoint remains blacklisted
    /// and a probe has succeeded since recovery began, leave recovery.
    pub fn tick(&self) {
        let endpoints = self.endpoints.lock();
        for endpoint in endpoints.iter() {
            endpoint.expire_if_elapsed();
        }
        let any_blacklisted = endpoints.iter().any(|e| e.is_blacklisted());
        drop(endpoints);

        if !any_blacklisted
            && self.shared.in_recovery.load(Ordering::SeqCst)
            && self.shared.probe_succeeded.load(Ordering::SeqCst)
        {
            self.shared.exit_recovery();
        }
    }

    /// True while the daemon is in recovery mode.
    pub fn recovery_active(&self) -> bool {
        self.shared.in_recovery.load(Ordering::SeqCst)
    }

    /// True if any registered endpoint is currently blacklisted.
    pub fn any_blacklisted(&self) -> bool {
        self.endpoints.lock().iter().any(|e| e.is_blacklisted())
    }
}
