//! eralink Prometheus metrics infrastructure.
//!
//! Centralized metric definitions for the oracle daemon, plus the HTTP
//! surface publishing `/metrics` and `/healthcheck`.

pub mod oracle;
pub mod server;

pub use server::spawn_health_server;

use once_cell::sync::Lazy;
use prometheus::Registry;

/// Global Prometheus registry for all eralink metrics.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    oracle::register_metrics(&registry);
    registry
});

/// Initialize all metrics. Call once at startup.
pub fn init() {
    Lazy::force(&REGISTRY);
    tracing::info!("eralink metrics initialized");
}
