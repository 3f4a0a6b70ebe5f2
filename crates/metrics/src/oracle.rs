//! Oracle daemon metrics.
//!
//! Metric names mirror what operators already scrape for this oracle:
//! era gauges, transaction outcome histograms, and per-chain exception
//! counters.

use once_cell::sync::Lazy;
use prometheus::{Gauge, GaugeVec, Histogram, IntCounter, Registry};

/// 1 while any endpoint is blacklisted, otherwise 0.
pub static IS_RECOVERY_MODE_ACTIVE: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new(
        "is_recovery_mode_active",
        "1, if the recovery mode, otherwise - the default mode",
    )
    .expect("metric can be created")
});

/// Active era index observed on the relay chain.
pub static ACTIVE_ERA_ID: Lazy<Gauge> =
    Lazy::new(|| Gauge::new("active_era_id", "active era index").expect("metric can be created"));

/// Last era this oracle fully reported.
pub static LAST_ERA_REPORTED: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new(
        "last_era_reported",
        "the last era that the oracle has reported",
    )
    .expect("metric can be created")
});

/// Last era in which a submission reverted.
pub static LAST_FAILED_ERA: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new(
        "last_failed_era",
        "the last era in which a report transaction reverted",
    )
    .expect("metric can be created")
});

/// Block number of the previous era change.
pub static PREVIOUS_ERA_CHANGE_BLOCK_NUMBER: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new(
        "previous_era_change_block_number",
        "block number of the previous era change",
    )
    .expect("metric can be created")
});

/// Unix timestamp of the last completed era report.
pub static TIME_ELAPSED_UNTIL_LAST_ERA_REPORT: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new(
        "time_elapsed_until_last_era_report",
        "the time elapsed until the last era report from the unix epoch in seconds",
    )
    .expect("metric can be created")
});

/// Sum of free balances over all stashes in the current era.
pub static TOTAL_STASHES_FREE_BALANCE: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new(
        "total_stashes_free_balance",
        "total free balance of all stash accounts",
    )
    .expect("metric can be created")
});

/// Parachain balance of the oracle's own account.
pub static ORACLE_BALANCE: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new(
        "oracle_balance",
        "parachain balance of the oracle account in wei",
    )
    .expect("metric can be created")
});

/// Reverted report transactions.
pub static TX_REVERT: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(prometheus::histogram_opts!(
        "tx_revert",
        "reverted report transactions"
    ))
    .expect("metric can be created")
});

/// Successfully mined report transactions.
pub static TX_SUCCESS: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(prometheus::histogram_opts!(
        "tx_success",
        "successfully mined report transactions"
    ))
    .expect("metric can be created")
});

/// Exceptions while talking to the parachain.
pub static PARA_EXCEPTIONS_COUNT: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("para_exceptions_count", "parachain exceptions count")
        .expect("metric can be created")
});

/// Exceptions while talking to the relay chain.
pub static RELAY_EXCEPTIONS_COUNT: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("relay_exceptions_count", "relay chain exceptions count")
        .expect("metric can be created")
});

/// Info-style gauge carrying the connected relay endpoint as a label.
pub static AGENT: Lazy<GaugeVec> = Lazy::new(|| {
    GaugeVec::new(
        prometheus::opts!("agent", "connected relay chain node"),
        &["relay_chain_node_address"],
    )
    .expect("metric can be created")
});

/// Point the `agent` info metric at the currently connected relay URL.
///
/// Previous label values are dropped so the metric always carries exactly
/// one series.
pub fn set_agent(relay_url: &str) {
    AGENT.reset();
    AGENT.with_label_values(&[relay_url]).set(1.0);
}

/// Register all oracle metrics with the given registry.
pub fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(IS_RECOVERY_MODE_ACTIVE.clone()))
        .ok();
    registry.register(Box::new(ACTIVE_ERA_ID.clone())).ok();
    registry.register(Box::new(LAST_ERA_REPORTED.clone())).ok();
    registry.register(Box::new(LAST_FAILED_ERA.clone())).ok();
    registry
        .register(Box::new(PREVIOUS_ERA_CHANGE_BLOCK_NUMBER.clone()))
        .ok();
    registry
        .register(Box::new(TIME_ELAPSED_UNTIL_LAST_ERA_REPORT.clone()))
        .ok();
    registry
        .register(Box::new(TOTAL_STASHES_FREE_BALANCE.clone()))
        .ok();
    registry.register(Box::new(ORACLE_BALANCE.clone())).ok();
    registry.register(Box::new(TX_REVERT.clone())).ok();
    registry.register(Box::new(TX_SUCCESS.clone())).ok();
    registry
        .register(Box::new(PARA_EXCEPTIONS_COUNT.clone()))
        .ok();
    registry
        .register(Box::new(RELAY_EXCEPTIONS_COUNT.clone()))
        .ok();
    registry.register(Box::new(AGENT.clone())).ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::core::Collector;

    #[test]
    fn all_metrics_register_once() {
        let registry = Registry::new();
        register_metrics(&registry);
        let families = registry.gather();
        let names: Vec<_> = families.iter().map(|f| f.get_name()).collect();
        assert!(names.contains(&"is_recovery_mode_active"));
        assert!(names.contains(&"tx_success"));
        assert!(names.contains(&"relay_exceptions_count"));
    }

    #[test]
    fn agent_keeps_a_single_series() {
        set_agent("ws://first:9944");
        set_agent("ws://second:9944");
        let metrics = AGENT.collect();
        assert_eq!(metrics[0].get_metric().len(), 1);
        let label = &metrics[0].get_metric()[0].get_label()[0];
        assert_eq!(label.get_value(), "ws://second:9944");
    }
}
