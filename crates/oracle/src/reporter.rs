//! The reporting state machine.
//!
//! One cooperative loop: wake on the monitoring tick, observe the relay
//! era, and when it advances (and the contract is ready) walk the stash
//! set sequentially through report assembly and submission. Recovery
//! mode overlays every base state while any endpoint is blacklisted.

use crate::config::{ConfigError, OracleConfig};
use crate::era_tracker::EraTracker;
use crate::error::OracleError;
use crate::report_builder::ReportBuilder;
use crate::submitter::{SubmitOutcome, Submitter};
use crate::watchdog::Watchdog;
use eralink_client::{FailureArbiter, OracleApi, ParaApi, RelayApi};
use eralink_metrics::oracle as metrics;
use eralink_types::{AccountId32, EraId, ReporterStatus};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Timing and mode knobs the reporter needs from the configuration.
struct ReporterSettings {
    frequency: Duration,
    watchdog_period: Duration,
    era_update_delay: Duration,
    era_delay_time: Duration,
    shutdown_grace: Duration,
    era_duration_blocks: u64,
    initial_block_number: u64,
    debug_mode: bool,
}

impl From<&OracleConfig> for ReporterSettings {
    fn from(config: &OracleConfig) -> Self {
        Self {
            frequency: config.frequency_of_requests,
            watchdog_period: config.watchdog_period(),
            era_update_delay: config.era_update_delay,
            era_delay_time: config.era_delay_time,
            shutdown_grace: config.shutdown_grace,
            era_duration_blocks: config.era_duration_blocks,
            initial_block_number: config.initial_block_number,
            debug_mode: config.debug_mode,
        }
    }
}

/// Top-level orchestrator owning the FSM of the oracle.
pub struct Reporter {
    settings: ReporterSettings,
    relay: Arc<dyn RelayApi>,
    para: Arc<dyn ParaApi>,
    oracle: Arc<dyn OracleApi>,
    builder: ReportBuilder,
    submitter: Submitter,
    arbiter: Arc<FailureArbiter>,
    status: watch::Sender<ReporterStatus>,
    tracker: Option<EraTracker>,
    last_era_reported: Option<EraId>,
}

impl Reporter {
    /// Wire the reporter up. Nothing touches the network until
    /// [`Self::initialize`] runs.
    pub fn new(
        config: &OracleConfig,
        relay: Arc<dyn RelayApi>,
        para: Arc<dyn ParaApi>,
        oracle: Arc<dyn OracleApi>,
        submitter: Submitter,
        arbiter: Arc<FailureArbiter>,
        status: watch::Sender<ReporterStatus>,
    ) -> Self {
        Self {
            settings: ReporterSettings::from(config),
            builder: ReportBuilder::new(relay.clone()),
            relay,
            para,
            oracle,
            submitter,
            arbiter,
            status,
            tracker: None,
            last_era_reported: None,
        }
    }

    /// Last era the reporter completed in this process lifetime.
    pub fn last_era_reported(&self) -> Option<EraId> {
        self.last_era_reported
    }

    fn set_status(&self, status: ReporterStatus) {
        self.status.send_replace(status);
    }

    /// Startup sequence: verify the contract is deployed, learn the
    /// chain id, fetch the era anchor and build the tracker.
    pub async fn initialize(&mut self) -> Result<(), OracleError> {
        self.set_status(ReporterStatus::Starting);

        let code = self
            .para
            .code_at(self.submitter.contract_address())
            .await
            .map_err(OracleError::from_para)?;
        if code.is_empty() {
            return Err(OracleError::Config(ConfigError::Contract(format!(
                "no code at {}; wrong address or contract not deployed",
                self.submitter.contract_address()
            ))));
        }

        let chain_id = self
            .para
            .chain_id()
            .await
            .map_err(OracleError::from_para)?;
        self.submitter.set_chain_id(chain_id);

        let anchor = self.oracle.anchor().await.map_err(OracleError::from_para)?;
        self.tracker = Some(EraTracker::new(
            anchor,
            self.settings.era_duration_blocks,
            self.settings.initial_block_number,
        ));

        metrics::set_agent(&self.relay.connected_url().await);
        info!(
            chain_id,
            oracle = %self.submitter.address(),
            contract = %self.submitter.contract_address(),
            ?anchor,
            "oracle initialized"
        );
        self.set_status(ReporterStatus::Monitoring);
        Ok(())
    }

    /// Run the reporting loop until cancelled or a fatal guard fires.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<(), OracleError> {
        let init = tokio::select! {
            result = self.initialize() => result,
            _ = cancel.cancelled() => return Ok(()),
        };
        if let Err(e) = init {
            error!(error = %e, "oracle startup failed");
            return Err(e);
        }

        let watchdog = Watchdog::new(self.settings.watchdog_period);
        let mut tick = tokio::time::interval(self.settings.frequency);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("shutdown requested, stopping reporter");
                    self.set_status(ReporterStatus::NotWorking);
                    return Ok(());
                }
                _ = watchdog.expired() => {
                    warn!("era watchdog fired, force-reconnecting relay client");
                    self.relay.force_reconnect().await;
                    metrics::set_agent(&self.relay.connected_url().await);
                    watchdog.rearm();
                }
                _ = tick.tick() => {
                    match self.poll_once(&cancel).await {
                        Ok(true) => watchdog.rearm(),
                        Ok(false) => {}
                        Err(e) if e.is_fatal() => {
                            error!(error = %e, grace_secs = self.settings.shutdown_grace.as_secs(),
                                "fatal condition, shutting down after grace period");
                            self.set_status(ReporterStatus::NotWorking);
                            tokio::select! {
                                _ = tokio::time::sleep(self.settings.shutdown_grace) => {}
                                _ = cancel.cancelled() => {}
                            }
                            return Err(e);
                        }
                        Err(e) => {
                            warn!(error = %e, "monitoring tick failed");
                        }
                    }
                }
            }
        }
    }

    /// One monitoring step. Returns `Ok(true)` when the era advanced.
    ///
    /// Public so the scenario tests can drive the FSM tick by tick; the
    /// run loop uses nothing else.
    pub async fn poll_once(&mut self, cancel: &CancellationToken) -> Result<bool, OracleError> {
        self.arbiter.tick();
        if self.arbiter.recovery_active() {
            self.set_status(ReporterStatus::Recovering);
            // Probe both chains; a success on a healthy (or just
            // un-blacklisted) endpoint satisfies the recovery exit rule.
            let _ = self.relay.finalized_head().await;
            let _ = self.para.chain_id().await;
            self.arbiter.tick();
            if self.arbiter.recovery_active() {
                return Ok(false);
            }
            info!("all endpoints healthy again");
            self.set_status(ReporterStatus::Monitoring);
        }

        let era_info = self
            .relay
            .active_era()
            .await
            .map_err(OracleError::from_relay)?;
        let observed_era = era_info.index as EraId;
        metrics::ACTIVE_ERA_ID.set(observed_era as f64);

        let tracker = self
            .tracker
            .as_mut()
            .expect("poll_once runs after initialize");
        let advanced = tracker.observe(observed_era);

        if tracker.stagnant_for() > self.settings.era_update_delay {
            return Err(OracleError::SkewFatal(format!(
                "no era advance for {}s (limit {}s)",
                tracker.stagnant_for().as_secs(),
                self.settings.era_update_delay.as_secs()
            )));
        }

        let committed = self
            .oracle
            .committed_era_id()
            .await
            .map_err(OracleError::from_para)?;
        let skew = tracker.anchor().skew_seconds(observed_era, committed);
        if skew > self.settings.era_delay_time.as_secs() {
            return Err(OracleError::SkewFatal(format!(
                "contract era {committed} trails relay era {observed_era} by {skew}s \
                 (limit {}s)",
                self.settings.era_delay_time.as_secs()
            )));
        }

        if let Some(last) = self.last_era_reported {
            metrics::LAST_ERA_REPORTED.set(last as f64);
        }

        let Some(new_era) = advanced else {
            debug!(era = observed_era, "no era change, waiting");
            return Ok(false);
        };
        info!(era = new_era, start = ?era_info.start, "active era advanced");

        let reportable = self
            .oracle
            .current_era_id()
            .await
            .map_err(OracleError::from_para)?;
        if reportable != new_era {
            info!(
                era = new_era,
                reportable, "contract is not accepting this era yet, waiting"
            );
            return Ok(true);
        }
        if self.last_era_reported == Some(reportable) {
            info!(era = reportable, "era already reported, waiting for the next one");
            return Ok(true);
        }

        let stashes = self
            .oracle
            .stash_accounts()
            .await
            .map_err(OracleError::from_para)?;
        if stashes.is_empty() {
            info!(era = reportable, "stash set is empty, nothing to report");
            return Ok(true);
        }

        self.set_status(ReporterStatus::Processing);
        let result = self.process_era(reportable, &stashes, cancel).await;
        self.set_status(ReporterStatus::Monitoring);
        result.map(|_| true)
    }

    /// Walk every stash of the era through build and submit, in contract
    /// order, and advance `last_era_reported` only if each one ended in
    /// success or already-reported.
    async fn process_era(
        &mut self,
        era: EraId,
        stashes: &[AccountId32],
        cancel: &CancellationToken,
    ) -> Result<(), OracleError> {
        let block_number = self
            .tracker
            .as_ref()
            .expect("poll_once runs after initialize")
            .boundary_block(era);

        let Some(snapshot) = self
            .relay
            .block_hash_at(block_number)
            .await
            .map_err(OracleError::from_relay)?
        else {
            warn!(era, block_number, "era boundary block not found, skipping era");
            return Ok(());
        };
        metrics::PREVIOUS_ERA_CHANGE_BLOCK_NUMBER.set(block_number as f64);
        info!(era, block_number, snapshot = %snapshot, "processing era");

        if let Ok(balance) = self.para.balance(self.submitter.address()).await {
            let wei: f64 = balance.to_string().parse().unwrap_or(f64::MAX);
            metrics::ORACLE_BALANCE.set(wei);
        }
        metrics::TOTAL_STASHES_FREE_BALANCE.set(0.0);

        let mut all_reported = true;
        for stash in stashes {
            if cancel.is_cancelled() {
                all_reported = false;
                break;
            }
            match self.handle_stash(era, stash, &snapshot).await {
                Ok(SubmitOutcome::Submitted { tx_hash }) => {
                    info!(era, %stash, %tx_hash, "report accepted");
                }
                Ok(SubmitOutcome::AlreadyReported) => {}
                Ok(SubmitOutcome::DryRun) => {}
                Err(OracleError::TxRevert { .. }) => {
                    // Logged and counted by the submitter. Not retried
                    // this era; the next era is the next attempt.
                    all_reported = false;
                }
                Err(OracleError::RelayData(reason)) => {
                    warn!(era, %stash, reason, "skipping stash: bad relay data");
                    metrics::RELAY_EXCEPTIONS_COUNT.inc();
                    all_reported = false;
                }
                Err(OracleError::Para(reason)) => {
                    warn!(era, %stash, reason, "skipping stash: parachain error");
                    metrics::PARA_EXCEPTIONS_COUNT.inc();
                    all_reported = false;
                }
                Err(OracleError::Client(e)) => {
                    warn!(era, %stash, error = %e, "skipping stash: client error");
                    all_reported = false;
                }
                Err(fatal) => return Err(fatal),
            }
        }

        if all_reported && !self.settings.debug_mode {
            self.last_era_reported = Some(era);
            metrics::LAST_ERA_REPORTED.set(era as f64);
            metrics::TIME_ELAPSED_UNTIL_LAST_ERA_REPORT.set(unix_now_secs() as f64);
            info!(era, "era fully reported");
        }
        Ok(())
    }

    async fn handle_stash(
        &mut self,
        era: EraId,
        stash: &AccountId32,
        snapshot: &eralink_types::BlockHash,
    ) -> Result<SubmitOutcome, OracleError> {
        let report = self.builder.build(stash, snapshot).await?;
        metrics::TOTAL_STASHES_FREE_BALANCE.add(report.stash_balance as f64);
        self.submitter.submit(era, &report).await
    }
}

fn unix_now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
