//! eralink oracle daemon.
//!
//! Flagless entry point: configuration comes from the environment, and
//! SIGINT/SIGTERM trigger a graceful shutdown with a bounded drain.

mod supervisor;

use anyhow::Result;
use eralink_client::{FailureArbiter, OracleMaster, ParaClient, RelayClient};
use eralink_oracle::{OracleConfig, Reporter, Submitter};
use eralink_types::ReporterStatus;
use std::sync::Arc;
use std::time::Duration;
use supervisor::Supervisor;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Window allotted to in-flight work once a shutdown signal arrives.
const SHUTDOWN_DRAIN: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = match OracleConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "configuration is invalid");
            std::process::exit(1);
        }
    };
    info!(
        ?config,
        para_id = config.para_id,
        ss58_format = config.ss58_format,
        type_registry_preset = %config.type_registry_preset,
        "configuration loaded"
    );

    eralink_metrics::init();
    let (status_tx, status_rx) = watch::channel(ReporterStatus::NotWorking);

    let arbiter = Arc::new(FailureArbiter::new(
        config.max_failure_requests,
        config.blacklist_timeout,
    ));
    let relay = Arc::new(RelayClient::new(&config.ws_urls_relay, &arbiter));
    let para = Arc::new(ParaClient::new(&config.ws_urls_para, &arbiter));
    let oracle = Arc::new(OracleMaster::new(para.clone(), config.contract_address));

    let submitter = Submitter::new(
        para.clone(),
        oracle.clone(),
        config.contract_address,
        config.signer.clone(),
        config.gas_limit,
        config.max_priority_fee_per_gas,
        config.debug_mode,
    );

    let supervisor = Supervisor::new(SHUTDOWN_DRAIN);
    let health_addr = config.health_addr;
    supervisor.spawn("health-server", async move {
        eralink_metrics::server::start_health_server(health_addr, status_rx)
            .await
            .map_err(|e| anyhow::anyhow!("{e}"))
    });

    let reporter = Reporter::new(
        &config,
        relay,
        para,
        oracle,
        submitter,
        arbiter,
        status_tx,
    );
    let cancel = supervisor.cancellation_token();
    let mut reporter_handle = tokio::spawn(reporter.run(cancel.clone()));

    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
    let outcome = tokio::select! {
        result = &mut reporter_handle => Some(result),
        _ = tokio::signal::ctrl_c() => {
            info!("received SIGINT");
            None
        }
        _ = sigterm.recv() => {
            info!("received SIGTERM");
            None
        }
    };

    let result = match outcome {
        // The reporter ended on its own: fatal guard or startup failure.
        Some(join_result) => join_result?,
        None => {
            cancel.cancel();
            match tokio::time::timeout(SHUTDOWN_DRAIN, &mut reporter_handle).await {
                Ok(join_result) => join_result?,
                Err(_) => {
                    error!("reporter did not drain in time, aborting");
                    reporter_handle.abort();
                    Ok(())
                }
            }
        }
    };

    supervisor.shutdown().await;

    if let Err(e) = result {
        error!(error = %e, "oracle terminated with a fatal error");
        std::process::exit(1);
    }
    info!("oracle stopped");
    Ok(())
}

/// Seed the tracing filter from `LOG_LEVEL_STDOUT`; `RUST_LOG` wins when
/// set.
fn init_tracing() {
    let level = std::env::var("LOG_LEVEL_STDOUT")
        .unwrap_or_else(|_| "INFO".into())
        .to_lowercase();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
