//! Daemon status published through the health surface.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reporter state as exposed by `GET /healthcheck`.
///
/// `Recovering` is modal: the reporter enters it from any base state
/// when an endpoint is blacklisted and returns to `Monitoring` once no
/// endpoint remains blacklisted and a probe has succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReporterStatus {
    /// Process is up but the oracle has not been configured yet.
    NotWorking,
    /// Config validated and keys loaded; clients connecting.
    Starting,
    /// Waiting for the next era on the monitoring tick.
    Monitoring,
    /// Building and submitting reports for the current era.
    Processing,
    /// At least one endpoint is blacklisted; RPC suppressed.
    Recovering,
}

impl ReporterStatus {
    /// Human-readable form used in the healthcheck JSON body.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReporterStatus::NotWorking => "not working",
            ReporterStatus::Starting => "starting",
            ReporterStatus::Monitoring => "monitoring",
            ReporterStatus::Processing => "processing",
            ReporterStatus::Recovering => "recovering",
        }
    }
}

impl fmt::Display for ReporterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
