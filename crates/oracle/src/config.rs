//! Environment-driven configuration.
//!
//! The daemon has a flagless entry point; every knob is an environment
//! variable. Values are validated here so every later failure is an
//! operational condition, not a misconfiguration.

use alloy_primitives::Address;
use alloy_signer_local::PrivateKeySigner;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// SS58 formats the relay side accepts (polkadot, kusama, generic).
const SS58_FORMATS: &[u16] = &[0, 2, 42];

/// Configuration errors, fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is not set.
    #[error("missing required environment variable {0}")]
    MissingEnv(&'static str),

    /// An environment variable is set to an unusable value.
    #[error("invalid value for {name}: {reason}")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The oracle private key could not be loaded or parsed. The message
    /// never echoes key material.
    #[error("oracle private key: {0}")]
    Key(String),

    /// The ABI artifact is unreadable or incomplete.
    #[error("ABI: {0}")]
    Abi(String),

    /// The configured contract address has no deployed code.
    #[error("contract: {0}")]
    Contract(String),
}

/// Validated daemon configuration.
pub struct OracleConfig {
    /// Relay-chain WebSocket endpoints, in preference order.
    pub ws_urls_relay: Vec<String>,
    /// Parachain WebSocket endpoints, in preference order.
    pub ws_urls_para: Vec<String>,
    /// OracleMaster contract address.
    pub contract_address: Address,
    /// Oracle signing key.
    pub signer: PrivateKeySigner,
    /// Path to the ABI artifact cross-checked at startup.
    pub abi_path: PathBuf,
    /// Gas limit for report transactions.
    pub gas_limit: u64,
    /// EIP-1559 priority fee.
    pub max_priority_fee_per_gas: u128,
    /// Monitoring tick interval.
    pub frequency_of_requests: Duration,
    /// Consecutive failures tolerated before an endpoint is blacklisted.
    pub max_failure_requests: u32,
    /// Blacklist cooldown.
    pub blacklist_timeout: Duration,
    /// Watchdog period base (the local era duration).
    pub era_duration_seconds: u64,
    /// Era length in blocks, for boundary arithmetic.
    pub era_duration_blocks: u64,
    /// Block number of era 0's boundary.
    pub initial_block_number: u64,
    /// SS58 address format of the relay chain.
    pub ss58_format: u16,
    /// Relay type registry preset name.
    pub type_registry_preset: String,
    /// Parachain id.
    pub para_id: u32,
    /// Bind address of the health/metrics HTTP surface.
    pub health_addr: SocketAddr,
    /// Log verbosity seed for stdout.
    pub log_level: String,
    /// When true, reports are built and logged but never submitted.
    pub debug_mode: bool,
    /// Watchdog slack on top of the era duration.
    pub watchdog_delay: u64,
    /// Maximum tolerated local era stagnation.
    pub era_update_delay: Duration,
    /// Maximum tolerated contract/relay skew in wall time.
    pub era_delay_time: Duration,
    /// Grace period before a fatal exit.
    pub shutdown_grace: Duration,
}

impl fmt::Debug for OracleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OracleConfig")
            .field("ws_urls_relay", &self.ws_urls_relay)
            .field("ws_urls_para", &self.ws_urls_para)
            .field("contract_address", &self.contract_address)
            .field("oracle_address", &self.signer.address())
            .field("abi_path", &self.abi_path)
            .field("gas_limit", &self.gas_limit)
            .field("frequency_of_requests", &self.frequency_of_requests)
            .field("debug_mode", &self.debug_mode)
            .finish_non_exhaustive()
    }
}

impl OracleConfig {
    /// Load and validate the configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let ws_urls_relay = ws_urls("WS_URL_RELAY")?;
        let ws_urls_para = ws_urls("WS_URL_PARA")?;

        let contract_address = require("CONTRACT_ADDRESS")?
            .parse::<Address>()
            .map_err(|e| ConfigError::InvalidEnv {
                name: "CONTRACT_ADDRESS",
                reason: e.to_string(),
            })?;

        let signer = load_signer()?;

        let abi_path = PathBuf::from(optional("ABI_PATH").unwrap_or_else(|| "assets/oracle.json".into()));
        eralink_client::contract::verify_abi_file(&abi_path).map_err(ConfigError::Abi)?;

        let gas_limit: u64 = parse_or("GAS_LIMIT", 10_000_000)?;
        if gas_limit == 0 {
            return Err(ConfigError::InvalidEnv {
                name: "GAS_LIMIT",
                reason: "must be positive".into(),
            });
        }

        let ss58_format: u16 = parse_or("SS58_FORMAT", 2)?;
        if !SS58_FORMATS.contains(&ss58_format) {
            return Err(ConfigError::InvalidEnv {
                name: "SS58_FORMAT",
                reason: format!("must be one of {SS58_FORMATS:?}"),
            });
        }

        let era_duration_blocks: u64 = parse_or("ERA_DURATION_IN_BLOCKS", 30)?;
        if era_duration_blocks == 0 {
            return Err(ConfigError::InvalidEnv {
                name: "ERA_DURATION_IN_BLOCKS",
                reason: "must be positive".into(),
            });
        }
        let era_duration_seconds: u64 = parse_or("ERA_DURATION_IN_SECONDS", 180)?;
        if era_duration_seconds == 0 {
            return Err(ConfigError::InvalidEnv {
                name: "ERA_DURATION_IN_SECONDS",
                reason: "must be positive".into(),
            });
        }

        let ip: IpAddr = parse_or_str("REST_API_SERVER_IP_ADDRESS", "0.0.0.0")?;
        let rest_port: u16 = parse_or("REST_API_SERVER_PORT", 8000)?;
        let prometheus_port: u16 = parse_or("PROMETHEUS_METRICS_PORT", rest_port)?;
        if prometheus_port != rest_port {
            warn!(
                rest_port,
                prometheus_port,
                "PROMETHEUS_METRICS_PORT differs from REST_API_SERVER_PORT; \
                 both routes are served on the REST port"
            );
        }

        let debug_mode = optional("ORACLE_MODE")
            .map(|mode| mode.eq_ignore_ascii_case("DEBUG"))
            .unwrap_or(false);

        Ok(Self {
            ws_urls_relay,
            ws_urls_para,
            contract_address,
            signer,
            abi_path,
            gas_limit,
            max_priority_fee_per_gas: parse_or("MAX_PRIORITY_FEE_PER_GAS", 0u128)?,
            frequency_of_requests: Duration::from_secs(parse_or("FREQUENCY_OF_REQUESTS", 180u64)?),
            max_failure_requests: parse_or("MAX_NUMBER_OF_FAILURE_REQUESTS", 10u32)?,
            blacklist_timeout: Duration::from_secs(parse_or("TIMEOUT", 60u64)?),
            era_duration_seconds,
            era_duration_blocks,
            initial_block_number: parse_or("INITIAL_BLOCK_NUMBER", 1u64)?,
            ss58_format,
            type_registry_preset: optional("TYPE_REGISTRY_PRESET")
                .unwrap_or_else(|| "kusama".into()),
            para_id: parse_or("PARA_ID", 999u32)?,
            health_addr: SocketAddr::new(ip, rest_port),
            log_level: optional("LOG_LEVEL_STDOUT").unwrap_or_else(|| "INFO".into()),
            debug_mode,
            watchdog_delay: parse_or("WATCHDOG_DELAY", 5u64)?,
            era_update_delay: Duration::from_secs(parse_or("ERA_UPDATE_DELAY", 360u64)?),
            era_delay_time: Duration::from_secs(parse_or("ERA_DELAY_TIME", 600u64)?),
            shutdown_grace: Duration::from_secs(parse_or("WAITING_TIME_BEFORE_SHUTDOWN", 600u64)?),
        })
    }

    /// Watchdog period: era duration plus the configured slack.
    pub fn watchdog_period(&self) -> Duration {
        Duration::from_secs(self.era_duration_seconds + self.watchdog_delay)
    }
}

fn optional(name: &'static str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::MissingEnv(name))
}

fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: fmt::Display,
{
    match optional(name) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidEnv {
            name,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn parse_or_str<T: FromStr>(name: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: fmt::Display,
{
    let raw = optional(name).unwrap_or_else(|| default.to_string());
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidEnv {
        name,
        reason: e.to_string(),
    })
}

/// Split a comma-separated URL list, dropping entries that are not
/// WebSocket URLs. An empty result is a configuration error.
fn ws_urls(name: &'static str) -> Result<Vec<String>, ConfigError> {
    let raw = require(name)?;
    let mut urls = Vec::new();
    for url in raw.split(',').map(str::trim).filter(|u| !u.is_empty()) {
        if url.starts_with("ws://") || url.starts_with("wss://") {
            urls.push(url.to_string());
        } else {
            warn!(url, "unsupported ws provider removed from {name}");
        }
    }

    if urls.is_empty() {
        return Err(ConfigError::InvalidEnv {
            name,
            reason: "no valid ws:// or wss:// urls".into(),
        });
    }
    Ok(urls)
}

/// Load the signing key from `ORACLE_PRIVATE_KEY` or the file at
/// `ORACLE_PRIVATE_KEY_PATH`. Exactly one of the two must be set.
fn load_signer() -> Result<PrivateKeySigner, ConfigError> {
    let inline = optional("ORACLE_PRIVATE_KEY");
    let path = optional("ORACLE_PRIVATE_KEY_PATH");

    let raw = match (inline, path) {
        (Some(_), Some(_)) => {
            return Err(ConfigError::Key(
                "set either ORACLE_PRIVATE_KEY or ORACLE_PRIVATE_KEY_PATH, not both".into(),
            ))
        }
        (Some(key), None) => key,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Key(format!("cannot read key file {path}: {e}")))?
            .trim()
            .to_string(),
        (None, None) => {
            return Err(ConfigError::Key(
                "neither ORACLE_PRIVATE_KEY nor ORACLE_PRIVATE_KEY_PATH is set".into(),
            ))
        }
    };

    raw.parse::<PrivateKeySigner>()
        .map_err(|_| ConfigError::Key("not a valid 32-byte hex private key".into()))
}
