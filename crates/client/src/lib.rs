//! Dual-chain RPC layer for the eralink oracle daemon.
//!
//! One WebSocket session per chain, with per-endpoint failure tracking
//! feeding the [`FailureArbiter`]. The relay side exposes SCALE-typed
//! staking queries pinned to a block hash; the parachain side exposes the
//! eth JSON-RPC subset the submitter needs, plus statically-typed
//! OracleMaster contract bindings.

pub mod api;
pub mod contract;
pub mod endpoint;
pub mod error;
pub mod para;
pub mod relay;
pub mod ws;

pub use api::{OracleApi, ParaApi, RelayApi, TxReceipt};
pub use contract::OracleMaster;
pub use endpoint::{ChainTag, EndpointHealth, FailureArbiter};
pub use error::ClientError;
pub use para::ParaClient;
pub use relay::RelayClient;
