//! Core types for the eralink oracle daemon.
//!
//! This crate provides the domain vocabulary shared by every other crate:
//! era arithmetic, relay-chain account identifiers, the per-stash staking
//! report, and the daemon status published through the health surface.

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

pub mod account;
pub mod era;
pub mod report;
pub mod status;

pub use account::{AccountId32, BlockHash};
pub use era::{EraAnchor, EraId};
pub use report::{ReportTuple, StakeStatus, UnlockChunk};
pub use status::ReporterStatus;
