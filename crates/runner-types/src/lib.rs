//! Common types module for the transaction runner.
//!
//! This module defines the data model shared by every runner crate: the run
//! configuration, planned jobs and their lifecycle states, aggregate statistics,
//! events, and the small helpers used to format and convert them.

/// Transaction delivery types for blockchain interactions.
pub mod delivery;
/// Event types published while a run is in progress.
pub mod events;
/// Run configuration, planned jobs and per-job records.
pub mod job;
/// Registry trait for self-registering implementations.
pub mod registry;
/// Zeroizing string wrapper for private keys.
pub mod secret_string;
/// Aggregate run statistics and outcomes.
pub mod stats;
/// Utility functions for formatting and unit conversion.
pub mod utils;
/// Configuration validation types for ensuring type-safe configurations.
pub mod validation;

pub use delivery::*;
pub use events::*;
pub use job::*;
pub use registry::ImplementationRegistry;
pub use secret_string::SecretString;
pub use stats::*;
pub use utils::{
	estimate_gas_cost, format_ether, parse_ether_amount, parse_gwei_amount, truncate_id,
	with_0x_prefix, without_0x_prefix, TRANSFER_GAS_LIMIT,
};
pub use validation::*;
