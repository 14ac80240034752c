//! Utility functions for formatting and unit conversion.
//!
//! This module provides helpers for displaying hashes and amounts and for
//! turning human-entered ETH/gwei amounts into base units.

pub mod formatting;
pub mod units;

pub use formatting::{format_ether, format_units, truncate_id, with_0x_prefix, without_0x_prefix};
pub use units::{
	estimate_gas_cost, parse_ether_amount, parse_gwei_amount, AmountError, TRANSFER_GAS_LIMIT,
};
