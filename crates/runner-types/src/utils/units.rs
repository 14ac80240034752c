//! Conversion of user-entered amounts into base units.

use alloy_primitives::utils::{parse_units, ParseUnits};
use alloy_primitives::U256;
use thiserror::Error;

/// Gas consumed by a plain value transfer with empty calldata.
pub const TRANSFER_GAS_LIMIT: u64 = 21_000;

/// Errors produced while parsing a decimal amount.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
	#[error("amount is empty")]
	Empty,
	#[error("amount must not be negative: {0}")]
	Negative(String),
	#[error("invalid amount '{amount}': {reason}")]
	Invalid { amount: String, reason: String },
	#[error("amount '{0}' does not fit in 128 bits")]
	Overflow(String),
}

fn parse_non_negative(amount: &str, unit: &str) -> Result<U256, AmountError> {
	let amount = amount.trim();
	if amount.is_empty() {
		return Err(AmountError::Empty);
	}

	match parse_units(amount, unit) {
		Ok(ParseUnits::U256(value)) => Ok(value),
		Ok(ParseUnits::I256(value)) if !value.is_negative() => Ok(value.into_raw()),
		Ok(ParseUnits::I256(_)) => Err(AmountError::Negative(amount.to_string())),
		Err(e) => Err(AmountError::Invalid {
			amount: amount.to_string(),
			reason: e.to_string(),
		}),
	}
}

/// Parses an ETH amount such as `"0.0001"` into wei.
pub fn parse_ether_amount(amount: &str) -> Result<U256, AmountError> {
	parse_non_negative(amount, "ether")
}

/// Parses a gwei amount such as `"0.05"` into wei.
pub fn parse_gwei_amount(amount: &str) -> Result<u128, AmountError> {
	let wei = parse_non_negative(amount, "gwei")?;
	if wei > U256::from(u128::MAX) {
		return Err(AmountError::Overflow(amount.trim().to_string()));
	}
	Ok(wei.to::<u128>())
}

/// Upper bound of the gas spent by `count` plain transfers at `gas_price` wei.
pub fn estimate_gas_cost(count: u64, gas_price: u128) -> U256 {
	U256::from(count) * U256::from(TRANSFER_GAS_LIMIT) * U256::from(gas_price)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_ether_amount() {
		assert_eq!(
			parse_ether_amount("1").unwrap(),
			U256::from(1_000_000_000_000_000_000u128)
		);
		assert_eq!(
			parse_ether_amount(" 0.0001 ").unwrap(),
			U256::from(100_000_000_000_000u128)
		);
		assert_eq!(parse_ether_amount("0").unwrap(), U256::ZERO);
	}

	#[test]
	fn test_parse_rejects_bad_input() {
		assert_eq!(parse_ether_amount(""), Err(AmountError::Empty));
		assert!(matches!(
			parse_ether_amount("-1"),
			Err(AmountError::Negative(_))
		));
		assert!(matches!(
			parse_ether_amount("abc"),
			Err(AmountError::Invalid { .. })
		));
	}

	#[test]
	fn test_parse_gwei_amount() {
		assert_eq!(parse_gwei_amount("1").unwrap(), 1_000_000_000);
		assert_eq!(parse_gwei_amount("0.05").unwrap(), 50_000_000);
		assert!(matches!(
			parse_gwei_amount("-0.5"),
			Err(AmountError::Negative(_))
		));
	}

	#[test]
	fn test_estimate_gas_cost() {
		// 100 transfers at 1 gwei
		assert_eq!(
			estimate_gas_cost(100, 1_000_000_000),
			U256::from(2_100_000_000_000_000u128)
		);
		assert_eq!(estimate_gas_cost(0, 1_000_000_000), U256::ZERO);
	}
}
