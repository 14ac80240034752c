//! String formatting utilities.
//!
//! Provides functions for formatting strings for display, including
//! hex string prefix management, amount formatting, and truncation for readability.

use alloy_primitives::U256;

/// Truncates a long hex identifier for log output.
///
/// Keeps the first 10 and last 8 characters, e.g. `0x12345678...9abcdef0`.
pub fn truncate_id(id: &str) -> String {
	if id.len() <= 20 {
		id.to_string()
	} else {
		format!("{}...{}", &id[..10], &id[id.len() - 8..])
	}
}

/// Adds "0x" prefix to a hex string if it doesn't already have one.
pub fn with_0x_prefix(hex_str: &str) -> String {
	if hex_str.to_lowercase().starts_with("0x") {
		hex_str.to_string()
	} else {
		format!("0x{}", hex_str)
	}
}

/// Removes "0x" or "0X" prefix from a hex string if present.
pub fn without_0x_prefix(hex_str: &str) -> &str {
	hex_str
		.strip_prefix("0x")
		.or_else(|| hex_str.strip_prefix("0X"))
		.unwrap_or(hex_str)
}

/// Formats a base-unit amount with `decimals` decimal places, keeping at most
/// `max_fraction` fractional digits and dropping trailing zeros.
///
/// `format_units(U256::from(1_500_000u64), 6, 6)` yields `"1.5"`.
pub fn format_units(amount: U256, decimals: u8, max_fraction: usize) -> String {
	let raw = amount.to_string();
	if decimals == 0 {
		return raw;
	}

	let decimal_places = decimals as usize;
	let (integer_part, fraction_part) = if raw.len() <= decimal_places {
		("0".to_string(), format!("{:0>width$}", raw, width = decimal_places))
	} else {
		let split = raw.len() - decimal_places;
		(raw[..split].to_string(), raw[split..].to_string())
	};

	let shown = &fraction_part[..max_fraction.min(fraction_part.len())];
	let trimmed = shown.trim_end_matches('0');
	if trimmed.is_empty() {
		integer_part
	} else {
		format!("{}.{}", integer_part, trimmed)
	}
}

/// Formats a wei amount as ETH with up to six fractional digits.
pub fn format_ether(wei: U256) -> String {
	format_units(wei, 18, 6)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_truncate_id() {
		assert_eq!(truncate_id("0x1234"), "0x1234");
		assert_eq!(
			truncate_id("0x5fbdb2315678afecb367f032d93f642f64180aa3"),
			"0x5fbdb231...64180aa3"
		);
	}

	#[test]
	fn test_prefix_helpers() {
		assert_eq!(with_0x_prefix("abcd"), "0xabcd");
		assert_eq!(with_0x_prefix("0Xabcd"), "0Xabcd");
		assert_eq!(without_0x_prefix("0xabcd"), "abcd");
		assert_eq!(without_0x_prefix("abcd"), "abcd");
	}

	#[test]
	fn test_format_ether() {
		assert_eq!(format_ether(U256::from(1_000_000_000_000_000_000u128)), "1");
		assert_eq!(format_ether(U256::from(1_500_000_000_000_000_000u128)), "1.5");
		// 21000 gas at 1 gwei
		assert_eq!(format_ether(U256::from(21_000_000_000_000u128)), "0.000021");
		// Below six fractional digits
		assert_eq!(format_ether(U256::from(1u64)), "0");
		assert_eq!(format_ether(U256::ZERO), "0");
	}

	#[test]
	fn test_format_units_zero_decimals() {
		assert_eq!(format_units(U256::from(1000u64), 0, 6), "1000");
		assert_eq!(format_units(U256::from(1_250_000u64), 6, 2), "1.25");
	}
}
