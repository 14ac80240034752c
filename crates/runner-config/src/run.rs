//! The `[run]` section and its validation contract.
//!
//! Values are kept in the units a person types (ETH, gwei, milliseconds) until
//! [`RunSettings::validate`] converts them into a [`RunConfig`].

use crate::ConfigError;
use alloy_primitives::Address;
use runner_types::{parse_ether_amount, parse_gwei_amount, without_0x_prefix, RunConfig};
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Gas price below which a warning is emitted, in gwei.
pub const DEFAULT_MIN_GAS_PRICE_GWEI: &str = "0.01";

const MAX_COUNT: i64 = 2000;

/// Run parameters as written in the configuration file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunSettings {
	/// Recipient of every transfer.
	pub target_address: String,
	/// Number of transfers, 1 to 2000.
	pub count: i64,
	/// Value of each transfer in ETH.
	#[serde(default = "default_value", deserialize_with = "deserialize_amount")]
	pub value: String,
	/// Gas price in gwei.
	#[serde(deserialize_with = "deserialize_amount")]
	pub gas_price: String,
	/// Pause after each submission.
	#[serde(default)]
	pub delay_ms: i64,
	/// Cap on transactions awaiting confirmation.
	#[serde(default = "default_max_pending")]
	pub max_pending: i64,
	/// Warning threshold for the gas price, in gwei.
	#[serde(
		default = "default_min_gas_price",
		deserialize_with = "deserialize_amount"
	)]
	pub min_gas_price: String,
}

fn default_value() -> String {
	"0".to_string()
}

fn default_max_pending() -> i64 {
	1
}

fn default_min_gas_price() -> String {
	DEFAULT_MIN_GAS_PRICE_GWEI.to_string()
}

/// Accepts `"0.05"`, `5` or `0.05` for amount fields.
fn deserialize_amount<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Amount {
		Text(String),
		Integer(i64),
		Float(f64),
	}

	Ok(match Amount::deserialize(deserializer)? {
		Amount::Text(s) => s,
		Amount::Integer(i) => i.to_string(),
		Amount::Float(f) => f.to_string(),
	})
}

/// Output of a successful validation.
#[derive(Debug, Clone)]
pub struct ValidatedRun {
	pub config: RunConfig,
	/// Advisory messages that do not block the run.
	pub warnings: Vec<String>,
}

/// Values supplied on the command line, replacing their file counterparts.
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
	pub target_address: Option<String>,
	pub count: Option<i64>,
	pub value: Option<String>,
	pub gas_price: Option<String>,
	pub delay_ms: Option<i64>,
	pub max_pending: Option<i64>,
}

impl RunSettings {
	/// Replaces every field for which an override was given.
	pub fn apply_overrides(&mut self, overrides: RunOverrides) {
		if let Some(target) = overrides.target_address {
			self.target_address = target;
		}
		if let Some(count) = overrides.count {
			self.count = count;
		}
		if let Some(value) = overrides.value {
			self.value = value;
		}
		if let Some(gas_price) = overrides.gas_price {
			self.gas_price = gas_price;
		}
		if let Some(delay_ms) = overrides.delay_ms {
			self.delay_ms = delay_ms;
		}
		if let Some(max_pending) = overrides.max_pending {
			self.max_pending = max_pending;
		}
	}

	/// Checks every field and converts the section into base units.
	///
	/// All violations are gathered into one `ConfigError::Validation`, joined by
	/// a space. A gas price under `min_gas_price` only produces a warning.
	pub fn validate(&self, drain_timeout: Option<Duration>) -> Result<ValidatedRun, ConfigError> {
		let mut errors = Vec::new();
		let mut warnings = Vec::new();

		let target = match parse_target_address(&self.target_address) {
			Ok(address) => Some(address),
			Err(message) => {
				errors.push(message);
				None
			},
		};

		if !(1..=MAX_COUNT).contains(&self.count) {
			errors.push(format!(
				"Transaction count must be between 1 and {}.",
				MAX_COUNT
			));
		}

		let value = match parse_ether_amount(&self.value) {
			Ok(value) => Some(value),
			Err(e) => {
				errors.push(format!("Transaction value must be 0 or greater ({}).", e));
				None
			},
		};

		let gas_price = match parse_gwei_amount(&self.gas_price) {
			Ok(gas_price) => Some(gas_price),
			Err(e) => {
				errors.push(format!("Gas price must be 0 or greater ({}).", e));
				None
			},
		};
		if let Some(gas_price) = gas_price {
			match parse_gwei_amount(&self.min_gas_price) {
				Ok(threshold) if gas_price < threshold => warnings.push(format!(
					"Gas price {} gwei is below {} gwei; transactions may not be processed.",
					self.gas_price.trim(),
					self.min_gas_price.trim()
				)),
				Ok(_) => {},
				Err(e) => errors.push(format!("Invalid min_gas_price ({}).", e)),
			}
		}

		if self.delay_ms < 0 {
			errors.push("Delay must be 0 or greater.".to_string());
		}

		if self.max_pending < 1 {
			errors.push("Max pending transactions must be at least 1.".to_string());
		}

		match (target, value, gas_price) {
			(Some(target), Some(value), Some(gas_price)) if errors.is_empty() => Ok(ValidatedRun {
				config: RunConfig {
					target,
					count: self.count as u64,
					value,
					gas_price,
					delay: Duration::from_millis(self.delay_ms as u64),
					max_pending: self.max_pending as usize,
					drain_timeout,
				},
				warnings,
			}),
			_ => Err(ConfigError::Validation(errors.join(" "))),
		}
	}
}

/// Parses a hex address. Mixed-case input must carry a valid EIP-55 checksum;
/// all-lowercase and all-uppercase input is accepted as is.
fn parse_target_address(input: &str) -> Result<Address, String> {
	let trimmed = input.trim();
	if trimmed.is_empty() {
		return Err("Target address is required.".to_string());
	}

	let digits = without_0x_prefix(trimmed);
	if digits.len() != 40 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
		return Err("Invalid address format.".to_string());
	}

	let has_lower = digits.chars().any(|c| c.is_ascii_lowercase());
	let has_upper = digits.chars().any(|c| c.is_ascii_uppercase());
	if has_lower && has_upper {
		Address::parse_checksummed(format!("0x{}", digits), None)
			.map_err(|_| "Invalid address checksum.".to_string())
	} else {
		Address::from_str(digits).map_err(|_| "Invalid address format.".to_string())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::U256;

	fn settings() -> RunSettings {
		RunSettings {
			target_address: "0x70997970C51812dc3A010C7d01b50e0d17dc79C8".to_string(),
			count: 100,
			value: "0.0001".to_string(),
			gas_price: "0.05".to_string(),
			delay_ms: 250,
			max_pending: 5,
			min_gas_price: DEFAULT_MIN_GAS_PRICE_GWEI.to_string(),
		}
	}

	#[test]
	fn test_valid_settings_convert_to_base_units() {
		let validated = settings().validate(None).unwrap();
		let config = validated.config;

		assert_eq!(
			config.target,
			Address::from_str("0x70997970c51812dc3a010c7d01b50e0d17dc79c8").unwrap()
		);
		assert_eq!(config.count, 100);
		assert_eq!(config.value, U256::from(100_000_000_000_000u128));
		assert_eq!(config.gas_price, 50_000_000);
		assert_eq!(config.delay, Duration::from_millis(250));
		assert_eq!(config.max_pending, 5);
		assert!(validated.warnings.is_empty());
	}

	#[test]
	fn test_count_bounds() {
		let mut run = settings();
		run.count = 2000;
		assert!(run.validate(None).is_ok());

		run.count = 2001;
		assert!(run.validate(None).is_err());

		run.count = 0;
		let err = run.validate(None).unwrap_err();
		assert!(err.to_string().contains("between 1 and 2000"));
	}

	#[test]
	fn test_all_errors_reported_together() {
		let run = RunSettings {
			target_address: String::new(),
			count: 0,
			value: "-1".to_string(),
			gas_price: "abc".to_string(),
			delay_ms: -5,
			max_pending: 0,
			min_gas_price: DEFAULT_MIN_GAS_PRICE_GWEI.to_string(),
		};

		let message = run.validate(None).unwrap_err().to_string();
		assert!(message.contains("Target address is required."));
		assert!(message.contains("Transaction count"));
		assert!(message.contains("Transaction value"));
		assert!(message.contains("Gas price"));
		assert!(message.contains("Delay"));
		assert!(message.contains("Max pending"));
	}

	#[test]
	fn test_low_gas_price_warns() {
		let mut run = settings();
		run.gas_price = "0.001".to_string();

		let validated = run.validate(None).unwrap();
		assert_eq!(validated.warnings.len(), 1);
		assert!(validated.warnings[0].contains("below 0.01 gwei"));

		run.gas_price = "0".to_string();
		let validated = run.validate(None).unwrap();
		assert_eq!(validated.config.gas_price, 0);
		assert_eq!(validated.warnings.len(), 1);
	}

	#[test]
	fn test_address_checksum_rules() {
		// all lowercase and all uppercase skip the checksum
		assert!(parse_target_address("0x70997970c51812dc3a010c7d01b50e0d17dc79c8").is_ok());
		assert!(parse_target_address("0x70997970C51812DC3A010C7D01B50E0D17DC79C8").is_ok());
		assert!(parse_target_address("70997970c51812dc3a010c7d01b50e0d17dc79c8").is_ok());

		// mixed case with a wrong checksum
		assert_eq!(
			parse_target_address("0x70997970c51812dc3A010C7d01b50e0d17dc79C8"),
			Err("Invalid address checksum.".to_string())
		);

		assert!(parse_target_address("0x1234").is_err());
		assert!(parse_target_address("0xzz997970c51812dc3a010c7d01b50e0d17dc79c8").is_err());
	}

	#[test]
	fn test_overrides_replace_fields() {
		let mut run = settings();
		run.apply_overrides(RunOverrides {
			count: Some(3),
			gas_price: Some("1".to_string()),
			..Default::default()
		});

		assert_eq!(run.count, 3);
		assert_eq!(run.gas_price, "1");
		assert_eq!(run.value, "0.0001");
		assert_eq!(run.max_pending, 5);
	}

	#[test]
	fn test_numeric_amounts_deserialize() {
		let run: RunSettings = toml::from_str(
			r#"
target_address = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8"
count = 2
value = 0
gas_price = 0.05
"#,
		)
		.unwrap();

		assert_eq!(run.value, "0");
		assert_eq!(run.gas_price, "0.05");
		assert_eq!(run.max_pending, 1);
		assert_eq!(run.min_gas_price, "0.01");
	}
}
