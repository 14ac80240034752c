//! Configuration module for the transaction runner.
//!
//! This module provides structures and utilities for managing runner configuration.
//! It supports loading configuration from TOML files and provides validation to ensure
//! all required configuration values are properly set.
//!
//! ## Modular Configuration Support
//!
//! Configurations can be split into multiple files:
//! - Use `include = ["file1.toml", "file2.toml"]` to include other config files
//! - Each top-level section must be unique across all files (no duplicates allowed)

#[cfg(feature = "testing")]
pub mod builders {
	pub mod config;
}
mod loader;
mod run;

pub use run::{RunOverrides, RunSettings, ValidatedRun, DEFAULT_MIN_GAS_PRICE_GWEI};

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message only, not the whole input
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the runner.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Identity and lifecycle settings of this runner instance.
	pub runner: RunnerConfig,
	/// Ledger endpoint.
	pub network: NetworkConfig,
	/// Configuration for account management.
	pub account: AccountConfig,
	/// Confirmation policy of the ledger port.
	#[serde(default)]
	pub delivery: DeliveryConfig,
	/// Parameters of the transfer run, in human units.
	pub run: RunSettings,
}

/// Configuration specific to the runner instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunnerConfig {
	/// Identifier used in log output.
	pub id: String,
	/// How long to wait for pending transactions once submission stops.
	/// Waits without a deadline when unset.
	#[serde(default)]
	pub drain_timeout_seconds: Option<u64>,
	/// Block explorer prefix for transaction links, e.g. `https://basescan.org/tx/`.
	#[serde(default)]
	pub explorer_tx_url: Option<String>,
}

/// Ledger endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
	/// HTTP JSON-RPC endpoint.
	pub rpc_url: String,
	/// Expected chain id; checked against the node when set.
	#[serde(default)]
	pub chain_id: Option<u64>,
}

/// Configuration for account management.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of account implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

impl AccountConfig {
	/// Returns the raw configuration of the primary implementation.
	pub fn primary_config(&self) -> Option<&toml::Value> {
		self.implementations.get(&self.primary)
	}
}

/// Confirmation policy of the ledger port.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeliveryConfig {
	/// Name of the delivery implementation to use.
	#[serde(default = "default_delivery_implementation")]
	pub implementation: String,
	/// Blocks required before a transaction counts as confirmed; the
	/// inclusion block counts as one.
	#[serde(default = "default_confirmations")]
	pub min_confirmations: u64,
	/// Interval between receipt polls.
	#[serde(default = "default_poll_interval_ms")]
	pub poll_interval_ms: u64,
	/// Upper bound on a single confirmation wait.
	#[serde(default = "default_confirmation_timeout_seconds")]
	pub confirmation_timeout_seconds: u64,
}

impl Default for DeliveryConfig {
	fn default() -> Self {
		Self {
			implementation: default_delivery_implementation(),
			min_confirmations: default_confirmations(),
			poll_interval_ms: default_poll_interval_ms(),
			confirmation_timeout_seconds: default_confirmation_timeout_seconds(),
		}
	}
}

impl DeliveryConfig {
	pub fn poll_interval(&self) -> Duration {
		Duration::from_millis(self.poll_interval_ms)
	}

	pub fn confirmation_timeout(&self) -> Duration {
		Duration::from_secs(self.confirmation_timeout_seconds)
	}
}

fn default_delivery_implementation() -> String {
	"evm_alloy".to_string()
}

fn default_confirmations() -> u64 {
	1
}

fn default_poll_interval_ms() -> u64 {
	2000
}

fn default_confirmation_timeout_seconds() -> u64 {
	600
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = String::with_capacity(input.len());
	let mut last_end = 0;

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match default_value {
				Some(default) => default.to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)));
				},
			},
		};

		result.push_str(&input[last_end..full_match.start()]);
		result.push_str(&value);
		last_end = full_match.end();
	}
	result.push_str(&input[last_end..]);

	Ok(result)
}

impl Config {
	/// Loads configuration from a file with environment variable resolution.
	///
	/// Supports `include = ["file1.toml", "file2.toml"]`; each top-level section
	/// must be unique across all configuration files.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let path_buf = Path::new(path);
		let base_dir = path_buf.parent().unwrap_or_else(|| Path::new("."));

		let mut loader = loader::ConfigLoader::new(base_dir);
		let file_name = path_buf
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path)))?;
		loader.load_config(file_name).await
	}

	/// Validates the run section and converts it into a [`runner_types::RunConfig`].
	///
	/// Every violation is collected; the error message lists all of them.
	pub fn run_config(&self) -> Result<ValidatedRun, ConfigError> {
		let drain_timeout = self.runner.drain_timeout_seconds.map(Duration::from_secs);
		self.run.validate(drain_timeout)
	}

	/// Checks the sections that do not depend on per-run overrides.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.runner.id.is_empty() {
			return Err(ConfigError::Validation("Runner ID cannot be empty".into()));
		}
		if self.runner.drain_timeout_seconds == Some(0) {
			return Err(ConfigError::Validation(
				"drain_timeout_seconds must be greater than 0 when set".into(),
			));
		}

		let rpc_url = self.network.rpc_url.trim();
		if rpc_url.is_empty() {
			return Err(ConfigError::Validation(
				"Network rpc_url cannot be empty".into(),
			));
		}
		if !(rpc_url.starts_with("http://") || rpc_url.starts_with("https://")) {
			return Err(ConfigError::Validation(format!(
				"Network rpc_url must be an http(s) URL, got '{}'",
				rpc_url
			)));
		}

		if self.account.implementations.is_empty() {
			return Err(ConfigError::Validation(
				"Account implementation cannot be empty".into(),
			));
		}
		if self.account.primary_config().is_none() {
			return Err(ConfigError::Validation(format!(
				"Primary account '{}' not found in implementations",
				self.account.primary
			)));
		}

		if self.delivery.min_confirmations == 0 {
			return Err(ConfigError::Validation(
				"min_confirmations must be at least 1".into(),
			));
		}
		if self.delivery.min_confirmations > 100 {
			return Err(ConfigError::Validation(
				"min_confirmations cannot exceed 100".into(),
			));
		}
		if self.delivery.poll_interval_ms == 0 {
			return Err(ConfigError::Validation(
				"poll_interval_ms must be greater than 0".into(),
			));
		}
		if self.delivery.confirmation_timeout_seconds == 0 {
			return Err(ConfigError::Validation(
				"confirmation_timeout_seconds must be greater than 0".into(),
			));
		}

		Ok(())
	}
}

/// Parses a TOML string, resolving environment variables and validating the
/// static sections. The run section is checked by [`Config::run_config`] so
/// that command-line overrides can be applied first.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const BASE_CONFIG: &str = r#"
[runner]
id = "test-runner"

[network]
rpc_url = "http://localhost:8545"

[account]
primary = "local"
[account.implementations.local]
private_key = "${TEST_RUNNER_PRIVATE_KEY:-0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80}"

[run]
target_address = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8"
count = 5
value = "0.0001"
gas_price = "0.05"
max_pending = 2
"#;

	#[test]
	fn test_env_var_resolution() {
		std::env::set_var("TEST_RUNNER_HOST", "localhost");
		std::env::set_var("TEST_RUNNER_PORT", "8545");

		let input = "url = \"http://${TEST_RUNNER_HOST}:${TEST_RUNNER_PORT}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "url = \"http://localhost:8545\"");

		std::env::remove_var("TEST_RUNNER_HOST");
		std::env::remove_var("TEST_RUNNER_PORT");
	}

	#[test]
	fn test_env_var_with_default() {
		let input = "value = \"${MISSING_RUNNER_VAR:-default_value}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "value = \"default_value\"");
	}

	#[test]
	fn test_missing_env_var_error() {
		let input = "value = \"${MISSING_RUNNER_VAR}\"";
		let result = resolve_env_vars(input);
		assert!(result.is_err());
		assert!(result
			.unwrap_err()
			.to_string()
			.contains("MISSING_RUNNER_VAR"));
	}

	#[test]
	fn test_oversized_input_rejected() {
		let input = "a".repeat(1024 * 1024 + 1);
		assert!(matches!(
			resolve_env_vars(&input),
			Err(ConfigError::Validation(_))
		));
	}

	#[test]
	fn test_parse_applies_defaults() {
		let config: Config = BASE_CONFIG.parse().unwrap();
		assert_eq!(config.runner.id, "test-runner");
		assert_eq!(config.runner.drain_timeout_seconds, None);
		assert_eq!(config.delivery.implementation, "evm_alloy");
		assert_eq!(config.delivery.min_confirmations, 1);
		assert_eq!(config.delivery.poll_interval(), Duration::from_millis(2000));
		assert_eq!(
			config.delivery.confirmation_timeout(),
			Duration::from_secs(600)
		);
		assert_eq!(config.run.delay_ms, 0);
		assert_eq!(config.run.min_gas_price, DEFAULT_MIN_GAS_PRICE_GWEI);
		assert!(config.account.primary_config().is_some());
	}

	#[test]
	fn test_config_with_env_vars() {
		std::env::set_var("TEST_RUNNER_ID", "base-mainnet");

		let config_str = BASE_CONFIG.replace("\"test-runner\"", "\"${TEST_RUNNER_ID}\"");
		let config: Config = config_str.parse().unwrap();
		assert_eq!(config.runner.id, "base-mainnet");

		std::env::remove_var("TEST_RUNNER_ID");
	}

	#[test]
	fn test_min_confirmations_bounds() {
		let config_str = format!("{}\n[delivery]\nmin_confirmations = 101\n", BASE_CONFIG);
		let err = config_str.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("cannot exceed 100"));

		let config_str = format!("{}\n[delivery]\nmin_confirmations = 0\n", BASE_CONFIG);
		let err = config_str.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("at least 1"));
	}

	#[test]
	fn test_unknown_primary_account() {
		let config_str = BASE_CONFIG.replace("primary = \"local\"", "primary = \"kms\"");
		let err = config_str.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("Primary account 'kms'"));
	}

	#[test]
	fn test_rpc_url_must_be_http() {
		let config_str = BASE_CONFIG.replace("http://localhost:8545", "ws://localhost:8546");
		let err = config_str.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("http(s) URL"));
	}

	#[test]
	fn test_zero_drain_timeout_rejected() {
		let config_str = BASE_CONFIG.replace(
			"id = \"test-runner\"",
			"id = \"test-runner\"\ndrain_timeout_seconds = 0",
		);
		assert!(config_str.parse::<Config>().is_err());
	}

	#[test]
	fn test_run_config_conversion() {
		let config_str = BASE_CONFIG.replace(
			"id = \"test-runner\"",
			"id = \"test-runner\"\ndrain_timeout_seconds = 30",
		);
		let config: Config = config_str.parse().unwrap();
		let validated = config.run_config().unwrap();

		assert_eq!(validated.config.count, 5);
		assert_eq!(validated.config.max_pending, 2);
		assert_eq!(validated.config.gas_price, 50_000_000);
		assert_eq!(validated.config.drain_timeout, Some(Duration::from_secs(30)));
		assert!(validated.warnings.is_empty());
	}
}
