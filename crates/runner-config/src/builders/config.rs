//! Configuration builder for tests.
//!
//! Produces a [`Config`] pointing at a local node with a well-known development
//! key, so tests only spell out the fields they care about.

use crate::{
	AccountConfig, Config, DeliveryConfig, NetworkConfig, RunSettings, RunnerConfig,
	DEFAULT_MIN_GAS_PRICE_GWEI,
};
use std::collections::HashMap;

/// First account of the default anvil/hardhat mnemonic.
const DEV_PRIVATE_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// Builder for creating `Config` instances with a fluent API.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
	runner_id: String,
	rpc_url: String,
	drain_timeout_seconds: Option<u64>,
	min_confirmations: u64,
	run: RunSettings,
}

impl Default for ConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigBuilder {
	pub fn new() -> Self {
		Self {
			runner_id: "test-runner".to_string(),
			rpc_url: "http://localhost:8545".to_string(),
			drain_timeout_seconds: None,
			min_confirmations: 1,
			run: RunSettings {
				target_address: "0x70997970c51812dc3a010c7d01b50e0d17dc79c8".to_string(),
				count: 5,
				value: "0".to_string(),
				gas_price: "0.05".to_string(),
				delay_ms: 0,
				max_pending: 2,
				min_gas_price: DEFAULT_MIN_GAS_PRICE_GWEI.to_string(),
			},
		}
	}

	pub fn runner_id(mut self, id: impl Into<String>) -> Self {
		self.runner_id = id.into();
		self
	}

	pub fn rpc_url(mut self, url: impl Into<String>) -> Self {
		self.rpc_url = url.into();
		self
	}

	pub fn drain_timeout_seconds(mut self, seconds: u64) -> Self {
		self.drain_timeout_seconds = Some(seconds);
		self
	}

	pub fn min_confirmations(mut self, confirmations: u64) -> Self {
		self.min_confirmations = confirmations;
		self
	}

	pub fn count(mut self, count: i64) -> Self {
		self.run.count = count;
		self
	}

	pub fn max_pending(mut self, max_pending: i64) -> Self {
		self.run.max_pending = max_pending;
		self
	}

	pub fn gas_price(mut self, gwei: impl Into<String>) -> Self {
		self.run.gas_price = gwei.into();
		self
	}

	pub fn build(self) -> Config {
		let mut local = toml::Table::new();
		local.insert(
			"private_key".to_string(),
			toml::Value::String(DEV_PRIVATE_KEY.to_string()),
		);

		Config {
			runner: RunnerConfig {
				id: self.runner_id,
				drain_timeout_seconds: self.drain_timeout_seconds,
				explorer_tx_url: None,
			},
			network: NetworkConfig {
				rpc_url: self.rpc_url,
				chain_id: None,
			},
			account: AccountConfig {
				primary: "local".to_string(),
				implementations: HashMap::from([("local".to_string(), toml::Value::Table(local))]),
			},
			delivery: DeliveryConfig {
				min_confirmations: self.min_confirmations,
				..DeliveryConfig::default()
			},
			run: self.run,
		}
	}
}
