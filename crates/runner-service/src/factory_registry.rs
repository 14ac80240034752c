//! Dynamic factory registry for runner implementations.
//!
//! Collects every account and delivery implementation the crates register, so
//! the engine can be built from the names used in the configuration.

use runner_account::AccountFactory;
use runner_config::Config;
use runner_core::{ReporterInterface, RunEngine, RunnerBuilder, RunnerFactories};
use runner_delivery::DeliveryFactory;
use runner_types::RunConfig;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// Global registry for all implementation factories
pub struct FactoryRegistry {
	pub account: HashMap<String, AccountFactory>,
	pub delivery: HashMap<String, DeliveryFactory>,
}

impl FactoryRegistry {
	pub fn new() -> Self {
		Self {
			account: HashMap::new(),
			delivery: HashMap::new(),
		}
	}

	pub fn register_account(&mut self, name: impl Into<String>, factory: AccountFactory) {
		self.account.insert(name.into(), factory);
	}

	pub fn register_delivery(&mut self, name: impl Into<String>, factory: DeliveryFactory) {
		self.delivery.insert(name.into(), factory);
	}
}

static REGISTRY: OnceLock<FactoryRegistry> = OnceLock::new();

/// Returns the registry, registering all known implementations on first use.
pub fn get_registry() -> &'static FactoryRegistry {
	REGISTRY.get_or_init(|| {
		let mut registry = FactoryRegistry::new();

		for (name, factory) in runner_account::get_all_implementations() {
			tracing::debug!("Registering account implementation: {}", name);
			registry.register_account(name, factory);
		}

		for (name, factory) in runner_delivery::get_all_implementations() {
			tracing::debug!("Registering delivery implementation: {}", name);
			registry.register_delivery(name, factory);
		}

		registry
	})
}

/// Picks the factories for the named implementations, failing on unknown names.
macro_rules! build_factories {
	($registry:expr, $names:expr, $registry_field:ident, $type_name:literal) => {{
		let mut factories = HashMap::new();
		for name in $names {
			if let Some(factory) = $registry.$registry_field.get(name) {
				factories.insert(name.clone(), *factory);
			} else {
				let mut available: Vec<_> = $registry.$registry_field.keys().cloned().collect();
				available.sort();
				return Err(format!(
					"Unknown {} implementation '{}'. Available: [{}]",
					$type_name,
					name,
					available.join(", ")
				)
				.into());
			}
		}
		factories
	}};
}

/// Builds a run engine from the configuration and a validated run.
pub async fn build_runner_from_config(
	config: Config,
	run: RunConfig,
	reporter: Arc<dyn ReporterInterface>,
) -> Result<RunEngine, Box<dyn std::error::Error>> {
	let registry = get_registry();

	let account_factories =
		build_factories!(registry, config.account.implementations.keys(), account, "account");
	let delivery_factories = build_factories!(
		registry,
		std::iter::once(&config.delivery.implementation),
		delivery,
		"delivery"
	);

	let factories = RunnerFactories {
		account_factories,
		delivery_factories,
	};

	Ok(RunnerBuilder::new(config).build(run, reporter, factories).await?)
}

#[cfg(test)]
mod tests {
	use super::*;
	use runner_config::builders::config::ConfigBuilder;
	use runner_core::TracingReporter;

	#[test]
	fn test_registry_contains_builtin_implementations() {
		let registry = get_registry();
		assert!(registry.account.contains_key("local"));
		assert!(registry.delivery.contains_key("evm_alloy"));
	}

	#[tokio::test]
	async fn test_build_runner_from_config() {
		let config = ConfigBuilder::new().count(3).build();
		let run = config.run_config().unwrap().config;

		// Building connects lazily, so no node is needed here.
		let engine = build_runner_from_config(config, run, Arc::new(TracingReporter::default()))
			.await
			.unwrap();
		assert_eq!(engine.config().count, 3);
	}

	#[tokio::test]
	async fn test_unknown_delivery_is_rejected() {
		let mut config = ConfigBuilder::new().build();
		config.delivery.implementation = "carrier_pigeon".to_string();
		let run = config.run_config().unwrap().config;

		let error = build_runner_from_config(config, run, Arc::new(TracingReporter::default()))
			.await
			.err()
			.unwrap();
		assert!(error
			.to_string()
			.starts_with("Unknown delivery implementation 'carrier_pigeon'"));
	}
}
