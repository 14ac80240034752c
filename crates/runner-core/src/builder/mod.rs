//! Builder pattern for constructing run engines.
//!
//! Composes a [`RunEngine`] from the account and delivery implementations
//! named in the configuration, using factory functions looked up by name.

use crate::engine::RunEngine;
use crate::reporter::ReporterInterface;
use runner_account::{AccountError, AccountInterface, AccountService};
use runner_config::Config;
use runner_delivery::{DeliveryError, DeliveryInterface, DeliveryOptions, DeliveryService};
use runner_types::{RunConfig, SecretString};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during engine construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Factory functions available to the builder, keyed by implementation name.
pub struct RunnerFactories<AF, DF> {
	pub account_factories: HashMap<String, AF>,
	pub delivery_factories: HashMap<String, DF>,
}

/// Builder for constructing a [`RunEngine`] with pluggable implementations.
pub struct RunnerBuilder {
	config: Config,
}

impl RunnerBuilder {
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// Builds an engine for `run`, reporting progress to `reporter`.
	///
	/// `run` is passed separately so callers can apply command-line overrides
	/// to the configured run before validating it.
	pub async fn build<AF, DF>(
		self,
		run: RunConfig,
		reporter: Arc<dyn ReporterInterface>,
		factories: RunnerFactories<AF, DF>,
	) -> Result<RunEngine, BuilderError>
	where
		AF: Fn(&toml::Value) -> Result<Box<dyn AccountInterface>, AccountError>,
		DF: Fn(&DeliveryOptions, &SecretString) -> Result<Box<dyn DeliveryInterface>, DeliveryError>,
	{
		let account_name = &self.config.account.primary;
		let account_config = self.config.account.primary_config().ok_or_else(|| {
			BuilderError::Config(format!(
				"Primary account '{}' has no configuration",
				account_name
			))
		})?;
		let account_factory = factories
			.account_factories
			.get(account_name)
			.ok_or_else(|| BuilderError::MissingComponent(format!("account '{}'", account_name)))?;

		let account = match account_factory(account_config) {
			Ok(implementation) => AccountService::new(implementation),
			Err(e) => {
				tracing::error!(
					component = "account",
					implementation = %account_name,
					error = %e,
					"Failed to create account implementation"
				);
				return Err(BuilderError::Config(format!(
					"Failed to create account implementation '{}': {}",
					account_name, e
				)));
			},
		};
		let sender = account
			.get_address()
			.await
			.map_err(|e| BuilderError::Config(e.to_string()))?;
		tracing::info!(component = "account", implementation = %account_name, address = %sender, "Loaded");

		let delivery_config = &self.config.delivery;
		let delivery_name = &delivery_config.implementation;
		let delivery_factory = factories
			.delivery_factories
			.get(delivery_name)
			.ok_or_else(|| BuilderError::MissingComponent(format!("delivery '{}'", delivery_name)))?;

		let options = DeliveryOptions {
			rpc_url: self.config.network.rpc_url.clone(),
			chain_id: self.config.network.chain_id,
			poll_interval: delivery_config.poll_interval(),
			confirmation_timeout: delivery_config.confirmation_timeout(),
		};
		let implementation = delivery_factory(&options, &account.get_private_key()).map_err(|e| {
			tracing::error!(
				component = "delivery",
				implementation = %delivery_name,
				error = %e,
				"Failed to create delivery implementation"
			);
			BuilderError::Config(format!(
				"Failed to create delivery implementation '{}': {}",
				delivery_name, e
			))
		})?;
		tracing::info!(
			component = "delivery",
			implementation = %delivery_name,
			rpc_url = %options.rpc_url,
			min_confirmations = delivery_config.min_confirmations,
			"Loaded"
		);

		let delivery = DeliveryService::new(implementation, delivery_config.min_confirmations)
			.with_expected_chain_id(self.config.network.chain_id);

		Ok(RunEngine::new(run, Arc::new(delivery), reporter))
	}
}
