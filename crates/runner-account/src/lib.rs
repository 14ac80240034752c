//! Account management for the transaction runner.
//!
//! An account owns the sending address and the key material used to sign
//! transfers. Signing itself happens in the delivery layer, which builds a
//! wallet from the key returned by [`AccountService::get_private_key`].

use alloy_primitives::Address;
use async_trait::async_trait;
use runner_types::{ImplementationRegistry, SecretString};
use thiserror::Error;

pub mod implementations {
	pub mod local;
}

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
	/// The configured key is missing or malformed.
	#[error("Invalid key: {0}")]
	InvalidKey(String),
	/// The configuration section failed schema validation.
	#[error("Invalid configuration: {0}")]
	InvalidConfig(String),
	/// Error raised by the account implementation.
	#[error("Implementation error: {0}")]
	Implementation(String),
}

/// Interface every account implementation provides.
#[async_trait]
pub trait AccountInterface: Send + Sync {
	/// Address transfers are sent from.
	async fn address(&self) -> Result<Address, AccountError>;

	/// Returns the private key with a 0x prefix.
	fn get_private_key(&self) -> SecretString;
}

/// Builds an account implementation from its TOML section.
pub type AccountFactory = fn(&toml::Value) -> Result<Box<dyn AccountInterface>, AccountError>;

/// Registry trait for account implementations.
pub trait AccountRegistry: ImplementationRegistry<Factory = AccountFactory> {}

/// Returns `(name, factory)` for every built-in account implementation.
pub fn get_all_implementations() -> Vec<(&'static str, AccountFactory)> {
	use implementations::local;

	vec![(local::Registry::NAME, local::Registry::factory())]
}

/// Service wrapping the configured account implementation.
pub struct AccountService {
	implementation: Box<dyn AccountInterface>,
}

impl AccountService {
	pub fn new(implementation: Box<dyn AccountInterface>) -> Self {
		Self { implementation }
	}

	pub async fn get_address(&self) -> Result<Address, AccountError> {
		self.implementation.address().await
	}

	/// Returns the key the delivery layer signs with.
	pub fn get_private_key(&self) -> SecretString {
		self.implementation.get_private_key()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_local_implementation_registered() {
		let names: Vec<_> = get_all_implementations()
			.into_iter()
			.map(|(name, _)| name)
			.collect();
		assert_eq!(names, vec!["local"]);
	}
}
