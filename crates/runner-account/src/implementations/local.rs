//! Account backed by a private key held in memory.
//!
//! Configuration:
//!
//! ```toml
//! [account.implementations.local]
//! private_key = "${RUNNER_PRIVATE_KEY}"
//! ```

use crate::{AccountError, AccountInterface};
use alloy_primitives::Address;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use runner_types::{
	with_0x_prefix, without_0x_prefix, ConfigSchema, Field, FieldType, Schema, SecretString,
	ValidationError,
};

/// Local private-key account.
pub struct LocalWallet {
	signer: PrivateKeySigner,
	private_key: SecretString,
}

impl LocalWallet {
	/// Parses a hex private key, with or without 0x prefix.
	pub fn new(private_key: &SecretString) -> Result<Self, AccountError> {
		let normalized = private_key.with_exposed(|key| with_0x_prefix(key.trim()));
		let signer: PrivateKeySigner = normalized
			.parse()
			.map_err(|e| AccountError::InvalidKey(format!("{}", e)))?;

		Ok(Self {
			signer,
			private_key: SecretString::new(normalized),
		})
	}
}

/// Schema of the `local` account section.
pub struct LocalWalletSchema;

impl ConfigSchema for LocalWalletSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![Field::new("private_key", FieldType::String).with_validator(|value| {
				let key = value.as_str().unwrap_or_default();
				let digits = without_0x_prefix(key.trim());
				if digits.len() != 64 {
					return Err("Private key must be 64 hex characters".to_string());
				}
				if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
					return Err("Private key must be hex encoded".to_string());
				}
				Ok(())
			})],
			vec![],
		);

		schema.validate(config)
	}
}

#[async_trait]
impl AccountInterface for LocalWallet {
	async fn address(&self) -> Result<Address, AccountError> {
		Ok(self.signer.address())
	}

	fn get_private_key(&self) -> SecretString {
		self.private_key.clone()
	}
}

/// Creates a [`LocalWallet`] from its configuration section.
pub fn create_account(config: &toml::Value) -> Result<Box<dyn AccountInterface>, AccountError> {
	LocalWalletSchema
		.validate(config)
		.map_err(|e| AccountError::InvalidConfig(e.to_string()))?;

	let private_key = config
		.get("private_key")
		.and_then(|v| v.as_str())
		.ok_or_else(|| AccountError::InvalidConfig("private_key is required".to_string()))?;

	let wallet = LocalWallet::new(&SecretString::from(private_key))?;
	tracing::debug!(address = %wallet.signer.address(), "Loaded local account");
	Ok(Box::new(wallet))
}

/// Registry for the local account implementation.
pub struct Registry;

impl runner_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "local";
	type Factory = crate::AccountFactory;

	fn factory() -> Self::Factory {
		create_account
	}
}

impl crate::AccountRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use std::str::FromStr;

	// First account of the default anvil/hardhat mnemonic.
	const DEV_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
	const DEV_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

	fn section(key: &str) -> toml::Value {
		toml::from_str(&format!("private_key = \"{}\"", key)).unwrap()
	}

	#[tokio::test]
	async fn test_address_derived_from_key() {
		let account = create_account(&section(DEV_KEY)).unwrap();
		let address = account.address().await.unwrap();
		assert_eq!(address, Address::from_str(DEV_ADDRESS).unwrap());
	}

	#[test]
	fn test_private_key_is_prefixed_and_redacted() {
		let account = create_account(&section(DEV_KEY)).unwrap();
		let key = account.get_private_key();

		assert!(key.with_exposed(|k| k.starts_with("0x")));
		assert_eq!(format!("{:?}", key), "SecretString(***REDACTED***)");
	}

	#[test]
	fn test_rejects_malformed_keys() {
		assert!(matches!(
			create_account(&section("0x1234")),
			Err(AccountError::InvalidConfig(_))
		));

		let missing: toml::Value = toml::from_str("other = 1").unwrap();
		assert!(matches!(
			create_account(&missing),
			Err(AccountError::InvalidConfig(_))
		));
	}

	#[test]
	fn test_zero_key_rejected_by_signer() {
		let zero = "0".repeat(64);
		assert!(matches!(
			create_account(&section(&zero)),
			Err(AccountError::InvalidKey(_))
		));
	}
}
