//! Transaction delivery module for the transaction runner.
//!
//! This module is the runner's port to the ledger: it broadcasts transfers,
//! waits for their confirmation and answers the connectivity check run before
//! the first submission.

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use runner_types::{
	ImplementationRegistry, SecretString, TransactionHash, TransactionJob, TransactionReceipt,
};
use std::time::Duration;
use thiserror::Error;

pub mod implementations {
	pub mod evm {
		pub mod alloy;
	}
}

/// Errors that can occur during transaction delivery operations.
#[derive(Debug, Error)]
pub enum DeliveryError {
	/// The ledger refused the transfer before assigning it a hash.
	#[error("Broadcast failed: {0}")]
	Broadcast(String),
	/// Waiting for the confirmation failed: timeout, dropped transaction or RPC error.
	#[error("Confirmation failed: {0}")]
	Confirmation(String),
	/// A query against the ledger failed.
	#[error("Network error: {0}")]
	Network(String),
}

/// Interface implemented by every ledger backend.
///
/// Implementations must tolerate one submission running concurrently with many
/// confirmation waits.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait DeliveryInterface: Send + Sync {
	/// Signs and broadcasts one transfer, returning its hash once accepted.
	async fn submit_transfer(&self, job: &TransactionJob) -> Result<TransactionHash, DeliveryError>;

	/// Waits until the transaction is included and has `confirmations` blocks,
	/// the inclusion block counting as the first.
	async fn wait_for_confirmation(
		&self,
		hash: &TransactionHash,
		confirmations: u64,
	) -> Result<TransactionReceipt, DeliveryError>;

	/// Address transfers are sent from.
	async fn get_address(&self) -> Result<Address, DeliveryError>;

	/// Native balance of `address` in wei.
	async fn get_balance(&self, address: Address) -> Result<U256, DeliveryError>;

	/// Latest block number.
	async fn get_block_number(&self) -> Result<u64, DeliveryError>;

	/// Chain id reported by the node.
	async fn get_chain_id(&self) -> Result<u64, DeliveryError>;
}

/// Connection settings handed to delivery factories.
#[derive(Debug, Clone)]
pub struct DeliveryOptions {
	/// HTTP JSON-RPC endpoint.
	pub rpc_url: String,
	/// Chain id used when signing; taken from the node when unset.
	pub chain_id: Option<u64>,
	/// Interval between receipt polls.
	pub poll_interval: Duration,
	/// Upper bound on one confirmation wait.
	pub confirmation_timeout: Duration,
}

/// Builds a delivery implementation from connection settings and the signing key.
pub type DeliveryFactory =
	fn(&DeliveryOptions, &SecretString) -> Result<Box<dyn DeliveryInterface>, DeliveryError>;

/// Registry trait for delivery implementations.
pub trait DeliveryRegistry: ImplementationRegistry<Factory = DeliveryFactory> {}

/// Returns `(name, factory)` for every built-in delivery implementation.
pub fn get_all_implementations() -> Vec<(&'static str, DeliveryFactory)> {
	use implementations::evm::alloy;

	vec![(alloy::Registry::NAME, alloy::Registry::factory())]
}

/// Ledger state observed by [`DeliveryService::check_connection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerStatus {
	pub block_number: u64,
	pub sender: Address,
	/// Sender balance in wei.
	pub balance: U256,
}

/// Service wrapping the configured delivery implementation.
pub struct DeliveryService {
	implementation: Box<dyn DeliveryInterface>,
	/// Confirmations required before a transfer counts as confirmed.
	min_confirmations: u64,
	/// Chain the node must report, when configured.
	expected_chain_id: Option<u64>,
}

impl DeliveryService {
	pub fn new(implementation: Box<dyn DeliveryInterface>, min_confirmations: u64) -> Self {
		Self {
			implementation,
			min_confirmations,
			expected_chain_id: None,
		}
	}

	/// Makes [`check_connection`](Self::check_connection) fail when the node reports another chain.
	pub fn with_expected_chain_id(mut self, chain_id: Option<u64>) -> Self {
		self.expected_chain_id = chain_id;
		self
	}

	/// Broadcasts the transfer described by `job`.
	pub async fn deliver(&self, job: &TransactionJob) -> Result<TransactionHash, DeliveryError> {
		self.implementation.submit_transfer(job).await
	}

	/// Waits for the configured number of confirmations.
	pub async fn confirm(&self, hash: &TransactionHash) -> Result<TransactionReceipt, DeliveryError> {
		self.implementation
			.wait_for_confirmation(hash, self.min_confirmations)
			.await
	}

	/// Checks that the ledger answers: block number, sender address, sender
	/// balance and, when configured, the chain id.
	pub async fn check_connection(&self) -> Result<LedgerStatus, DeliveryError> {
		let block_number = self.implementation.get_block_number().await?;

		if let Some(expected) = self.expected_chain_id {
			let actual = self.implementation.get_chain_id().await?;
			if actual != expected {
				return Err(DeliveryError::Network(format!(
					"Node reports chain {} but chain {} is configured",
					actual, expected
				)));
			}
		}

		let sender = self.implementation.get_address().await?;
		let balance = self.implementation.get_balance(sender).await?;

		Ok(LedgerStatus {
			block_number,
			sender,
			balance,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	struct StaticLedger {
		chain_id: u64,
		fail_block_number: bool,
	}

	#[async_trait]
	impl DeliveryInterface for StaticLedger {
		async fn submit_transfer(
			&self,
			job: &TransactionJob,
		) -> Result<TransactionHash, DeliveryError> {
			Ok(TransactionHash(job.index.to_be_bytes().to_vec()))
		}

		async fn wait_for_confirmation(
			&self,
			hash: &TransactionHash,
			confirmations: u64,
		) -> Result<TransactionReceipt, DeliveryError> {
			Ok(TransactionReceipt {
				hash: hash.clone(),
				block_number: confirmations,
				success: true,
			})
		}

		async fn get_address(&self) -> Result<Address, DeliveryError> {
			Ok(Address::repeat_byte(0x42))
		}

		async fn get_balance(&self, _address: Address) -> Result<U256, DeliveryError> {
			Ok(U256::from(7u64))
		}

		async fn get_block_number(&self) -> Result<u64, DeliveryError> {
			if self.fail_block_number {
				Err(DeliveryError::Network("connection refused".to_string()))
			} else {
				Ok(100)
			}
		}

		async fn get_chain_id(&self) -> Result<u64, DeliveryError> {
			Ok(self.chain_id)
		}
	}

	fn service(chain_id: u64, fail_block_number: bool) -> DeliveryService {
		DeliveryService::new(
			Box::new(StaticLedger {
				chain_id,
				fail_block_number,
			}),
			3,
		)
	}

	#[tokio::test]
	async fn test_check_connection_reports_status() {
		let status = service(8453, false).check_connection().await.unwrap();
		assert_eq!(status.block_number, 100);
		assert_eq!(status.sender, Address::repeat_byte(0x42));
		assert_eq!(status.balance, U256::from(7u64));
	}

	#[tokio::test]
	async fn test_check_connection_propagates_network_error() {
		let result = service(8453, true).check_connection().await;
		assert!(matches!(result, Err(DeliveryError::Network(_))));
	}

	#[tokio::test]
	async fn test_check_connection_rejects_chain_mismatch() {
		let service = service(1, false).with_expected_chain_id(Some(8453));
		let err = service.check_connection().await.unwrap_err();
		assert!(err.to_string().contains("chain 1"));
	}

	#[tokio::test]
	async fn test_confirm_uses_min_confirmations() {
		let receipt = service(8453, false)
			.confirm(&TransactionHash(vec![1]))
			.await
			.unwrap();
		assert_eq!(receipt.block_number, 3);
	}

	#[test]
	fn test_alloy_implementation_registered() {
		let names: Vec<_> = get_all_implementations()
			.into_iter()
			.map(|(name, _)| name)
			.collect();
		assert_eq!(names, vec!["evm_alloy"]);
	}
}
