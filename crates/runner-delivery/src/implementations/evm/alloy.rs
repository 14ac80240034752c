//! Ledger port backed by an alloy HTTP provider.
//!
//! Transfers are signed by an `EthereumWallet` filler built from the account key;
//! nonce, gas limit and chain id come from the recommended fillers. The gas
//! price is always set explicitly, producing legacy-priced transactions.

use crate::{DeliveryError, DeliveryInterface, DeliveryOptions};
use alloy_network::{EthereumWallet, TransactionBuilder};
use alloy_primitives::{Address, FixedBytes, U256};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_types::TransactionRequest;
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use alloy_transport_http::Http;
use async_trait::async_trait;
use runner_types::{
	truncate_id, SecretString, TransactionHash, TransactionJob, TransactionReceipt,
};
use std::sync::Arc;
use std::time::Duration;

/// Alloy-based EVM delivery implementation for a single network.
pub struct AlloyDelivery {
	provider: Arc<dyn Provider<Http<reqwest::Client>> + Send + Sync>,
	sender: Address,
	poll_interval: Duration,
	confirmation_timeout: Duration,
}

impl AlloyDelivery {
	/// Builds the provider. No request is made until the first call.
	pub fn new(options: &DeliveryOptions, signer: PrivateKeySigner) -> Result<Self, DeliveryError> {
		let url: reqwest::Url = options
			.rpc_url
			.parse()
			.map_err(|e| DeliveryError::Network(format!("Invalid RPC URL: {}", e)))?;

		let signer = signer.with_chain_id(options.chain_id);
		let sender = signer.address();
		let wallet = EthereumWallet::from(signer);

		let provider = ProviderBuilder::new()
			.with_recommended_fillers()
			.wallet(wallet)
			.on_http(url);

		Ok(Self {
			provider: Arc::new(provider)
				as Arc<dyn Provider<Http<reqwest::Client>> + Send + Sync>,
			sender,
			poll_interval: options.poll_interval,
			confirmation_timeout: options.confirmation_timeout,
		})
	}

	/// Polls until the receipt has enough confirmations. Runs without a deadline;
	/// the caller bounds it.
	async fn poll_receipt(
		&self,
		tx_hash: FixedBytes<32>,
		confirmations: u64,
	) -> Result<TransactionReceipt, DeliveryError> {
		loop {
			let receipt = self
				.provider
				.get_transaction_receipt(tx_hash)
				.await
				.map_err(|e| DeliveryError::Confirmation(format!("Failed to get receipt: {}", e)))?;

			if let Some(receipt) = receipt {
				let tx_block = receipt.block_number.unwrap_or(0);
				let current_block = self.provider.get_block_number().await.map_err(|e| {
					DeliveryError::Confirmation(format!("Failed to get block number: {}", e))
				})?;

				let current_confirmations = current_block.saturating_sub(tx_block) + 1;
				if current_confirmations >= confirmations {
					return Ok(TransactionReceipt {
						hash: TransactionHash(receipt.transaction_hash.0.to_vec()),
						block_number: tx_block,
						success: receipt.status(),
					});
				}

				tracing::debug!(
					tx_hash = %truncate_id(&tx_hash.to_string()),
					remaining = confirmations - current_confirmations,
					"Waiting for more confirmations"
				);
			}

			tokio::time::sleep(self.poll_interval).await;
		}
	}
}

#[async_trait]
impl DeliveryInterface for AlloyDelivery {
	async fn submit_transfer(&self, job: &TransactionJob) -> Result<TransactionHash, DeliveryError> {
		let request = TransactionRequest::default()
			.with_from(self.sender)
			.with_to(job.target)
			.with_value(job.value)
			.with_gas_price(job.gas_price);

		let pending_tx = self
			.provider
			.send_transaction(request)
			.await
			.map_err(|e| DeliveryError::Broadcast(e.to_string()))?;

		let tx_hash = *pending_tx.tx_hash();
		tracing::debug!(
			index = job.index,
			tx_hash = %truncate_id(&tx_hash.to_string()),
			"Broadcast transfer"
		);

		Ok(TransactionHash(tx_hash.0.to_vec()))
	}

	async fn wait_for_confirmation(
		&self,
		hash: &TransactionHash,
		confirmations: u64,
	) -> Result<TransactionReceipt, DeliveryError> {
		if hash.0.len() != 32 {
			return Err(DeliveryError::Confirmation(format!(
				"Invalid transaction hash length: {}",
				hash.0.len()
			)));
		}
		let tx_hash = FixedBytes::<32>::from_slice(&hash.0);

		match tokio::time::timeout(
			self.confirmation_timeout,
			self.poll_receipt(tx_hash, confirmations),
		)
		.await
		{
			Ok(result) => result,
			Err(_) => Err(DeliveryError::Confirmation(format!(
				"Timeout waiting for {} confirmations after {} seconds",
				confirmations,
				self.confirmation_timeout.as_secs()
			))),
		}
	}

	async fn get_address(&self) -> Result<Address, DeliveryError> {
		Ok(self.sender)
	}

	async fn get_balance(&self, address: Address) -> Result<U256, DeliveryError> {
		self.provider
			.get_balance(address)
			.await
			.map_err(|e| DeliveryError::Network(format!("Failed to get balance: {}", e)))
	}

	async fn get_block_number(&self) -> Result<u64, DeliveryError> {
		self.provider
			.get_block_number()
			.await
			.map_err(|e| DeliveryError::Network(format!("Failed to get block number: {}", e)))
	}

	async fn get_chain_id(&self) -> Result<u64, DeliveryError> {
		self.provider
			.get_chain_id()
			.await
			.map_err(|e| DeliveryError::Network(format!("Failed to get chain id: {}", e)))
	}
}

/// Creates an [`AlloyDelivery`] signing with `private_key`.
pub fn create_http_delivery(
	options: &DeliveryOptions,
	private_key: &SecretString,
) -> Result<Box<dyn DeliveryInterface>, DeliveryError> {
	let signer: PrivateKeySigner = private_key.with_exposed(|key| {
		key.parse()
			.map_err(|_| DeliveryError::Network("Invalid private key format".to_string()))
	})?;

	Ok(Box::new(AlloyDelivery::new(options, signer)?))
}

/// Registry for the HTTP/Alloy delivery implementation.
pub struct Registry;

impl runner_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "evm_alloy";
	type Factory = crate::DeliveryFactory;

	fn factory() -> Self::Factory {
		create_http_delivery
	}
}

impl crate::DeliveryRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use std::str::FromStr;

	const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

	fn options(rpc_url: &str) -> DeliveryOptions {
		DeliveryOptions {
			rpc_url: rpc_url.to_string(),
			chain_id: Some(8453),
			poll_interval: Duration::from_millis(10),
			confirmation_timeout: Duration::from_secs(1),
		}
	}

	#[tokio::test]
	async fn test_sender_comes_from_key() {
		let delivery =
			create_http_delivery(&options("http://localhost:8545"), &SecretString::from(DEV_KEY))
				.unwrap();
		assert_eq!(
			delivery.get_address().await.unwrap(),
			Address::from_str("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266").unwrap()
		);
	}

	#[tokio::test]
	async fn test_invalid_rpc_url() {
		let result = create_http_delivery(&options("not a url"), &SecretString::from(DEV_KEY));
		assert!(matches!(result, Err(DeliveryError::Network(_))));
	}

	#[tokio::test]
	async fn test_invalid_private_key() {
		let result =
			create_http_delivery(&options("http://localhost:8545"), &SecretString::from("0x12"));
		assert!(matches!(result, Err(DeliveryError::Network(_))));
	}

	#[tokio::test]
	async fn test_short_hash_rejected_before_polling() {
		let delivery =
			create_http_delivery(&options("http://localhost:8545"), &SecretString::from(DEV_KEY))
				.unwrap();
		let result = delivery
			.wait_for_confirmation(&TransactionHash(vec![0u8; 4]), 1)
			.await;
		assert!(matches!(result, Err(DeliveryError::Confirmation(_))));
	}
}
