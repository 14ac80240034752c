//! Transaction delivery types for the runner.
//!
//! This module defines types related to blockchain transaction submission
//! and monitoring, including transaction hashes and receipts.

use crate::utils::with_0x_prefix;
use std::fmt;

/// Blockchain transaction hash representation.
///
/// Stores transaction hashes as raw bytes so the ledger port stays free to
/// hand back whatever identifier its network uses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct TransactionHash(pub Vec<u8>);

impl TransactionHash {
	/// Returns the hash as a `0x`-prefixed lowercase hex string.
	pub fn to_hex(&self) -> String {
		with_0x_prefix(&hex::encode(&self.0))
	}
}

impl fmt::Display for TransactionHash {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.to_hex())
	}
}

/// Transaction receipt containing execution details.
///
/// Provides information about a transaction after it has been included in a block,
/// including its success status and block number.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TransactionReceipt {
	/// The hash of the transaction.
	pub hash: TransactionHash,
	/// The block number where the transaction was included.
	pub block_number: u64,
	/// Whether the transaction executed successfully.
	pub success: bool,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_hash_display_is_prefixed_hex() {
		let hash = TransactionHash(vec![0xab, 0xcd, 0x01]);
		assert_eq!(hash.to_string(), "0xabcd01");
		assert_eq!(hash.to_hex(), "0xabcd01");
	}
}
