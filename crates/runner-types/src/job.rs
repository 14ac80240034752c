//! Run configuration, planned jobs and per-job records.
//!
//! A run plans `count` transfers to a single target. Each transfer becomes a
//! [`TransactionJob`] with a 1-based index, and its progress is tracked by a
//! [`TransactionRecord`] moving through the [`JobState`] lifecycle:
//! Planned -> Sending -> Pending -> Confirmed | Failed.

use crate::TransactionHash;
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Immutable parameters of a single run.
///
/// Values are already validated and converted to base units; human-facing
/// units only exist in the configuration layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
	/// Address receiving every transfer.
	pub target: Address,
	/// Number of transfers to plan.
	pub count: u64,
	/// Value of each transfer in wei.
	pub value: U256,
	/// Gas price of each transfer in wei.
	pub gas_price: u128,
	/// Pause applied after each submission attempt.
	pub delay: Duration,
	/// Maximum number of broadcast transactions awaiting confirmation.
	pub max_pending: usize,
	/// Optional deadline for waiting on pending transactions once submission stops.
	pub drain_timeout: Option<Duration>,
}

impl RunConfig {
	/// Builds the job for the given 1-based index.
	pub fn job(&self, index: u64) -> TransactionJob {
		TransactionJob {
			index,
			target: self.target,
			value: self.value,
			gas_price: self.gas_price,
		}
	}
}

/// One planned transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionJob {
	/// 1-based position in submission order.
	pub index: u64,
	pub target: Address,
	/// Value in wei.
	pub value: U256,
	/// Gas price in wei.
	pub gas_price: u128,
}

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobState {
	/// Created but not yet handed to the ledger.
	Planned,
	/// Broadcast call in progress.
	Sending,
	/// Broadcast succeeded, awaiting confirmation.
	Pending,
	/// Ledger reported successful execution.
	Confirmed,
	/// Broadcast was rejected, execution failed, or the confirmation wait errored.
	Failed,
}

impl JobState {
	/// Returns the upper-case label used in log output.
	pub fn as_str(&self) -> &'static str {
		match self {
			JobState::Planned => "PLANNED",
			JobState::Sending => "SENDING",
			JobState::Pending => "PENDING",
			JobState::Confirmed => "CONFIRMED",
			JobState::Failed => "FAILED",
		}
	}
}

impl fmt::Display for JobState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Progress of a single job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
	pub index: u64,
	pub state: JobState,
	/// Ledger-assigned hash, present once the broadcast succeeded.
	pub tx_hash: Option<TransactionHash>,
	/// Failure detail, present only in the Failed state.
	pub error: Option<String>,
}

impl TransactionRecord {
	/// Creates a record in the Planned state.
	pub fn planned(index: u64) -> Self {
		Self {
			index,
			state: JobState::Planned,
			tx_hash: None,
			error: None,
		}
	}
}
