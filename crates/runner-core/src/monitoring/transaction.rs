//! Confirmation watching for broadcast transactions.
//!
//! One watcher runs per pending job. It waits for the ledger's verdict once,
//! never retries, and always takes the job out of the pending set.

use crate::engine::context::RunContext;
use runner_types::{truncate_id, JobState, TransactionHash};
use tokio::sync::OwnedSemaphorePermit;
use tracing::instrument;

/// Failure detail for a transaction the ledger included but did not execute.
pub const EXECUTION_FAILED: &str = "execution failed";

pub struct ConfirmationWatcher {
	context: RunContext,
}

impl ConfirmationWatcher {
	pub fn new(context: RunContext) -> Self {
		Self { context }
	}

	/// Waits for the job's confirmation and records its terminal state.
	///
	/// `permit` is the job's slot under the pending cap. It is released only
	/// after the job has left the pending set.
	#[instrument(skip_all, fields(index = index, tx_hash = %truncate_id(&tx_hash.to_hex())))]
	pub async fn watch(&self, index: u64, tx_hash: TransactionHash, permit: OwnedSemaphorePermit) {
		let (state, error) = match self.context.delivery.confirm(&tx_hash).await {
			Ok(receipt) if receipt.success => {
				tracing::debug!(block = receipt.block_number, "Confirmed");
				(JobState::Confirmed, None)
			},
			Ok(receipt) => {
				tracing::debug!(block = receipt.block_number, "Included but execution failed");
				(JobState::Failed, Some(EXECUTION_FAILED.to_string()))
			},
			Err(e) => {
				tracing::debug!(error = %e, "Confirmation wait failed");
				(JobState::Failed, Some(e.to_string()))
			},
		};

		let mut record = match self.context.pending.remove(index).await {
			Ok(record) => record,
			Err(e) => {
				tracing::error!(error = %e, "Watched job missing from pending set");
				return;
			},
		};

		let stats = match state {
			JobState::Confirmed => self.context.stats.increment_confirmed().await,
			_ => self.context.stats.increment_failed().await,
		};
		drop(permit);

		self.context.transition(&mut record, state, None, error);
		self.context.publish_stats(&stats);
	}
}
