//! Lifecycle management for a run.
//!
//! Covers the connectivity check before the first submission, the drain phase
//! after the last one, and the [`RunHandle`] callers use to follow, cancel and
//! await a run in progress.

use super::context::RunContext;
use super::EngineError;
use alloy_primitives::U256;
use runner_delivery::DeliveryService;
use runner_types::{estimate_gas_cost, format_ether, RunConfig, RunOutcome, RunStats, RunSummary};
use tokio::sync::Mutex;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

/// Checks that the ledger answers before anything is submitted.
pub(super) async fn preflight(delivery: &DeliveryService, config: &RunConfig) -> Result<(), EngineError> {
	let status = delivery
		.check_connection()
		.await
		.map_err(|e| EngineError::Connection(e.to_string()))?;

	let gas_cost = estimate_gas_cost(config.count, config.gas_price);
	let required = config
		.value
		.saturating_mul(U256::from(config.count))
		.saturating_add(gas_cost);

	tracing::info!(
		block = status.block_number,
		sender = %status.sender,
		balance = %format_ether(status.balance),
		estimated_gas = %format_ether(gas_cost),
		"Connected to ledger"
	);

	if status.balance < required {
		tracing::warn!(
			balance = %format_ether(status.balance),
			required = %format_ether(required),
			"Sender balance may not cover all transfers"
		);
	}

	Ok(())
}

/// Waits for every watcher to finish.
///
/// Cancellation does not shorten the drain; pending transactions are already
/// on the ledger and their outcome is still reported. Returns the timed-out
/// outcome when the drain deadline expires first, `None` otherwise.
pub(super) async fn drain(context: &RunContext, mut watchers: JoinSet<()>) -> Option<RunOutcome> {
	let in_flight = watchers.len();
	if in_flight > 0 {
		tracing::info!(in_flight, "Waiting for pending transactions");
	}

	let join_all = async {
		while let Some(result) = watchers.join_next().await {
			if let Err(e) = result {
				tracing::error!(error = %e, "Confirmation watcher failed");
			}
		}
	};

	let Some(timeout) = context.config.drain_timeout else {
		join_all.await;
		return None;
	};

	if tokio::time::timeout(timeout, join_all).await.is_ok() {
		return None;
	}

	let pending = context.pending.indices().await;
	tracing::warn!(
		timeout_secs = timeout.as_secs(),
		pending = ?pending,
		"Drain timed out"
	);
	// Watchers keep running so late confirmations are still logged.
	watchers.detach_all();
	Some(RunOutcome::DrainTimedOut { pending })
}

/// Builds the summary and reports it.
pub(super) async fn finish(context: &RunContext, outcome: RunOutcome) -> RunSummary {
	let summary = RunSummary {
		outcome,
		stats: context.stats.snapshot().await,
	};
	tracing::info!(stats = %summary.stats, outcome = ?summary.outcome, "Run finished");
	context.reporter.on_run_finished(&summary);
	summary
}

/// Handle to a started run.
pub struct RunHandle {
	context: RunContext,
	task: Mutex<Option<JoinHandle<RunSummary>>>,
}

impl RunHandle {
	pub(super) fn new(context: RunContext, task: JoinHandle<RunSummary>) -> Self {
		Self {
			context,
			task: Mutex::new(Some(task)),
		}
	}

	/// Stops submission of further jobs. Jobs already pending are still awaited.
	///
	/// Safe to call any number of times, also after the run finished.
	pub fn cancel(&self) {
		if !self.context.cancel.is_cancelled() {
			tracing::info!("Cancellation requested");
			self.context.cancel.cancel();
		}
	}

	pub fn is_cancelled(&self) -> bool {
		self.context.cancel.is_cancelled()
	}

	/// Token that cancels this run, for wiring into signal handlers.
	pub fn cancellation_token(&self) -> CancellationToken {
		self.context.cancel.clone()
	}

	/// Current counters.
	pub async fn stats(&self) -> RunStats {
		self.context.stats.snapshot().await
	}

	/// Number of jobs currently pending.
	pub async fn pending_count(&self) -> usize {
		self.context.pending.len().await
	}

	/// Waits for the run to finish and returns its summary.
	///
	/// The summary is handed out once; a second call fails with
	/// [`EngineError::AlreadyCompleted`].
	pub async fn wait(&self) -> Result<RunSummary, EngineError> {
		let task = self
			.task
			.lock()
			.await
			.take()
			.ok_or(EngineError::AlreadyCompleted)?;

		task.await.map_err(|e| EngineError::Task(e.to_string()))
	}
}
