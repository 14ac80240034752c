//! State shared by the dispatcher and the confirmation watchers of one run.

use crate::reporter::ReporterInterface;
use crate::state::{JobStateMachine, PendingSet};
use crate::stats::StatsAggregator;
use runner_delivery::DeliveryService;
use runner_types::{JobEvent, JobState, RunConfig, RunStats, TransactionHash, TransactionRecord};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Everything a run's tasks need, passed explicitly instead of through globals.
///
/// Cloning is cheap; all shared state sits behind `Arc`s.
#[derive(Clone)]
pub struct RunContext {
	pub config: Arc<RunConfig>,
	pub delivery: Arc<DeliveryService>,
	pub reporter: Arc<dyn ReporterInterface>,
	pub stats: Arc<StatsAggregator>,
	pub pending: Arc<PendingSet>,
	/// Requests that no further job is submitted.
	pub cancel: CancellationToken,
}

impl RunContext {
	pub fn new(
		config: RunConfig,
		delivery: Arc<DeliveryService>,
		reporter: Arc<dyn ReporterInterface>,
		cancel: CancellationToken,
	) -> Self {
		Self {
			stats: Arc::new(StatsAggregator::new(config.count)),
			config: Arc::new(config),
			delivery,
			reporter,
			pending: Arc::new(PendingSet::new()),
			cancel,
		}
	}

	/// Applies a transition to `record` and reports it.
	///
	/// An invalid transition means the engine itself is broken; it is logged and
	/// the record is left unchanged.
	pub fn transition(
		&self,
		record: &mut TransactionRecord,
		to: JobState,
		tx_hash: Option<TransactionHash>,
		error: Option<String>,
	) {
		if let Err(e) = JobStateMachine::transition(record, to, tx_hash, error) {
			tracing::error!(error = %e, "Rejected job transition");
			return;
		}

		self.reporter.on_job_state_change(&JobEvent {
			index: record.index,
			state: record.state,
			tx_hash: record.tx_hash.clone(),
			error: record.error.clone(),
		});
	}

	pub fn publish_stats(&self, stats: &RunStats) {
		self.reporter.on_stats_update(stats);
	}
}
