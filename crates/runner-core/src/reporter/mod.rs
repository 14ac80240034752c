//! Sinks for job transitions and aggregate statistics.
//!
//! The engine never renders anything itself. It hands every transition and
//! every stats change to a [`ReporterInterface`]; the binary logs them through
//! [`TracingReporter`] and other observers follow the run through the
//! [`EventBusReporter`].

use crate::engine::event_bus::EventBus;
use runner_types::{truncate_id, JobEvent, JobState, RunEvent, RunOutcome, RunStats, RunSummary};
use std::sync::Arc;

/// Receives progress of a run.
///
/// Calls come from the dispatcher and from watcher tasks concurrently and must
/// not block.
pub trait ReporterInterface: Send + Sync {
	/// A job entered Sending, Pending, Confirmed or Failed. The event detail is
	/// the transaction hash or, for failures, the error.
	fn on_job_state_change(&self, event: &JobEvent);

	/// Counters after an update.
	fn on_stats_update(&self, stats: &RunStats);

	/// The run ended; called exactly once.
	fn on_run_finished(&self, summary: &RunSummary);
}

/// Logs every transition through `tracing`.
#[derive(Debug, Clone, Default)]
pub struct TracingReporter {
	/// Prefix the hash is appended to, e.g. `https://basescan.org/tx/`.
	explorer_tx_url: Option<String>,
}

impl TracingReporter {
	pub fn new(explorer_tx_url: Option<String>) -> Self {
		Self { explorer_tx_url }
	}

	/// Explorer link for a hash, when an explorer is configured.
	pub fn explorer_link(&self, tx_hash: &str) -> Option<String> {
		self.explorer_tx_url
			.as_ref()
			.map(|base| format!("{}{}", base, tx_hash))
	}
}

impl ReporterInterface for TracingReporter {
	fn on_job_state_change(&self, event: &JobEvent) {
		let tx_hash = event.tx_hash.as_ref().map(|hash| hash.to_hex());
		let short_hash = tx_hash.as_deref().map(truncate_id).unwrap_or_default();
		let link = tx_hash
			.as_deref()
			.and_then(|hash| self.explorer_link(hash))
			.unwrap_or_default();

		match event.state {
			JobState::Planned | JobState::Sending => {
				tracing::debug!(index = event.index, state = %event.state, "Sending transaction");
			},
			JobState::Pending => {
				tracing::info!(index = event.index, tx_hash = %short_hash, link = %link, "Transaction pending");
			},
			JobState::Confirmed => {
				tracing::info!(index = event.index, tx_hash = %short_hash, link = %link, "Transaction confirmed");
			},
			JobState::Failed => {
				tracing::warn!(
					index = event.index,
					tx_hash = %short_hash,
					error = %event.error.as_deref().unwrap_or("unknown error"),
					"Transaction failed"
				);
			},
		}
	}

	fn on_stats_update(&self, stats: &RunStats) {
		tracing::debug!(
			sent = stats.sent,
			confirmed = stats.confirmed,
			failed = stats.failed,
			progress = %format!("{:.1}%", stats.progress_percent()),
			"Stats updated"
		);
	}

	fn on_run_finished(&self, summary: &RunSummary) {
		let stats = &summary.stats;
		match &summary.outcome {
			RunOutcome::Completed => {
				tracing::info!(confirmed = stats.confirmed, failed = stats.failed, "All transactions completed");
			},
			RunOutcome::Cancelled => {
				tracing::warn!(confirmed = stats.confirmed, failed = stats.failed, "Run stopped by user");
			},
			RunOutcome::DrainTimedOut { pending } => {
				tracing::warn!(
					confirmed = stats.confirmed,
					failed = stats.failed,
					pending = ?pending,
					"Gave up waiting for pending transactions"
				);
			},
		}
	}
}

/// Publishes every report as a [`RunEvent`].
#[derive(Clone)]
pub struct EventBusReporter {
	event_bus: EventBus,
}

impl EventBusReporter {
	pub fn new(event_bus: EventBus) -> Self {
		Self { event_bus }
	}
}

impl ReporterInterface for EventBusReporter {
	fn on_job_state_change(&self, event: &JobEvent) {
		// No subscribers is not an error
		self.event_bus.publish(RunEvent::Job(event.clone())).ok();
	}

	fn on_stats_update(&self, stats: &RunStats) {
		self.event_bus.publish(RunEvent::StatsUpdated(*stats)).ok();
	}

	fn on_run_finished(&self, summary: &RunSummary) {
		self.event_bus.publish(RunEvent::Finished(summary.clone())).ok();
	}
}

/// Forwards every report to several reporters in order.
#[derive(Clone, Default)]
pub struct FanoutReporter {
	reporters: Vec<Arc<dyn ReporterInterface>>,
}

impl FanoutReporter {
	pub fn new(reporters: Vec<Arc<dyn ReporterInterface>>) -> Self {
		Self { reporters }
	}
}

impl ReporterInterface for FanoutReporter {
	fn on_job_state_change(&self, event: &JobEvent) {
		for reporter in &self.reporters {
			reporter.on_job_state_change(event);
		}
	}

	fn on_stats_update(&self, stats: &RunStats) {
		for reporter in &self.reporters {
			reporter.on_stats_update(stats);
		}
	}

	fn on_run_finished(&self, summary: &RunSummary) {
		for reporter in &self.reporters {
			reporter.on_run_finished(summary);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use runner_types::TransactionHash;

	#[test]
	fn test_explorer_link() {
		let reporter = TracingReporter::new(Some("https://basescan.org/tx/".to_string()));
		assert_eq!(
			reporter.explorer_link("0xabc").as_deref(),
			Some("https://basescan.org/tx/0xabc")
		);
		assert_eq!(TracingReporter::default().explorer_link("0xabc"), None);
	}

	#[tokio::test]
	async fn test_event_bus_reporter_publishes() {
		let bus = EventBus::new(16);
		let mut receiver = bus.subscribe();
		let fanout = FanoutReporter::new(vec![
			Arc::new(TracingReporter::default()),
			Arc::new(EventBusReporter::new(bus.clone())),
		]);

		let event = JobEvent {
			index: 1,
			state: JobState::Pending,
			tx_hash: Some(TransactionHash(vec![0x01; 32])),
			error: None,
		};
		fanout.on_job_state_change(&event);
		fanout.on_stats_update(&RunStats::new(1));

		assert_eq!(receiver.recv().await.unwrap(), RunEvent::Job(event));
		assert_eq!(
			receiver.recv().await.unwrap(),
			RunEvent::StatsUpdated(RunStats::new(1))
		);
	}
}
