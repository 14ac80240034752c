//! Event types published while a run is in progress.
//!
//! Events flow through an event bus so any number of observers (log sinks,
//! progress displays, tests) can follow a run without the engine knowing them.

use crate::{JobState, RunStats, RunSummary, TransactionHash};
use serde::{Deserialize, Serialize};

/// Main event type emitted by the runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunEvent {
	/// A job moved to a new lifecycle state.
	Job(JobEvent),
	/// The aggregate counters changed.
	StatsUpdated(RunStats),
	/// The run finished; no further events follow.
	Finished(RunSummary),
}

/// A single job state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobEvent {
	pub index: u64,
	pub state: JobState,
	/// Hash for Pending and Confirmed transitions.
	pub tx_hash: Option<TransactionHash>,
	/// Failure detail for Failed transitions.
	pub error: Option<String>,
}

impl JobEvent {
	/// Human-readable detail: the error for failures, otherwise the hash if known.
	pub fn detail(&self) -> Option<String> {
		match (&self.error, &self.tx_hash) {
			(Some(error), _) => Some(error.clone()),
			(None, Some(hash)) => Some(hash.to_hex()),
			(None, None) => None,
		}
	}
}
