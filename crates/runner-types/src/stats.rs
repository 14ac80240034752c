//! Aggregate run statistics and outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Counters describing the progress of a run.
///
/// `failed` is the number reported to users and includes `rejected`, the
/// jobs whose broadcast itself failed and therefore never counted as sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
	pub planned: u64,
	pub sent: u64,
	pub confirmed: u64,
	pub failed: u64,
	pub rejected: u64,
}

impl RunStats {
	/// Creates empty counters for a run of `planned` jobs.
	pub fn new(planned: u64) -> Self {
		Self {
			planned,
			..Default::default()
		}
	}

	/// Jobs that failed after reaching Pending.
	pub fn failed_after_send(&self) -> u64 {
		self.failed.saturating_sub(self.rejected)
	}

	/// Jobs broadcast but not yet resolved.
	pub fn in_flight(&self) -> u64 {
		self.sent
			.saturating_sub(self.confirmed + self.failed_after_send())
	}

	/// Checks the counter invariants that hold at every observation point.
	pub fn is_consistent(&self) -> bool {
		self.rejected <= self.failed
			&& self.confirmed + self.failed_after_send() <= self.sent
			&& self.sent + self.rejected <= self.planned
	}

	/// Confirmed share of the planned jobs, in percent.
	pub fn progress_percent(&self) -> f64 {
		if self.planned == 0 {
			return 0.0;
		}
		self.confirmed as f64 / self.planned as f64 * 100.0
	}
}

impl fmt::Display for RunStats {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"planned={} sent={} confirmed={} failed={}",
			self.planned, self.sent, self.confirmed, self.failed
		)
	}
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
	/// Every planned job was attempted and every pending job resolved.
	Completed,
	/// Submission stopped early on request; pending jobs were drained.
	Cancelled,
	/// The drain deadline expired with jobs still pending.
	DrainTimedOut { pending: Vec<u64> },
}

/// Final report of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
	pub outcome: RunOutcome,
	pub stats: RunStats,
}
