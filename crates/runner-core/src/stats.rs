//! Aggregate counters shared by the dispatcher and the confirmation watchers.

use runner_types::RunStats;
use tokio::sync::RwLock;

/// Thread-safe run counters.
///
/// Every increment returns the snapshot taken under the same lock, so the
/// caller can publish exactly the state its own update produced.
#[derive(Debug, Default)]
pub struct StatsAggregator {
	stats: RwLock<RunStats>,
}

impl StatsAggregator {
	pub fn new(planned: u64) -> Self {
		Self {
			stats: RwLock::new(RunStats::new(planned)),
		}
	}

	/// Clears every counter and sets the planned total.
	pub async fn reset(&self, planned: u64) {
		*self.stats.write().await = RunStats::new(planned);
	}

	/// A job reached Pending.
	pub async fn increment_sent(&self) -> RunStats {
		self.update(|stats| stats.sent += 1).await
	}

	/// A pending job executed successfully.
	pub async fn increment_confirmed(&self) -> RunStats {
		self.update(|stats| stats.confirmed += 1).await
	}

	/// A pending job failed on the ledger or while waiting.
	pub async fn increment_failed(&self) -> RunStats {
		self.update(|stats| stats.failed += 1).await
	}

	/// A job's broadcast was rejected; counted as failed but never as sent.
	pub async fn increment_rejected(&self) -> RunStats {
		self.update(|stats| {
			stats.failed += 1;
			stats.rejected += 1;
		})
		.await
	}

	pub async fn snapshot(&self) -> RunStats {
		*self.stats.read().await
	}

	async fn update(&self, f: impl FnOnce(&mut RunStats)) -> RunStats {
		let mut stats = self.stats.write().await;
		f(&mut stats);
		debug_assert!(stats.is_consistent(), "inconsistent run stats: {:?}", *stats);
		*stats
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::Arc;

	#[tokio::test]
	async fn test_increments_and_reset() {
		let stats = StatsAggregator::new(3);
		stats.increment_sent().await;
		stats.increment_sent().await;
		stats.increment_confirmed().await;
		stats.increment_failed().await;
		let snapshot = stats.increment_rejected().await;

		assert_eq!(snapshot.planned, 3);
		assert_eq!(snapshot.sent, 2);
		assert_eq!(snapshot.confirmed, 1);
		assert_eq!(snapshot.failed, 2);
		assert_eq!(snapshot.rejected, 1);
		assert!(snapshot.is_consistent());

		stats.reset(10).await;
		assert_eq!(stats.snapshot().await, RunStats::new(10));
	}

	#[tokio::test]
	async fn test_concurrent_increments() {
		let stats = Arc::new(StatsAggregator::new(100));
		let mut tasks = tokio::task::JoinSet::new();
		for _ in 0..100 {
			let stats = stats.clone();
			tasks.spawn(async move {
				stats.increment_sent().await;
				stats.increment_confirmed().await;
			});
		}
		while tasks.join_next().await.is_some() {}

		let snapshot = stats.snapshot().await;
		assert_eq!(snapshot.sent, 100);
		assert_eq!(snapshot.confirmed, 100);
	}
}
