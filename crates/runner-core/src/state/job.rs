//! Job state machine and the set of pending jobs.
//!
//! Jobs move through Planned -> Sending -> Pending -> Confirmed | Failed, with
//! Sending -> Failed when the broadcast is rejected. Confirmed and Failed are
//! terminal.

use once_cell::sync::Lazy;
use runner_types::{JobState, TransactionHash, TransactionRecord};
use std::collections::{BTreeMap, HashMap, HashSet};
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors that can occur during job state management.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JobStateError {
	#[error("Invalid state transition for job {index} from {from} to {to}")]
	InvalidTransition {
		index: u64,
		from: JobState,
		to: JobState,
	},
	#[error("Job {0} is not pending")]
	NotPending(u64),
	#[error("Job {0} is already pending")]
	AlreadyPending(u64),
}

/// Validates and applies job transitions.
pub struct JobStateMachine;

impl JobStateMachine {
	/// Moves `record` to `to`, attaching the hash or error that state carries.
	pub fn transition(
		record: &mut TransactionRecord,
		to: JobState,
		tx_hash: Option<TransactionHash>,
		error: Option<String>,
	) -> Result<(), JobStateError> {
		if !Self::is_valid_transition(record.state, to) {
			return Err(JobStateError::InvalidTransition {
				index: record.index,
				from: record.state,
				to,
			});
		}

		record.state = to;
		if tx_hash.is_some() {
			record.tx_hash = tx_hash;
		}
		if to == JobState::Failed {
			record.error = error;
		}
		Ok(())
	}

	/// Checks if a state transition is valid
	pub fn is_valid_transition(from: JobState, to: JobState) -> bool {
		static TRANSITIONS: Lazy<HashMap<JobState, HashSet<JobState>>> = Lazy::new(|| {
			HashMap::from([
				(JobState::Planned, HashSet::from([JobState::Sending])),
				(
					JobState::Sending,
					HashSet::from([JobState::Pending, JobState::Failed]),
				),
				(
					JobState::Pending,
					HashSet::from([JobState::Confirmed, JobState::Failed]),
				),
				(JobState::Confirmed, HashSet::new()),
				(JobState::Failed, HashSet::new()),
			])
		});

		TRANSITIONS
			.get(&from)
			.is_some_and(|allowed| allowed.contains(&to))
	}
}

/// Records currently in the Pending state, keyed by job index.
#[derive(Debug, Default)]
pub struct PendingSet {
	records: RwLock<BTreeMap<u64, TransactionRecord>>,
}

impl PendingSet {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a record that has just reached Pending.
	pub async fn insert(&self, record: TransactionRecord) -> Result<usize, JobStateError> {
		if record.state != JobState::Pending {
			return Err(JobStateError::NotPending(record.index));
		}

		let mut records = self.records.write().await;
		if records.contains_key(&record.index) {
			return Err(JobStateError::AlreadyPending(record.index));
		}
		records.insert(record.index, record);
		Ok(records.len())
	}

	/// Takes the record out of the set so it can reach a terminal state.
	pub async fn remove(&self, index: u64) -> Result<TransactionRecord, JobStateError> {
		self.records
			.write()
			.await
			.remove(&index)
			.ok_or(JobStateError::NotPending(index))
	}

	pub async fn len(&self) -> usize {
		self.records.read().await.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.records.read().await.is_empty()
	}

	/// Pending indices in ascending order.
	pub async fn indices(&self) -> Vec<u64> {
		self.records.read().await.keys().copied().collect()
	}
}
