//! Run engine that submits transfers and tracks them to confirmation.
//!
//! The dispatcher submits jobs strictly one after another in index order, so
//! sender nonces are assigned without gaps or races. Confirmation waits run
//! concurrently in watcher tasks, bounded by a semaphore holding one permit per
//! allowed pending transaction.

pub mod context;
pub mod event_bus;
pub mod lifecycle;

use crate::monitoring::ConfirmationWatcher;
use crate::reporter::ReporterInterface;
use context::RunContext;
use lifecycle::RunHandle;
use runner_delivery::DeliveryService;
use runner_types::{JobState, RunConfig, RunOutcome, RunSummary, TransactionJob, TransactionRecord};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// Errors that can occur during engine operations.
///
/// Job failures never surface here; they are recorded per job. Only problems
/// that prevent a run from starting, or misuse of the run lifecycle, do.
#[derive(Debug, Error)]
pub enum EngineError {
	/// The ledger could not be reached before the first submission.
	#[error("Connection error: {0}")]
	Connection(String),
	#[error("Run already started")]
	AlreadyStarted,
	#[error("Run already completed")]
	AlreadyCompleted,
	/// The run task panicked or was aborted.
	#[error("Run task failed: {0}")]
	Task(String),
}

/// Engine executing a single run.
pub struct RunEngine {
	config: RunConfig,
	delivery: Arc<DeliveryService>,
	reporter: Arc<dyn ReporterInterface>,
	cancel: CancellationToken,
	started: AtomicBool,
}

impl RunEngine {
	pub fn new(
		config: RunConfig,
		delivery: Arc<DeliveryService>,
		reporter: Arc<dyn ReporterInterface>,
	) -> Self {
		Self {
			config,
			delivery,
			reporter,
			cancel: CancellationToken::new(),
			started: AtomicBool::new(false),
		}
	}

	/// Uses `token` for cancellation, so callers can cancel before `start` returns.
	pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
		self.cancel = token;
		self
	}

	pub fn config(&self) -> &RunConfig {
		&self.config
	}

	/// Checks the ledger connection, then starts the run in the background.
	///
	/// Fails with [`EngineError::Connection`] before any submission when the
	/// ledger does not answer. An engine runs at most once; later calls fail
	/// with [`EngineError::AlreadyStarted`].
	pub async fn start(&self) -> Result<RunHandle, EngineError> {
		if self.started.swap(true, Ordering::SeqCst) {
			return Err(EngineError::AlreadyStarted);
		}

		lifecycle::preflight(&self.delivery, &self.config).await?;

		let context = RunContext::new(
			self.config.clone(),
			self.delivery.clone(),
			self.reporter.clone(),
			self.cancel.clone(),
		);
		let handle_context = context.clone();
		let task = tokio::spawn(run(context));

		Ok(RunHandle::new(handle_context, task))
	}
}

/// Full run: submission loop, drain, summary.
async fn run(context: RunContext) -> RunSummary {
	let mut watchers = JoinSet::new();
	let stopped_early = dispatch(&context, &mut watchers).await;

	let outcome = match lifecycle::drain(&context, watchers).await {
		Some(outcome) => outcome,
		None if stopped_early => RunOutcome::Cancelled,
		None => RunOutcome::Completed,
	};

	lifecycle::finish(&context, outcome).await
}

/// Submits jobs in index order until all are attempted or cancellation is
/// requested. Returns true when it stopped because of cancellation.
#[instrument(skip_all, fields(planned = context.config.count, max_pending = context.config.max_pending))]
async fn dispatch(context: &RunContext, watchers: &mut JoinSet<()>) -> bool {
	let config = context.config.clone();
	// The cap never binds above the job count.
	let permits = config
		.max_pending
		.min(usize::try_from(config.count).unwrap_or(usize::MAX))
		.min(Semaphore::MAX_PERMITS);
	let capacity = Arc::new(Semaphore::new(permits));
	let mut next_index: u64 = 1;

	tracing::info!("Starting submission");

	while next_index <= config.count {
		if context.cancel.is_cancelled() {
			break;
		}

		let permit = tokio::select! {
			biased;
			_ = context.cancel.cancelled() => break,
			permit = capacity.clone().acquire_owned() => match permit {
				Ok(permit) => permit,
				Err(e) => {
					tracing::error!(error = %e, "Pending capacity closed");
					break;
				},
			},
		};

		submit(context, config.job(next_index), permit, watchers).await;
		next_index += 1;

		if next_index <= config.count && !config.delay.is_zero() {
			tokio::select! {
				_ = context.cancel.cancelled() => break,
				_ = tokio::time::sleep(config.delay) => {},
			}
		}
	}

	let stopped_early = next_index <= config.count;
	if stopped_early {
		tracing::info!(next_index, "Submission stopped by cancellation");
	}
	stopped_early
}

/// Broadcasts one job. On success the job joins the pending set and a watcher
/// takes over its permit; on failure the job is recorded as failed and the
/// permit is returned immediately.
async fn submit(
	context: &RunContext,
	job: TransactionJob,
	permit: OwnedSemaphorePermit,
	watchers: &mut JoinSet<()>,
) {
	let mut record = TransactionRecord::planned(job.index);
	context.transition(&mut record, JobState::Sending, None, None);

	match context.delivery.deliver(&job).await {
		Ok(tx_hash) => {
			let stats = context.stats.increment_sent().await;
			context.transition(&mut record, JobState::Pending, Some(tx_hash.clone()), None);
			if let Err(e) = context.pending.insert(record).await {
				tracing::error!(index = job.index, error = %e, "Failed to track pending job");
				return;
			}
			context.publish_stats(&stats);

			let watcher = ConfirmationWatcher::new(context.clone());
			let index = job.index;
			watchers.spawn(async move { watcher.watch(index, tx_hash, permit).await });
		},
		Err(e) => {
			drop(permit);
			let stats = context.stats.increment_rejected().await;
			context.transition(&mut record, JobState::Failed, None, Some(e.to_string()));
			context.publish_stats(&stats);
		},
	}
}
