//! Core run engine for the transaction runner.
//!
//! Submits a planned series of value transfers one at a time, keeps at most
//! `max_pending` of them awaiting confirmation, watches each broadcast
//! transaction concurrently and reports every job transition and counter
//! change to a [`ReporterInterface`].

pub mod builder;
pub mod engine;
pub mod monitoring;
pub mod reporter;
pub mod state;
pub mod stats;

pub use builder::{BuilderError, RunnerBuilder, RunnerFactories};
pub use engine::event_bus::EventBus;
pub use engine::lifecycle::RunHandle;
pub use engine::{EngineError, RunEngine};
pub use reporter::{EventBusReporter, FanoutReporter, ReporterInterface, TracingReporter};
pub use stats::StatsAggregator;
