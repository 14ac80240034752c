//! Job lifecycle state.
//!
//! Transition validation for individual jobs and the shared set of jobs
//! awaiting confirmation.

pub mod job;

pub use job::{JobStateError, JobStateMachine, PendingSet};
