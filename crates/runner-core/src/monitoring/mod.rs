//! Asynchronous monitoring of broadcast transactions.

pub mod transaction;

pub use transaction::{ConfirmationWatcher, EXECUTION_FAILED};
