//! # Utilities Module
//!
//! Logging, retry and task-runner helpers shared by the binaries.

pub(crate) mod logger;
pub(crate) mod retry;
pub(crate) mod runner;

pub use logger::{setup_logger, SUBMIT_RESULT_TARGET};
pub use retry::{with_retry, RetryConfig};
pub use runner::WorkerRunner;
