//! # Autopay Core - Wallet State and Auto-Submission Engine
//!
//! This crate holds everything chain-independent about the auto-paying wallet:
//! the shared wallet state, the background submitter, and the
//! build/sign/submit protocol it drives.
//!
//! ## Modules
//!
//! - [`config`] - Send configuration and worker cadence
//! - [`error`] - Typed error handling with thiserror
//! - [`metrics`] - Attempt and ledger latency metrics
//! - [`state`] - The wallet state store and its snapshots
//! - [`submission`] - One build/sign/submit attempt and its outcome
//! - [`traits`] - Keypair loader and ledger gateway seams
//! - [`wallet`] - Keypair type
//! - [`worker`] - The auto-submission worker

pub mod config;
pub mod error;
pub mod metrics;
pub mod state;
pub mod submission;
pub mod traits;
pub mod wallet;
pub mod worker;
pub(crate) mod utils;

pub use config::{amount_to_stroops, SendConfig, WorkerConfig};
pub use error::{ConfigError, CoreError, ErrorKind, LedgerError, NetworkError, WalletError};
pub use metrics::{MetricsCollector, MetricsSnapshot};
pub use state::{WalletSnapshot, WalletStore};
pub use submission::{submit_payment, SubmissionOutcome};
pub use traits::{AccountContext, Balance, KeypairLoader, LedgerGateway, SignedTx, TxSummary};
pub use wallet::Keypair;
pub use worker::{AutoSubmitter, SubmitterStats, TickOutcome};

pub use utils::{setup_logger, with_retry, RetryConfig, WorkerRunner, SUBMIT_RESULT_TARGET};
