//! # Transaction Submission Protocol
//!
//! One invocation turns a keypair and a send configuration into exactly one
//! ledger submission: load account, build, sign, submit. There is no retry in
//! here; a repeated attempt with a stale sequence number would risk a
//! duplicate payment, so the worker's next tick is the only retry.

use crate::config::SendConfig;
use crate::error::{ErrorKind, LedgerError, NetworkError};
use crate::metrics::MetricsCollector;
use crate::traits::LedgerGateway;
use crate::wallet::Keypair;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::time::{Duration, Instant};

/// Outcome of the most recent completed submission attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    Success {
        source: String,
        tx_hash: String,
        submitted_at: DateTime<Utc>,
    },
    Failure {
        source: String,
        error_kind: ErrorKind,
        message: String,
        attempted_at: DateTime<Utc>,
    },
}

impl SubmissionOutcome {
    pub fn from_result(source: &str, result: Result<String, LedgerError>) -> Self {
        match result {
            Ok(tx_hash) => SubmissionOutcome::Success {
                source: source.to_string(),
                tx_hash,
                submitted_at: Utc::now(),
            },
            Err(e) => SubmissionOutcome::Failure {
                source: source.to_string(),
                error_kind: e.kind(),
                message: e.to_string(),
                attempted_at: Utc::now(),
            },
        }
    }

    /// Public id of the account the attempt was made for.
    pub fn source(&self) -> &str {
        match self {
            SubmissionOutcome::Success { source, .. } | SubmissionOutcome::Failure { source, .. } => {
                source
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionOutcome::Success { .. })
    }

    pub fn tx_hash(&self) -> Option<&str> {
        match self {
            SubmissionOutcome::Success { tx_hash, .. } => Some(tx_hash),
            SubmissionOutcome::Failure { .. } => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            SubmissionOutcome::Success { .. } => None,
            SubmissionOutcome::Failure { error_kind, .. } => Some(*error_kind),
        }
    }
}

/// Runs one build/sign/submit cycle and returns the transaction hash.
///
/// Each network call is bounded by `timeout`; an expired call becomes
/// [`NetworkError::Timeout`].
pub async fn submit_payment(
    gateway: &dyn LedgerGateway,
    keypair: &Keypair,
    send: &SendConfig,
    timeout: Duration,
    metrics: &MetricsCollector,
) -> Result<String, LedgerError> {
    let account = bounded(
        timeout,
        "load_account",
        metrics,
        gateway.load_account(keypair.public_id()),
    )
    .await?;

    let signed = gateway.build_and_sign(
        &account,
        send.destination(),
        send.amount(),
        send.memo(),
        keypair,
    )?;

    let hash = bounded(timeout, "submit", metrics, gateway.submit(&signed)).await?;
    if hash != signed.hash {
        tracing::debug!(
            "Ledger reported hash {} for locally computed {}",
            hash,
            signed.hash
        );
    }
    Ok(hash)
}

async fn bounded<T, F>(
    timeout: Duration,
    operation: &str,
    metrics: &MetricsCollector,
    call: F,
) -> Result<T, LedgerError>
where
    F: Future<Output = Result<T, LedgerError>>,
{
    let started = Instant::now();
    let result = tokio::time::timeout(timeout, call).await;
    metrics.record_ledger_latency(started.elapsed());

    match result {
        Ok(inner) => inner,
        Err(_) => Err(NetworkError::Timeout {
            timeout_ms: timeout.as_millis() as u64,
            endpoint: operation.to_string(),
        }
        .into()),
    }
}
