//! # Auto-Submission Worker
//!
//! Drives one submission attempt per tick while the wallet is armed. Ticks are
//! strictly sequential: the next tick is not awaited until the current attempt
//! has finished, so a slow ledger delays attempts instead of stacking them.

use crate::config::{SendConfig, WorkerConfig};
use crate::error::{ConfigError, CoreError, WalletError};
use crate::metrics::MetricsCollector;
use crate::state::WalletStore;
use crate::submission::{submit_payment, SubmissionOutcome};
use crate::traits::LedgerGateway;
use crate::utils::SUBMIT_RESULT_TARGET;
use crate::wallet::Keypair;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SubmitterStats {
    pub ticks: u64,
    pub skipped: u64,
    pub success: u64,
    pub failed: u64,
}

/// What a single tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Disarmed,
    /// Armed, but the keypair or send configuration is missing.
    Incomplete,
    Attempted(SubmissionOutcome),
}

pub struct AutoSubmitter {
    store: Arc<WalletStore>,
    gateway: Arc<dyn LedgerGateway>,
    config: WorkerConfig,
    metrics: Arc<MetricsCollector>,
    // Held for the whole attempt so scheduled and manual attempts never overlap.
    attempt_gate: Mutex<()>,
}

impl AutoSubmitter {
    pub fn new(
        store: Arc<WalletStore>,
        gateway: Arc<dyn LedgerGateway>,
        config: WorkerConfig,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            store,
            gateway,
            config,
            metrics,
            attempt_gate: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<WalletStore> {
        &self.store
    }

    pub fn metrics(&self) -> &Arc<MetricsCollector> {
        &self.metrics
    }

    /// Runs one tick: snapshot, completeness check, at most one attempt.
    pub async fn tick(&self) -> TickOutcome {
        let _gate = self.attempt_gate.lock().await;
        let snapshot = self.store.snapshot();

        if !snapshot.armed {
            self.metrics.record_skip();
            return TickOutcome::Disarmed;
        }
        let Some((keypair, send)) = snapshot.submission_inputs() else {
            debug!("Armed but wallet or send config missing, skipping tick");
            self.metrics.record_skip();
            return TickOutcome::Incomplete;
        };

        TickOutcome::Attempted(self.attempt(snapshot.generation, &keypair, &send).await)
    }

    /// Submits once right now, regardless of the armed flag.
    pub async fn submit_once(&self) -> Result<SubmissionOutcome, CoreError> {
        let _gate = self.attempt_gate.lock().await;
        let snapshot = self.store.snapshot();

        if snapshot.keypair.is_none() {
            return Err(WalletError::NotLoaded.into());
        }
        let (keypair, send) = snapshot
            .submission_inputs()
            .ok_or_else(|| ConfigError::missing("send_config"))?;

        Ok(self.attempt(snapshot.generation, &keypair, &send).await)
    }

    // Callers hold `attempt_gate`.
    async fn attempt(
        &self,
        generation: u64,
        keypair: &Keypair,
        send: &SendConfig,
    ) -> SubmissionOutcome {
        let started = Instant::now();
        let result = submit_payment(
            self.gateway.as_ref(),
            keypair,
            send,
            self.config.request_timeout(),
            &self.metrics,
        )
        .await;
        let duration = started.elapsed();

        let outcome = SubmissionOutcome::from_result(keypair.public_id(), result);
        self.metrics.record_attempt(duration, outcome.is_success());

        match &outcome {
            SubmissionOutcome::Success { tx_hash, .. } => info!(
                target: SUBMIT_RESULT_TARGET,
                "SUCCESS sent {} to {} | hash {} in {:.1}s",
                send.amount(),
                send.destination(),
                tx_hash,
                duration.as_secs_f64()
            ),
            SubmissionOutcome::Failure {
                error_kind,
                message,
                ..
            } => warn!(
                target: SUBMIT_RESULT_TARGET,
                "FAILED sending {} to {} | {}: {} in {:.1}s",
                send.amount(),
                send.destination(),
                error_kind,
                message,
                duration.as_secs_f64()
            ),
        }

        self.store.record_result(generation, outcome.clone());
        outcome
    }

    /// Ticks until `token` is cancelled.
    ///
    /// Cancellation is observed between ticks; an attempt already running is
    /// allowed to finish (each of its network calls is time-bounded).
    pub async fn run(&self, token: CancellationToken) -> SubmitterStats {
        let span = tracing::info_span!("worker");

        async move {
            info!(
                "Auto-submitter started (every {}ms)",
                self.config.tick_interval().as_millis()
            );
            let mut stats = SubmitterStats::default();
            let mut ticker = interval(self.config.tick_interval());
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        info!("Worker stopping (cancelled).");
                        break;
                    }
                    _ = ticker.tick() => {}
                }

                stats.ticks += 1;
                match self.tick().await {
                    TickOutcome::Disarmed | TickOutcome::Incomplete => stats.skipped += 1,
                    TickOutcome::Attempted(outcome) if outcome.is_success() => stats.success += 1,
                    TickOutcome::Attempted(_) => stats.failed += 1,
                }
            }
            stats
        }
        .instrument(span)
        .await
    }
}
