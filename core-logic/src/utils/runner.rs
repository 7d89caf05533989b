use super::logger::SUBMIT_RESULT_TARGET;
use crate::worker::{AutoSubmitter, SubmitterStats};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

pub struct WorkerRunner;

impl WorkerRunner {
    /// Cancels `token` on Ctrl+C.
    pub fn spawn_shutdown_listener(token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            tokio::select! {
                res = signal::ctrl_c() => match res {
                    Ok(()) => {
                        info!(target: SUBMIT_RESULT_TARGET, "🛑 Received Ctrl+C. Initiating graceful shutdown...");
                        token.cancel();
                    }
                    Err(err) => {
                        error!("Unable to listen for shutdown signal: {}", err);
                    }
                },
                _ = token.cancelled() => {}
            }
        })
    }

    /// Spawns the auto-submitter as a background task.
    pub fn spawn_submitter(
        submitter: Arc<AutoSubmitter>,
        token: CancellationToken,
    ) -> JoinHandle<SubmitterStats> {
        tokio::spawn(async move { submitter.run(token).await })
    }

    /// Waits for the submitter task and logs the session summary.
    ///
    /// The summary goes to the `submit_result` target so it reaches the console.
    pub async fn wait_for_submitter(handle: JoinHandle<SubmitterStats>, started: Instant) {
        let stats = match handle.await {
            Ok(stats) => stats,
            Err(e) => {
                error!("Auto-submitter task panicked or failed to join: {:?}", e);
                return;
            }
        };

        info!(target: SUBMIT_RESULT_TARGET, "🛑 Shutdown Complete.");
        info!(target: SUBMIT_RESULT_TARGET, "{}", summary_line(&stats, started.elapsed()));
    }
}

fn summary_line(stats: &SubmitterStats, elapsed: Duration) -> String {
    let attempts = stats.success + stats.failed;
    let rate = if attempts > 0 {
        (stats.success as f64 / attempts as f64) * 100.0
    } else {
        0.0
    };

    format!(
        "Total Time: {:.1}s | Ticks: {} | Skipped: {} | Success: {} | Fail: {} | Success Rate: {:.2}%",
        elapsed.as_secs_f64(),
        stats.ticks,
        stats.skipped,
        stats.success,
        stats.failed,
        rate
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_line_reports_success_rate() {
        let stats = SubmitterStats {
            ticks: 10,
            skipped: 6,
            success: 3,
            failed: 1,
        };
        assert_eq!(
            summary_line(&stats, Duration::from_millis(12_340)),
            "Total Time: 12.3s | Ticks: 10 | Skipped: 6 | Success: 3 | Fail: 1 | Success Rate: 75.00%"
        );
    }

    #[test]
    fn test_summary_line_without_attempts() {
        let line = summary_line(&SubmitterStats::default(), Duration::ZERO);
        assert!(line.ends_with("Success Rate: 0.00%"));
    }

    #[tokio::test]
    async fn test_wait_for_submitter_returns_after_join() {
        let handle = tokio::spawn(async { SubmitterStats::default() });
        WorkerRunner::wait_for_submitter(handle, Instant::now()).await;
    }
}
