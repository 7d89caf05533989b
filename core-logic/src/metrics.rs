use chrono::Utc;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub timestamp: String,
    pub uptime_secs: u64,
    pub attempts: AttemptMetrics,
    pub performance: PerformanceMetrics,
    pub ledger: LedgerMetrics,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttemptMetrics {
    pub total: u64,
    pub success: u64,
    pub failed: u64,
    pub skipped_ticks: u64,
    pub success_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceMetrics {
    pub total_duration_ms: u64,
    pub avg_attempt_duration_ms: f64,
    pub min_attempt_duration_ms: u64,
    pub max_attempt_duration_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LedgerMetrics {
    pub total_calls: u64,
    pub avg_latency_ms: f64,
    pub min_latency_ms: u64,
    pub max_latency_ms: u64,
}

#[derive(Debug)]
pub struct MetricsCollector {
    attempts_total: AtomicU64,
    attempts_success: AtomicU64,
    attempts_failed: AtomicU64,
    skipped_ticks: AtomicU64,
    attempt_duration_sum_ms: AtomicU64,
    attempt_min_duration_ms: AtomicU64,
    attempt_max_duration_ms: AtomicU64,
    ledger_calls: AtomicU64,
    ledger_latency_sum_ms: AtomicU64,
    ledger_min_latency_ms: AtomicU64,
    ledger_max_latency_ms: AtomicU64,
    start_time: Instant,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self {
            attempts_total: AtomicU64::new(0),
            attempts_success: AtomicU64::new(0),
            attempts_failed: AtomicU64::new(0),
            skipped_ticks: AtomicU64::new(0),
            attempt_duration_sum_ms: AtomicU64::new(0),
            attempt_min_duration_ms: AtomicU64::new(u64::MAX),
            attempt_max_duration_ms: AtomicU64::new(0),
            ledger_calls: AtomicU64::new(0),
            ledger_latency_sum_ms: AtomicU64::new(0),
            ledger_min_latency_ms: AtomicU64::new(u64::MAX),
            ledger_max_latency_ms: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }
}

impl MetricsCollector {
    pub fn record_attempt(&self, duration: Duration, success: bool) {
        let duration_ms = duration.as_millis() as u64;

        self.attempts_total.fetch_add(1, Ordering::SeqCst);
        self.attempt_duration_sum_ms
            .fetch_add(duration_ms, Ordering::SeqCst);
        self.attempt_min_duration_ms
            .fetch_min(duration_ms, Ordering::SeqCst);
        self.attempt_max_duration_ms
            .fetch_max(duration_ms, Ordering::SeqCst);

        if success {
            self.attempts_success.fetch_add(1, Ordering::SeqCst);
        } else {
            self.attempts_failed.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub fn record_skip(&self) {
        self.skipped_ticks.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_ledger_latency(&self, latency: Duration) {
        let latency_ms = latency.as_millis() as u64;

        self.ledger_calls.fetch_add(1, Ordering::SeqCst);
        self.ledger_latency_sum_ms
            .fetch_add(latency_ms, Ordering::SeqCst);
        self.ledger_min_latency_ms
            .fetch_min(latency_ms, Ordering::SeqCst);
        self.ledger_max_latency_ms
            .fetch_max(latency_ms, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let total = self.attempts_total.load(Ordering::SeqCst);
        let success = self.attempts_success.load(Ordering::SeqCst);
        let total_duration = self.attempt_duration_sum_ms.load(Ordering::SeqCst);
        let min_duration = self.attempt_min_duration_ms.load(Ordering::SeqCst);

        let calls = self.ledger_calls.load(Ordering::SeqCst);
        let latency = self.ledger_latency_sum_ms.load(Ordering::SeqCst);
        let min_latency = self.ledger_min_latency_ms.load(Ordering::SeqCst);

        MetricsSnapshot {
            timestamp: Utc::now().to_rfc3339(),
            uptime_secs: self.uptime().as_secs(),
            attempts: AttemptMetrics {
                total,
                success,
                failed: self.attempts_failed.load(Ordering::SeqCst),
                skipped_ticks: self.skipped_ticks.load(Ordering::SeqCst),
                success_rate: if total > 0 {
                    success as f64 / total as f64 * 100.0
                } else {
                    0.0
                },
            },
            performance: PerformanceMetrics {
                total_duration_ms: total_duration,
                avg_attempt_duration_ms: if total > 0 {
                    total_duration as f64 / total as f64
                } else {
                    0.0
                },
                min_attempt_duration_ms: if min_duration == u64::MAX {
                    0
                } else {
                    min_duration
                },
                max_attempt_duration_ms: self.attempt_max_duration_ms.load(Ordering::SeqCst),
            },
            ledger: LedgerMetrics {
                total_calls: calls,
                avg_latency_ms: if calls > 0 {
                    latency as f64 / calls as f64
                } else {
                    0.0
                },
                min_latency_ms: if min_latency == u64::MAX { 0 } else { min_latency },
                max_latency_ms: self.ledger_max_latency_ms.load(Ordering::SeqCst),
            },
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }

    pub async fn export_to_file(&self, path: &str) -> std::io::Result<()> {
        tokio::fs::write(path, self.to_json()).await
    }

    pub fn attempts_total(&self) -> u64 {
        self.attempts_total.load(Ordering::SeqCst)
    }

    pub fn attempts_success(&self) -> u64 {
        self.attempts_success.load(Ordering::SeqCst)
    }

    pub fn attempts_failed(&self) -> u64 {
        self.attempts_failed.load(Ordering::SeqCst)
    }

    pub fn skipped_ticks(&self) -> u64 {
        self.skipped_ticks.load(Ordering::SeqCst)
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }
}
