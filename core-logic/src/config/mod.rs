use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Smallest ledger unit per whole native unit (7 decimal places).
pub const STROOPS_PER_UNIT: i64 = 10_000_000;
pub const AMOUNT_DECIMALS: usize = 7;
/// Upper bound of a ledger text memo, in bytes.
pub const MEMO_TEXT_MAX_BYTES: usize = 28;

/// Payment parameters the worker submits on every armed tick.
///
/// Only constructed through [`SendConfig::new`], so a held value is always
/// complete and validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendConfig {
    destination: String,
    amount: String,
    memo: String,
}

impl SendConfig {
    pub fn new(destination: &str, amount: &str, memo: &str) -> Result<Self, ConfigError> {
        let destination = destination.trim();
        let amount = amount.trim();
        let memo = memo.trim();

        if destination.is_empty() {
            return Err(ConfigError::missing("destination"));
        }
        if amount.is_empty() {
            return Err(ConfigError::missing("amount"));
        }
        amount_to_stroops(amount).map_err(|reason| ConfigError::invalid("amount", reason))?;
        if memo.len() > MEMO_TEXT_MAX_BYTES {
            return Err(ConfigError::invalid(
                "memo",
                format!(
                    "{} bytes exceeds the {} byte text memo limit",
                    memo.len(),
                    MEMO_TEXT_MAX_BYTES
                ),
            ));
        }

        Ok(Self {
            destination: destination.to_string(),
            amount: amount.to_string(),
            memo: memo.to_string(),
        })
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn memo(&self) -> &str {
        &self.memo
    }

    pub fn is_complete(&self) -> bool {
        !self.destination.is_empty() && !self.amount.is_empty()
    }
}

/// Converts a decimal amount string into stroops.
///
/// Accepts plain decimal notation with at most [`AMOUNT_DECIMALS`] fractional
/// digits. Signs, exponents and zero are rejected.
pub fn amount_to_stroops(amount: &str) -> Result<i64, String> {
    let amount = amount.trim();
    if amount.is_empty() {
        return Err("amount is empty".to_string());
    }

    let (whole, frac) = amount.split_once('.').unwrap_or((amount, ""));
    if whole.is_empty() && frac.is_empty() {
        return Err(format!("'{}' is not a number", amount));
    }
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !all_digits(whole) || !all_digits(frac) {
        return Err(format!("'{}' is not a decimal number", amount));
    }
    if frac.len() > AMOUNT_DECIMALS {
        return Err(format!(
            "'{}' has more than {} decimal places",
            amount, AMOUNT_DECIMALS
        ));
    }

    let too_large = || format!("'{}' is too large", amount);
    let whole_value: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| too_large())?
    };
    let frac_value: i64 = if frac.is_empty() {
        0
    } else {
        format!("{:0<width$}", frac, width = AMOUNT_DECIMALS)
            .parse()
            .map_err(|_| too_large())?
    };

    let stroops = whole_value
        .checked_mul(STROOPS_PER_UNIT)
        .and_then(|v| v.checked_add(frac_value))
        .ok_or_else(too_large)?;

    if stroops <= 0 {
        return Err("amount must be positive".to_string());
    }
    Ok(stroops)
}

/// Cadence and bounds of the Auto-Submission Worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Upper bound for every individual ledger network call.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl WorkerConfig {
    pub fn new(tick_interval: Duration, request_timeout: Duration) -> Self {
        Self {
            tick_interval_ms: tick_interval.as_millis() as u64,
            request_timeout_ms: request_timeout.as_millis() as u64,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.max(1))
    }
}
