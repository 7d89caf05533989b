//! # Horizon Gateway
//!
//! [`LedgerGateway`] over the Horizon REST API of a Stellar-protocol ledger
//! (Pi Network mainnet by default).
//!
//! Submissions are sent exactly once. Balance and history reads are
//! idempotent and go through [`with_retry`] on transient failures.

use crate::config::PiConfig;
use crate::transaction;
use anyhow::{Context, Result};
use async_trait::async_trait;
use autopay_core::{
    with_retry, AccountContext, Balance, Keypair, LedgerError, LedgerGateway, NetworkError,
    RetryConfig, SignedTx, TxSummary,
};
use reqwest::header::{HeaderValue, RETRY_AFTER};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct AccountRecord {
    sequence: String,
    #[serde(default)]
    balances: Vec<Balance>,
}

#[derive(Debug, Deserialize)]
struct SubmitRecord {
    hash: String,
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(rename = "_embedded")]
    embedded: Embedded<T>,
}

#[derive(Debug, Deserialize)]
struct Embedded<T> {
    records: Vec<T>,
}

/// Horizon problem document returned on 4xx/5xx.
#[derive(Debug, Default, Deserialize)]
struct Problem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    detail: String,
    #[serde(default)]
    extras: Option<ProblemExtras>,
}

#[derive(Debug, Deserialize)]
struct ProblemExtras {
    result_codes: Option<ResultCodes>,
}

#[derive(Debug, Deserialize)]
struct ResultCodes {
    transaction: Option<String>,
    #[serde(default)]
    operations: Vec<String>,
}

pub struct HorizonGateway {
    client: Client,
    base_url: String,
    network_id: [u8; 32],
    base_fee: u32,
    timeout_ms: u64,
    retry: RetryConfig,
}

impl HorizonGateway {
    pub fn new(config: &PiConfig) -> Result<Self> {
        let timeout = Duration::from_millis(config.request_timeout_ms.max(1));
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.horizon_url.trim_end_matches('/').to_string(),
            network_id: transaction::network_id(&config.network_passphrase),
            base_fee: config.base_fee,
            timeout_ms: timeout.as_millis() as u64,
            retry: RetryConfig::default(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, LedgerError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.transport_error(path, e))?;

        let status = response.status();
        if !status.is_success() {
            let retry = retry_after(response.headers().get(RETRY_AFTER));
            let body = response.text().await.unwrap_or_default();
            return Err(classify_read_failure(status, path, &body, retry));
        }
        self.decode(path, response).await
    }

    async fn decode<T: DeserializeOwned>(
        &self,
        path: &str,
        response: Response,
    ) -> Result<T, LedgerError> {
        response.json::<T>().await.map_err(|e| {
            NetworkError::InvalidResponse {
                endpoint: path.to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    fn transport_error(&self, endpoint: &str, e: reqwest::Error) -> LedgerError {
        let endpoint = endpoint.to_string();
        let error = if e.is_timeout() {
            NetworkError::Timeout {
                timeout_ms: self.timeout_ms,
                endpoint,
            }
        } else if e.is_connect() {
            NetworkError::ConnectionRefused {
                endpoint,
                reason: e.to_string(),
            }
        } else {
            NetworkError::InvalidResponse {
                endpoint,
                reason: e.to_string(),
            }
        };
        error.into()
    }
}

#[async_trait]
impl LedgerGateway for HorizonGateway {
    async fn load_account(&self, public_id: &str) -> Result<AccountContext, LedgerError> {
        let path = format!("/accounts/{}", public_id);
        let record: AccountRecord = self.get_json(&path).await?;
        let sequence = record.sequence.parse::<i64>().map_err(|e| {
            LedgerError::from(NetworkError::InvalidResponse {
                endpoint: path.clone(),
                reason: format!("bad sequence '{}': {}", record.sequence, e),
            })
        })?;

        Ok(AccountContext {
            account_id: public_id.to_string(),
            sequence,
            base_fee: self.base_fee,
        })
    }

    fn build_and_sign(
        &self,
        account: &AccountContext,
        destination: &str,
        amount: &str,
        memo: &str,
        keypair: &Keypair,
    ) -> Result<SignedTx, LedgerError> {
        let tx = transaction::build_payment(account, destination, amount, memo)?;
        transaction::sign(tx, keypair, self.network_id)
    }

    async fn submit(&self, tx: &SignedTx) -> Result<String, LedgerError> {
        let path = "/transactions";
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .form(&[("tx", tx.envelope_xdr.as_str())])
            .send()
            .await
            .map_err(|e| self.transport_error(path, e))?;

        let status = response.status();
        if !status.is_success() {
            let retry = retry_after(response.headers().get(RETRY_AFTER));
            let body = response.text().await.unwrap_or_default();
            debug!("Horizon rejected {} with {}: {}", tx.hash, status, body);
            return Err(classify_submit_failure(status, &body, retry));
        }

        let record: SubmitRecord = self.decode(path, response).await?;
        Ok(record.hash)
    }

    async fn query_balance(&self, public_id: &str) -> Result<Vec<Balance>, LedgerError> {
        let path = format!("/accounts/{}", public_id);
        let record: AccountRecord =
            with_retry(&self.retry, "query_balance", || self.get_json(&path)).await?;
        Ok(record.balances)
    }

    async fn query_recent_history(
        &self,
        public_id: &str,
        limit: u32,
    ) -> Result<Vec<TxSummary>, LedgerError> {
        let path = format!(
            "/accounts/{}/transactions?limit={}&order=desc",
            public_id, limit
        );
        let page: Page<TxSummary> =
            with_retry(&self.retry, "query_recent_history", || self.get_json(&path)).await?;
        Ok(page.embedded.records)
    }
}

fn retry_after(header: Option<&HeaderValue>) -> u64 {
    header
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}

fn classify_read_failure(status: StatusCode, path: &str, body: &str, retry: u64) -> LedgerError {
    match status {
        StatusCode::NOT_FOUND => {
            LedgerError::rejected(format!("account not found on ledger ({})", path))
        }
        StatusCode::TOO_MANY_REQUESTS => NetworkError::RateLimited {
            endpoint: path.to_string(),
            retry_after: retry,
        }
        .into(),
        _ => {
            debug!("Horizon {} on {}: {}", status, path, body);
            NetworkError::HttpError {
                status_code: status.as_u16(),
                endpoint: path.to_string(),
            }
            .into()
        }
    }
}

/// Maps a failed `POST /transactions` to a ledger error.
///
/// 4xx answers are ledger decisions and become `Rejected`, carrying the
/// result codes when Horizon includes them. 429 and 5xx are transport.
fn classify_submit_failure(status: StatusCode, body: &str, retry: u64) -> LedgerError {
    let endpoint = "/transactions".to_string();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return NetworkError::RateLimited {
            endpoint,
            retry_after: retry,
        }
        .into();
    }
    if !status.is_client_error() {
        return NetworkError::HttpError {
            status_code: status.as_u16(),
            endpoint,
        }
        .into();
    }

    let problem: Problem = serde_json::from_str(body).unwrap_or_default();
    let codes = problem.extras.and_then(|extras| extras.result_codes);
    let reason = match codes {
        Some(ResultCodes {
            transaction: Some(tx_code),
            operations,
        }) if !operations.is_empty() => format!("{} [{}]", tx_code, operations.join(", ")),
        Some(ResultCodes {
            transaction: Some(tx_code),
            ..
        }) => tx_code,
        _ if !problem.detail.is_empty() => problem.detail,
        _ if !problem.title.is_empty() => problem.title,
        _ => format!("HTTP {}", status.as_u16()),
    };
    LedgerError::rejected(reason)
}
