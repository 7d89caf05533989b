#![allow(dead_code)]

use async_trait::async_trait;
use autopay_core::{
    AccountContext, Balance, Keypair, KeypairLoader, LedgerError, LedgerGateway, NetworkError,
    SignedTx, TxSummary, WalletError,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub enum Behavior {
    Succeed { hash: String, delay: Duration },
    Hang,
    Reject(String),
    Unreachable,
}

/// Scripted in-memory ledger that records every call it sees.
pub struct MockGateway {
    behavior: Mutex<Behavior>,
    pub load_calls: AtomicUsize,
    pub submit_calls: AtomicUsize,
    active: AtomicUsize,
    pub max_active: AtomicUsize,
    spans: Mutex<Vec<(Instant, Instant)>>,
    built: Mutex<Vec<(String, String, String)>>,
}

impl MockGateway {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            load_calls: AtomicUsize::new(0),
            submit_calls: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            spans: Mutex::new(Vec::new()),
            built: Mutex::new(Vec::new()),
        }
    }

    pub fn succeeding(hash: &str) -> Self {
        Self::new(Behavior::Succeed {
            hash: hash.to_string(),
            delay: Duration::ZERO,
        })
    }

    pub fn slow(hash: &str, delay: Duration) -> Self {
        Self::new(Behavior::Succeed {
            hash: hash.to_string(),
            delay,
        })
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn loads(&self) -> usize {
        self.load_calls.load(Ordering::SeqCst)
    }

    pub fn submits(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    /// (start, end) of every attempt that reached a successful submit.
    pub fn spans(&self) -> Vec<(Instant, Instant)> {
        self.spans.lock().unwrap().clone()
    }

    /// (destination, amount, memo) of every transaction built.
    pub fn built(&self) -> Vec<(String, String, String)> {
        self.built.lock().unwrap().clone()
    }

    fn behavior(&self) -> Behavior {
        self.behavior.lock().unwrap().clone()
    }
}

#[async_trait]
impl LedgerGateway for MockGateway {
    async fn load_account(&self, public_id: &str) -> Result<AccountContext, LedgerError> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);

        match self.behavior() {
            Behavior::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
            Behavior::Unreachable => {
                self.active.fetch_sub(1, Ordering::SeqCst);
                Err(NetworkError::ConnectionRefused {
                    endpoint: "mock".into(),
                    reason: "down".into(),
                }
                .into())
            }
            Behavior::Succeed { delay, .. } => {
                tokio::time::sleep(delay / 2).await;
                Ok(AccountContext {
                    account_id: public_id.to_string(),
                    sequence: 41,
                    base_fee: 100,
                })
            }
            Behavior::Reject(_) => Ok(AccountContext {
                account_id: public_id.to_string(),
                sequence: 41,
                base_fee: 100,
            }),
        }
    }

    fn build_and_sign(
        &self,
        account: &AccountContext,
        destination: &str,
        amount: &str,
        memo: &str,
        keypair: &Keypair,
    ) -> Result<SignedTx, LedgerError> {
        self.built.lock().unwrap().push((
            destination.to_string(),
            amount.to_string(),
            memo.to_string(),
        ));
        if destination == "INVALID" {
            self.active.fetch_sub(1, Ordering::SeqCst);
            return Err(LedgerError::validation("destination is not an account id"));
        }
        Ok(SignedTx {
            envelope_xdr: format!("{}:{}:{}", keypair.public_id(), account.sequence + 1, amount),
            hash: "local".to_string(),
        })
    }

    async fn submit(&self, _tx: &SignedTx) -> Result<String, LedgerError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        let result = match self.behavior() {
            Behavior::Succeed { hash, delay } => {
                let started = Instant::now() - delay / 2;
                tokio::time::sleep(delay - delay / 2).await;
                self.spans.lock().unwrap().push((started, Instant::now()));
                Ok(hash)
            }
            Behavior::Reject(code) => Err(LedgerError::rejected(code)),
            Behavior::Hang | Behavior::Unreachable => Err(LedgerError::from(
                NetworkError::InvalidResponse {
                    endpoint: "mock".into(),
                    reason: "unexpected".into(),
                },
            )),
        };
        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn query_balance(&self, _public_id: &str) -> Result<Vec<Balance>, LedgerError> {
        Ok(vec![Balance {
            asset_type: "native".into(),
            asset_code: None,
            balance: "100.0000000".into(),
        }])
    }

    async fn query_recent_history(
        &self,
        _public_id: &str,
        _limit: u32,
    ) -> Result<Vec<TxSummary>, LedgerError> {
        Ok(Vec::new())
    }
}

/// Loader that accepts any phrase except ones containing "bad".
pub struct FakeLoader;

impl KeypairLoader for FakeLoader {
    fn derive(&self, phrase: &str) -> Result<Keypair, WalletError> {
        if phrase.contains("bad") {
            return Err(WalletError::InvalidPhrase {
                reason: "checksum mismatch".into(),
            });
        }
        let tag: String = phrase.split_whitespace().map(|w| &w[..1]).collect();
        Ok(Keypair::new(
            format!("G{}", tag.to_uppercase()),
            format!("S{}", tag.to_uppercase()),
        ))
    }
}
