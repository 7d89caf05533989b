use crate::error::{LedgerError, WalletError};
use crate::wallet::Keypair;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Sequence and fee context of the source account, as loaded from the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountContext {
    pub account_id: String,
    /// Current sequence number; the next transaction uses `sequence + 1`.
    pub sequence: i64,
    /// Fee per operation, in stroops.
    pub base_fee: u32,
}

/// A built and signed transaction, ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTx {
    /// Base64 XDR transaction envelope.
    pub envelope_xdr: String,
    /// Hex transaction hash.
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub asset_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_code: Option<String>,
    pub balance: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxSummary {
    pub hash: String,
    #[serde(default)]
    pub memo: Option<String>,
    pub created_at: String,
    pub successful: bool,
}

/// Derives a signing keypair from a recovery phrase.
pub trait KeypairLoader: Send + Sync {
    /// Validates the phrase checksum before deriving anything.
    fn derive(&self, phrase: &str) -> Result<Keypair, WalletError>;
}

/// Network client of the ledger.
///
/// Implementations hold no wallet state; callers bound each call with a timeout.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    async fn load_account(&self, public_id: &str) -> Result<AccountContext, LedgerError>;

    /// Builds a single native payment and signs it with `keypair`.
    /// An empty `memo` means no memo.
    fn build_and_sign(
        &self,
        account: &AccountContext,
        destination: &str,
        amount: &str,
        memo: &str,
        keypair: &Keypair,
    ) -> Result<SignedTx, LedgerError>;

    /// Submits once and returns the transaction hash.
    async fn submit(&self, tx: &SignedTx) -> Result<String, LedgerError>;

    async fn query_balance(&self, public_id: &str) -> Result<Vec<Balance>, LedgerError>;

    async fn query_recent_history(
        &self,
        public_id: &str,
        limit: u32,
    ) -> Result<Vec<TxSummary>, LedgerError>;
}
