use crate::keys;
use autopay_core::config::MEMO_TEXT_MAX_BYTES;
use autopay_core::{amount_to_stroops, AccountContext, Keypair, LedgerError, SignedTx};
use ed25519_dalek::Signer;
use sha2::{Digest, Sha256};
use stellar_strkey::ed25519::PublicKey;
use stellar_xdr::curr::{
    Asset, DecoratedSignature, Hash, Limits, Memo, MuxedAccount, Operation, OperationBody,
    PaymentOp, Preconditions, SequenceNumber, Signature, SignatureHint, Transaction,
    TransactionEnvelope, TransactionExt, TransactionSignaturePayload,
    TransactionSignaturePayloadTaggedTransaction, TransactionV1Envelope, Uint256, VecM, WriteXdr,
};

/// Network id: SHA-256 of the network passphrase.
pub fn network_id(passphrase: &str) -> [u8; 32] {
    Sha256::digest(passphrase.as_bytes()).into()
}

pub fn parse_account_id(field: &str, account_id: &str) -> Result<[u8; 32], LedgerError> {
    PublicKey::from_string(account_id)
        .map(|key| key.0)
        .map_err(|_| {
            LedgerError::validation(format!("{} '{}' is not an account id", field, account_id))
        })
}

/// Builds a single native-asset payment from `account`, at `account.sequence + 1`.
pub fn build_payment(
    account: &AccountContext,
    destination: &str,
    amount: &str,
    memo: &str,
) -> Result<Transaction, LedgerError> {
    let source = parse_account_id("source", &account.account_id)?;
    let destination = parse_account_id("destination", destination)?;
    let stroops = amount_to_stroops(amount).map_err(LedgerError::validation)?;

    let memo = if memo.is_empty() {
        Memo::None
    } else {
        let text = memo
            .as_bytes()
            .to_vec()
            .try_into()
            .map_err(|_| {
                LedgerError::validation(format!("memo exceeds {} bytes", MEMO_TEXT_MAX_BYTES))
            })?;
        Memo::Text(text)
    };

    let seq_num = account
        .sequence
        .checked_add(1)
        .ok_or_else(|| LedgerError::validation("account sequence exhausted"))?;

    let payment = Operation {
        source_account: None,
        body: OperationBody::Payment(PaymentOp {
            destination: MuxedAccount::Ed25519(Uint256(destination)),
            asset: Asset::Native,
            amount: stroops,
        }),
    };
    let operations: VecM<Operation, 100> = vec![payment]
        .try_into()
        .map_err(|_| LedgerError::validation("too many operations"))?;
    let fee = account
        .base_fee
        .checked_mul(operations.len() as u32)
        .ok_or_else(|| LedgerError::validation("fee overflows u32"))?;

    Ok(Transaction {
        source_account: MuxedAccount::Ed25519(Uint256(source)),
        fee,
        seq_num: SequenceNumber(seq_num),
        cond: Preconditions::None,
        memo,
        operations,
        ext: TransactionExt::V0,
    })
}

/// Hash that gets signed: SHA-256 of the tagged transaction under `network_id`.
pub fn transaction_hash(tx: &Transaction, network_id: [u8; 32]) -> Result<[u8; 32], LedgerError> {
    let payload = TransactionSignaturePayload {
        network_id: Hash(network_id),
        tagged_transaction: TransactionSignaturePayloadTaggedTransaction::Tx(tx.clone()),
    };
    let bytes = payload
        .to_xdr(Limits::none())
        .map_err(|e| LedgerError::signing(format!("failed to encode payload: {}", e)))?;
    Ok(Sha256::digest(&bytes).into())
}

/// Signs `tx` with `keypair` and wraps it in a base64 envelope.
pub fn sign(
    tx: Transaction,
    keypair: &Keypair,
    network_id: [u8; 32],
) -> Result<SignedTx, LedgerError> {
    let key = keys::signing_key(keypair).map_err(|e| LedgerError::signing(e.to_string()))?;
    let hash = transaction_hash(&tx, network_id)?;

    let public = key.verifying_key().to_bytes();
    let hint = SignatureHint([public[28], public[29], public[30], public[31]]);
    let signature = key
        .sign(&hash)
        .to_bytes()
        .to_vec()
        .try_into()
        .map_err(|_| LedgerError::signing("signature exceeds 64 bytes"))?;

    let signatures = vec![DecoratedSignature {
        hint,
        signature: Signature(signature),
    }]
    .try_into()
    .map_err(|_| LedgerError::signing("too many signatures"))?;

    let envelope = TransactionEnvelope::Tx(TransactionV1Envelope { tx, signatures });
    let envelope_xdr = envelope
        .to_xdr_base64(Limits::none())
        .map_err(|e| LedgerError::signing(format!("failed to encode envelope: {}", e)))?;

    Ok(SignedTx {
        envelope_xdr,
        hash: hex::encode(hash),
    })
}
