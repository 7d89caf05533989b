//! SEP-0005 keypair derivation.
//!
//! A BIP39 phrase is turned into a 64-byte seed (empty passphrase), then
//! SLIP-0010 ed25519 derivation walks `m/44'/<coin_type>'/<account>'`.
//! Every level is hardened; ed25519 has no public child derivation.

use autopay_core::{Keypair, KeypairLoader, WalletError};
use bip39::Mnemonic;
use ed25519_dalek::SigningKey;
use hmac::{Hmac, Mac};
use sha2::Sha512;
use stellar_strkey::ed25519::{PrivateKey, PublicKey};
use zeroize::Zeroize;

type HmacSha512 = Hmac<Sha512>;

const HARDENED_OFFSET: u32 = 0x8000_0000;
const MASTER_HMAC_KEY: &[u8] = b"ed25519 seed";
const BIP44_PURPOSE: u32 = 44;

/// SLIP-0044 coin type registered for Stellar; Pi wallets derive under it too.
pub const STELLAR_COIN_TYPE: u32 = 148;

/// Derives the account keypair of a recovery phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sep5KeypairLoader {
    coin_type: u32,
    account: u32,
}

impl Default for Sep5KeypairLoader {
    fn default() -> Self {
        Self::new(STELLAR_COIN_TYPE)
    }
}

impl Sep5KeypairLoader {
    pub fn new(coin_type: u32) -> Self {
        Self {
            coin_type,
            account: 0,
        }
    }

    pub fn with_account(mut self, account: u32) -> Self {
        self.account = account;
        self
    }

    /// Derivation path as displayed to users, e.g. `m/44'/148'/0'`.
    pub fn path(&self) -> String {
        format!("m/{}'/{}'/{}'", BIP44_PURPOSE, self.coin_type, self.account)
    }
}

impl KeypairLoader for Sep5KeypairLoader {
    fn derive(&self, phrase: &str) -> Result<Keypair, WalletError> {
        let mnemonic = Mnemonic::parse(phrase.trim()).map_err(|e| WalletError::InvalidPhrase {
            reason: e.to_string(),
        })?;

        let mut seed = mnemonic.to_seed("");
        let derived = derive_ed25519_key(&seed, &[BIP44_PURPOSE, self.coin_type, self.account]);
        seed.zeroize();

        let mut key = derived?;
        let keypair = keypair_from_seed(&key);
        key.zeroize();
        Ok(keypair)
    }
}

/// Encodes a raw ed25519 seed as a strkey keypair (`G...` / `S...`).
pub fn keypair_from_seed(seed: &[u8; 32]) -> Keypair {
    let signing = SigningKey::from_bytes(seed);
    let public = PublicKey(signing.verifying_key().to_bytes()).to_string();
    let secret = PrivateKey(*seed).to_string();
    Keypair::new(public, secret)
}

/// Decodes an `S...` strkey secret into a signing key.
pub fn signing_key(keypair: &Keypair) -> Result<SigningKey, WalletError> {
    let mut raw = PrivateKey::from_string(keypair.secret())
        .map_err(|e| WalletError::InvalidKey {
            reason: format!("secret seed does not decode: {}", e),
        })?
        .0;
    let key = SigningKey::from_bytes(&raw);
    raw.zeroize();

    let public = PublicKey(key.verifying_key().to_bytes()).to_string();
    if public != keypair.public_id() {
        return Err(WalletError::InvalidKey {
            reason: "secret seed does not match public id".into(),
        });
    }
    Ok(key)
}

fn derive_ed25519_key(seed: &[u8], path: &[u32]) -> Result<[u8; 32], WalletError> {
    let (mut key, mut chain_code) = split(hmac_sha512(MASTER_HMAC_KEY, seed)?);

    for &index in path {
        // 0x00 || key || ser32(index | 2^31)
        let mut data = [0u8; 37];
        data[1..33].copy_from_slice(&key);
        data[33..].copy_from_slice(&(index | HARDENED_OFFSET).to_be_bytes());

        let child = hmac_sha512(&chain_code, &data);
        data.zeroize();
        key.zeroize();
        chain_code.zeroize();
        (key, chain_code) = split(child?);
    }

    chain_code.zeroize();
    Ok(key)
}

fn split(mut output: [u8; 64]) -> ([u8; 32], [u8; 32]) {
    let mut left = [0u8; 32];
    let mut right = [0u8; 32];
    left.copy_from_slice(&output[..32]);
    right.copy_from_slice(&output[32..]);
    output.zeroize();
    (left, right)
}

fn hmac_sha512(key: &[u8], data: &[u8]) -> Result<[u8; 64], WalletError> {
    let mut mac =
        HmacSha512::new_from_slice(key).map_err(|e| WalletError::DerivationFailed {
            reason: format!("HMAC-SHA512 key init failed: {}", e),
        })?;
    mac.update(data);

    let mut output = [0u8; 64];
    output.copy_from_slice(&mac.finalize().into_bytes());
    Ok(output)
}
