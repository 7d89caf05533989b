//! # Wallet State Store
//!
//! The single shared record behind the control surface and the worker.
//! Every field is private to [`WalletStore`]; each operation is one critical
//! section and none of them is ever held across a network call.

use crate::config::SendConfig;
use crate::error::{ConfigError, WalletError};
use crate::submission::SubmissionOutcome;
use crate::traits::KeypairLoader;
use crate::wallet::Keypair;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{info, warn};

#[derive(Debug, Default)]
struct WalletState {
    keypair: Option<Arc<Keypair>>,
    send_config: Option<SendConfig>,
    armed: bool,
    last_result: Option<SubmissionOutcome>,
    generation: u64,
}

/// Immutable point-in-time copy of the wallet state.
#[derive(Debug, Clone, Default)]
pub struct WalletSnapshot {
    pub keypair: Option<Arc<Keypair>>,
    pub send_config: Option<SendConfig>,
    pub armed: bool,
    pub last_result: Option<SubmissionOutcome>,
    /// Bumped by every load, including a reload of the same phrase.
    pub generation: u64,
}

impl WalletSnapshot {
    pub fn public_id(&self) -> Option<&str> {
        self.keypair.as_deref().map(Keypair::public_id)
    }

    /// Keypair and send configuration, if both are present and complete.
    /// Ignores the armed flag.
    pub fn submission_inputs(&self) -> Option<(Arc<Keypair>, SendConfig)> {
        let keypair = self.keypair.clone()?;
        let send = self.send_config.clone().filter(SendConfig::is_complete)?;
        Some((keypair, send))
    }
}

#[derive(Debug, Default)]
pub struct WalletStore {
    inner: RwLock<WalletState>,
}

impl WalletStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, WalletState> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, WalletState> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the active keypair and clears the previous identity's result.
    /// Send configuration and the armed flag are kept.
    pub fn load(&self, keypair: Keypair) -> String {
        let public_id = keypair.public_id().to_string();
        {
            let mut state = self.write();
            state.keypair = Some(Arc::new(keypair));
            state.last_result = None;
            state.generation += 1;
        }
        info!("Wallet loaded: {}", public_id);
        public_id
    }

    /// Derives a keypair from `phrase` and loads it.
    ///
    /// Derivation runs outside the lock; an invalid phrase leaves the store
    /// untouched.
    pub fn load_phrase(
        &self,
        loader: &dyn KeypairLoader,
        phrase: &str,
    ) -> Result<String, WalletError> {
        let keypair = loader.derive(phrase)?;
        Ok(self.load(keypair))
    }

    /// Validates and replaces the whole send configuration.
    pub fn configure(
        &self,
        destination: &str,
        amount: &str,
        memo: &str,
    ) -> Result<SendConfig, ConfigError> {
        let config = SendConfig::new(destination, amount, memo)?;
        self.write().send_config = Some(config.clone());
        info!(
            "Send config updated: {} to {}",
            config.amount(),
            config.destination()
        );
        Ok(config)
    }

    pub fn set_armed(&self, armed: bool) -> bool {
        self.write().armed = armed;
        info!("Auto-send {}", if armed { "armed" } else { "disarmed" });
        armed
    }

    /// Flips the armed flag and returns the new value.
    pub fn toggle_armed(&self) -> bool {
        let armed = {
            let mut state = self.write();
            state.armed = !state.armed;
            state.armed
        };
        info!("Auto-send {}", if armed { "armed" } else { "disarmed" });
        armed
    }

    pub fn snapshot(&self) -> WalletSnapshot {
        let state = self.read();
        WalletSnapshot {
            keypair: state.keypair.clone(),
            send_config: state.send_config.clone(),
            armed: state.armed,
            last_result: state.last_result.clone(),
            generation: state.generation,
        }
    }

    /// Overwrites the last result of an attempt started from a snapshot of
    /// `generation`.
    ///
    /// If a load happened since that snapshot the outcome is dropped and
    /// `false` is returned.
    pub fn record_result(&self, generation: u64, outcome: SubmissionOutcome) -> bool {
        let mut state = self.write();
        if state.generation != generation {
            drop(state);
            warn!(
                "Discarding result for {}: wallet was reloaded during the attempt",
                outcome.source()
            );
            return false;
        }
        state.last_result = Some(outcome);
        true
    }
}
