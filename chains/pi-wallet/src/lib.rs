//! # Pi Wallet
//!
//! Pi Network bindings for the autopay core: SEP-0005 keypair derivation,
//! a Horizon ledger gateway, and the HTTP control surface.

pub mod config;
pub mod horizon;
pub mod keys;
pub mod transaction;
pub mod web;

pub use config::PiConfig;
pub use horizon::HorizonGateway;
pub use keys::Sep5KeypairLoader;
