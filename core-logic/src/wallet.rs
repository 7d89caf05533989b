use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Signing identity of the wallet: a public account id and its secret seed.
///
/// The secret is wiped on drop and never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Keypair {
    public_id: String,
    secret: String,
}

impl Keypair {
    pub fn new(public_id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            public_id: public_id.into(),
            secret: secret.into(),
        }
    }

    pub fn public_id(&self) -> &str {
        &self.public_id
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("public_id", &self.public_id)
            .field("secret", &"***REDACTED***")
            .finish()
    }
}
