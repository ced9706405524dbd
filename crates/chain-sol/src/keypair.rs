//! Ed25519 keypairs for locally generated accounts.
//!
//! Used for fresh mint accounts (which must co-sign their own creation) and
//! for keypair-backed wallets in headless setups.

use ed25519_dalek::Signer;
use rand_core::{OsRng, RngCore};
use zeroize::Zeroize;

use crate::pubkey::{Pubkey, Signature};

/// An Ed25519 signing keypair. The secret half is wiped on drop by
/// `ed25519-dalek`.
pub struct Keypair {
    signing_key: ed25519_dalek::SigningKey,
}

impl Keypair {
    /// Generate a new keypair from the OS random source.
    pub fn generate() -> Self {
        let mut seed = [0u8; 32];
        OsRng.fill_bytes(&mut seed);
        let keypair = Self::from_seed(&seed);
        seed.zeroize();
        keypair
    }

    /// Build a keypair from a 32-byte Ed25519 seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let mut seed = *seed;
        let signing_key = ed25519_dalek::SigningKey::from_bytes(&seed);
        seed.zeroize();
        Self { signing_key }
    }

    pub fn pubkey(&self) -> Pubkey {
        Pubkey::new_from_array(self.signing_key.verifying_key().to_bytes())
    }

    pub fn sign_message(&self, message: &[u8]) -> Signature {
        Signature::new_from_array(self.signing_key.sign(message).to_bytes())
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("pubkey", &self.pubkey())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keypairs_differ() {
        let a = Keypair::generate();
        let b = Keypair::generate();
        assert_ne!(a.pubkey(), b.pubkey());
    }

    #[test]
    fn seeded_keypair_is_deterministic() {
        let a = Keypair::from_seed(&[0x42u8; 32]);
        let b = Keypair::from_seed(&[0x42u8; 32]);
        assert_eq!(a.pubkey(), b.pubkey());
    }

    #[test]
    fn pubkey_is_on_curve() {
        assert!(Keypair::generate().pubkey().is_on_curve());
    }

    #[test]
    fn signature_verifies_against_pubkey() {
        let keypair = Keypair::from_seed(&[0x11u8; 32]);
        let sig = keypair.sign_message(b"hello devnet");
        assert!(sig.verify(&keypair.pubkey(), b"hello devnet"));
        assert!(!sig.verify(&keypair.pubkey(), b"hello mainnet"));
    }

    #[test]
    fn debug_hides_secret() {
        let keypair = Keypair::from_seed(&[0x11u8; 32]);
        let debug = format!("{keypair:?}");
        assert!(debug.contains("pubkey"));
        assert!(!debug.contains("signing_key"));
    }
}
