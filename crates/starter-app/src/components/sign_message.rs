//! Sign an arbitrary text message with the connected wallet.

use chain_sol::{Pubkey, Signature};
use tracing::{debug, warn};

use crate::context::AppContext;
use crate::error::AppError;
use crate::toast::Toaster;
use crate::wallet::{WalletError, WalletSession};

pub struct MessageSigner {
    toaster: Toaster,
    pub message: String,
    signature: Option<Signature>,
}

impl MessageSigner {
    pub fn new(ctx: &AppContext) -> Self {
        Self {
            toaster: ctx.toaster.clone(),
            message: String::new(),
            signature: None,
        }
    }

    pub fn signature(&self) -> Option<Signature> {
        self.signature
    }

    /// Base58 signature as shown in the output field.
    pub fn signature_text(&self) -> String {
        self.signature.map(|s| s.to_string()).unwrap_or_default()
    }

    async fn request_signature(
        &self,
        identity: &Pubkey,
        session: &WalletSession,
    ) -> Result<Signature, AppError> {
        let signature = session.sign_message(self.message.as_bytes()).await?;
        if !signature.verify(identity, self.message.as_bytes()) {
            return Err(WalletError::Adapter(format!(
                "signature does not verify against {identity}"
            ))
            .into());
        }
        Ok(signature)
    }

    pub async fn sign(&mut self, session: &WalletSession) {
        let Some(identity) = session.public_key() else {
            self.toaster.error("Please connect your wallet");
            return;
        };
        if self.message.is_empty() {
            self.toaster.error("Message cannot be empty");
            return;
        }

        self.signature = None;
        match self.request_signature(&identity, session).await {
            Ok(signature) => {
                debug!(%identity, %signature, "message signed");
                self.signature = Some(signature);
                self.toaster.success("Message signed");
            }
            Err(e) => {
                warn!(%identity, error = %e, "message signing failed");
                self.toaster.error("Failed to sign message");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkConfig;
    use crate::rpc::ledger::InMemoryLedger;
    use crate::storage::MemoryStore;
    use crate::wallet::{LocalWallet, WalletAdapter};
    use async_trait::async_trait;
    use chain_sol::{Keypair, Transaction};
    use std::sync::Arc;

    fn ctx() -> AppContext {
        AppContext::new(
            NetworkConfig::default(),
            Arc::new(InMemoryLedger::new()),
            Arc::new(MemoryStore::new()),
        )
    }

    /// Claims one identity, signs with another key.
    struct ImpostorWallet {
        claimed: Pubkey,
        signer: Keypair,
    }

    #[async_trait]
    impl WalletAdapter for ImpostorWallet {
        fn name(&self) -> &str {
            "Impostor"
        }

        async fn connect(&self) -> Result<Pubkey, WalletError> {
            Ok(self.claimed)
        }

        async fn disconnect(&self) -> Result<(), WalletError> {
            Ok(())
        }

        async fn sign_transaction(&self, tx: Transaction) -> Result<Transaction, WalletError> {
            Ok(tx)
        }

        async fn sign_message(&self, message: &[u8]) -> Result<Signature, WalletError> {
            Ok(self.signer.sign_message(message))
        }
    }

    #[tokio::test]
    async fn signs_and_verifies() {
        let ctx = ctx();
        let wallet = Arc::new(LocalWallet::new(Keypair::from_seed(&[8u8; 32])));
        let mut session = WalletSession::new(wallet.clone());
        session.connect().await.unwrap();

        let mut signer = MessageSigner::new(&ctx);
        signer.message = "hello solana".into();
        signer.sign(&session).await;

        let sig = signer.signature().unwrap();
        assert!(sig.verify(&wallet.pubkey(), b"hello solana"));
        assert_eq!(signer.signature_text(), sig.to_string());
        assert_eq!(ctx.toaster.last().unwrap().message, "Message signed");
    }

    #[tokio::test]
    async fn empty_message_is_refused() {
        let ctx = ctx();
        let mut session =
            WalletSession::new(Arc::new(LocalWallet::new(Keypair::from_seed(&[8u8; 32]))));
        session.connect().await.unwrap();

        let mut signer = MessageSigner::new(&ctx);
        signer.sign(&session).await;

        assert_eq!(signer.signature(), None);
        assert_eq!(ctx.toaster.last().unwrap().message, "Message cannot be empty");
    }

    #[tokio::test]
    async fn requires_wallet() {
        let ctx = ctx();
        let session =
            WalletSession::new(Arc::new(LocalWallet::new(Keypair::from_seed(&[8u8; 32]))));
        let mut signer = MessageSigner::new(&ctx);
        signer.message = "hi".into();

        signer.sign(&session).await;
        assert_eq!(ctx.toaster.last().unwrap().message, "Please connect your wallet");
    }

    #[tokio::test]
    async fn mismatched_signature_is_rejected() {
        let ctx = ctx();
        let impostor = ImpostorWallet {
            claimed: Keypair::from_seed(&[1u8; 32]).pubkey(),
            signer: Keypair::from_seed(&[2u8; 32]),
        };
        let mut session = WalletSession::new(Arc::new(impostor));
        session.connect().await.unwrap();

        let mut signer = MessageSigner::new(&ctx);
        signer.message = "hi".into();
        signer.sign(&session).await;

        assert_eq!(signer.signature(), None);
        assert_eq!(ctx.toaster.last().unwrap().message, "Failed to sign message");
    }
}
