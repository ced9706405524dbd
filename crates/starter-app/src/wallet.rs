//! Wallet session: which adapter is in use and which identity it exposes.
//!
//! The browser-extension protocol stays behind [`WalletAdapter`]. The
//! session only tracks connected/disconnected state and routes signing
//! requests, so components never touch key material.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chain_sol::{Keypair, Pubkey, Signature, Transaction};
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::rpc::RpcClient;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Wallet not connected")]
    NotConnected,

    #[error("User rejected the request: {0}")]
    Rejected(String),

    #[error("Wallet adapter error: {0}")]
    Adapter(String),
}

/// A wallet the user can connect: an extension, a hardware device or a
/// local keypair.
#[async_trait]
pub trait WalletAdapter: Send + Sync {
    fn name(&self) -> &str;

    /// Ask the wallet for access; returns the identity it exposes.
    async fn connect(&self) -> Result<Pubkey, WalletError>;

    async fn disconnect(&self) -> Result<(), WalletError>;

    /// Fill the wallet's signature slot and return the transaction.
    /// Slots already filled by other signers must be preserved.
    async fn sign_transaction(&self, tx: Transaction) -> Result<Transaction, WalletError>;

    async fn sign_message(&self, message: &[u8]) -> Result<Signature, WalletError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Disconnected,
    Connected(Pubkey),
}

pub struct WalletSession {
    adapter: Arc<dyn WalletAdapter>,
    state: SessionState,
}

impl WalletSession {
    pub fn new(adapter: Arc<dyn WalletAdapter>) -> Self {
        Self {
            adapter,
            state: SessionState::Disconnected,
        }
    }

    pub fn adapter_name(&self) -> &str {
        self.adapter.name()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The connected identity, if any.
    pub fn public_key(&self) -> Option<Pubkey> {
        match self.state {
            SessionState::Connected(pubkey) => Some(pubkey),
            SessionState::Disconnected => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.public_key().is_some()
    }

    pub async fn connect(&mut self) -> Result<Pubkey, WalletError> {
        let pubkey = self.adapter.connect().await?;
        debug!(wallet = self.adapter.name(), %pubkey, "wallet connected");
        self.state = SessionState::Connected(pubkey);
        Ok(pubkey)
    }

    /// Always ends disconnected, even if the adapter complains.
    pub async fn disconnect(&mut self) {
        if let Err(e) = self.adapter.disconnect().await {
            warn!(wallet = self.adapter.name(), error = %e, "wallet disconnect failed");
        }
        self.state = SessionState::Disconnected;
        debug!(wallet = self.adapter.name(), "wallet disconnected");
    }

    /// Have the wallet sign `tx` as fee payer, then submit it through `rpc`.
    pub async fn send_transaction(
        &self,
        tx: Transaction,
        rpc: &dyn RpcClient,
    ) -> Result<Signature, AppError> {
        let identity = self.public_key().ok_or(AppError::WalletNotConnected)?;
        if tx.message.fee_payer() != Some(&identity) {
            return Err(WalletError::Adapter(format!(
                "transaction fee payer is not the connected wallet {identity}"
            ))
            .into());
        }

        let signed = self.adapter.sign_transaction(tx).await?;
        if !signed.is_fully_signed() {
            return Err(WalletError::Adapter(
                "wallet returned an incompletely signed transaction".into(),
            )
            .into());
        }

        let signature = rpc.send_transaction(&signed).await?;
        debug!(%identity, %signature, "transaction submitted");
        Ok(signature)
    }

    pub async fn sign_message(&self, message: &[u8]) -> Result<Signature, AppError> {
        if !self.is_connected() {
            return Err(AppError::WalletNotConnected);
        }
        Ok(self.adapter.sign_message(message).await?)
    }
}

/// Adapter backed by an in-process keypair; stands in for an extension in
/// CLI runs and tests.
pub struct LocalWallet {
    keypair: Keypair,
    connected: AtomicBool,
    rejecting: AtomicBool,
}

impl LocalWallet {
    pub fn new(keypair: Keypair) -> Self {
        Self {
            keypair,
            connected: AtomicBool::new(false),
            rejecting: AtomicBool::new(false),
        }
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    /// Decline every signing request, as a user clicking "Reject" would.
    pub fn set_rejecting(&self, rejecting: bool) {
        self.rejecting.store(rejecting, Ordering::SeqCst);
    }

    fn ensure_signable(&self) -> Result<(), WalletError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(WalletError::NotConnected);
        }
        if self.rejecting.load(Ordering::SeqCst) {
            return Err(WalletError::Rejected("signature declined".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl WalletAdapter for LocalWallet {
    fn name(&self) -> &str {
        "Local Keypair"
    }

    async fn connect(&self) -> Result<Pubkey, WalletError> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(self.keypair.pubkey())
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn sign_transaction(&self, mut tx: Transaction) -> Result<Transaction, WalletError> {
        self.ensure_signable()?;
        tx.partial_sign(&self.keypair)
            .map_err(|e| WalletError::Adapter(e.to_string()))?;
        Ok(tx)
    }

    async fn sign_message(&self, message: &[u8]) -> Result<Signature, WalletError> {
        self.ensure_signable()?;
        Ok(self.keypair.sign_message(message))
    }
}
