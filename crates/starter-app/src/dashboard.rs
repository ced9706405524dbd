//! The page: one wallet session and one of each component.
//!
//! The dashboard owns the refresh flag shared between the airdrop
//! requester and the balance viewer, and re-runs the identity-dependent
//! effects (balance feed, mint list) whenever the wallet changes.

use std::sync::Arc;

use chain_sol::Pubkey;
use tracing::{debug, warn};

use crate::components::{
    AirdropRequester, BalanceViewer, MessageSigner, MintCreator, RefreshFlag, TransferForm,
};
use crate::context::AppContext;
use crate::toast::Toast;
use crate::wallet::{WalletAdapter, WalletError, WalletSession};

pub struct Dashboard {
    ctx: AppContext,
    session: WalletSession,
    refresh: RefreshFlag,
    pub balance: BalanceViewer,
    pub airdrop: AirdropRequester,
    pub transfer: TransferForm,
    pub mint: MintCreator,
    pub signer: MessageSigner,
}

impl Dashboard {
    pub fn new(ctx: AppContext, adapter: Arc<dyn WalletAdapter>) -> Self {
        let refresh = RefreshFlag::new();
        let raise = refresh.clone();

        Self {
            balance: BalanceViewer::new(&ctx, refresh.clone()),
            airdrop: AirdropRequester::new(&ctx).on_airdrop(move || raise.raise()),
            transfer: TransferForm::new(&ctx),
            mint: MintCreator::new(&ctx),
            signer: MessageSigner::new(&ctx),
            session: WalletSession::new(adapter),
            refresh,
            ctx,
        }
    }

    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    pub fn session(&self) -> &WalletSession {
        &self.session
    }

    pub fn identity(&self) -> Option<Pubkey> {
        self.session.public_key()
    }

    pub fn refresh_requested(&self) -> bool {
        self.refresh.is_raised()
    }

    /// First render. With `auto_connect`, try the wallet silently.
    pub async fn mount(&mut self, auto_connect: bool) {
        if auto_connect {
            if let Err(e) = self.session.connect().await {
                warn!(wallet = self.session.adapter_name(), error = %e, "auto-connect failed");
            }
        }
        self.on_wallet_changed().await;
    }

    pub async fn connect_wallet(&mut self) -> Result<Pubkey, WalletError> {
        let identity = self.session.connect().await?;
        self.on_wallet_changed().await;
        Ok(identity)
    }

    pub async fn disconnect_wallet(&mut self) {
        self.session.disconnect().await;
        self.on_wallet_changed().await;
    }

    /// Re-run everything keyed on the wallet identity.
    pub async fn on_wallet_changed(&mut self) {
        let identity = self.session.public_key();
        debug!(identity = ?identity, "wallet changed");
        self.balance.sync(identity).await;
        self.mint.rehydrate(&self.session).await;
    }

    /// Apply queued balance pushes and honour a pending refresh request.
    pub async fn tick(&mut self) {
        self.balance.apply_pending();
        self.balance.refresh_if_requested().await;
    }

    pub async fn request_airdrop(&mut self) {
        self.airdrop.request(&self.session).await;
    }

    pub async fn submit_transfer(&mut self) {
        self.transfer.submit(&self.session).await;
    }

    pub async fn create_and_mint(&mut self) {
        self.mint.create_and_mint(&self.session).await;
    }

    pub async fn set_active_mint(&mut self, mint: &str) {
        self.mint.set_active(&self.session, mint).await;
    }

    pub async fn sign_message(&mut self) {
        self.signer.sign(&self.session).await;
    }

    /// Toasts raised since the last call.
    pub fn take_toasts(&self) -> Vec<Toast> {
        self.ctx.toaster.drain()
    }

    pub async fn unmount(mut self) {
        self.balance.teardown().await;
    }
}
