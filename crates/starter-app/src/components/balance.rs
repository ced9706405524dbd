//! Live SOL balance of the connected wallet.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chain_sol::{lamports_to_sol, Pubkey};
use tracing::{debug, warn};

use crate::context::AppContext;
use crate::display::{format_sol, short_address};
use crate::rpc::{AccountSubscription, RpcClient};
use crate::toast::Toaster;

/// "Please re-fetch" signal from other components to the viewer.
#[derive(Debug, Clone, Default)]
pub struct RefreshFlag(Arc<AtomicBool>);

impl RefreshFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear the flag, reporting whether it was set.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}

pub struct BalanceViewer {
    rpc: Arc<dyn RpcClient>,
    toaster: Toaster,
    refresh: RefreshFlag,
    identity: Option<Pubkey>,
    subscription: Option<AccountSubscription>,
    balance: Option<f64>,
}

impl BalanceViewer {
    pub fn new(ctx: &AppContext, refresh: RefreshFlag) -> Self {
        Self {
            rpc: ctx.rpc.clone(),
            toaster: ctx.toaster.clone(),
            refresh,
            identity: None,
            subscription: None,
            balance: None,
        }
    }

    /// Balance in SOL; `None` while unknown.
    pub fn balance(&self) -> Option<f64> {
        self.balance
    }

    pub fn balance_text(&self) -> String {
        format_sol(self.balance)
    }

    pub fn identity(&self) -> Option<Pubkey> {
        self.identity
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn address_text(&self) -> Option<String> {
        self.identity.as_ref().map(short_address)
    }

    /// Full address for the clipboard.
    pub fn copy_address(&self) -> Option<String> {
        let address = self.identity?.to_string();
        self.toaster.success("Copied to clipboard");
        Some(address)
    }

    /// Follow the session's identity: drop the old feed, then fetch and
    /// subscribe for the new one. `None` resets the balance to unknown.
    pub async fn sync(&mut self, identity: Option<Pubkey>) {
        if identity.is_some() && identity == self.identity && self.subscription.is_some() {
            return;
        }

        self.teardown().await;
        self.identity = identity;

        let Some(pubkey) = identity else {
            self.balance = None;
            return;
        };

        self.fetch().await;

        match self.rpc.subscribe_account(&pubkey).await {
            Ok(subscription) => {
                debug!(%pubkey, id = subscription.id, "balance subscription opened");
                self.subscription = Some(subscription);
            }
            Err(e) => warn!(%pubkey, error = %e, "balance subscription failed"),
        }
    }

    /// One-off balance read. Failure leaves the balance unknown.
    pub async fn fetch(&mut self) {
        let Some(pubkey) = self.identity else {
            return;
        };

        match self.rpc.get_balance(&pubkey).await {
            Ok(lamports) => self.balance = Some(lamports_to_sol(lamports)),
            Err(e) => {
                warn!(%pubkey, error = %e, "balance fetch failed");
                self.toaster.error("Failed to fetch balance");
                self.balance = None;
            }
        }
    }

    /// Apply every push already queued. Returns whether anything changed.
    pub fn apply_pending(&mut self) -> bool {
        let Some(subscription) = self.subscription.as_mut() else {
            return false;
        };

        let mut latest = None;
        while let Ok(update) = subscription.updates.try_recv() {
            latest = Some(update.lamports);
        }

        match latest {
            Some(lamports) => {
                self.balance = Some(lamports_to_sol(lamports));
                true
            }
            None => false,
        }
    }

    /// Re-fetch if another component asked for it.
    pub async fn refresh_if_requested(&mut self) -> bool {
        if !self.refresh.take() {
            return false;
        }
        self.fetch().await;
        true
    }

    /// Close the feed. Unsubscribe errors are ignored.
    pub async fn teardown(&mut self) {
        let Some(subscription) = self.subscription.take() else {
            return;
        };
        if let Err(e) = self.rpc.unsubscribe_account(subscription.id).await {
            debug!(id = subscription.id, error = %e, "unsubscribe failed");
        }
    }
}
