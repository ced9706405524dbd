//! Devnet/testnet funding, once per page session.

use std::sync::Arc;

use chain_sol::{sol_to_lamports, Pubkey, Signature};
use tracing::{debug, warn};

use crate::config::Cluster;
use crate::context::AppContext;
use crate::error::AppError;
use crate::explorer::Explorer;
use crate::rpc::RpcClient;
use crate::toast::Toaster;
use crate::wallet::WalletSession;

type AirdropCallback = Box<dyn Fn() + Send + Sync>;

pub struct AirdropRequester {
    rpc: Arc<dyn RpcClient>,
    toaster: Toaster,
    explorer: Explorer,
    cluster: Cluster,
    /// SOL amount as typed.
    pub amount: String,
    attempted: bool,
    last_signature: Option<Signature>,
    on_airdrop: Option<AirdropCallback>,
}

impl AirdropRequester {
    pub fn new(ctx: &AppContext) -> Self {
        Self {
            rpc: ctx.rpc.clone(),
            toaster: ctx.toaster.clone(),
            explorer: ctx.explorer,
            cluster: ctx.config.cluster,
            amount: "1".to_string(),
            attempted: false,
            last_signature: None,
            on_airdrop: None,
        }
    }

    /// Called after every successful airdrop.
    pub fn on_airdrop(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_airdrop = Some(Box::new(callback));
        self
    }

    pub fn attempted(&self) -> bool {
        self.attempted
    }

    pub fn last_signature(&self) -> Option<Signature> {
        self.last_signature
    }

    pub fn explorer_url(&self) -> Option<String> {
        self.last_signature.map(|sig| self.explorer.tx_url(&sig))
    }

    async fn send_airdrop(&self, identity: &Pubkey) -> Result<Signature, AppError> {
        let lamports = sol_to_lamports(&self.amount)?;
        Ok(self.rpc.request_airdrop(identity, lamports).await?)
    }

    pub async fn request(&mut self, session: &WalletSession) {
        let Some(identity) = session.public_key() else {
            self.toaster.error("Please connect your wallet");
            return;
        };

        if !self.cluster.supports_airdrop() {
            self.toaster.error(format!(
                "Airdrops are not available on {}",
                self.cluster.display_name()
            ));
            return;
        }

        if self.attempted {
            self.toaster
                .error("Airdrop already attempted today. Try again tomorrow!");
            return;
        }

        // Failed attempts count too.
        self.attempted = true;

        match self.send_airdrop(&identity).await {
            Ok(signature) => {
                debug!(%identity, %signature, amount = %self.amount, "airdrop requested");
                self.last_signature = Some(signature);
                self.toaster
                    .success(format!("Airdropped {} SOL successfully!", self.amount.trim()));
                if let Some(callback) = &self.on_airdrop {
                    callback();
                }
            }
            Err(e) => {
                warn!(%identity, error = %e, "airdrop failed");
                self.toaster
                    .error("Airdrop limit reached. Try again tomorrow!");
            }
        }
    }
}
