//! Send SOL to another address.

use std::sync::Arc;

use chain_sol::{sol_to_lamports, system, Instruction, Pubkey, Signature, Transaction};
use tracing::{debug, warn};

use crate::context::AppContext;
use crate::error::AppError;
use crate::explorer::Explorer;
use crate::rpc::RpcClient;
use crate::toast::Toaster;
use crate::wallet::WalletSession;

/// The single System transfer for `amount` SOL from `from` to `recipient`.
pub fn transfer_instructions(
    from: &Pubkey,
    recipient: &str,
    amount: &str,
) -> Result<Vec<Instruction>, AppError> {
    let to: Pubkey = recipient.trim().parse()?;
    let lamports = sol_to_lamports(amount)?;
    if lamports == 0 {
        return Err(AppError::InvalidInput("amount must be greater than zero".into()));
    }
    Ok(vec![system::transfer(from, &to, lamports)])
}

pub struct TransferForm {
    rpc: Arc<dyn RpcClient>,
    toaster: Toaster,
    explorer: Explorer,
    pub recipient: String,
    pub amount: String,
    last_signature: Option<Signature>,
}

impl TransferForm {
    pub fn new(ctx: &AppContext) -> Self {
        Self {
            rpc: ctx.rpc.clone(),
            toaster: ctx.toaster.clone(),
            explorer: ctx.explorer,
            recipient: String::new(),
            amount: String::new(),
            last_signature: None,
        }
    }

    pub fn last_signature(&self) -> Option<Signature> {
        self.last_signature
    }

    pub fn explorer_url(&self) -> Option<String> {
        self.last_signature.map(|sig| self.explorer.tx_url(&sig))
    }

    async fn send(
        &self,
        identity: &Pubkey,
        session: &WalletSession,
    ) -> Result<Signature, AppError> {
        let instructions = transfer_instructions(identity, &self.recipient, &self.amount)?;

        let latest = self.rpc.get_latest_blockhash().await?;
        let tx = Transaction::new_with_payer(&instructions, identity, &latest.blockhash)?;
        let signature = session.send_transaction(tx, self.rpc.as_ref()).await?;

        let checkpoint = self.rpc.get_latest_blockhash().await?;
        self.rpc.confirm_transaction(&signature, &checkpoint).await?;
        Ok(signature)
    }

    /// Build, sign, send and confirm. The inputs are cleared afterwards
    /// whatever the outcome.
    pub async fn submit(&mut self, session: &WalletSession) {
        let Some(identity) = session.public_key() else {
            self.toaster.error("Please connect your wallet");
            return;
        };

        match self.send(&identity, session).await {
            Ok(signature) => {
                debug!(%identity, %signature, recipient = %self.recipient, "transfer confirmed");
                self.toaster
                    .success(format!("Transfer successful of {}", self.amount.trim()));
                self.last_signature = Some(signature);
            }
            Err(e) => {
                warn!(%identity, error = %e, "transfer failed");
                self.toaster
                    .error("Transfer failed. Check the address and balance.");
            }
        }

        self.recipient.clear();
        self.amount.clear();
    }
}
