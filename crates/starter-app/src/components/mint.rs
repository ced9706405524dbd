//! Create an SPL token mint, mint a starting supply to the wallet, and keep
//! the list of created mints per wallet.

use std::sync::Arc;

use chain_sol::{
    associated_token, spl_token, system, units_to_ui_amount, Instruction, Keypair, Pubkey,
    Signature, SolError, Transaction,
};
use tracing::{debug, warn};

use crate::context::AppContext;
use crate::error::AppError;
use crate::explorer::Explorer;
use crate::rpc::RpcClient;
use crate::storage::mints::{MintRecord, MintStore};
use crate::toast::Toaster;
use crate::wallet::WalletSession;

pub const MINT_DECIMALS: u8 = 6;
/// Ten whole tokens at six decimals.
pub const INITIAL_SUPPLY: u64 = 10_000_000;

/// Create the mint account, initialize it, create the payer's associated
/// token account and mint [`INITIAL_SUPPLY`] into it, in that order.
pub fn mint_instructions(
    payer: &Pubkey,
    mint: &Pubkey,
    rent_lamports: u64,
) -> Result<Vec<Instruction>, SolError> {
    let ata = associated_token::get_associated_token_address(payer, mint)?;
    Ok(vec![
        system::create_account(
            payer,
            mint,
            rent_lamports,
            spl_token::MINT_SIZE as u64,
            &spl_token::ID,
        ),
        spl_token::initialize_mint(mint, payer, None, MINT_DECIMALS),
        associated_token::create_associated_token_account(payer, &ata, payer, mint),
        spl_token::mint_to(mint, &ata, payer, INITIAL_SUPPLY)?,
    ])
}

pub struct MintCreator {
    rpc: Arc<dyn RpcClient>,
    toaster: Toaster,
    explorer: Explorer,
    store: MintStore,
    mints: Vec<String>,
    active_mint: Option<String>,
    token_balance: Option<f64>,
    last_signature: Option<Signature>,
}

impl MintCreator {
    pub fn new(ctx: &AppContext) -> Self {
        Self {
            rpc: ctx.rpc.clone(),
            toaster: ctx.toaster.clone(),
            explorer: ctx.explorer,
            store: MintStore::new(ctx.storage.clone()),
            mints: Vec::new(),
            active_mint: None,
            token_balance: None,
            last_signature: None,
        }
    }

    /// Newest first.
    pub fn mints(&self) -> &[String] {
        &self.mints
    }

    pub fn active_mint(&self) -> Option<&str> {
        self.active_mint.as_deref()
    }

    pub fn token_balance(&self) -> Option<f64> {
        self.token_balance
    }

    pub fn last_signature(&self) -> Option<Signature> {
        self.last_signature
    }

    pub fn mint_url(&self, mint: &str) -> String {
        self.explorer.address_url(mint)
    }

    /// Active mint address for the clipboard.
    pub fn copy_active_mint(&self) -> Option<String> {
        let mint = self.active_mint.clone()?;
        self.toaster.success("Mint address copied");
        Some(mint)
    }

    /// A listed mint address for the clipboard. Unknown mints copy nothing.
    pub fn copy_mint(&self, mint: &str) -> Option<String> {
        let mint = self.mints.iter().find(|m| m.as_str() == mint)?.clone();
        self.toaster.success("Copied mint");
        Some(mint)
    }

    fn record(&self) -> MintRecord {
        MintRecord {
            mints: self.mints.clone(),
            active_mint: self.active_mint.clone(),
        }
    }

    fn clear(&mut self) {
        self.mints.clear();
        self.active_mint = None;
        self.token_balance = None;
    }

    /// UI amount held by `owner`'s associated account for `mint`.
    async fn read_token_balance(&self, owner: &Pubkey, mint: &str) -> Result<f64, AppError> {
        let mint: Pubkey = mint.parse()?;
        let ata = associated_token::get_associated_token_address(owner, &mint)?;
        let data = self
            .rpc
            .get_account_data(&ata)
            .await?
            .ok_or(AppError::AccountNotFound(ata))?;
        let amount = spl_token::token_account_amount(&data)?;
        Ok(units_to_ui_amount(amount, MINT_DECIMALS))
    }

    /// Load the stored mint list for the connected wallet, migrating a
    /// legacy entry, then read the active mint's balance. Balance errors
    /// are swallowed.
    pub async fn rehydrate(&mut self, session: &WalletSession) {
        self.clear();
        let Some(identity) = session.public_key() else {
            return;
        };

        let Some(record) = self.store.rehydrate(&identity) else {
            return;
        };
        self.mints = record.mints;
        self.active_mint = record.active_mint;

        let Some(active) = self.active_mint.clone() else {
            return;
        };
        match self.read_token_balance(&identity, &active).await {
            Ok(balance) => self.token_balance = Some(balance),
            Err(e) => debug!(%identity, mint = %active, error = %e, "token balance unavailable"),
        }
    }

    async fn create(
        &self,
        identity: &Pubkey,
        session: &WalletSession,
    ) -> Result<(Pubkey, Signature), AppError> {
        let mint = Keypair::generate();
        let rent = self
            .rpc
            .get_minimum_balance_for_rent_exemption(spl_token::MINT_SIZE)
            .await?;
        let instructions = mint_instructions(identity, &mint.pubkey(), rent)?;

        let latest = self.rpc.get_latest_blockhash().await?;
        let mut tx = Transaction::new_with_payer(&instructions, identity, &latest.blockhash)?;
        tx.partial_sign(&mint)?;
        let signature = session.send_transaction(tx, self.rpc.as_ref()).await?;

        let checkpoint = self.rpc.get_latest_blockhash().await?;
        self.rpc.confirm_transaction(&signature, &checkpoint).await?;
        Ok((mint.pubkey(), signature))
    }

    pub async fn create_and_mint(&mut self, session: &WalletSession) {
        let Some(identity) = session.public_key() else {
            self.toaster.error("Please connect your wallet first");
            return;
        };

        let (mint, signature) = match self.create(&identity, session).await {
            Ok(created) => created,
            Err(e) => {
                warn!(%identity, error = %e, "create and mint failed");
                self.toaster.error("Failed to create and mint token");
                return;
            }
        };
        debug!(%identity, %mint, %signature, "token mint created");

        let mint = mint.to_string();
        self.last_signature = Some(signature);
        self.active_mint = Some(mint.clone());
        self.token_balance = match self.read_token_balance(&identity, &mint).await {
            Ok(balance) => Some(balance),
            Err(e) => {
                warn!(%identity, %mint, error = %e, "token balance unavailable after mint");
                None
            }
        };

        let base = self
            .store
            .load_current(&identity)
            .unwrap_or_else(|| self.record());
        let record = base.with_new_mint(&mint);
        if let Err(e) = self.store.save(&identity, &record) {
            warn!(%identity, error = %e, "mint list not persisted");
        }
        self.mints = record.mints;

        self.toaster.success("Token minted successfully");
    }

    /// Switch the displayed mint. A mint that is not in the list is ignored.
    pub async fn set_active(&mut self, session: &WalletSession, mint: &str) {
        let Some(identity) = session.public_key() else {
            return;
        };
        if !self.mints.iter().any(|m| m == mint) {
            warn!(%identity, mint, "ignoring unknown mint");
            return;
        }
        self.active_mint = Some(mint.to_string());

        let record = self
            .store
            .load_current(&identity)
            .and_then(|stored| stored.with_active(mint))
            .or_else(|| self.record().with_active(mint));
        if let Some(record) = record {
            if let Err(e) = self.store.save(&identity, &record) {
                warn!(%identity, error = %e, "active mint not persisted");
            }
        }

        self.token_balance = Some(
            self.read_token_balance(&identity, mint)
                .await
                .unwrap_or_else(|e| {
                    debug!(%identity, mint, error = %e, "token balance unavailable");
                    0.0
                }),
        );
    }
}
