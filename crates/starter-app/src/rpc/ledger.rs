//! In-process cluster for offline runs and tests.
//!
//! Holds a map of accounts and executes the instructions the starter
//! issues: System `CreateAccount`/`Transfer`, SPL Token
//! `InitializeMint`/`MintTo` and Associated Token `Create`. Transactions are
//! checked for a known blockhash and valid signatures in every slot, then
//! applied atomically. Failures can be injected per RPC method.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chain_sol::{associated_token, spl_token, system, Hash, Pubkey, Signature, Transaction};
use tokio::sync::mpsc;

use super::{
    AccountNotification, AccountSubscription, LatestBlockhash, RpcClient, RpcError,
    SubscriptionId,
};

/// Lamports per byte-year times the two-year exemption threshold.
const RENT_LAMPORTS_PER_BYTE: u64 = 3_480 * 2;
/// Per-account storage overhead charged by rent.
const ACCOUNT_STORAGE_OVERHEAD: u64 = 128;
/// Blocks a blockhash stays valid for.
const BLOCKHASH_VALIDITY: u64 = 150;

const MINT_DECIMALS_OFFSET: usize = 44;
const MINT_INITIALIZED_OFFSET: usize = 45;
const MINT_SUPPLY_OFFSET: usize = 36;
const TOKEN_ACCOUNT_STATE_OFFSET: usize = 108;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerAccount {
    pub lamports: u64,
    pub owner: Pubkey,
    pub data: Vec<u8>,
}

#[derive(Default)]
struct LedgerState {
    accounts: HashMap<Pubkey, LedgerAccount>,
    block_height: u64,
    recent_blockhashes: HashMap<Hash, u64>,
    landed: HashSet<Signature>,
    subscribers: HashMap<SubscriptionId, (Pubkey, mpsc::UnboundedSender<AccountNotification>)>,
    next_subscription: SubscriptionId,
    calls: HashMap<&'static str, usize>,
    failing: HashSet<&'static str>,
    airdrop_counter: u64,
}

#[derive(Default)]
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Credit `lamports` to `pubkey` outside of any transaction.
    pub fn fund(&self, pubkey: &Pubkey, lamports: u64) {
        let mut state = self.lock();
        credit(&mut state.accounts, pubkey, lamports);
        notify(&mut state, &[*pubkey]);
    }

    pub fn account(&self, pubkey: &Pubkey) -> Option<LedgerAccount> {
        self.lock().accounts.get(pubkey).cloned()
    }

    /// Make every future call to `method` fail until [`Self::recover`].
    pub fn fail_method(&self, method: &'static str) {
        self.lock().failing.insert(method);
    }

    pub fn recover(&self, method: &'static str) {
        self.lock().failing.remove(method);
    }

    /// How many times `method` was invoked, failed calls included.
    pub fn calls(&self, method: &'static str) -> usize {
        self.lock().calls.get(method).copied().unwrap_or(0)
    }

    pub fn active_subscriptions(&self) -> usize {
        self.lock().subscribers.len()
    }

    fn enter(&self, method: &'static str) -> Result<MutexGuard<'_, LedgerState>, RpcError> {
        let mut state = self.lock();
        *state.calls.entry(method).or_insert(0) += 1;
        if state.failing.contains(method) {
            return Err(RpcError::Server {
                code: -32000,
                message: format!("{method} unavailable"),
            });
        }
        Ok(state)
    }
}

#[async_trait]
impl RpcClient for InMemoryLedger {
    async fn get_balance(&self, pubkey: &Pubkey) -> Result<u64, RpcError> {
        let state = self.enter("getBalance")?;
        Ok(state.accounts.get(pubkey).map_or(0, |a| a.lamports))
    }

    async fn request_airdrop(&self, pubkey: &Pubkey, lamports: u64) -> Result<Signature, RpcError> {
        let mut state = self.enter("requestAirdrop")?;
        if lamports == 0 {
            return Err(RpcError::Server {
                code: -32602,
                message: "airdrop amount must be positive".into(),
            });
        }
        credit(&mut state.accounts, pubkey, lamports);
        notify(&mut state, &[*pubkey]);

        state.airdrop_counter += 1;
        let mut sig = [0u8; 64];
        sig[..32].copy_from_slice(pubkey.as_bytes());
        sig[32..40].copy_from_slice(&state.airdrop_counter.to_le_bytes());
        let signature = Signature::from(sig);
        state.landed.insert(signature);
        Ok(signature)
    }

    async fn get_latest_blockhash(&self) -> Result<LatestBlockhash, RpcError> {
        let mut state = self.enter("getLatestBlockhash")?;
        state.block_height += 1;
        let height = state.block_height;
        let blockhash = next_blockhash(height);
        state.recent_blockhashes.insert(blockhash, height);
        Ok(LatestBlockhash {
            blockhash,
            last_valid_block_height: height + BLOCKHASH_VALIDITY,
        })
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, RpcError> {
        let mut state = self.enter("sendTransaction")?;
        let signature = verify_transaction(&state, tx)?;
        if state.landed.contains(&signature) {
            return Err(RpcError::TransactionFailed("already processed".into()));
        }

        let mut accounts = state.accounts.clone();
        let touched = execute(&mut accounts, tx)?;
        state.accounts = accounts;
        state.landed.insert(signature);
        notify(&mut state, &touched);

        Ok(signature)
    }

    async fn confirm_transaction(
        &self,
        signature: &Signature,
        checkpoint: &LatestBlockhash,
    ) -> Result<(), RpcError> {
        let state = self.enter("confirmTransaction")?;
        if state.landed.contains(signature) {
            Ok(())
        } else if state.block_height > checkpoint.last_valid_block_height {
            Err(RpcError::BlockHeightExceeded(*signature))
        } else {
            Err(RpcError::TransactionFailed(format!("{signature} never landed")))
        }
    }

    async fn get_minimum_balance_for_rent_exemption(&self, data_len: usize) -> Result<u64, RpcError> {
        let _state = self.enter("getMinimumBalanceForRentExemption")?;
        Ok(rent_exempt_minimum(data_len))
    }

    async fn get_account_data(&self, pubkey: &Pubkey) -> Result<Option<Vec<u8>>, RpcError> {
        let state = self.enter("getAccountInfo")?;
        Ok(state.accounts.get(pubkey).map(|a| a.data.clone()))
    }

    async fn subscribe_account(&self, pubkey: &Pubkey) -> Result<AccountSubscription, RpcError> {
        let mut state = self.enter("accountSubscribe")?;
        let id = state.next_subscription;
        state.next_subscription += 1;
        let (tx, rx) = mpsc::unbounded_channel();
        state.subscribers.insert(id, (*pubkey, tx));
        Ok(AccountSubscription { id, updates: rx })
    }

    async fn unsubscribe_account(&self, id: SubscriptionId) -> Result<(), RpcError> {
        let mut state = self.enter("accountUnsubscribe")?;
        state
            .subscribers
            .remove(&id)
            .map(|_| ())
            .ok_or(RpcError::UnknownSubscription(id))
    }
}

pub fn rent_exempt_minimum(data_len: usize) -> u64 {
    (ACCOUNT_STORAGE_OVERHEAD + data_len as u64) * RENT_LAMPORTS_PER_BYTE
}

fn credit(accounts: &mut HashMap<Pubkey, LedgerAccount>, pubkey: &Pubkey, lamports: u64) {
    let account = accounts.entry(*pubkey).or_insert_with(|| LedgerAccount {
        lamports: 0,
        owner: system::ID,
        data: Vec::new(),
    });
    account.lamports = account.lamports.saturating_add(lamports);
}

fn notify(state: &mut LedgerState, touched: &[Pubkey]) {
    let LedgerState {
        accounts,
        subscribers,
        ..
    } = state;
    subscribers.retain(|_, (watched, tx)| {
        let watched = *watched;
        if !touched.contains(&watched) {
            return !tx.is_closed();
        }
        let lamports = accounts.get(&watched).map_or(0, |a| a.lamports);
        tx.send(AccountNotification { lamports }).is_ok()
    });
}

fn verify_transaction(state: &LedgerState, tx: &Transaction) -> Result<Signature, RpcError> {
    if !state
        .recent_blockhashes
        .get(&tx.message.recent_blockhash)
        .is_some_and(|issued| state.block_height <= issued + BLOCKHASH_VALIDITY)
    {
        return Err(RpcError::TransactionFailed("Blockhash not found".into()));
    }

    let message = tx.message.serialize();
    let signers = tx.message.signer_keys();
    if signers.len() != tx.signatures.len() {
        return Err(RpcError::TransactionFailed("signature count mismatch".into()));
    }
    for (signer, slot) in signers.iter().zip(&tx.signatures) {
        let valid = slot.is_some_and(|sig| sig.verify(signer, &message));
        if !valid {
            return Err(RpcError::TransactionFailed(format!(
                "missing or invalid signature for {signer}"
            )));
        }
    }

    tx.signature()
        .ok_or_else(|| RpcError::TransactionFailed("transaction has no signatures".into()))
}

/// Apply every instruction in order; returns the touched accounts.
fn execute(
    accounts: &mut HashMap<Pubkey, LedgerAccount>,
    tx: &Transaction,
) -> Result<Vec<Pubkey>, RpcError> {
    let msg = &tx.message;
    let mut touched = Vec::new();

    for (i, ix) in msg.instructions.iter().enumerate() {
        let fail = |reason: String| RpcError::TransactionFailed(format!("instruction {i}: {reason}"));
        let program = msg
            .program_id(i)
            .ok_or_else(|| fail("program index out of range".into()))?;
        let keys = ix
            .account_indices
            .iter()
            .map(|&idx| {
                msg.account_keys
                    .get(usize::from(idx))
                    .copied()
                    .ok_or_else(|| fail("account index out of range".into()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let key = |n: usize| {
            keys.get(n)
                .copied()
                .ok_or_else(|| fail(format!("missing account {n}")))
        };

        if *program == system::ID {
            execute_system(accounts, &ix.data, key(0)?, key(1)?).map_err(fail)?;
            touched.extend([key(0)?, key(1)?]);
        } else if *program == spl_token::ID {
            execute_token(accounts, &ix.data, &keys).map_err(fail)?;
            touched.extend(keys.iter().copied());
        } else if *program == associated_token::ID {
            let (payer, ata, owner, mint) = (key(0)?, key(1)?, key(2)?, key(3)?);
            create_ata(accounts, &payer, &ata, &owner, &mint).map_err(fail)?;
            touched.extend([payer, ata]);
        } else {
            return Err(fail(format!("unsupported program {program}")));
        }
    }

    touched.sort();
    touched.dedup();
    Ok(touched)
}

fn debit(
    accounts: &mut HashMap<Pubkey, LedgerAccount>,
    from: &Pubkey,
    lamports: u64,
) -> Result<(), String> {
    let account = accounts
        .get_mut(from)
        .ok_or_else(|| format!("{from} has no funds"))?;
    account.lamports = account
        .lamports
        .checked_sub(lamports)
        .ok_or_else(|| format!("insufficient funds in {from}"))?;
    Ok(())
}

fn execute_system(
    accounts: &mut HashMap<Pubkey, LedgerAccount>,
    data: &[u8],
    from: Pubkey,
    to: Pubkey,
) -> Result<(), String> {
    let index = data
        .get(..4)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or("system instruction too short")?;
    let read_u64 = |at: usize| -> Result<u64, String> {
        data.get(at..at + 8)
            .and_then(|b| b.try_into().ok())
            .map(u64::from_le_bytes)
            .ok_or_else(|| "system instruction truncated".to_string())
    };

    match index {
        0 => {
            let lamports = read_u64(4)?;
            let space = read_u64(12)?;
            let owner: [u8; 32] = data
                .get(20..52)
                .and_then(|b| b.try_into().ok())
                .ok_or("create_account owner truncated")?;
            if accounts.get(&to).is_some_and(|a| a.lamports > 0 || !a.data.is_empty()) {
                return Err(format!("account {to} already in use"));
            }
            debit(accounts, &from, lamports)?;
            accounts.insert(
                to,
                LedgerAccount {
                    lamports,
                    owner: Pubkey::from(owner),
                    data: vec![0u8; space as usize],
                },
            );
            Ok(())
        }
        2 => {
            let lamports = read_u64(4)?;
            debit(accounts, &from, lamports)?;
            credit(accounts, &to, lamports);
            Ok(())
        }
        other => Err(format!("unsupported system instruction {other}")),
    }
}

fn execute_token(
    accounts: &mut HashMap<Pubkey, LedgerAccount>,
    data: &[u8],
    keys: &[Pubkey],
) -> Result<(), String> {
    match data.first() {
        Some(0) => {
            let mint = keys.first().ok_or("initialize_mint needs a mint")?;
            let decimals = *data.get(1).ok_or("decimals missing")?;
            let authority = data.get(2..34).ok_or("mint authority missing")?;
            let account = accounts
                .get_mut(mint)
                .filter(|a| a.owner == spl_token::ID && a.data.len() == spl_token::MINT_SIZE)
                .ok_or_else(|| format!("{mint} is not an allocated mint account"))?;
            if account.data[MINT_INITIALIZED_OFFSET] != 0 {
                return Err(format!("mint {mint} already initialized"));
            }
            account.data[..4].copy_from_slice(&1u32.to_le_bytes());
            account.data[4..36].copy_from_slice(authority);
            account.data[MINT_DECIMALS_OFFSET] = decimals;
            account.data[MINT_INITIALIZED_OFFSET] = 1;
            if let (Some(1), Some(freeze)) = (data.get(34), data.get(35..67)) {
                account.data[46..50].copy_from_slice(&1u32.to_le_bytes());
                account.data[50..82].copy_from_slice(freeze);
            }
            Ok(())
        }
        Some(7) => {
            let amount = data
                .get(1..9)
                .and_then(|b| b.try_into().ok())
                .map(u64::from_le_bytes)
                .ok_or("mint_to amount missing")?;
            let [mint, dest, authority] = keys else {
                return Err("mint_to needs three accounts".into());
            };

            let mint_account = accounts
                .get_mut(mint)
                .filter(|a| a.owner == spl_token::ID && a.data.len() == spl_token::MINT_SIZE)
                .ok_or_else(|| format!("{mint} is not a mint"))?;
            if mint_account.data[MINT_INITIALIZED_OFFSET] != 1 {
                return Err(format!("mint {mint} not initialized"));
            }
            if &mint_account.data[4..36] != authority.as_bytes() {
                return Err(format!("{authority} is not the mint authority"));
            }
            let supply_range = MINT_SUPPLY_OFFSET..MINT_SUPPLY_OFFSET + 8;
            let supply = mint_account.data[supply_range.clone()]
                .try_into()
                .map(u64::from_le_bytes)
                .map_err(|_| "bad supply")?;
            let supply = supply.checked_add(amount).ok_or("supply overflow")?;
            mint_account.data[supply_range].copy_from_slice(&supply.to_le_bytes());

            let dest_account = accounts
                .get_mut(dest)
                .filter(|a| a.owner == spl_token::ID && a.data.len() == spl_token::ACCOUNT_SIZE)
                .ok_or_else(|| format!("{dest} is not a token account"))?;
            if &dest_account.data[..32] != mint.as_bytes() {
                return Err(format!("{dest} holds a different mint"));
            }
            let balance = spl_token::token_account_amount(&dest_account.data)
                .map_err(|e| e.to_string())?
                .checked_add(amount)
                .ok_or("balance overflow")?;
            dest_account.data[64..72].copy_from_slice(&balance.to_le_bytes());
            Ok(())
        }
        Some(other) => Err(format!("unsupported token instruction {other}")),
        None => Err("empty token instruction".into()),
    }
}

fn create_ata(
    accounts: &mut HashMap<Pubkey, LedgerAccount>,
    payer: &Pubkey,
    ata: &Pubkey,
    owner: &Pubkey,
    mint: &Pubkey,
) -> Result<(), String> {
    let expected = associated_token::get_associated_token_address(owner, mint)
        .map_err(|e| e.to_string())?;
    if expected != *ata {
        return Err(format!("{ata} is not the associated account of {owner}"));
    }
    if accounts.contains_key(ata) {
        return Err(format!("associated account {ata} already exists"));
    }
    if !accounts
        .get(mint)
        .is_some_and(|a| a.owner == spl_token::ID && a.data.get(MINT_INITIALIZED_OFFSET) == Some(&1))
    {
        return Err(format!("{mint} is not an initialized mint"));
    }

    let lamports = rent_exempt_minimum(spl_token::ACCOUNT_SIZE);
    debit(accounts, payer, lamports)?;

    let mut data = vec![0u8; spl_token::ACCOUNT_SIZE];
    data[..32].copy_from_slice(mint.as_bytes());
    data[32..64].copy_from_slice(owner.as_bytes());
    data[TOKEN_ACCOUNT_STATE_OFFSET] = 1;
    accounts.insert(
        *ata,
        LedgerAccount {
            lamports,
            owner: spl_token::ID,
            data,
        },
    );
    Ok(())
}

/// Deterministic, distinct blockhash per block height.
fn next_blockhash(height: u64) -> Hash {
    let mut hash = [0u8; 32];
    hash[..8].copy_from_slice(&height.to_le_bytes());
    hash[8..16].copy_from_slice(&(!height).to_le_bytes());
    hash
}
