//! The RPC surface every component talks to.
//!
//! `RpcClient` is the seam between the UI components and a cluster. Two
//! implementations ship with the crate: [`http::HttpRpcClient`] speaks
//! JSON-RPC to a real node, [`ledger::InMemoryLedger`] executes the
//! starter's instructions against an in-process account map.

pub mod http;
pub mod ledger;
#[cfg(test)]
pub(crate) mod test_node;

use async_trait::async_trait;
use chain_sol::{Hash, Pubkey, Signature, Transaction};
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("HTTP request failed: {0}")]
    Transport(String),

    #[error("RPC error {code}: {message}")]
    Server { code: i64, message: String },

    #[error("failed to parse RPC response: {0}")]
    Parse(String),

    #[error("transaction failed: {0}")]
    TransactionFailed(String),

    #[error("transaction {0} expired: block height exceeded")]
    BlockHeightExceeded(Signature),

    #[error("unknown subscription: {0}")]
    UnknownSubscription(SubscriptionId),
}

/// A recent blockhash and the last block height at which a transaction
/// referencing it can still land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatestBlockhash {
    pub blockhash: Hash,
    pub last_valid_block_height: u64,
}

pub type SubscriptionId = u64;

/// Pushed whenever a watched account changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountNotification {
    pub lamports: u64,
}

/// A live account-change feed.
///
/// Dropping the subscription closes the feed and stops the producer on its
/// next wake-up; [`RpcClient::unsubscribe_account`] stops it immediately.
#[derive(Debug)]
pub struct AccountSubscription {
    pub id: SubscriptionId,
    pub updates: mpsc::UnboundedReceiver<AccountNotification>,
}

#[async_trait]
pub trait RpcClient: Send + Sync {
    /// Lamport balance of `pubkey` (0 for a missing account).
    async fn get_balance(&self, pubkey: &Pubkey) -> Result<u64, RpcError>;

    async fn request_airdrop(&self, pubkey: &Pubkey, lamports: u64)
        -> Result<Signature, RpcError>;

    async fn get_latest_blockhash(&self) -> Result<LatestBlockhash, RpcError>;

    /// Submit a fully signed transaction.
    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, RpcError>;

    /// Wait until `signature` reaches the client's commitment level, or fail
    /// once the chain passes `checkpoint.last_valid_block_height`.
    async fn confirm_transaction(
        &self,
        signature: &Signature,
        checkpoint: &LatestBlockhash,
    ) -> Result<(), RpcError>;

    async fn get_minimum_balance_for_rent_exemption(&self, data_len: usize)
        -> Result<u64, RpcError>;

    /// Raw account data, `None` when the account does not exist.
    async fn get_account_data(&self, pubkey: &Pubkey) -> Result<Option<Vec<u8>>, RpcError>;

    async fn subscribe_account(&self, pubkey: &Pubkey) -> Result<AccountSubscription, RpcError>;

    async fn unsubscribe_account(&self, id: SubscriptionId) -> Result<(), RpcError>;
}
