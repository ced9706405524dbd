use chain_sol::{Pubkey, SolError};
use thiserror::Error;

use crate::rpc::RpcError;
use crate::storage::StorageError;
use crate::wallet::WalletError;

/// Everything a component operation can fail with before the failure is
/// turned into a toast.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Wallet not connected")]
    WalletNotConnected,

    #[error("Account not found: {0}")]
    AccountNotFound(Pubkey),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Sol(#[from] SolError),

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
