//! Starter wallet dashboard for Solana.
//!
//! Connect a wallet, watch its SOL balance, request test funds, send SOL,
//! create and mint an SPL token, and sign messages. Chain access goes
//! through [`rpc::RpcClient`]; signing goes through
//! [`wallet::WalletAdapter`]; the mint list persists in a
//! [`storage::KeyValueStore`].

pub mod components;
pub mod config;
pub mod context;
pub mod dashboard;
pub mod display;
pub mod error;
pub mod explorer;
pub mod rpc;
pub mod storage;
pub mod toast;
pub mod wallet;

pub use config::{Cluster, Commitment, NetworkConfig};
pub use context::AppContext;
pub use dashboard::Dashboard;
pub use error::AppError;
pub use rpc::RpcClient;
pub use toast::{Toast, ToastKind, Toaster};
pub use wallet::{LocalWallet, WalletAdapter, WalletSession};
