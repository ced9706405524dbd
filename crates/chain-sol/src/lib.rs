//! Solana primitives for the starter wallet.
//!
//! Addresses, keypairs, the instructions the wallet issues (System transfer
//! and account creation, SPL Token mint setup, associated token accounts),
//! legacy message compilation with per-signer signature slots, and amount
//! conversion. Built directly on `ed25519-dalek`, `curve25519-dalek`, `sha2`
//! and `bs58` rather than on `solana-sdk`.

pub mod amount;
pub mod associated_token;
pub mod error;
pub mod keypair;
pub mod pubkey;
pub mod spl_token;
pub mod system;
pub mod transaction;

pub use amount::{lamports_to_sol, sol_to_lamports, units_to_ui_amount, LAMPORTS_PER_SOL};
pub use associated_token::get_associated_token_address;
pub use error::SolError;
pub use keypair::Keypair;
pub use pubkey::{Pubkey, Signature};
pub use transaction::{AccountMeta, Hash, Instruction, Message, Transaction};
