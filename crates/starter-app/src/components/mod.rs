//! Headless page components.
//!
//! Each component owns its view state and reports outcomes through the
//! shared [`Toaster`](crate::toast::Toaster). Operations take `&mut self`
//! and are awaited one at a time by the page.

pub mod airdrop;
pub mod balance;
pub mod mint;
pub mod sign_message;
pub mod transfer;

pub use airdrop::AirdropRequester;
pub use balance::{BalanceViewer, RefreshFlag};
pub use mint::MintCreator;
pub use sign_message::MessageSigner;
pub use transfer::TransferForm;
