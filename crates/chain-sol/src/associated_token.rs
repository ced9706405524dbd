//! Associated token accounts: derivation and creation.
//!
//! The associated token account (ATA) of an owner for a mint is the program
//! derived address with seeds `[owner, token_program_id, mint]` under the
//! Associated Token Account program.

use sha2::{Digest, Sha256};

use crate::error::SolError;
use crate::pubkey::Pubkey;
use crate::spl_token;
use crate::system;
use crate::transaction::{AccountMeta, Instruction};

/// Associated Token Account Program ID: `ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL`
pub const ID: Pubkey = Pubkey::new_from_array([
    0x8c, 0x97, 0x25, 0x8f, 0x4e, 0x24, 0x89, 0xf1, 0xbb, 0x3d, 0x10, 0x29, 0x14, 0x8e, 0x0d,
    0x83, 0x0b, 0x5a, 0x13, 0x99, 0xda, 0xff, 0x10, 0x84, 0x04, 0x8e, 0x7b, 0xd8, 0xdb, 0xe9,
    0xf8, 0x59,
]);

const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

/// Derive the associated token account for `owner` and `mint`.
pub fn get_associated_token_address(owner: &Pubkey, mint: &Pubkey) -> Result<Pubkey, SolError> {
    find_program_address(
        &[owner.as_ref(), spl_token::ID.as_ref(), mint.as_ref()],
        &ID,
    )
    .map(|(address, _bump)| address)
}

/// Create the associated token account for `owner`/`mint`, paid by
/// `payer`. Instruction data is empty (the non-idempotent `Create`).
pub fn create_associated_token_account(
    payer: &Pubkey,
    associated_account: &Pubkey,
    owner: &Pubkey,
    mint: &Pubkey,
) -> Instruction {
    Instruction {
        program_id: ID,
        accounts: vec![
            AccountMeta::new(*payer, true),
            AccountMeta::new(*associated_account, false),
            AccountMeta::new_readonly(*owner, false),
            AccountMeta::new_readonly(*mint, false),
            AccountMeta::new_readonly(system::ID, false),
            AccountMeta::new_readonly(spl_token::ID, false),
        ],
        data: Vec::new(),
    }
}

/// Search bump seeds from 255 down for the first off-curve
/// `SHA-256(seeds || bump || program_id || "ProgramDerivedAddress")`.
pub fn find_program_address(
    seeds: &[&[u8]],
    program_id: &Pubkey,
) -> Result<(Pubkey, u8), SolError> {
    for bump in (0u8..=255).rev() {
        if let Some(address) = create_program_address(seeds, bump, program_id) {
            return Ok((address, bump));
        }
    }

    Err(SolError::InvalidAddress(
        "could not find valid PDA bump seed".into(),
    ))
}

fn create_program_address(seeds: &[&[u8]], bump: u8, program_id: &Pubkey) -> Option<Pubkey> {
    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed);
    }
    hasher.update([bump]);
    hasher.update(program_id.as_bytes());
    hasher.update(PDA_MARKER);

    let candidate = Pubkey::new_from_array(hasher.finalize().into());
    (!candidate.is_on_curve()).then_some(candidate)
}
