//! System Program instructions.
//!
//! System instructions carry a u32 LE discriminant followed by their
//! fixed-width arguments.

use crate::pubkey::Pubkey;
use crate::transaction::{AccountMeta, Instruction};

/// The System Program: 32 zero bytes, `11111111111111111111111111111111`.
pub const ID: Pubkey = Pubkey::new_from_array([0u8; 32]);

const CREATE_ACCOUNT_IX_INDEX: u32 = 0;
const TRANSFER_IX_INDEX: u32 = 2;

/// Allocate `space` bytes for `new_account`, fund it with `lamports` from
/// `from` and assign it to `owner`. Both `from` and `new_account` sign.
pub fn create_account(
    from: &Pubkey,
    new_account: &Pubkey,
    lamports: u64,
    space: u64,
    owner: &Pubkey,
) -> Instruction {
    // u32 index + u64 lamports + u64 space + 32-byte owner = 52 bytes.
    let mut data = Vec::with_capacity(52);
    data.extend_from_slice(&CREATE_ACCOUNT_IX_INDEX.to_le_bytes());
    data.extend_from_slice(&lamports.to_le_bytes());
    data.extend_from_slice(&space.to_le_bytes());
    data.extend_from_slice(owner.as_bytes());

    Instruction {
        program_id: ID,
        accounts: vec![
            AccountMeta::new(*from, true),
            AccountMeta::new(*new_account, true),
        ],
        data,
    }
}

/// Move `lamports` from `from` to `to`.
pub fn transfer(from: &Pubkey, to: &Pubkey, lamports: u64) -> Instruction {
    let mut data = Vec::with_capacity(12);
    data.extend_from_slice(&TRANSFER_IX_INDEX.to_le_bytes());
    data.extend_from_slice(&lamports.to_le_bytes());

    Instruction {
        program_id: ID,
        accounts: vec![AccountMeta::new(*from, true), AccountMeta::new(*to, false)],
        data,
    }
}

/// Lamports carried by a System `Transfer` instruction, if `ix` is one.
pub fn decode_transfer_lamports(ix: &Instruction) -> Option<u64> {
    if ix.program_id != ID || ix.data.len() != 12 {
        return None;
    }
    let index = u32::from_le_bytes(ix.data[..4].try_into().ok()?);
    if index != TRANSFER_IX_INDEX {
        return None;
    }
    Some(u64::from_le_bytes(ix.data[4..].try_into().ok()?))
}
