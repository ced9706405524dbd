//! SPL Token program: mint initialization, minting and token-account
//! decoding.
//!
//! Token instructions start with a single-byte tag. Only the subset needed
//! to create a fungible mint and fund its first holder is implemented.

use crate::error::SolError;
use crate::pubkey::Pubkey;
use crate::transaction::{AccountMeta, Instruction};

/// SPL Token Program ID: `TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA`
pub const ID: Pubkey = Pubkey::new_from_array([
    0x06, 0xdd, 0xf6, 0xe1, 0xd7, 0x65, 0xa1, 0x93, 0xd9, 0xcb, 0xe1, 0x46, 0xce, 0xeb, 0x79,
    0xac, 0x1c, 0xb4, 0x85, 0xed, 0x5f, 0x5b, 0x37, 0x91, 0x3a, 0x8c, 0xf5, 0x85, 0x7e, 0xff,
    0x00, 0xa9,
]);

/// Rent sysvar: `SysvarRent111111111111111111111111111111111`
pub const SYSVAR_RENT_ID: Pubkey = Pubkey::new_from_array([
    0x06, 0xa7, 0xd5, 0x17, 0x19, 0x2c, 0x5c, 0x51, 0x21, 0x8c, 0xc9, 0x4c, 0x3d, 0x4a, 0xf1,
    0x7f, 0x58, 0xda, 0xee, 0x08, 0x9b, 0xa1, 0xfd, 0x44, 0xe3, 0xdb, 0xd9, 0x8a, 0x00, 0x00,
    0x00, 0x00,
]);

/// Size of a packed `Mint` account.
pub const MINT_SIZE: usize = 82;

/// Size of a packed token `Account`.
pub const ACCOUNT_SIZE: usize = 165;

const INITIALIZE_MINT_TAG: u8 = 0;
const MINT_TO_TAG: u8 = 7;

/// Byte offset of the u64 `amount` field inside a token account
/// (after the 32-byte mint and 32-byte owner).
const ACCOUNT_AMOUNT_OFFSET: usize = 64;

/// `InitializeMint`: set decimals, the mint authority and an optional
/// freeze authority on a freshly allocated mint account.
///
/// Data: tag(0) | decimals u8 | mint_authority 32 | COption<freeze> (1 or 33).
pub fn initialize_mint(
    mint: &Pubkey,
    mint_authority: &Pubkey,
    freeze_authority: Option<&Pubkey>,
    decimals: u8,
) -> Instruction {
    let mut data = Vec::with_capacity(67);
    data.push(INITIALIZE_MINT_TAG);
    data.push(decimals);
    data.extend_from_slice(mint_authority.as_bytes());
    match freeze_authority {
        Some(freeze) => {
            data.push(1);
            data.extend_from_slice(freeze.as_bytes());
        }
        None => data.push(0),
    }

    Instruction {
        program_id: ID,
        accounts: vec![
            AccountMeta::new(*mint, false),
            AccountMeta::new_readonly(SYSVAR_RENT_ID, false),
        ],
        data,
    }
}

/// `MintTo`: mint `amount` base units into `destination`, signed by the
/// mint authority.
pub fn mint_to(
    mint: &Pubkey,
    destination: &Pubkey,
    authority: &Pubkey,
    amount: u64,
) -> Result<Instruction, SolError> {
    if amount == 0 {
        return Err(SolError::TransactionBuildError(
            "mint amount must be > 0".into(),
        ));
    }

    let mut data = Vec::with_capacity(9);
    data.push(MINT_TO_TAG);
    data.extend_from_slice(&amount.to_le_bytes());

    Ok(Instruction {
        program_id: ID,
        accounts: vec![
            AccountMeta::new(*mint, false),
            AccountMeta::new(*destination, false),
            AccountMeta::new_readonly(*authority, true),
        ],
        data,
    })
}

/// Read the raw token amount out of packed token-account data.
pub fn token_account_amount(data: &[u8]) -> Result<u64, SolError> {
    if data.len() < ACCOUNT_SIZE {
        return Err(SolError::InvalidAccountData(format!(
            "token account must be {ACCOUNT_SIZE} bytes, got {}",
            data.len()
        )));
    }
    let raw: [u8; 8] = data[ACCOUNT_AMOUNT_OFFSET..ACCOUNT_AMOUNT_OFFSET + 8]
        .try_into()
        .map_err(|_| SolError::InvalidAccountData("amount field truncated".into()))?;
    Ok(u64::from_le_bytes(raw))
}
