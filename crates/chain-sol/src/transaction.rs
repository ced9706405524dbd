//! Legacy Solana transaction messages, signature slots and wire format.
//!
//! On the wire a transaction is a compact-u16 signature count, the 64-byte
//! signatures, then the message: a three-byte header (required signers,
//! read-only signers, read-only non-signers), the account key table, the
//! 32-byte recent blockhash and the compiled instructions. Each compiled
//! instruction is a program index followed by its account indices and data,
//! both prefixed with a compact-u16 length.
//!
//! A transaction is compiled once against a fee payer and a recent
//! blockhash. Signers fill their own slots independently, so a freshly
//! generated account can co-sign before the wallet adds the fee payer's
//! signature.

use crate::error::SolError;
use crate::keypair::Keypair;
use crate::pubkey::{Pubkey, Signature};

/// Recent blockhash a message is anchored to.
pub type Hash = [u8; 32];

/// Append `value` to `buf` in Solana's compact-u16 form: seven bits per
/// byte, low bits first, high bit set while more bytes follow.
pub fn write_compact_u16(buf: &mut Vec<u8>, value: u16) {
    let mut rest = value;
    while rest >= 0x80 {
        buf.push((rest as u8 & 0x7f) | 0x80);
        rest >>= 7;
    }
    buf.push(rest as u8);
}

/// A single account reference in an instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountMeta {
    pub pubkey: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountMeta {
    pub fn new(pubkey: Pubkey, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: true,
        }
    }

    pub fn new_readonly(pubkey: Pubkey, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: false,
        }
    }
}

/// An instruction before it is compiled into a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub program_id: Pubkey,
    pub accounts: Vec<AccountMeta>,
    pub data: Vec<u8>,
}

/// An instruction whose accounts are indices into `Message::account_keys`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstruction {
    pub program_id_index: u8,
    pub account_indices: Vec<u8>,
    pub data: Vec<u8>,
}

/// A compiled legacy message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Canonical order: writable signers (fee payer first), read-only
    /// signers, writable non-signers, read-only non-signers.
    pub account_keys: Vec<Pubkey>,
    pub num_required_signatures: u8,
    pub num_readonly_signed: u8,
    pub num_readonly_unsigned: u8,
    pub recent_blockhash: Hash,
    pub instructions: Vec<CompiledInstruction>,
}

impl Message {
    /// Compile `instructions` with `fee_payer` at account index 0.
    pub fn compile(
        instructions: &[Instruction],
        fee_payer: &Pubkey,
        recent_blockhash: &Hash,
    ) -> Result<Self, SolError> {
        if instructions.is_empty() {
            return Err(SolError::TransactionBuildError(
                "transaction has no instructions".into(),
            ));
        }

        struct Entry {
            pubkey: Pubkey,
            is_signer: bool,
            is_writable: bool,
        }

        let mut entries: Vec<Entry> = Vec::new();
        let mut upsert = |pubkey: Pubkey, signer: bool, writable: bool| {
            if let Some(entry) = entries.iter_mut().find(|e| e.pubkey == pubkey) {
                entry.is_signer |= signer;
                entry.is_writable |= writable;
            } else {
                entries.push(Entry {
                    pubkey,
                    is_signer: signer,
                    is_writable: writable,
                });
            }
        };

        upsert(*fee_payer, true, true);
        for ix in instructions {
            for meta in &ix.accounts {
                upsert(meta.pubkey, meta.is_signer, meta.is_writable);
            }
            upsert(ix.program_id, false, false);
        }

        // Stable sort keeps insertion order inside each class, and the fee
        // payer was inserted first as a writable signer.
        entries.sort_by_key(|e| match (e.is_signer, e.is_writable) {
            (true, true) => 0u8,
            (true, false) => 1,
            (false, true) => 2,
            (false, false) => 3,
        });

        if entries.len() > usize::from(u8::MAX) {
            return Err(SolError::TransactionBuildError(format!(
                "too many accounts: {}",
                entries.len()
            )));
        }

        let count = |f: fn(&Entry) -> bool| entries.iter().filter(|e| f(e)).count() as u8;
        let num_required_signatures = count(|e| e.is_signer);
        let num_readonly_signed = count(|e| e.is_signer && !e.is_writable);
        let num_readonly_unsigned = count(|e| !e.is_signer && !e.is_writable);

        let account_keys: Vec<Pubkey> = entries.iter().map(|e| e.pubkey).collect();
        let index_of = |key: &Pubkey| -> Result<u8, SolError> {
            account_keys
                .iter()
                .position(|k| k == key)
                .map(|i| i as u8)
                .ok_or_else(|| {
                    SolError::TransactionBuildError(format!("{key} not in account keys"))
                })
        };

        let mut compiled = Vec::with_capacity(instructions.len());
        for ix in instructions {
            let account_indices = ix
                .accounts
                .iter()
                .map(|meta| index_of(&meta.pubkey))
                .collect::<Result<Vec<_>, _>>()?;
            compiled.push(CompiledInstruction {
                program_id_index: index_of(&ix.program_id)?,
                account_indices,
                data: ix.data.clone(),
            });
        }

        Ok(Self {
            account_keys,
            num_required_signatures,
            num_readonly_signed,
            num_readonly_unsigned,
            recent_blockhash: *recent_blockhash,
            instructions: compiled,
        })
    }

    pub fn fee_payer(&self) -> Option<&Pubkey> {
        self.account_keys.first()
    }

    /// The accounts that must sign, in signature-slot order.
    pub fn signer_keys(&self) -> &[Pubkey] {
        let n = usize::from(self.num_required_signatures).min(self.account_keys.len());
        &self.account_keys[..n]
    }

    /// Program invoked by the instruction at `index`.
    pub fn program_id(&self, index: usize) -> Option<&Pubkey> {
        let ix = self.instructions.get(index)?;
        self.account_keys.get(usize::from(ix.program_id_index))
    }

    /// Serialize the message (the bytes every signer signs).
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(256);

        buf.push(self.num_required_signatures);
        buf.push(self.num_readonly_signed);
        buf.push(self.num_readonly_unsigned);

        write_compact_u16(&mut buf, self.account_keys.len() as u16);
        for key in &self.account_keys {
            buf.extend_from_slice(key.as_bytes());
        }

        buf.extend_from_slice(&self.recent_blockhash);

        write_compact_u16(&mut buf, self.instructions.len() as u16);
        for ix in &self.instructions {
            buf.push(ix.program_id_index);
            write_compact_u16(&mut buf, ix.account_indices.len() as u16);
            buf.extend_from_slice(&ix.account_indices);
            write_compact_u16(&mut buf, ix.data.len() as u16);
            buf.extend_from_slice(&ix.data);
        }

        buf
    }
}

/// A compiled message plus one signature slot per required signer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub message: Message,
    /// `None` until the matching signer has signed.
    pub signatures: Vec<Option<Signature>>,
}

impl Transaction {
    pub fn new_unsigned(message: Message) -> Self {
        let slots = usize::from(message.num_required_signatures);
        Self {
            message,
            signatures: vec![None; slots],
        }
    }

    /// Compile and wrap in one step.
    pub fn new_with_payer(
        instructions: &[Instruction],
        fee_payer: &Pubkey,
        recent_blockhash: &Hash,
    ) -> Result<Self, SolError> {
        Ok(Self::new_unsigned(Message::compile(
            instructions,
            fee_payer,
            recent_blockhash,
        )?))
    }

    /// Fill the slot belonging to `keypair`. Other slots are untouched.
    pub fn partial_sign(&mut self, keypair: &Keypair) -> Result<(), SolError> {
        let signature = keypair.sign_message(&self.message.serialize());
        self.add_signature(&keypair.pubkey(), signature)
    }

    /// Place an externally produced signature in `signer`'s slot.
    pub fn add_signature(&mut self, signer: &Pubkey, signature: Signature) -> Result<(), SolError> {
        let slot = self
            .message
            .signer_keys()
            .iter()
            .position(|k| k == signer)
            .ok_or_else(|| {
                SolError::SigningError(format!("{signer} not found in transaction signers"))
            })?;
        self.signatures[slot] = Some(signature);
        Ok(())
    }

    pub fn is_signed_by(&self, signer: &Pubkey) -> bool {
        self.message
            .signer_keys()
            .iter()
            .position(|k| k == signer)
            .and_then(|slot| self.signatures.get(slot).copied().flatten())
            .is_some()
    }

    pub fn is_fully_signed(&self) -> bool {
        self.signatures.iter().all(Option::is_some)
    }

    /// The first signature identifies the transaction on chain.
    pub fn signature(&self) -> Option<Signature> {
        self.signatures.first().copied().flatten()
    }

    /// Wire bytes ready for `sendTransaction`. Every slot must be filled.
    pub fn serialize(&self) -> Result<Vec<u8>, SolError> {
        let message = self.message.serialize();
        let mut wire = Vec::with_capacity(3 + 64 * self.signatures.len() + message.len());

        write_compact_u16(&mut wire, self.signatures.len() as u16);
        for (slot, signature) in self.signatures.iter().enumerate() {
            let signature = signature.ok_or_else(|| {
                SolError::SigningError(format!("signature slot {slot} is empty"))
            })?;
            wire.extend_from_slice(&signature.to_bytes());
        }
        wire.extend_from_slice(&message);

        Ok(wire)
    }
}
