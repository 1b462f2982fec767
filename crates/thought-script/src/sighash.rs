//! Legacy (pre-witness) signature hash computation.
//!
//! The hash commits to a canonicalized view of the spending transaction.
//! SIGHASH_SINGLE with an input index beyond the last output returns the
//! 32-byte value `0x01 00...00`: the original client never range-checked the
//! index and the resulting "hash" became consensus. It must not be fixed.

use crate::{Error, Result};
use bitcoin::consensus::Encodable;
use bitcoin::hashes::{sha256d, Hash};
use bitcoin::opcodes::all::OP_CODESEPARATOR;
use bitcoin::{Amount, ScriptBuf, Transaction};

/// Hash type bits at the end of a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SigHashType(pub u32);

impl SigHashType {
    /// Sign all inputs and outputs.
    pub const ALL: Self = Self(0x01);
    /// Sign all inputs, no outputs.
    pub const NONE: Self = Self(0x02);
    /// Sign all inputs and the output matching the input index.
    pub const SINGLE: Self = Self(0x03);
    /// Modifier: commit only to the input being signed.
    pub const ANYONE_CAN_PAY: Self = Self(0x80);

    /// Bits of the hash type identifying which outputs are signed.
    const MASK: u32 = 0x1f;

    /// Adds the ANYONECANPAY modifier.
    pub fn with_anyone_can_pay(self) -> Self {
        Self(self.0 | Self::ANYONE_CAN_PAY.0)
    }

    fn base(self) -> u32 {
        self.0 & Self::MASK
    }

    fn anyone_can_pay(self) -> bool {
        self.0 & Self::ANYONE_CAN_PAY.0 != 0
    }
}

/// Computes the legacy signature hash for `input_index` of `tx`.
///
/// `script_code` is the script of the output being spent (or the redeem
/// script for P2SH). Undefined base hash types are treated as SIGHASH_ALL,
/// matching consensus.
pub fn legacy_signature_hash(
    script_code: &[u8],
    hash_type: SigHashType,
    tx: &Transaction,
    input_index: usize,
) -> Result<[u8; 32]> {
    // The out-of-range SIGHASH_SINGLE case short-circuits before anything
    // else, including input validation, exactly as the original client did.
    if hash_type.base() == SigHashType::SINGLE.base() && input_index >= tx.output.len() {
        let mut hash = [0u8; 32];
        hash[0] = 0x01;
        return Ok(hash);
    }

    if input_index >= tx.input.len() {
        return Err(Error::InputIndexOutOfRange(input_index, tx.input.len()));
    }

    let script_code = remove_opcode(script_code, OP_CODESEPARATOR.to_u8())?;

    // Copy of the transaction with every signature script blanked except the
    // one being signed, which carries the script code.
    let mut tx_copy = tx.clone();
    for (i, input) in tx_copy.input.iter_mut().enumerate() {
        input.script_sig = if i == input_index {
            ScriptBuf::from_bytes(script_code.clone())
        } else {
            ScriptBuf::new()
        };
        input.witness = bitcoin::Witness::default();
    }

    match hash_type.base() {
        t if t == SigHashType::NONE.base() => {
            tx_copy.output.clear();
            for (i, input) in tx_copy.input.iter_mut().enumerate() {
                if i != input_index {
                    input.sequence = bitcoin::Sequence::ZERO;
                }
            }
        }
        t if t == SigHashType::SINGLE.base() => {
            tx_copy.output.truncate(input_index + 1);
            for output in tx_copy.output.iter_mut().take(input_index) {
                // The "negative one" placeholder value serializes as all
                // bits set in the unsigned wire encoding.
                output.value = Amount::from_sat(u64::MAX);
                output.script_pubkey = ScriptBuf::new();
            }
            for (i, input) in tx_copy.input.iter_mut().enumerate() {
                if i != input_index {
                    input.sequence = bitcoin::Sequence::ZERO;
                }
            }
        }
        // SIGHASH_ALL and undefined types leave the transaction unchanged.
        _ => {}
    }

    if hash_type.anyone_can_pay() {
        tx_copy.input = vec![tx_copy.input[input_index].clone()];
    }

    // Legacy serialization (all witnesses are empty) followed by the hash
    // type as a little-endian u32, double SHA-256 hashed.
    let mut preimage = Vec::with_capacity(tx_copy.total_size() + 4);
    tx_copy
        .consensus_encode(&mut preimage)
        .expect("writing to a Vec cannot fail; qed");
    preimage.extend(hash_type.0.to_le_bytes());

    Ok(sha256d::Hash::hash(&preimage).to_byte_array())
}

/// Removes every occurrence of `opcode` from a script, preserving pushed
/// data even when it happens to contain the opcode byte.
fn remove_opcode(script: &[u8], opcode: u8) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(script.len());
    let mut i = 0;
    while i < script.len() {
        let start = i;
        let op = script[i];
        i += 1;
        let data_len = match op {
            1..=75 => op as usize,
            0x4c => {
                // OP_PUSHDATA1
                let len = *script.get(i).ok_or(Error::MalformedScript)? as usize;
                i += 1;
                len
            }
            0x4d => {
                // OP_PUSHDATA2
                let bytes: [u8; 2] = script
                    .get(i..i + 2)
                    .ok_or(Error::MalformedScript)?
                    .try_into()
                    .expect("2 bytes by range; qed");
                i += 2;
                u16::from_le_bytes(bytes) as usize
            }
            0x4e => {
                // OP_PUSHDATA4
                let bytes: [u8; 4] = script
                    .get(i..i + 4)
                    .ok_or(Error::MalformedScript)?
                    .try_into()
                    .expect("4 bytes by range; qed");
                i += 4;
                u32::from_le_bytes(bytes) as usize
            }
            _ => 0,
        };

        if script.len() - i < data_len {
            return Err(Error::MalformedScript);
        }
        i += data_len;
        // `opcode` is never a push opcode, so matching bytes inside pushed
        // data are kept.
        if op != opcode {
            out.extend(&script[start..i]);
        }
    }
    Ok(out)
}
