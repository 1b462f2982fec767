//! Base58Check addresses and standard script builders.
//!
//! Thought uses Base58Check with chain-specific version bytes; there is no
//! bech32 encoding on this chain.

use crate::constants::COMPRESSED_PUBKEY_SIZE;
use crate::solver::{self, ScriptClass};
use crate::{Error, Result};
use bitcoin::base58;
use bitcoin::hashes::{hash160, Hash};
use bitcoin::opcodes::all::{OP_CHECKSIG, OP_DUP, OP_EQUAL, OP_EQUALVERIFY, OP_HASH160};
use bitcoin::script::Instruction;
use bitcoin::Script;
use thought_primitives::Params;

// Signature script length bounds for a P2PKH spend: a 1-byte push opcode, a
// DER signature (8..=72 bytes) with its 1-byte hash type, then a 1-byte push
// opcode and the 33-byte compressed key.
const MIN_PUBKEY_HASH_SIG_SCRIPT_LEN: usize = 1 + 8 + 1 + 1 + COMPRESSED_PUBKEY_SIZE;
const MAX_PUBKEY_HASH_SIG_SCRIPT_LEN: usize = 1 + 72 + 1 + 1 + COMPRESSED_PUBKEY_SIZE;

/// Encodes a pay-to-pubkey-hash address for the network.
pub fn pubkey_hash_address(hash: &[u8; 20], params: &Params) -> String {
    encode_with_version(params.pubkey_hash_addr_id, hash)
}

/// Encodes a pay-to-script-hash address for the network.
pub fn script_hash_address(hash: &[u8; 20], params: &Params) -> String {
    encode_with_version(params.script_hash_addr_id, hash)
}

/// Derives the P2PKH address of a compressed secp256k1 public key.
pub fn pubkey_address(pubkey: &[u8], params: &Params) -> Result<String> {
    if pubkey.len() != COMPRESSED_PUBKEY_SIZE || !matches!(pubkey[0], 0x02 | 0x03) {
        return Err(Error::InvalidPublicKey);
    }
    let hash = hash160::Hash::hash(pubkey).to_byte_array();
    Ok(pubkey_hash_address(&hash, params))
}

fn encode_with_version(version: u8, hash: &[u8; 20]) -> String {
    let mut payload = [0u8; 21];
    payload[0] = version;
    payload[1..].copy_from_slice(hash);
    base58::encode_check(&payload)
}

/// The account identifier owning an output script.
///
/// Standard single-address classes map to their address. Everything else,
/// including bare multisig and unrecognized scripts, is tracked under the
/// raw script hex so the balance invariant still holds for those coins.
pub fn owner_account(script: &[u8], params: &Params) -> String {
    match solver::classify(script) {
        ScriptClass::PubKeyHash { hash } => pubkey_hash_address(&hash, params),
        ScriptClass::ScriptHash { hash } => script_hash_address(&hash, params),
        ScriptClass::PubKey { pubkey } => {
            let hash = hash160::Hash::hash(&pubkey).to_byte_array();
            pubkey_hash_address(&hash, params)
        }
        _ => hex::encode(script),
    }
}

/// The addresses associated with a classified script, as the node reports
/// them. Multisig lists one address per strictly encoded key.
pub fn addresses(class: &ScriptClass, params: &Params) -> Vec<String> {
    match class {
        ScriptClass::PubKeyHash { hash } => vec![pubkey_hash_address(hash, params)],
        ScriptClass::ScriptHash { hash } => vec![script_hash_address(hash, params)],
        ScriptClass::PubKey { pubkey } => {
            let hash = hash160::Hash::hash(pubkey).to_byte_array();
            vec![pubkey_hash_address(&hash, params)]
        }
        ScriptClass::Multisig { pubkeys, .. } => pubkeys
            .iter()
            .map(|key| {
                let hash = hash160::Hash::hash(key).to_byte_array();
                pubkey_hash_address(&hash, params)
            })
            .collect(),
        ScriptClass::NonStandard | ScriptClass::NullData => Vec::new(),
    }
}

/// Decodes an address and rebuilds the output script paying to it.
pub fn address_to_script(address: &str, params: &Params) -> Result<Vec<u8>> {
    let payload =
        base58::decode_check(address).map_err(|_| Error::InvalidAddress(address.to_string()))?;
    if payload.len() != 21 {
        return Err(Error::InvalidAddress(address.to_string()));
    }
    let hash: [u8; 20] = payload[1..].try_into().expect("21 bytes by check; qed");

    let version = payload[0];
    if version == params.pubkey_hash_addr_id {
        Ok(pay_to_pubkey_hash_script(&hash))
    } else if version == params.script_hash_addr_id {
        Ok(pay_to_script_hash_script(&hash))
    } else {
        Err(Error::UnknownAddressVersion(version, params.name))
    }
}

/// Builds the standard `OP_DUP OP_HASH160 <hash> OP_EQUALVERIFY OP_CHECKSIG`
/// script.
pub fn pay_to_pubkey_hash_script(hash: &[u8; 20]) -> Vec<u8> {
    let mut script = Vec::with_capacity(25);
    script.extend([OP_DUP.to_u8(), OP_HASH160.to_u8(), 20]);
    script.extend(hash);
    script.extend([OP_EQUALVERIFY.to_u8(), OP_CHECKSIG.to_u8()]);
    script
}

/// Builds the standard `OP_HASH160 <hash> OP_EQUAL` script.
pub fn pay_to_script_hash_script(hash: &[u8; 20]) -> Vec<u8> {
    let mut script = Vec::with_capacity(23);
    script.extend([OP_HASH160.to_u8(), 20]);
    script.extend(hash);
    script.push(OP_EQUAL.to_u8());
    script
}

/// Recovers the signer address from a spending signature script.
///
/// A signature script long enough to be a P2PKH spend whose trailing 33
/// bytes parse as a compressed key yields that key's address; otherwise the
/// final data push is treated as a P2SH redeem script and hashed.
pub fn recover_signer(sig_script: &[u8], params: &Params) -> Option<String> {
    if sig_script.is_empty() || !Script::from_bytes(sig_script).is_push_only() {
        return None;
    }

    if (MIN_PUBKEY_HASH_SIG_SCRIPT_LEN..=MAX_PUBKEY_HASH_SIG_SCRIPT_LEN).contains(&sig_script.len())
    {
        let pubkey = &sig_script[sig_script.len() - COMPRESSED_PUBKEY_SIZE..];
        if matches!(pubkey[0], 0x02 | 0x03) {
            let hash = hash160::Hash::hash(pubkey).to_byte_array();
            return Some(pubkey_hash_address(&hash, params));
        }
    }

    let redeem_script = final_push(sig_script)?;
    let hash = hash160::Hash::hash(redeem_script).to_byte_array();
    Some(script_hash_address(&hash, params))
}

/// The data associated with the final push of a script, if it parses.
fn final_push(script: &[u8]) -> Option<&[u8]> {
    let mut data = None;
    for instruction in Script::from_bytes(script).instructions() {
        match instruction {
            Ok(Instruction::PushBytes(push)) => data = Some(push.as_bytes()),
            Ok(Instruction::Op(_)) => data = None,
            Err(_) => return None,
        }
    }
    data
}
