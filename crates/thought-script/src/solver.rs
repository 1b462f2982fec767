//! Output-script classification.
//!
//! Classification is a byte-pattern template match, never interpretation.
//! The first matching template wins, in the same order the node applies.

use crate::constants::{
    COMPRESSED_PUBKEY_SIZE, MAX_DATA_CARRIER_SIZE, MAX_PUBKEYS_PER_MULTISIG, MAX_SCRIPT_SIZE,
    PUBKEY_HASH_SCRIPT_LEN, SCRIPT_HASH_SCRIPT_LEN, UNCOMPRESSED_PUBKEY_SIZE,
};
use bitcoin::opcodes::all::{
    OP_CHECKMULTISIG, OP_CHECKSIG, OP_DUP, OP_EQUAL, OP_EQUALVERIFY, OP_HASH160, OP_PUSHNUM_1,
    OP_PUSHNUM_16, OP_RETURN,
};
use bitcoin::script::Instruction;
use bitcoin::{Opcode, Script};

/// The standard classes of output script known to the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptClass {
    /// None of the recognized forms.
    NonStandard,
    /// Pay to a bare public key.
    PubKey { pubkey: Vec<u8> },
    /// Pay to a public key hash.
    PubKeyHash { hash: [u8; 20] },
    /// Pay to a script hash.
    ScriptHash { hash: [u8; 20] },
    /// Bare m-of-n multi signature.
    Multisig {
        required_sigs: u8,
        keys_count: u8,
        pubkeys: Vec<Vec<u8>>,
    },
    /// Provably unspendable data carrier.
    NullData,
}

impl ScriptClass {
    /// The script type name as reported by the node.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NonStandard => "nonstandard",
            Self::PubKey { .. } => "pubkey",
            Self::PubKeyHash { .. } => "pubkeyhash",
            Self::ScriptHash { .. } => "scripthash",
            Self::Multisig { .. } => "multisig",
            Self::NullData => "nulldata",
        }
    }

    /// Number of signatures required to spend an output of this class.
    pub fn required_sigs(&self) -> usize {
        match self {
            Self::PubKey { .. } | Self::PubKeyHash { .. } | Self::ScriptHash { .. } => 1,
            Self::Multisig { required_sigs, .. } => *required_sigs as usize,
            Self::NonStandard | Self::NullData => 0,
        }
    }
}

/// Classifies an output script, returning the first matching template.
pub fn classify(script: &[u8]) -> ScriptClass {
    if script.len() > MAX_SCRIPT_SIZE {
        return ScriptClass::NonStandard;
    }

    if let Some(pubkey) = extract_pubkey(script) {
        return ScriptClass::PubKey {
            pubkey: pubkey.to_vec(),
        };
    }

    if let Some(hash) = extract_pubkey_hash(script) {
        return ScriptClass::PubKeyHash { hash };
    }

    if let Some(hash) = extract_script_hash(script) {
        return ScriptClass::ScriptHash { hash };
    }

    if let Some((required_sigs, keys_count, pubkeys)) = match_multisig(script) {
        return ScriptClass::Multisig {
            required_sigs,
            keys_count,
            pubkeys,
        };
    }

    if is_null_data(script) {
        return ScriptClass::NullData;
    }

    ScriptClass::NonStandard
}

/// Extracts the 20-byte hash from a standard pay-to-pubkey-hash script.
///
/// The template is `OP_DUP OP_HASH160 <20-byte hash> OP_EQUALVERIFY OP_CHECKSIG`.
pub(crate) fn extract_pubkey_hash(script: &[u8]) -> Option<[u8; 20]> {
    if script.len() == PUBKEY_HASH_SCRIPT_LEN
        && script[0] == OP_DUP.to_u8()
        && script[1] == OP_HASH160.to_u8()
        && script[2] == 20
        && script[23] == OP_EQUALVERIFY.to_u8()
        && script[24] == OP_CHECKSIG.to_u8()
    {
        return Some(script[3..23].try_into().expect("20 bytes by check; qed"));
    }
    None
}

/// Extracts the 20-byte hash from a standard pay-to-script-hash script.
///
/// The template is `OP_HASH160 <20-byte hash> OP_EQUAL`.
pub(crate) fn extract_script_hash(script: &[u8]) -> Option<[u8; 20]> {
    if script.len() == SCRIPT_HASH_SCRIPT_LEN
        && script[0] == OP_HASH160.to_u8()
        && script[1] == 20
        && script[22] == OP_EQUAL.to_u8()
    {
        return Some(script[2..22].try_into().expect("20 bytes by check; qed"));
    }
    None
}

/// Extracts the key from a pay-to-pubkey script, compressed or uncompressed.
pub(crate) fn extract_pubkey(script: &[u8]) -> Option<&[u8]> {
    // Compressed: OP_DATA_33 <33-byte key with 0x02/0x03 prefix> OP_CHECKSIG
    if script.len() == COMPRESSED_PUBKEY_SIZE + 2
        && script[0] == COMPRESSED_PUBKEY_SIZE as u8
        && script[34] == OP_CHECKSIG.to_u8()
        && (script[1] == 0x02 || script[1] == 0x03)
    {
        return Some(&script[1..34]);
    }

    // Uncompressed or hybrid: OP_DATA_65 <65-byte key> OP_CHECKSIG with an
    // 0x04 (uncompressed) or 0x06/0x07 (hybrid) prefix.
    if script.len() == UNCOMPRESSED_PUBKEY_SIZE + 2
        && script[0] == UNCOMPRESSED_PUBKEY_SIZE as u8
        && script[66] == OP_CHECKSIG.to_u8()
        && matches!(script[1], 0x04 | 0x06 | 0x07)
    {
        return Some(&script[1..66]);
    }

    None
}

/// Whether a public key adheres to the strict encoding requirements.
pub(crate) fn is_strict_pubkey_encoding(pubkey: &[u8]) -> bool {
    match pubkey.len() {
        COMPRESSED_PUBKEY_SIZE => matches!(pubkey[0], 0x02 | 0x03),
        UNCOMPRESSED_PUBKEY_SIZE => matches!(pubkey[0], 0x04 | 0x06 | 0x07),
        _ => false,
    }
}

/// Matches a bare multisig script of the form
/// `<m> <pubkey>... <n> OP_CHECKMULTISIG`.
///
/// All key pushes are counted toward `n`; keys that fail strict encoding are
/// skipped in the returned key list, mirroring the node.
fn match_multisig(script: &[u8]) -> Option<(u8, u8, Vec<Vec<u8>>)> {
    if script.len() < 3 || script[script.len() - 1] != OP_CHECKMULTISIG.to_u8() {
        return None;
    }

    let mut instructions = Script::from_bytes(script).instructions();

    let required_sigs = match instructions.next()? {
        Ok(Instruction::Op(op)) => decode_pushnum(op)?,
        _ => return None,
    };

    let mut keys_count: usize = 0;
    let mut pubkeys = Vec::new();
    let declared = loop {
        match instructions.next()? {
            Ok(Instruction::PushBytes(key)) => {
                keys_count += 1;
                if is_strict_pubkey_encoding(key.as_bytes()) {
                    pubkeys.push(key.as_bytes().to_vec());
                }
            }
            Ok(Instruction::Op(op)) => break decode_pushnum(op)?,
            Err(_) => return None,
        }
    };

    if keys_count == 0
        || keys_count > MAX_PUBKEYS_PER_MULTISIG
        || declared as usize != keys_count
        || required_sigs as usize > keys_count
    {
        return None;
    }

    match instructions.next()? {
        Ok(Instruction::Op(op)) if op == OP_CHECKMULTISIG => {}
        _ => return None,
    }

    if instructions.next().is_some() {
        return None;
    }

    Some((required_sigs, keys_count as u8, pubkeys))
}

/// Whether the script is a standard null data script: a lone `OP_RETURN`, or
/// `OP_RETURN` followed by a single push of at most 80 bytes.
fn is_null_data(script: &[u8]) -> bool {
    if script.is_empty() || script[0] != OP_RETURN.to_u8() {
        return false;
    }
    if script.len() == 1 {
        return true;
    }

    let mut instructions = Script::from_bytes(&script[1..]).instructions();
    let push_ok = match instructions.next() {
        Some(Ok(Instruction::PushBytes(data))) => data.len() <= MAX_DATA_CARRIER_SIZE,
        Some(Ok(Instruction::Op(op))) => decode_pushnum(op).is_some(),
        _ => false,
    };
    push_ok && instructions.next().is_none()
}

fn decode_pushnum(opcode: Opcode) -> Option<u8> {
    if (OP_PUSHNUM_1.to_u8()..=OP_PUSHNUM_16.to_u8()).contains(&opcode.to_u8()) {
        Some(opcode.to_u8() - 0x50)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(hex: &str) -> Vec<u8> {
        hex::decode(hex).unwrap()
    }

    #[test]
    fn classifies_pubkey_hash() {
        let class = classify(&script(
            "76a914b19e5c5433afbf7aca8a73949a48fa6b41a1089d88ac",
        ));
        assert_eq!(class.name(), "pubkeyhash");
        assert_eq!(
            class,
            ScriptClass::PubKeyHash {
                hash: script("b19e5c5433afbf7aca8a73949a48fa6b41a1089d")
                    .try_into()
                    .unwrap(),
            }
        );
        assert_eq!(class.required_sigs(), 1);
    }

    #[test]
    fn classifies_script_hash() {
        let class = classify(&script("a914da1745e9b549bd0bfa1a569971c77eba30cd5a4b87"));
        assert_eq!(class.name(), "scripthash");
    }

    #[test]
    fn classifies_pay_to_pubkey() {
        // Compressed key.
        let class = classify(&script(
            "21039ec9a2265b552b81b0552e6e0d58925cc38c1264ab9828e8c5f071b7dc3d262dac",
        ));
        assert_eq!(class.name(), "pubkey");

        // Uncompressed key prefix 0x04.
        let mut uncompressed = vec![0x41, 0x04];
        uncompressed.extend(std::iter::repeat(0x11).take(64));
        uncompressed.push(0xac);
        assert_eq!(classify(&uncompressed).name(), "pubkey");

        // Hybrid prefixes are accepted.
        uncompressed[1] = 0x06;
        assert_eq!(classify(&uncompressed).name(), "pubkey");
        uncompressed[1] = 0x07;
        assert_eq!(classify(&uncompressed).name(), "pubkey");
        // 0x05 is not a valid prefix.
        uncompressed[1] = 0x05;
        assert_eq!(classify(&uncompressed).name(), "nonstandard");
    }

    #[test]
    fn classifies_bare_multisig() {
        // 1-of-2 with two compressed keys.
        let key_a = [&[0x02u8][..], &[0xaa; 32]].concat();
        let key_b = [&[0x03u8][..], &[0xbb; 32]].concat();
        let mut ms = vec![0x51, 33];
        ms.extend(&key_a);
        ms.push(33);
        ms.extend(&key_b);
        ms.extend([0x52, 0xae]);

        match classify(&ms) {
            ScriptClass::Multisig {
                required_sigs,
                keys_count,
                pubkeys,
            } => {
                assert_eq!(required_sigs, 1);
                assert_eq!(keys_count, 2);
                assert_eq!(pubkeys, vec![key_a, key_b]);
            }
            other => panic!("expected multisig, got {other:?}"),
        }

        // m > n is rejected.
        let mut overdrawn = ms.clone();
        overdrawn[0] = 0x53;
        assert_eq!(classify(&overdrawn).name(), "nonstandard");

        // Mismatched declared key count is rejected.
        let mut mismatched = ms;
        let n_pos = mismatched.len() - 2;
        mismatched[n_pos] = 0x53;
        assert_eq!(classify(&mismatched).name(), "nonstandard");
    }

    #[test]
    fn classifies_null_data() {
        assert_eq!(classify(&[0x6a]).name(), "nulldata");

        let mut small = vec![0x6a, 0x04];
        small.extend([0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(classify(&small).name(), "nulldata");

        let mut at_limit = vec![0x6a, 0x4c, 80];
        at_limit.extend(std::iter::repeat(0x00).take(80));
        assert_eq!(classify(&at_limit).name(), "nulldata");

        let mut over_limit = vec![0x6a, 0x4c, 81];
        over_limit.extend(std::iter::repeat(0x00).take(81));
        assert_eq!(classify(&over_limit).name(), "nonstandard");

        // Two pushes after OP_RETURN is not nulldata.
        assert_eq!(classify(&[0x6a, 0x01, 0xaa, 0x01, 0xbb]).name(), "nonstandard");
    }

    #[test]
    fn malformed_scripts_are_nonstandard() {
        // Truncated P2PKH.
        assert_eq!(
            classify(&script("76a914b19e5c5433afbf7aca8a73949a48fa6b41a1089d")).name(),
            "nonstandard"
        );
        // Push running past the end.
        assert_eq!(classify(&[0x6a, 0x05, 0x01]).name(), "nonstandard");
        // Oversized script.
        assert_eq!(classify(&vec![0x00; MAX_SCRIPT_SIZE + 1]).name(), "nonstandard");
    }
}
