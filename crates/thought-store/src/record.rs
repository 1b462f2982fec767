//! Persisted record types and key encodings.
//!
//! All keys sort lexicographically: a prefix scan over
//! `acct_coins/<account>/` enumerates an account's coins, and a reverse seek
//! in `balances/<account>/` up to a big-endian height finds the most recent
//! balance entry at or below that height.

use bitcoin::hashes::Hash;
use bitcoin::{BlockHash, OutPoint, Txid};
use serde::{Deserialize, Serialize};
use thought_primitives::Block;

/// Separator between the account and the remainder of a composite key.
/// Accounts are Base58 or hex strings and never contain it.
const KEY_SEPARATOR: u8 = b'/';

/// An unspent transaction output as persisted in the coin store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    /// Value in notions.
    pub value: u64,
    /// The output script.
    pub script_pubkey: Vec<u8>,
    /// Height of the block that created the coin.
    pub block_height: u64,
}

impl Coin {
    /// Serializes the coin for storage.
    pub fn encode(&self) -> Vec<u8> {
        bincode::serialize(self).expect("coin serialization cannot fail; qed")
    }

    /// Deserializes a coin from storage.
    pub fn decode(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}

/// The most recently applied block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadPointer {
    pub hash: BlockHash,
    pub height: u64,
}

/// A block record as persisted in the block store.
///
/// The coins spent by the block travel with it so a revert needs nothing but
/// this record: created outputs are recomputed from the transactions and
/// spent coins are restored from the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredBlock {
    pub block: Block,
    /// Coins deleted by this block that existed before it. Outputs created
    /// and spent within the block are intentionally absent.
    pub spent_coins: Vec<(OutPoint, Coin)>,
}

/// Coin store key: `txid || be32 vout` (36 bytes).
pub fn outpoint_key(outpoint: &OutPoint) -> [u8; 36] {
    let mut key = [0u8; 36];
    key[..32].copy_from_slice(outpoint.txid.as_ref());
    key[32..].copy_from_slice(&outpoint.vout.to_be_bytes());
    key
}

/// Parses a coin store key back into an outpoint.
pub fn key_to_outpoint(key: &[u8]) -> Option<OutPoint> {
    if key.len() != 36 {
        return None;
    }
    let txid = Txid::from_slice(&key[..32]).ok()?;
    let vout = u32::from_be_bytes(key[32..].try_into().ok()?);
    Some(OutPoint { txid, vout })
}

/// Account coin index key: `<account>/<outpoint key>`.
pub fn account_coin_key(account: &str, outpoint: &OutPoint) -> Vec<u8> {
    let mut key = Vec::with_capacity(account.len() + 1 + 36);
    key.extend(account.as_bytes());
    key.push(KEY_SEPARATOR);
    key.extend(outpoint_key(outpoint));
    key
}

/// Balance history key: `<account>/<be64 height>`.
pub fn balance_key(account: &str, height: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(account.len() + 1 + 8);
    key.extend(account.as_bytes());
    key.push(KEY_SEPARATOR);
    key.extend(height.to_be_bytes());
    key
}

/// Prefix shared by all keys of an account in composite keyspaces.
pub fn account_prefix(account: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(account.len() + 1);
    prefix.extend(account.as_bytes());
    prefix.push(KEY_SEPARATOR);
    prefix
}
