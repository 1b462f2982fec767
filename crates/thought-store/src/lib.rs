//! Persistent stores for the Thought indexer.
//!
//! One RocksDB database holds the block store, the coin (UTXO) store, the
//! per-account coin index, and the per-account balance history. Every block
//! is applied or reverted through a single atomic write batch, so a crash at
//! any point leaves the stores at the last completed block boundary.

mod codec;
mod error;
mod record;
mod storage;

pub use codec::DictionaryCodec;
pub use error::{Error, Result};
pub use record::{account_coin_key, balance_key, outpoint_key, Coin, HeadPointer, StoredBlock};
pub use storage::IndexerStore;

/// Column family names.
pub mod cf {
    /// Block records keyed by block hash.
    pub const BLOCKS: &str = "blocks";
    /// UTXO set keyed by outpoint.
    pub const COINS: &str = "coins";
    /// Per-account coin ownership index.
    pub const ACCOUNT_COINS: &str = "acct_coins";
    /// Per-account balance history keyed by account and height.
    pub const BALANCES: &str = "balances";
    /// Head pointer and height index.
    pub const META: &str = "meta";
}

/// Keys within the meta column family.
pub mod meta_keys {
    /// The head pointer.
    pub const HEAD: &[u8] = b"head";
    /// Prefix of the height -> block hash index entries.
    pub const HEIGHT_INDEX_PREFIX: &[u8] = b"height/";
}

/// Compression namespace for persisted block records.
pub const TRANSACTION_NAMESPACE: &str = "transaction";
