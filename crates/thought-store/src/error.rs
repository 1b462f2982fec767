//! Error types for the indexer stores.

use bitcoin::{BlockHash, OutPoint};

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// RocksDB error.
    #[error("rocksdb error: {0}")]
    Rocksdb(#[from] rocksdb::Error),

    /// Filesystem, compression or decompression failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Record serialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record deserialization failure.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// An input referenced a coin that is not in the store. Applying the
    /// block would violate the conservation invariant.
    #[error("coin not found: {0}")]
    CoinNotFound(OutPoint),

    /// A block record expected to be present is missing.
    #[error("block not found: {0}")]
    BlockNotFound(BlockHash),

    /// Revert was requested on an empty store.
    #[error("no head to revert")]
    NoHead,

    /// The block does not extend the current head.
    #[error("block {got} at height {height} does not extend head {expected}")]
    OutOfOrder {
        expected: BlockHash,
        got: BlockHash,
        height: u64,
    },

    /// An account balance would go negative.
    #[error("balance underflow for account {account} at height {height}")]
    BalanceUnderflow { account: String, height: u64 },

    /// A column family handle was missing; the database was not initialized
    /// by this store.
    #[error("store not initialized")]
    NotInitialized,
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
