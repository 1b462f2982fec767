//! Shared primitives for the Thought Rosetta implementation.
//!
//! This crate provides the types every other crate speaks:
//! - Network parameters (magics, ports, address version bytes, fee floors).
//! - Amount conversion between THT and notions (the 1e-8 base unit).
//! - The canonical block/transaction model produced by the node RPC layer
//!   and persisted by the indexer stores.
//! - Indexer configuration (pruning, compression dictionaries, data layout).

mod amount;
mod config;
mod params;
mod types;

pub use amount::{notions_from_tht, tht_from_notions, AmountError, NOTIONS_PER_THOUGHT};
pub use config::{CompressorEntry, IndexerConfig, Mode, PruningConfig, INDEXER_DIR, NODE_DIR};
pub use params::{Network, Params, MAINNET_PARAMS, TESTNET_PARAMS};
pub use types::{Block, Transaction, TxInput, TxOutput};

/// Blockchain identifier used in Rosetta network identifiers.
pub const BLOCKCHAIN: &str = "Thought";

/// Network identifier for the main network.
pub const MAINNET_NETWORK: &str = "Mainnet";

/// Network identifier for the test network.
pub const TESTNET_NETWORK: &str = "Testnet";

/// Rosetta operation type for a transaction input.
pub const INPUT_OP_TYPE: &str = "INPUT";

/// Rosetta operation type for a transaction output.
pub const OUTPUT_OP_TYPE: &str = "OUTPUT";

/// Rosetta operation type for a coinbase input.
pub const COINBASE_OP_TYPE: &str = "COINBASE";

/// Currency symbol of the chain.
pub const CURRENCY_SYMBOL: &str = "THT";

/// Number of decimal places in the currency (notions per THT exponent).
pub const CURRENCY_DECIMALS: u32 = 8;
