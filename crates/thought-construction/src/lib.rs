//! Stateless Rosetta Construction core for the Thought chain.
//!
//! The eight phases — derive, preprocess, metadata, payloads, parse,
//! combine, hash, submit — are pure functions over their inputs plus two
//! collaborators: the node RPC client (fee estimation, broadcast, coin
//! backfill) and the indexer's coin lookup. Opaque transaction blobs passed
//! between phases are hex-encoded JSON and are never persisted.

mod service;
pub mod types;

pub use service::{CoinIndex, ConstructionService};

use bitcoin::OutPoint;
use thiserror::Error;

/// Construction error taxonomy, mirrored 1:1 into Rosetta error codes by
/// the HTTP layer.
#[derive(Debug, Error)]
pub enum Error {
    /// The public key is on an unsupported curve.
    #[error("unsupported curve type: {0}")]
    UnsupportedCurve(String),

    /// Script or address handling failure.
    #[error(transparent)]
    Script(#[from] thought_script::Error),

    /// A coin identifier was not `txid:vout`.
    #[error("invalid coin identifier: {0}")]
    InvalidCoinIdentifier(String),

    /// A referenced coin is unknown to both the indexer and the node.
    #[error("coin not found: {0}")]
    CoinNotFound(OutPoint),

    /// The operation list does not describe a valid transfer.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Metadata does not carry one script per transaction input.
    #[error("expected {expected} script pub keys, got {got}")]
    ScriptPubKeyCountMismatch { expected: usize, got: usize },

    /// Combine was called with the wrong number of signatures.
    #[error("expected {expected} signatures, got {got}")]
    SignatureCountMismatch { expected: usize, got: usize },

    /// An opaque transaction blob failed to decode.
    #[error("malformed transaction payload: {0}")]
    MalformedPayload(String),

    /// The indexer coin lookup failed.
    #[error("coin index failure: {0}")]
    Index(String),

    /// The node rejected or failed a call.
    #[error(transparent)]
    Node(#[from] thought_node_rpc::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
