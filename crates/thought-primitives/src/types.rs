//! Canonical block and transaction model.
//!
//! This is the shape the indexer persists and the Data API reads. It is
//! produced from the node's verbose RPC responses and carries everything
//! needed to apply and later revert a block.

use bitcoin::{BlockHash, OutPoint, Txid};
use serde::{Deserialize, Serialize};

/// A block in the canonical chain model.
///
/// The chain is a singly-linked list over `parent_hash`; `height` is the
/// block's index in the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub hash: BlockHash,
    pub parent_hash: BlockHash,
    pub height: u64,
    pub transactions: Vec<Transaction>,
}

/// A transaction within a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub txid: Txid,
    pub version: i32,
    pub lock_time: u32,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
}

impl Transaction {
    /// Whether this is the block's coinbase transaction.
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].previous_output.is_none()
    }
}

/// A transaction input.
///
/// `previous_output` is `None` for the synthetic coinbase input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    pub previous_output: Option<OutPoint>,
    pub signature_script: Vec<u8>,
    pub sequence: u32,
}

/// A transaction output: the data from which a coin is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    /// Value in notions.
    pub value: u64,
    pub script_pubkey: Vec<u8>,
}
