//! Node JSON-RPC response types.
//!
//! These match the JSON returned by the node's RPC API. Blocks are always
//! requested with verbosity 2, so transactions arrive fully decoded with
//! their raw hex alongside.

use bitcoin::{BlockHash, Txid};
use serde::{Deserialize, Serialize};

/// Response for `getblock` with verbosity 2.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetBlock {
    /// The block hash.
    pub hash: BlockHash,
    /// The block height.
    pub height: u64,
    /// The block time in UNIX epoch time.
    #[serde(default)]
    pub time: u64,
    /// The hash of the previous block. Absent for the genesis block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previousblockhash: Option<BlockHash>,
    /// The decoded transactions.
    pub tx: Vec<GetRawTransaction>,
}

/// A verbose transaction, as embedded in `getblock` verbosity 2 or returned
/// by `getrawtransaction` with verbose output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetRawTransaction {
    /// The transaction id.
    pub txid: Txid,
    /// The transaction version.
    pub version: i32,
    /// The transaction locktime.
    pub locktime: u32,
    /// The serialized transaction in hex.
    pub hex: String,
    /// The transaction inputs.
    pub vin: Vec<Vin>,
    /// The transaction outputs.
    pub vout: Vec<Vout>,
}

/// A transaction input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vin {
    /// Coinbase payload; present only on the coinbase input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coinbase: Option<String>,
    /// Referenced transaction id. Absent on the coinbase input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub txid: Option<Txid>,
    /// Referenced output index. Absent on the coinbase input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vout: Option<u32>,
    /// The signature script.
    #[serde(rename = "scriptSig", skip_serializing_if = "Option::is_none")]
    pub script_sig: Option<ScriptSig>,
    /// The input sequence number.
    pub sequence: u32,
}

impl Vin {
    /// Whether this is the synthetic coinbase input.
    pub fn is_coinbase(&self) -> bool {
        self.coinbase.is_some()
    }
}

/// A signature script in both disassembled and hex form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptSig {
    pub asm: String,
    pub hex: String,
}

/// A transaction output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vout {
    /// The output value in THT.
    pub value: f64,
    /// The output index.
    pub n: u32,
    /// The output script.
    #[serde(rename = "scriptPubKey")]
    pub script_pub_key: ScriptPubKey,
}

/// A decoded output script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptPubKey {
    pub asm: String,
    pub hex: String,
    /// Number of required signatures, when the node reports one.
    #[serde(rename = "reqSigs", skip_serializing_if = "Option::is_none")]
    pub req_sigs: Option<i64>,
    /// The script type name, e.g. `pubkeyhash`.
    #[serde(rename = "type")]
    pub script_type: String,
    /// Addresses the script pays to, when standard.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addresses: Option<Vec<String>>,
}

/// Response for `estimatesmartfee`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeEstimate {
    /// Estimated fee rate in THT/kB. Absent when the node lacks data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feerate: Option<f64>,
    /// Errors encountered during processing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    /// Block number where the estimate was found.
    #[serde(default)]
    pub blocks: u64,
}
