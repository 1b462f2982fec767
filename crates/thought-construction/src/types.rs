//! Rosetta value types used by the Construction core.
//!
//! Only the subset the core manipulates is defined here; the HTTP layer
//! adapts these 1:1 onto the wire representation.

use serde::{Deserialize, Serialize};
use thought_primitives::{CURRENCY_DECIMALS, CURRENCY_SYMBOL};

pub use thought_node_rpc::types::ScriptPubKey;

/// Curve type of secp256k1 public keys.
pub const SECP256K1_CURVE: &str = "secp256k1";

/// Signature type produced for signing payloads.
pub const ECDSA_SIGNATURE: &str = "ecdsa";

/// Coin action of an input consuming a coin.
pub const COIN_SPENT: &str = "coin_spent";

/// Coin action of an output creating a coin.
pub const COIN_CREATED: &str = "coin_created";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountIdentifier {
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub symbol: String,
    pub decimals: u32,
}

impl Currency {
    /// The chain currency: THT with 8 decimals (notions).
    pub fn tht() -> Self {
        Self {
            symbol: CURRENCY_SYMBOL.to_string(),
            decimals: CURRENCY_DECIMALS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    /// Signed integer value in notions, as a decimal string.
    pub value: String,
    pub currency: Currency,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationIdentifier {
    pub index: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_index: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub operation_identifier: OperationIdentifier,
    #[serde(rename = "type")]
    pub op_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<AccountIdentifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coin_change: Option<CoinChange>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinIdentifier {
    /// `txid:vout`.
    pub identifier: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinChange {
    pub coin_identifier: CoinIdentifier,
    pub coin_action: String,
}

/// A spendable coin referenced by the construction flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub coin_identifier: CoinIdentifier,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    /// SEC-encoded key bytes.
    pub bytes: Vec<u8>,
    pub curve_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningPayload {
    pub account_identifier: AccountIdentifier,
    /// The sighash to sign.
    pub bytes: Vec<u8>,
    pub signature_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub signing_payload: SigningPayload,
    pub public_key: PublicKey,
    pub signature_type: String,
    /// DER-encoded ECDSA signature, without the trailing hash type.
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionIdentifier {
    pub hash: String,
}

/// Options produced by preprocess and consumed by metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessOptions {
    pub coins: Vec<Coin>,
    pub estimated_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_multiplier: Option<f64>,
}

/// Metadata produced by the metadata phase and consumed by payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionMetadata {
    #[serde(rename = "script_pubkeys")]
    pub script_pub_keys: Vec<ScriptPubKey>,
}
