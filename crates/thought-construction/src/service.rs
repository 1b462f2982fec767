//! The eight stateless construction phases.

use crate::types::{
    AccountIdentifier, Amount, Coin, CoinChange, CoinIdentifier, ConstructionMetadata, Currency,
    Operation, OperationIdentifier, PreprocessOptions, PublicKey, ScriptPubKey, Signature,
    SigningPayload, TransactionIdentifier, COIN_SPENT, ECDSA_SIGNATURE, SECP256K1_CURVE,
};
use crate::{Error, Result};
use bitcoin::consensus::encode::{deserialize, serialize_hex};
use bitcoin::script::{Builder, PushBytesBuf, ScriptBuf};
use bitcoin::{absolute, transaction, OutPoint, Sequence, Transaction, TxIn, TxOut, Witness};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thought_node_rpc::NodeRpc;
use thought_primitives::{Network, Params, INPUT_OP_TYPE, NOTIONS_PER_THOUGHT, OUTPUT_OP_TYPE};
use thought_script::address::{address_to_script, owner_account, pubkey_address, recover_signer};
use thought_script::{legacy_signature_hash, SigHashType};

/// Serialized size model: fixed overhead plus per-input and per-output
/// costs, in bytes, for a legacy P2PKH transfer.
const TRANSACTION_OVERHEAD_BYTES: u64 = 10;
const INPUT_SIZE_BYTES: u64 = 148;
const OUTPUT_SIZE_BYTES: u64 = 34;

/// Confirmation target passed to `estimatesmartfee`.
const DEFAULT_CONFIRMATION_TARGET: u64 = 2;

/// Transaction version used for constructed transfers.
const TRANSACTION_VERSION: i32 = 2;

/// Coin lookup the metadata phase uses before falling back to the node.
pub trait CoinIndex: Send + Sync + 'static {
    /// The script of a tracked coin, or `None` when the indexer does not
    /// know the coin.
    fn script_pub_key(&self, outpoint: &OutPoint) -> Result<Option<ScriptPubKey>>;
}

impl CoinIndex for thought_indexer::Indexer {
    fn script_pub_key(&self, outpoint: &OutPoint) -> Result<Option<ScriptPubKey>> {
        thought_indexer::Indexer::script_pub_key(self, outpoint)
            .map_err(|err| Error::Index(err.to_string()))
    }
}

/// The opaque unsigned-transaction blob carried between payloads, parse and
/// combine. Hex-encoded JSON; never persisted.
#[derive(Debug, Serialize, Deserialize)]
struct UnsignedTransaction {
    transaction: String,
    #[serde(rename = "scriptPubKeys")]
    script_pub_keys: Vec<ScriptPubKey>,
    input_amounts: Vec<String>,
    input_addresses: Vec<String>,
}

/// The opaque signed-transaction blob carried between combine, parse, hash
/// and submit.
#[derive(Debug, Serialize, Deserialize)]
struct SignedTransaction {
    transaction: String,
    input_amounts: Vec<String>,
}

/// The Construction API core.
pub struct ConstructionService<C, I> {
    params: &'static Params,
    currency: Currency,
    client: Arc<C>,
    coins: Arc<I>,
}

impl<C: NodeRpc, I: CoinIndex> ConstructionService<C, I> {
    pub fn new(network: Network, client: Arc<C>, coins: Arc<I>) -> Self {
        Self {
            params: network.params(),
            currency: Currency::tht(),
            client,
            coins,
        }
    }

    /// Derives the P2PKH account of a compressed secp256k1 public key.
    pub fn derive(&self, public_key: &PublicKey) -> Result<AccountIdentifier> {
        if public_key.curve_type != SECP256K1_CURVE {
            return Err(Error::UnsupportedCurve(public_key.curve_type.clone()));
        }
        let address = pubkey_address(&public_key.bytes, self.params)?;
        Ok(AccountIdentifier { address })
    }

    /// Turns the intended operations into the options the metadata phase
    /// needs: the coins to spend, the size estimate, and the multiplier.
    pub fn preprocess(
        &self,
        operations: &[Operation],
        fee_multiplier: Option<f64>,
    ) -> Result<PreprocessOptions> {
        let (inputs, outputs) = match_operations(operations)?;

        let coins = inputs
            .iter()
            .map(|op| Coin {
                coin_identifier: op
                    .coin_change
                    .as_ref()
                    .expect("validated by match_operations; qed")
                    .coin_identifier
                    .clone(),
                amount: op.amount.clone().expect("validated; qed"),
            })
            .collect();

        let estimated_size = TRANSACTION_OVERHEAD_BYTES
            + INPUT_SIZE_BYTES * inputs.len() as u64
            + OUTPUT_SIZE_BYTES * outputs.len() as u64;

        Ok(PreprocessOptions {
            coins,
            estimated_size,
            fee_multiplier,
        })
    }

    /// Resolves the spent coins' scripts and suggests a fee from the node's
    /// rate estimate.
    pub async fn metadata(
        &self,
        options: &PreprocessOptions,
    ) -> Result<(ConstructionMetadata, Vec<Amount>)> {
        let mut script_pub_keys = Vec::with_capacity(options.coins.len());
        for coin in &options.coins {
            let outpoint = parse_coin_identifier(&coin.coin_identifier.identifier)?;
            let script_pub_key = match self.coins.script_pub_key(&outpoint)? {
                Some(script_pub_key) => script_pub_key,
                // The indexer may not have caught up to a fresh coin yet;
                // fall back to the node.
                None => self.backfill_script_pub_key(&outpoint).await?,
            };
            script_pub_keys.push(script_pub_key);
        }

        let estimate = self
            .client
            .estimate_smart_fee(DEFAULT_CONFIRMATION_TARGET)
            .await?;
        let suggested = suggested_fee(self.params, options, estimate.feerate);

        Ok((
            ConstructionMetadata { script_pub_keys },
            vec![Amount {
                value: suggested.to_string(),
                currency: self.currency.clone(),
            }],
        ))
    }

    /// Assembles the unsigned transaction and one signing payload per
    /// input: the legacy SIGHASH_ALL signature hash against the spent
    /// output's script.
    pub fn payloads(
        &self,
        operations: &[Operation],
        metadata: &ConstructionMetadata,
    ) -> Result<(String, Vec<SigningPayload>)> {
        let (inputs, outputs) = match_operations(operations)?;
        if metadata.script_pub_keys.len() != inputs.len() {
            return Err(Error::ScriptPubKeyCountMismatch {
                expected: inputs.len(),
                got: metadata.script_pub_keys.len(),
            });
        }

        let mut tx_inputs = Vec::with_capacity(inputs.len());
        let mut input_amounts = Vec::with_capacity(inputs.len());
        let mut input_addresses = Vec::with_capacity(inputs.len());
        for op in &inputs {
            let coin_change = op.coin_change.as_ref().expect("validated; qed");
            tx_inputs.push(TxIn {
                previous_output: parse_coin_identifier(&coin_change.coin_identifier.identifier)?,
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: Witness::default(),
            });
            input_amounts.push(op.amount.as_ref().expect("validated; qed").value.clone());
            input_addresses.push(op.account.as_ref().expect("validated; qed").address.clone());
        }

        let mut tx_outputs = Vec::with_capacity(outputs.len());
        for op in &outputs {
            let address = &op.account.as_ref().expect("validated; qed").address;
            let value = parse_notions(&op.amount.as_ref().expect("validated; qed").value)?;
            tx_outputs.push(TxOut {
                value: bitcoin::Amount::from_sat(value.unsigned_abs()),
                script_pubkey: ScriptBuf::from_bytes(address_to_script(address, self.params)?),
            });
        }

        let tx = Transaction {
            version: transaction::Version(TRANSACTION_VERSION),
            lock_time: absolute::LockTime::ZERO,
            input: tx_inputs,
            output: tx_outputs,
        };

        let mut payloads = Vec::with_capacity(inputs.len());
        for (index, op) in inputs.iter().enumerate() {
            let script_code = hex::decode(&metadata.script_pub_keys[index].hex)
                .map_err(|e| Error::MalformedPayload(e.to_string()))?;
            let sighash = legacy_signature_hash(&script_code, SigHashType::ALL, &tx, index)?;
            payloads.push(SigningPayload {
                account_identifier: op.account.clone().expect("validated; qed"),
                bytes: sighash.to_vec(),
                signature_type: ECDSA_SIGNATURE.to_string(),
            });
        }

        let blob = UnsignedTransaction {
            transaction: serialize_hex(&tx),
            script_pub_keys: metadata.script_pub_keys.clone(),
            input_amounts,
            input_addresses,
        };
        Ok((encode_blob(&blob)?, payloads))
    }

    /// Recovers the operations (and, for signed transactions, the signers)
    /// from an opaque blob. Round-trips payloads and combine.
    pub fn parse(
        &self,
        signed: bool,
        transaction: &str,
    ) -> Result<(Vec<Operation>, Vec<AccountIdentifier>)> {
        let (tx, input_amounts, input_addresses) = if signed {
            let blob: SignedTransaction = decode_blob(transaction)?;
            let tx = decode_transaction(&blob.transaction)?;
            let addresses = tx
                .input
                .iter()
                .map(|input| {
                    recover_signer(input.script_sig.as_bytes(), self.params).ok_or_else(|| {
                        Error::MalformedPayload("unable to recover signer from input".into())
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            (tx, blob.input_amounts, addresses)
        } else {
            let blob: UnsignedTransaction = decode_blob(transaction)?;
            let tx = decode_transaction(&blob.transaction)?;
            (tx, blob.input_amounts, blob.input_addresses)
        };

        if input_amounts.len() != tx.input.len() || input_addresses.len() != tx.input.len() {
            return Err(Error::MalformedPayload(
                "input side data does not match transaction inputs".into(),
            ));
        }

        let mut operations = Vec::with_capacity(tx.input.len() + tx.output.len());
        for (index, input) in tx.input.iter().enumerate() {
            operations.push(Operation {
                operation_identifier: OperationIdentifier {
                    index: index as i64,
                    network_index: None,
                },
                op_type: INPUT_OP_TYPE.to_string(),
                status: None,
                account: Some(AccountIdentifier {
                    address: input_addresses[index].clone(),
                }),
                amount: Some(Amount {
                    value: input_amounts[index].clone(),
                    currency: self.currency.clone(),
                }),
                coin_change: Some(CoinChange {
                    coin_identifier: CoinIdentifier {
                        identifier: format!(
                            "{}:{}",
                            input.previous_output.txid, input.previous_output.vout
                        ),
                    },
                    coin_action: COIN_SPENT.to_string(),
                }),
            });
        }

        for (index, output) in tx.output.iter().enumerate() {
            operations.push(Operation {
                operation_identifier: OperationIdentifier {
                    index: (tx.input.len() + index) as i64,
                    network_index: None,
                },
                op_type: OUTPUT_OP_TYPE.to_string(),
                status: None,
                account: Some(AccountIdentifier {
                    address: owner_account(output.script_pubkey.as_bytes(), self.params),
                }),
                amount: Some(Amount {
                    value: output.value.to_sat().to_string(),
                    currency: self.currency.clone(),
                }),
                coin_change: None,
            });
        }

        let mut signers: Vec<AccountIdentifier> = Vec::new();
        if signed {
            for address in input_addresses {
                if !signers.iter().any(|signer| signer.address == address) {
                    signers.push(AccountIdentifier { address });
                }
            }
        }

        Ok((operations, signers))
    }

    /// Fills each input's signature script from the provided signatures:
    /// `<sig || SIGHASH_ALL> <pubkey>`.
    pub fn combine(
        &self,
        unsigned_transaction: &str,
        signatures: &[Signature],
    ) -> Result<String> {
        let blob: UnsignedTransaction = decode_blob(unsigned_transaction)?;
        let mut tx = decode_transaction(&blob.transaction)?;

        if signatures.len() != tx.input.len() {
            return Err(Error::SignatureCountMismatch {
                expected: tx.input.len(),
                got: signatures.len(),
            });
        }

        for (input, signature) in tx.input.iter_mut().zip(signatures) {
            let mut der = signature.bytes.clone();
            der.push(SigHashType::ALL.0 as u8);
            let der = PushBytesBuf::try_from(der)
                .map_err(|_| Error::MalformedPayload("oversized signature".into()))?;
            let pubkey = PushBytesBuf::try_from(signature.public_key.bytes.clone())
                .map_err(|_| Error::MalformedPayload("oversized public key".into()))?;
            input.script_sig = Builder::new().push_slice(der).push_slice(pubkey).into_script();
        }

        let blob = SignedTransaction {
            transaction: serialize_hex(&tx),
            input_amounts: blob.input_amounts,
        };
        encode_blob(&blob)
    }

    /// The transaction id of a signed transaction: double SHA-256 of its
    /// serialization, in little-endian hex.
    pub fn hash(&self, signed_transaction: &str) -> Result<TransactionIdentifier> {
        let blob: SignedTransaction = decode_blob(signed_transaction)?;
        let tx = decode_transaction(&blob.transaction)?;
        Ok(TransactionIdentifier {
            hash: tx.compute_txid().to_string(),
        })
    }

    /// Broadcasts a signed transaction through the node.
    pub async fn submit(&self, signed_transaction: &str) -> Result<TransactionIdentifier> {
        let blob: SignedTransaction = decode_blob(signed_transaction)?;
        let txid = self.client.send_raw_transaction(&blob.transaction).await?;
        Ok(TransactionIdentifier {
            hash: txid.to_string(),
        })
    }

    async fn backfill_script_pub_key(&self, outpoint: &OutPoint) -> Result<ScriptPubKey> {
        let tx = self
            .client
            .get_raw_transaction(&outpoint.txid)
            .await
            .map_err(|err| {
                if err.is_not_found() {
                    Error::CoinNotFound(*outpoint)
                } else {
                    Error::Node(err)
                }
            })?;
        tx.vout
            .iter()
            .find(|vout| vout.n == outpoint.vout)
            .map(|vout| vout.script_pub_key.clone())
            .ok_or(Error::CoinNotFound(*outpoint))
    }
}

/// Splits operations into validated inputs and outputs.
fn match_operations(operations: &[Operation]) -> Result<(Vec<&Operation>, Vec<&Operation>)> {
    let mut inputs = Vec::new();
    let mut outputs = Vec::new();

    for op in operations {
        let amount = op
            .amount
            .as_ref()
            .ok_or_else(|| Error::InvalidOperation("operation without amount".into()))?;
        let value = parse_notions(&amount.value)?;
        if op.account.is_none() {
            return Err(Error::InvalidOperation("operation without account".into()));
        }

        match op.op_type.as_str() {
            t if t == INPUT_OP_TYPE => {
                if value >= 0 {
                    return Err(Error::InvalidOperation(
                        "input amounts must be negative".into(),
                    ));
                }
                if op.coin_change.is_none() {
                    return Err(Error::InvalidOperation("input without coin change".into()));
                }
                inputs.push(op);
            }
            t if t == OUTPUT_OP_TYPE => {
                if value < 0 {
                    return Err(Error::InvalidOperation(
                        "output amounts must be positive".into(),
                    ));
                }
                outputs.push(op);
            }
            other => {
                return Err(Error::InvalidOperation(format!(
                    "unsupported operation type {other}"
                )));
            }
        }
    }

    if inputs.is_empty() {
        return Err(Error::InvalidOperation(
            "a transfer requires at least one input".into(),
        ));
    }
    Ok((inputs, outputs))
}

/// The suggested fee in notions: estimated size times the effective rate,
/// floored at the chain's minimum rate. A missing or non-positive node
/// estimate falls back to the minimum rate.
fn suggested_fee(params: &Params, options: &PreprocessOptions, feerate: Option<f64>) -> u64 {
    let min_rate = notions_per_byte(params.min_fee_rate);
    let rate = feerate
        .filter(|rate| *rate > 0.0)
        .map(notions_per_byte)
        .unwrap_or(min_rate);
    let multiplier = options.fee_multiplier.unwrap_or(1.0);

    let size = options.estimated_size as f64;
    let fee = size * rate * multiplier;
    let floor = size * min_rate;
    fee.max(floor).round() as u64
}

/// Converts a THT/kB rate into notions per byte.
fn notions_per_byte(tht_per_kb: f64) -> f64 {
    tht_per_kb * NOTIONS_PER_THOUGHT as f64 / 1000.0
}

fn parse_coin_identifier(identifier: &str) -> Result<OutPoint> {
    let (txid, vout) = identifier
        .split_once(':')
        .ok_or_else(|| Error::InvalidCoinIdentifier(identifier.to_string()))?;
    Ok(OutPoint {
        txid: txid
            .parse()
            .map_err(|_| Error::InvalidCoinIdentifier(identifier.to_string()))?,
        vout: vout
            .parse()
            .map_err(|_| Error::InvalidCoinIdentifier(identifier.to_string()))?,
    })
}

fn parse_notions(value: &str) -> Result<i64> {
    value
        .parse()
        .map_err(|_| Error::InvalidOperation(format!("unparsable amount {value:?}")))
}

fn encode_blob<T: Serialize>(blob: &T) -> Result<String> {
    let json = serde_json::to_vec(blob).map_err(|e| Error::MalformedPayload(e.to_string()))?;
    Ok(hex::encode(json))
}

fn decode_blob<T: for<'de> Deserialize<'de>>(blob: &str) -> Result<T> {
    let bytes = hex::decode(blob).map_err(|e| Error::MalformedPayload(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| Error::MalformedPayload(e.to_string()))
}

fn decode_transaction(transaction_hex: &str) -> Result<Transaction> {
    let bytes =
        hex::decode(transaction_hex).map_err(|e| Error::MalformedPayload(e.to_string()))?;
    deserialize(&bytes).map_err(|e| Error::MalformedPayload(e.to_string()))
}
