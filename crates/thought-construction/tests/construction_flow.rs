//! Full construction flow against reference vectors.

use async_trait::async_trait;
use bitcoin::{BlockHash, OutPoint, Txid};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use thought_construction::types::{
    AccountIdentifier, Amount, CoinChange, CoinIdentifier, Currency, Operation,
    OperationIdentifier, PublicKey, ScriptPubKey, Signature, COIN_SPENT, ECDSA_SIGNATURE,
    SECP256K1_CURVE,
};
use thought_construction::{CoinIndex, ConstructionService, Error, Result};
use thought_node_rpc::types::{FeeEstimate, GetBlock, GetRawTransaction};
use thought_node_rpc::{Error as RpcError, NodeRpc, Result as RpcResult};
use thought_primitives::{Network, INPUT_OP_TYPE, OUTPUT_OP_TYPE};

const TEST_PUBKEY: &str = "039ec9a2265b552b81b0552e6e0d58925cc38c1264ab9828e8c5f071b7dc3d262d";
const SENDER: &str = "kyw8MaocLYCniZ3NnJqNST3qtZNygLSiCC";
const RECIPIENT: &str = "m92udt8YzZ3B2WZ4uzjuL5sdaQuNnLM8KU";
const SPENT_COIN: &str = "5d7ffb8cf555d87a9524d26d5b2f49570ad1b62fd58bcc391ebe8a469ce1da7f:0";
const RECIPIENT_SCRIPT_HEX: &str = "76a914b19e5c5433afbf7aca8a73949a48fa6b41a1089d88ac";

const UNSIGNED_TX_HEX: &str = "02000000017fdae19c468abe1e39cc8bd52fb6d10a57492f5b6dd224957ad8\
                               55f58cfb7f5d0000000000ffffffff0170940000000000001976a914b19e5c\
                               5433afbf7aca8a73949a48fa6b41a1089d88ac00000000";
const SIGNING_PAYLOAD_HEX: &str =
    "b6aa747c4dbe4e0397da142c28aabd326e08ce9b0ce8fd5afc3c5840f3f41b05";
const SIGNATURE_DER_HEX: &str = "30450221009127a2f71c325e47b4119e298c5c486a1bbf0833c44fc472ca82\
                                 9af661ef1e13022064afdc1c4d554467722efab105bcc4f7faf0a94cf5024f\
                                 dfdd60af93bf88ccc6";
const SIGNED_TX_HEX: &str = "02000000017fdae19c468abe1e39cc8bd52fb6d10a57492f5b6dd224957ad855f5\
                             8cfb7f5d000000006b4830450221009127a2f71c325e47b4119e298c5c486a1b\
                             bf0833c44fc472ca829af661ef1e13022064afdc1c4d554467722efab105bcc4\
                             f7faf0a94cf5024fdfdd60af93bf88ccc6012102cfa3585ba594089988089\
                             2fc507d23ab2c79bd8f5ae40039d10e745dd60508bfffffffff017094000000\
                             0000001976a914b19e5c5433afbf7aca8a73949a48fa6b41a1089d88ac000000\
                             00";
const SIGNED_TXID: &str = "11cabe81d421dd4f97c11e79850e66c90df75130195ff836c5f372452801390e";

/// Node mock: canned fee estimate, recorded broadcasts.
struct MockClient {
    feerate: Mutex<Option<f64>>,
    broadcasts: Mutex<Vec<String>>,
}

impl MockClient {
    fn new(feerate: Option<f64>) -> Arc<Self> {
        Arc::new(Self {
            feerate: Mutex::new(feerate),
            broadcasts: Mutex::new(Vec::new()),
        })
    }

    fn set_feerate(&self, feerate: Option<f64>) {
        *self.feerate.lock() = feerate;
    }
}

#[async_trait]
impl NodeRpc for MockClient {
    async fn get_block_hash(&self, _height: u64) -> RpcResult<BlockHash> {
        unimplemented!("not used by construction")
    }

    async fn get_block(&self, _hash: &BlockHash) -> RpcResult<GetBlock> {
        unimplemented!("not used by construction")
    }

    async fn get_raw_transaction(&self, _txid: &Txid) -> RpcResult<GetRawTransaction> {
        Err(RpcError::Rpc {
            code: -5,
            message: "No such mempool or blockchain transaction".into(),
        })
    }

    async fn send_raw_transaction(&self, transaction_hex: &str) -> RpcResult<Txid> {
        self.broadcasts.lock().push(transaction_hex.to_string());
        Ok(SIGNED_TXID.parse().unwrap())
    }

    async fn estimate_smart_fee(&self, _conf_target: u64) -> RpcResult<FeeEstimate> {
        Ok(FeeEstimate {
            feerate: *self.feerate.lock(),
            errors: None,
            blocks: 2,
        })
    }

    async fn prune_blockchain(&self, _height: u64) -> RpcResult<u64> {
        unimplemented!("not used by construction")
    }
}

/// Indexer mock backed by a plain map.
struct MockCoins {
    coins: HashMap<OutPoint, ScriptPubKey>,
}

impl CoinIndex for MockCoins {
    fn script_pub_key(&self, outpoint: &OutPoint) -> Result<Option<ScriptPubKey>> {
        Ok(self.coins.get(outpoint).cloned())
    }
}

fn recipient_script_pub_key() -> ScriptPubKey {
    ScriptPubKey {
        asm: "OP_DUP OP_HASH160 b19e5c5433afbf7aca8a73949a48fa6b41a1089d \
              OP_EQUALVERIFY OP_CHECKSIG"
            .into(),
        hex: RECIPIENT_SCRIPT_HEX.into(),
        req_sigs: Some(1),
        script_type: "pubkeyhash".into(),
        addresses: Some(vec![RECIPIENT.into()]),
    }
}

fn transfer_ops() -> Vec<Operation> {
    vec![
        Operation {
            operation_identifier: OperationIdentifier {
                index: 0,
                network_index: None,
            },
            op_type: INPUT_OP_TYPE.into(),
            status: None,
            account: Some(AccountIdentifier {
                address: SENDER.into(),
            }),
            amount: Some(Amount {
                value: "-40000".into(),
                currency: Currency::tht(),
            }),
            coin_change: Some(CoinChange {
                coin_identifier: CoinIdentifier {
                    identifier: SPENT_COIN.into(),
                },
                coin_action: COIN_SPENT.into(),
            }),
        },
        Operation {
            operation_identifier: OperationIdentifier {
                index: 1,
                network_index: None,
            },
            op_type: OUTPUT_OP_TYPE.into(),
            status: None,
            account: Some(AccountIdentifier {
                address: RECIPIENT.into(),
            }),
            amount: Some(Amount {
                value: "38000".into(),
                currency: Currency::tht(),
            }),
            coin_change: None,
        },
    ]
}

fn service(
    client: Arc<MockClient>,
    coins: HashMap<OutPoint, ScriptPubKey>,
) -> ConstructionService<MockClient, MockCoins> {
    ConstructionService::new(Network::Testnet, client, Arc::new(MockCoins { coins }))
}

fn spent_outpoint() -> OutPoint {
    OutPoint {
        txid: "5d7ffb8cf555d87a9524d26d5b2f49570ad1b62fd58bcc391ebe8a469ce1da7f"
            .parse()
            .unwrap(),
        vout: 0,
    }
}

/// Hex of the inner raw transaction carried by an opaque blob.
fn blob_transaction_hex(blob: &str) -> String {
    let json: serde_json::Value =
        serde_json::from_slice(&hex::decode(blob).unwrap()).unwrap();
    json["transaction"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn construction_flow_round_trips() {
    let client = MockClient::new(Some(0.0001)); // 10x the minimum rate
    let mut coins = HashMap::new();
    coins.insert(spent_outpoint(), recipient_script_pub_key());
    let service = service(client.clone(), coins);

    // Derive.
    let account = service
        .derive(&PublicKey {
            bytes: hex::decode(TEST_PUBKEY).unwrap(),
            curve_type: SECP256K1_CURVE.into(),
        })
        .unwrap();
    assert_eq!(account.address, "kvdPDVw6T6ws8N2fAZiaFMHsJLXWDXtHiq");

    // Preprocess.
    let ops = transfer_ops();
    let options = service.preprocess(&ops, Some(0.75)).unwrap();
    assert_eq!(options.estimated_size, 192);
    assert_eq!(options.coins.len(), 1);
    assert_eq!(options.coins[0].coin_identifier.identifier, SPENT_COIN);
    assert_eq!(options.coins[0].amount.value, "-40000");

    // Metadata at a healthy fee rate.
    let (metadata, suggested) = service.metadata(&options).await.unwrap();
    assert_eq!(metadata.script_pub_keys, vec![recipient_script_pub_key()]);
    assert_eq!(suggested[0].value, "1440"); // 192 bytes * 10 notions/B * 0.75

    // Metadata clamped to the minimum fee rate.
    client.set_feerate(Some(0.00001));
    let (_, clamped) = service.metadata(&options).await.unwrap();
    assert_eq!(clamped[0].value, "192");

    // Payloads.
    let (unsigned, payloads) = service.payloads(&ops, &metadata).unwrap();
    assert_eq!(blob_transaction_hex(&unsigned), UNSIGNED_TX_HEX);
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0].account_identifier.address, SENDER);
    assert_eq!(hex::encode(&payloads[0].bytes), SIGNING_PAYLOAD_HEX);
    assert_eq!(payloads[0].signature_type, ECDSA_SIGNATURE);

    // Parse unsigned: operations round-trip, nobody has signed.
    let (parsed_ops, signers) = service.parse(false, &unsigned).unwrap();
    assert_eq!(parsed_ops, ops);
    assert!(signers.is_empty());

    // Combine.
    let signature = Signature {
        signing_payload: payloads[0].clone(),
        public_key: PublicKey {
            bytes: hex::decode(
                "02cfa3585ba5940899880892fc507d23ab2c79bd8f5ae40039d10e745dd60508bf",
            )
            .unwrap(),
            curve_type: SECP256K1_CURVE.into(),
        },
        signature_type: ECDSA_SIGNATURE.into(),
        bytes: hex::decode(SIGNATURE_DER_HEX).unwrap(),
    };
    let signed = service.combine(&unsigned, &[signature]).unwrap();
    assert_eq!(blob_transaction_hex(&signed), SIGNED_TX_HEX);

    // Parse signed: same operations, the sender has signed.
    let (parsed_signed_ops, signers) = service.parse(true, &signed).unwrap();
    assert_eq!(parsed_signed_ops, ops);
    assert_eq!(
        signers,
        vec![AccountIdentifier {
            address: SENDER.into()
        }]
    );

    // Hash.
    assert_eq!(service.hash(&signed).unwrap().hash, SIGNED_TXID);

    // Submit.
    let submitted = service.submit(&signed).await.unwrap();
    assert_eq!(submitted.hash, SIGNED_TXID);
    assert_eq!(client.broadcasts.lock().as_slice(), &[SIGNED_TX_HEX.to_string()]);
}

#[tokio::test]
async fn metadata_rejects_unknown_coins() {
    let client = MockClient::new(Some(0.0001));
    let service = service(client, HashMap::new());

    let options = service.preprocess(&transfer_ops(), None).unwrap();
    // Neither the indexer nor the node knows the coin.
    match service.metadata(&options).await {
        Err(Error::CoinNotFound(outpoint)) => assert_eq!(outpoint, spent_outpoint()),
        other => panic!("expected CoinNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn metadata_without_node_estimate_uses_minimum_rate() {
    let client = MockClient::new(None);
    let mut coins = HashMap::new();
    coins.insert(spent_outpoint(), recipient_script_pub_key());
    let service = service(client, coins);

    let options = service.preprocess(&transfer_ops(), None).unwrap();
    let (_, suggested) = service.metadata(&options).await.unwrap();
    assert_eq!(suggested[0].value, "192");
}

#[test]
fn derive_rejects_foreign_curves() {
    let client = MockClient::new(None);
    let service = service(client, HashMap::new());

    let result = service.derive(&PublicKey {
        bytes: hex::decode(TEST_PUBKEY).unwrap(),
        curve_type: "edwards25519".into(),
    });
    assert!(matches!(result, Err(Error::UnsupportedCurve(_))));
}

#[test]
fn preprocess_rejects_positive_inputs() {
    let client = MockClient::new(None);
    let service = service(client, HashMap::new());

    let mut ops = transfer_ops();
    ops[0].amount.as_mut().unwrap().value = "40000".into();
    assert!(matches!(
        service.preprocess(&ops, None),
        Err(Error::InvalidOperation(_))
    ));
}
