//! RocksDB-backed store implementation.

use crate::codec::DictionaryCodec;
use crate::record::{
    account_coin_key, account_prefix, balance_key, key_to_outpoint, outpoint_key, Coin,
    HeadPointer, StoredBlock,
};
use crate::{cf, meta_keys, Error, Result, TRANSACTION_NAMESPACE};
use bitcoin::hashes::Hash;
use bitcoin::{BlockHash, OutPoint};
use parking_lot::RwLock;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, Options, WriteBatch, DB};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use thought_primitives::{Block, Network, Params};
use thought_script::address::owner_account;

/// The persistent block, coin and balance stores of the indexer.
///
/// The applier is the single writer; readers may call the lookup methods
/// concurrently. Every mutation is one atomic [`WriteBatch`] covering coins,
/// the account index, balances, the block record, and the head pointer, so
/// a crash never exposes a partially applied block.
pub struct IndexerStore {
    db: DB,
    codec: DictionaryCodec,
    params: &'static Params,
    head: RwLock<Option<HeadPointer>>,
}

impl IndexerStore {
    /// Opens or creates the stores at the given path.
    pub fn open(path: &Path, network: Network, codec: DictionaryCodec) -> Result<Self> {
        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_compression_type(rocksdb::DBCompressionType::Lz4);

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(cf::BLOCKS, Options::default()),
            ColumnFamilyDescriptor::new(cf::COINS, Options::default()),
            ColumnFamilyDescriptor::new(cf::ACCOUNT_COINS, Options::default()),
            ColumnFamilyDescriptor::new(cf::BALANCES, Options::default()),
            ColumnFamilyDescriptor::new(cf::META, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;
        let head = Self::load_head(&db)?;

        match &head {
            Some(head) => {
                tracing::info!(height = head.height, hash = %head.hash, "opened indexer store")
            }
            None => tracing::info!("opened empty indexer store"),
        }

        Ok(Self {
            db,
            codec,
            params: network.params(),
            head: RwLock::new(head),
        })
    }

    /// The most recently applied block, if any.
    pub fn head(&self) -> Option<HeadPointer> {
        *self.head.read()
    }

    /// Applies a block: spends its inputs, creates its outputs, records the
    /// balance changes, and advances the head — all in one batch.
    pub fn apply(&self, block: &Block) -> Result<()> {
        if let Some(head) = self.head() {
            if block.parent_hash != head.hash || block.height != head.height + 1 {
                return Err(Error::OutOfOrder {
                    expected: head.hash,
                    got: block.hash,
                    height: block.height,
                });
            }
        }

        let cf_blocks = self.cf_handle(cf::BLOCKS)?;
        let cf_coins = self.cf_handle(cf::COINS)?;
        let cf_accounts = self.cf_handle(cf::ACCOUNT_COINS)?;
        let cf_balances = self.cf_handle(cf::BALANCES)?;
        let cf_meta = self.cf_handle(cf::META)?;

        let mut batch = WriteBatch::default();
        // Outputs created earlier in this block, spendable by later
        // transactions of the same block.
        let mut pending: HashMap<OutPoint, Coin> = HashMap::new();
        let mut deltas: HashMap<String, i128> = HashMap::new();
        // Only coins that existed before this block; in-block creations that
        // get spent again leave no trace in the record.
        let mut spent_coins: Vec<(OutPoint, Coin)> = Vec::new();

        for tx in &block.transactions {
            for input in &tx.inputs {
                let Some(outpoint) = input.previous_output else {
                    continue;
                };

                let coin = match pending.remove(&outpoint) {
                    Some(coin) => coin,
                    None => {
                        let bytes = self
                            .db
                            .get_cf(cf_coins, outpoint_key(&outpoint))?
                            .ok_or(Error::CoinNotFound(outpoint))?;
                        let coin = Coin::decode(&bytes)
                            .map_err(|e| Error::Deserialization(e.to_string()))?;
                        spent_coins.push((outpoint, coin.clone()));
                        coin
                    }
                };

                let account = owner_account(&coin.script_pubkey, self.params);
                *deltas.entry(account.clone()).or_default() -= coin.value as i128;
                batch.delete_cf(cf_coins, outpoint_key(&outpoint));
                batch.delete_cf(cf_accounts, account_coin_key(&account, &outpoint));
            }

            for (vout, output) in tx.outputs.iter().enumerate() {
                let outpoint = OutPoint {
                    txid: tx.txid,
                    vout: vout as u32,
                };
                let coin = Coin {
                    value: output.value,
                    script_pubkey: output.script_pubkey.clone(),
                    block_height: block.height,
                };

                let account = owner_account(&coin.script_pubkey, self.params);
                *deltas.entry(account.clone()).or_default() += coin.value as i128;
                batch.put_cf(cf_coins, outpoint_key(&outpoint), coin.encode());
                batch.put_cf(cf_accounts, account_coin_key(&account, &outpoint), b"");
                pending.insert(outpoint, coin);
            }
        }

        // Sparse balance history: one absolute entry per account whose
        // balance changed in this block.
        for (account, delta) in deltas {
            if delta == 0 {
                continue;
            }
            let current = self.balance(&account, u64::MAX)? as i128;
            let updated = current + delta;
            if updated < 0 {
                return Err(Error::BalanceUnderflow {
                    account,
                    height: block.height,
                });
            }
            batch.put_cf(
                cf_balances,
                balance_key(&account, block.height),
                (updated as u64).to_le_bytes(),
            );
        }

        let record = StoredBlock {
            block: block.clone(),
            spent_coins,
        };
        let encoded = bincode::serialize(&record)?;
        let compressed = match self.codec.compress(TRANSACTION_NAMESPACE, &encoded) {
            Ok(compressed) => compressed,
            Err(err) => {
                tracing::warn!(%err, height = block.height, "block compression failed, retrying");
                self.codec.compress(TRANSACTION_NAMESPACE, &encoded)?
            }
        };

        batch.put_cf(cf_blocks, block.hash.to_byte_array(), compressed);
        batch.put_cf(
            cf_meta,
            height_index_key(block.height),
            block.hash.to_byte_array(),
        );
        let head = HeadPointer {
            hash: block.hash,
            height: block.height,
        };
        batch.put_cf(cf_meta, meta_keys::HEAD, bincode::serialize(&head)?);

        self.db.write(batch)?;
        *self.head.write() = Some(head);

        tracing::debug!(
            height = block.height,
            txs = block.transactions.len(),
            "applied block"
        );
        Ok(())
    }

    /// Reverts the head block, restoring the stores to their exact state
    /// before it was applied. Returns the reverted block.
    pub fn revert_head(&self) -> Result<Block> {
        let head = self.head().ok_or(Error::NoHead)?;
        let record = self
            .stored_block(&head.hash)?
            .ok_or(Error::BlockNotFound(head.hash))?;

        let cf_blocks = self.cf_handle(cf::BLOCKS)?;
        let cf_coins = self.cf_handle(cf::COINS)?;
        let cf_accounts = self.cf_handle(cf::ACCOUNT_COINS)?;
        let cf_balances = self.cf_handle(cf::BALANCES)?;
        let cf_meta = self.cf_handle(cf::META)?;

        let mut batch = WriteBatch::default();
        let mut touched: HashSet<String> = HashSet::new();

        // Destroy the block's outputs. Outputs already spent within the
        // block are absent; deleting them again is a no-op.
        for tx in &record.block.transactions {
            for (vout, output) in tx.outputs.iter().enumerate() {
                let outpoint = OutPoint {
                    txid: tx.txid,
                    vout: vout as u32,
                };
                let account = owner_account(&output.script_pubkey, self.params);
                batch.delete_cf(cf_coins, outpoint_key(&outpoint));
                batch.delete_cf(cf_accounts, account_coin_key(&account, &outpoint));
                touched.insert(account);
            }
        }

        // Resurrect the coins the block spent.
        for (outpoint, coin) in &record.spent_coins {
            let account = owner_account(&coin.script_pubkey, self.params);
            batch.put_cf(cf_coins, outpoint_key(outpoint), coin.encode());
            batch.put_cf(cf_accounts, account_coin_key(&account, outpoint), b"");
            touched.insert(account);
        }

        // Balance entries are only ever written at the applied block's
        // height, so deleting that height restores the previous history.
        for account in &touched {
            batch.delete_cf(cf_balances, balance_key(account, head.height));
        }

        batch.delete_cf(cf_blocks, head.hash.to_byte_array());
        batch.delete_cf(cf_meta, height_index_key(head.height));

        let new_head = if head.height == 0 {
            batch.delete_cf(cf_meta, meta_keys::HEAD);
            None
        } else {
            let head = HeadPointer {
                hash: record.block.parent_hash,
                height: head.height - 1,
            };
            batch.put_cf(cf_meta, meta_keys::HEAD, bincode::serialize(&head)?);
            Some(head)
        };

        self.db.write(batch)?;
        *self.head.write() = new_head;

        tracing::info!(
            height = head.height,
            hash = %head.hash,
            "reverted block"
        );
        Ok(record.block)
    }

    /// Looks up a block by hash.
    pub fn block(&self, hash: &BlockHash) -> Result<Option<Block>> {
        Ok(self.stored_block(hash)?.map(|record| record.block))
    }

    /// Looks up the hash of the applied block at a height.
    pub fn block_hash_at(&self, height: u64) -> Result<Option<BlockHash>> {
        let cf_meta = self.cf_handle(cf::META)?;
        match self.db.get_cf(cf_meta, height_index_key(height))? {
            Some(bytes) => BlockHash::from_slice(&bytes)
                .map(Some)
                .map_err(|e| Error::Deserialization(e.to_string())),
            None => Ok(None),
        }
    }

    /// Looks up a block by height.
    pub fn block_at(&self, height: u64) -> Result<Option<Block>> {
        match self.block_hash_at(height)? {
            Some(hash) => self.block(&hash),
            None => Ok(None),
        }
    }

    /// Looks up a coin by outpoint.
    pub fn coin(&self, outpoint: &OutPoint) -> Result<Option<Coin>> {
        let cf_coins = self.cf_handle(cf::COINS)?;
        match self.db.get_cf(cf_coins, outpoint_key(outpoint))? {
            Some(bytes) => Coin::decode(&bytes)
                .map(Some)
                .map_err(|e| Error::Deserialization(e.to_string())),
            None => Ok(None),
        }
    }

    /// Enumerates the coins owned by an account.
    pub fn coins(&self, account: &str) -> Result<Vec<(OutPoint, Coin)>> {
        let cf_accounts = self.cf_handle(cf::ACCOUNT_COINS)?;
        let prefix = account_prefix(account);

        let mut coins = Vec::new();
        let mut iter = self.db.raw_iterator_cf(cf_accounts);
        iter.seek(&prefix);
        while iter.valid() {
            let Some(key) = iter.key() else { break };
            if !key.starts_with(&prefix) {
                break;
            }
            let outpoint = key_to_outpoint(&key[prefix.len()..])
                .ok_or_else(|| Error::Deserialization("bad account coin key".into()))?;
            let coin = self.coin(&outpoint)?.ok_or(Error::CoinNotFound(outpoint))?;
            coins.push((outpoint, coin));
            iter.next();
        }
        iter.status()?;
        Ok(coins)
    }

    /// The account's balance as of the end of `height`: the value of the
    /// most recent balance entry at or below it.
    pub fn balance(&self, account: &str, height: u64) -> Result<u64> {
        let cf_balances = self.cf_handle(cf::BALANCES)?;
        let prefix = account_prefix(account);

        let mut iter = self.db.raw_iterator_cf(cf_balances);
        iter.seek_for_prev(balance_key(account, height));
        if iter.valid() {
            if let (Some(key), Some(value)) = (iter.key(), iter.value()) {
                if key.starts_with(&prefix) {
                    let bytes: [u8; 8] = value
                        .try_into()
                        .map_err(|_| Error::Deserialization("bad balance entry".into()))?;
                    return Ok(u64::from_le_bytes(bytes));
                }
            }
        }
        iter.status()?;
        Ok(0)
    }

    fn stored_block(&self, hash: &BlockHash) -> Result<Option<StoredBlock>> {
        let cf_blocks = self.cf_handle(cf::BLOCKS)?;
        let Some(compressed) = self.db.get_cf(cf_blocks, hash.to_byte_array())? else {
            return Ok(None);
        };
        let encoded = self.codec.decompress(TRANSACTION_NAMESPACE, &compressed)?;
        bincode::deserialize(&encoded)
            .map(Some)
            .map_err(|e| Error::Deserialization(e.to_string()))
    }

    fn load_head(db: &DB) -> Result<Option<HeadPointer>> {
        let Some(cf_meta) = db.cf_handle(cf::META) else {
            return Ok(None);
        };
        match db.get_cf(cf_meta, meta_keys::HEAD)? {
            Some(bytes) => bincode::deserialize(&bytes)
                .map(Some)
                .map_err(|e| Error::Deserialization(e.to_string())),
            None => Ok(None),
        }
    }

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or(Error::NotInitialized)
    }
}

fn height_index_key(height: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(meta_keys::HEIGHT_INDEX_PREFIX.len() + 8);
    key.extend(meta_keys::HEIGHT_INDEX_PREFIX);
    key.extend(height.to_be_bytes());
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use thought_primitives::{Transaction, TxInput, TxOutput};
    use thought_script::address::{pay_to_pubkey_hash_script, pubkey_hash_address};

    fn open_temp() -> (tempfile::TempDir, IndexerStore) {
        let dir = tempfile::tempdir().unwrap();
        let store =
            IndexerStore::open(dir.path(), Network::Testnet, DictionaryCodec::new()).unwrap();
        (dir, store)
    }

    fn test_account(tag: u8) -> (String, Vec<u8>) {
        let hash = [tag; 20];
        let address = pubkey_hash_address(&hash, Network::Testnet.params());
        (address, pay_to_pubkey_hash_script(&hash))
    }

    fn block_hash(tag: u8) -> BlockHash {
        BlockHash::from_slice(&[tag; 32]).unwrap()
    }

    fn txid(tag: u8) -> bitcoin::Txid {
        bitcoin::Txid::from_slice(&[tag; 32]).unwrap()
    }

    fn coinbase_tx(tag: u8, outputs: Vec<TxOutput>) -> Transaction {
        Transaction {
            txid: txid(tag),
            version: 2,
            lock_time: 0,
            inputs: vec![TxInput {
                previous_output: None,
                signature_script: vec![0x01, tag],
                sequence: u32::MAX,
            }],
            outputs,
        }
    }

    fn spend_tx(tag: u8, spends: Vec<OutPoint>, outputs: Vec<TxOutput>) -> Transaction {
        Transaction {
            txid: txid(tag),
            version: 2,
            lock_time: 0,
            inputs: spends
                .into_iter()
                .map(|previous_output| TxInput {
                    previous_output: Some(previous_output),
                    signature_script: Vec::new(),
                    sequence: u32::MAX,
                })
                .collect(),
            outputs,
        }
    }

    fn genesis(script: &[u8]) -> Block {
        Block {
            hash: block_hash(0x10),
            parent_hash: block_hash(0x00),
            height: 0,
            transactions: vec![coinbase_tx(
                0xa0,
                vec![TxOutput {
                    value: 5_000_000_000,
                    script_pubkey: script.to_vec(),
                }],
            )],
        }
    }

    /// Full contents of every column family, for byte-identical snapshots.
    fn snapshot(store: &IndexerStore) -> Vec<(String, Vec<(Vec<u8>, Vec<u8>)>)> {
        [cf::BLOCKS, cf::COINS, cf::ACCOUNT_COINS, cf::BALANCES, cf::META]
            .iter()
            .map(|name| {
                let cf = store.db.cf_handle(name).unwrap();
                let entries = store
                    .db
                    .iterator_cf(cf, rocksdb::IteratorMode::Start)
                    .map(|entry| {
                        let (k, v) = entry.unwrap();
                        (k.to_vec(), v.to_vec())
                    })
                    .collect();
                (name.to_string(), entries)
            })
            .collect()
    }

    #[test]
    fn apply_creates_coins_and_balances() {
        let (_dir, store) = open_temp();
        let (account, script) = test_account(0x01);

        store.apply(&genesis(&script)).unwrap();

        let head = store.head().unwrap();
        assert_eq!(head.height, 0);
        assert_eq!(store.balance(&account, 0).unwrap(), 5_000_000_000);

        let coins = store.coins(&account).unwrap();
        assert_eq!(coins.len(), 1);
        assert_eq!(coins[0].1.value, 5_000_000_000);
        assert_eq!(coins[0].1.block_height, 0);

        assert!(store.block_at(0).unwrap().is_some());
        assert!(store.block(&head.hash).unwrap().is_some());
    }

    #[test]
    fn spending_moves_balance_between_accounts() {
        let (_dir, store) = open_temp();
        let (alice, alice_script) = test_account(0x01);
        let (bob, bob_script) = test_account(0x02);

        let genesis = genesis(&alice_script);
        store.apply(&genesis).unwrap();

        let coinbase_outpoint = OutPoint {
            txid: genesis.transactions[0].txid,
            vout: 0,
        };
        let block1 = Block {
            hash: block_hash(0x11),
            parent_hash: genesis.hash,
            height: 1,
            transactions: vec![
                coinbase_tx(
                    0xa1,
                    vec![TxOutput {
                        value: 5_000_000_000,
                        script_pubkey: alice_script.clone(),
                    }],
                ),
                spend_tx(
                    0xb1,
                    vec![coinbase_outpoint],
                    vec![
                        TxOutput {
                            value: 3_000_000_000,
                            script_pubkey: bob_script.clone(),
                        },
                        TxOutput {
                            value: 1_900_000_000,
                            script_pubkey: alice_script.clone(),
                        },
                    ],
                ),
            ],
        };
        store.apply(&block1).unwrap();

        // Conservation: balances equal the sum of owned coins.
        assert_eq!(store.balance(&bob, 1).unwrap(), 3_000_000_000);
        assert_eq!(
            store.balance(&alice, 1).unwrap(),
            5_000_000_000 + 1_900_000_000
        );
        let alice_coin_sum: u64 = store
            .coins(&alice)
            .unwrap()
            .iter()
            .map(|(_, coin)| coin.value)
            .sum();
        assert_eq!(alice_coin_sum, store.balance(&alice, 1).unwrap());

        // Balance history answers "as of height".
        assert_eq!(store.balance(&alice, 0).unwrap(), 5_000_000_000);
        assert_eq!(store.balance(&bob, 0).unwrap(), 0);
        assert_eq!(store.balance(&bob, 100).unwrap(), 3_000_000_000);

        // The spent coinbase is gone.
        assert!(store.coin(&coinbase_outpoint).unwrap().is_none());
    }

    #[test]
    fn in_block_spend_leaves_no_intermediate_coin() {
        let (_dir, store) = open_temp();
        let (alice, alice_script) = test_account(0x01);
        let (bob, bob_script) = test_account(0x02);

        let genesis = genesis(&alice_script);
        store.apply(&genesis).unwrap();
        let coinbase_outpoint = OutPoint {
            txid: genesis.transactions[0].txid,
            vout: 0,
        };

        // tx b1 spends the coinbase to bob; tx b2 spends b1's output back to
        // alice within the same block.
        let hop = spend_tx(
            0xb1,
            vec![coinbase_outpoint],
            vec![TxOutput {
                value: 4_000_000_000,
                script_pubkey: bob_script.clone(),
            }],
        );
        let hop_outpoint = OutPoint {
            txid: hop.txid,
            vout: 0,
        };
        let back = spend_tx(
            0xb2,
            vec![hop_outpoint],
            vec![TxOutput {
                value: 4_000_000_000,
                script_pubkey: alice_script.clone(),
            }],
        );

        let block1 = Block {
            hash: block_hash(0x11),
            parent_hash: genesis.hash,
            height: 1,
            transactions: vec![coinbase_tx(0xa1, vec![]), hop, back],
        };
        store.apply(&block1).unwrap();

        assert!(store.coin(&hop_outpoint).unwrap().is_none());
        assert_eq!(store.balance(&bob, 1).unwrap(), 0);
        assert_eq!(store.coins(&bob).unwrap().len(), 0);
        assert_eq!(store.balance(&alice, 1).unwrap(), 4_000_000_000);

        // Reverting restores the pre-block state without resurrecting the
        // intermediate coin.
        store.revert_head().unwrap();
        assert!(store.coin(&hop_outpoint).unwrap().is_none());
        assert_eq!(store.balance(&alice, 1).unwrap(), 5_000_000_000);
    }

    #[test]
    fn revert_restores_byte_identical_state() {
        let (_dir, store) = open_temp();
        let (_, alice_script) = test_account(0x01);
        let (_, bob_script) = test_account(0x02);

        let genesis = genesis(&alice_script);
        store.apply(&genesis).unwrap();
        let coinbase_outpoint = OutPoint {
            txid: genesis.transactions[0].txid,
            vout: 0,
        };

        let before = snapshot(&store);

        let block1 = Block {
            hash: block_hash(0x11),
            parent_hash: genesis.hash,
            height: 1,
            transactions: vec![
                coinbase_tx(
                    0xa1,
                    vec![TxOutput {
                        value: 5_000_000_000,
                        script_pubkey: bob_script.clone(),
                    }],
                ),
                spend_tx(
                    0xb1,
                    vec![coinbase_outpoint],
                    vec![TxOutput {
                        value: 5_000_000_000,
                        script_pubkey: bob_script,
                    }],
                ),
            ],
        };
        store.apply(&block1).unwrap();
        assert_eq!(store.head().unwrap().height, 1);

        let reverted = store.revert_head().unwrap();
        assert_eq!(reverted.hash, block1.hash);
        assert_eq!(store.head().unwrap().height, 0);
        assert_eq!(snapshot(&store), before);
    }

    #[test]
    fn head_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let (_, script) = test_account(0x01);
        let genesis = genesis(&script);

        {
            let store =
                IndexerStore::open(dir.path(), Network::Testnet, DictionaryCodec::new()).unwrap();
            store.apply(&genesis).unwrap();
        }

        let store =
            IndexerStore::open(dir.path(), Network::Testnet, DictionaryCodec::new()).unwrap();
        let head = store.head().unwrap();
        assert_eq!(head.height, 0);
        assert_eq!(head.hash, genesis.hash);
        assert_eq!(store.block_at(0).unwrap().unwrap(), genesis);
    }

    #[test]
    fn rejects_blocks_that_do_not_extend_head() {
        let (_dir, store) = open_temp();
        let (_, script) = test_account(0x01);
        store.apply(&genesis(&script)).unwrap();

        let orphan = Block {
            hash: block_hash(0x22),
            parent_hash: block_hash(0x33),
            height: 1,
            transactions: vec![coinbase_tx(0xa1, vec![])],
        };
        assert!(matches!(
            store.apply(&orphan),
            Err(Error::OutOfOrder { .. })
        ));
    }

    #[test]
    fn missing_referenced_coin_is_an_invariant_violation() {
        let (_dir, store) = open_temp();
        let (_, script) = test_account(0x01);
        store.apply(&genesis(&script)).unwrap();

        let bogus = OutPoint {
            txid: txid(0x99),
            vout: 3,
        };
        let genesis_hash = store.head().unwrap().hash;
        let block1 = Block {
            hash: block_hash(0x11),
            parent_hash: genesis_hash,
            height: 1,
            transactions: vec![coinbase_tx(0xa1, vec![]), spend_tx(0xb1, vec![bogus], vec![])],
        };
        assert!(matches!(
            store.apply(&block1),
            Err(Error::CoinNotFound(outpoint)) if outpoint == bogus
        ));
        // The failed apply left no trace.
        assert_eq!(store.head().unwrap().height, 0);
    }

    #[test]
    fn unknown_scripts_are_tracked_under_raw_hex() {
        let (_dir, store) = open_temp();
        let nulldata = vec![0x6a, 0x04, 0xde, 0xad, 0xbe, 0xef];
        let account = hex::encode(&nulldata);

        let block = Block {
            hash: block_hash(0x10),
            parent_hash: block_hash(0x00),
            height: 0,
            transactions: vec![coinbase_tx(
                0xa0,
                vec![TxOutput {
                    value: 0,
                    script_pubkey: nulldata,
                }],
            )],
        };
        store.apply(&block).unwrap();

        // The coin exists for the pseudo-account; zero value means no
        // balance entry.
        assert_eq!(store.coins(&account).unwrap().len(), 1);
        assert_eq!(store.balance(&account, 0).unwrap(), 0);
    }

    #[test]
    fn revert_on_empty_store_fails() {
        let (_dir, store) = open_temp();
        assert!(matches!(store.revert_head(), Err(Error::NoHead)));
    }
}
