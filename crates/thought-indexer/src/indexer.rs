//! The read-only facade the Data API adapts.

use crate::{Error, Result};
use bitcoin::{BlockHash, OutPoint, Script};
use std::sync::Arc;
use thought_node_rpc::types::ScriptPubKey;
use thought_primitives::{Block, IndexerConfig, Network, Params};
use thought_script::address::addresses;
use thought_script::classify;
use thought_store::{Coin, DictionaryCodec, HeadPointer, IndexerStore};

/// Read-only access to the indexed chain state.
///
/// The syncer owns all writes; this facade only takes read snapshots of the
/// underlying stores, so Data API handlers never contend with the applier.
pub struct Indexer {
    store: Arc<IndexerStore>,
    params: &'static Params,
}

impl Indexer {
    /// Opens the stores under the configured data directory, loading any
    /// registered compression dictionaries.
    pub fn open(config: &IndexerConfig, network: Network) -> Result<Self> {
        let mut codec = DictionaryCodec::new();
        for entry in &config.compression {
            codec
                .load_dictionary(entry.namespace.clone(), &entry.dictionary_path)
                .map_err(|source| Error::Dictionary {
                    namespace: entry.namespace.clone(),
                    source,
                })?;
        }

        let store = IndexerStore::open(&config.indexer_path(), network, codec)?;
        Ok(Self {
            store: Arc::new(store),
            params: network.params(),
        })
    }

    /// Wraps an already opened store.
    pub fn with_store(store: Arc<IndexerStore>, network: Network) -> Self {
        Self {
            store,
            params: network.params(),
        }
    }

    /// Handle to the underlying store, for wiring up the syncer.
    pub fn store(&self) -> Arc<IndexerStore> {
        self.store.clone()
    }

    /// The most recently applied block.
    pub fn tip(&self) -> Option<HeadPointer> {
        self.store.head()
    }

    /// Block lookup by hash.
    pub fn block(&self, hash: &BlockHash) -> Result<Option<Block>> {
        Ok(self.store.block(hash)?)
    }

    /// Block lookup by height on the applied chain.
    pub fn block_at(&self, height: u64) -> Result<Option<Block>> {
        Ok(self.store.block_at(height)?)
    }

    /// An account's balance as of `height`, or at the tip when `None`.
    pub fn balance(&self, account: &str, height: Option<u64>) -> Result<u64> {
        Ok(self.store.balance(account, height.unwrap_or(u64::MAX))?)
    }

    /// The coins an account currently owns.
    pub fn coins(&self, account: &str) -> Result<Vec<(OutPoint, Coin)>> {
        Ok(self.store.coins(account)?)
    }

    /// The script of a tracked coin, in the node's reporting shape. Used by
    /// the construction metadata phase.
    pub fn script_pub_key(&self, outpoint: &OutPoint) -> Result<Option<ScriptPubKey>> {
        let Some(coin) = self.store.coin(outpoint)? else {
            return Ok(None);
        };

        let class = classify(&coin.script_pubkey);
        let addrs = addresses(&class, self.params);
        Ok(Some(ScriptPubKey {
            asm: Script::from_bytes(&coin.script_pubkey).to_asm_string(),
            hex: hex::encode(&coin.script_pubkey),
            req_sigs: (class.required_sigs() > 0).then(|| class.required_sigs() as i64),
            script_type: class.name().to_string(),
            addresses: (!addrs.is_empty()).then_some(addrs),
        }))
    }
}
