//! The concurrent syncer.
//!
//! A bounded ring of look-ahead slots fetches blocks in parallel; a single
//! applier loop owns every store write and processes slots in strictly
//! increasing height order. Fetch workers never touch shared state — each
//! one delivers its block (or failure) through its slot's completion
//! channel. A reorg reverts exactly one block, invalidates the ring, and
//! restarts fetching from the new head.

use crate::convert::block_from_rpc;
use crate::{Error, Result};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use thought_node_rpc::NodeRpc;
use thought_primitives::{Block, IndexerConfig, PruningConfig};
use thought_store::IndexerStore;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// How many times a block that fails to decode is re-fetched before the
/// syncer gives up on it.
const MALFORMED_FETCH_ATTEMPTS: u32 = 3;

/// Delay between polls while the node has not reached a requested height.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Tuning knobs of the syncer.
#[derive(Debug, Clone)]
pub struct SyncerOptions {
    /// Number of look-ahead fetch slots.
    pub lookahead: usize,
    /// Delay between polls when the node is behind the requested height.
    pub poll_interval: Duration,
    pub pruning: PruningConfig,
}

impl SyncerOptions {
    /// Derives syncer options from the indexer configuration.
    pub fn from_config(config: &IndexerConfig) -> Self {
        Self {
            lookahead: config.effective_lookahead(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            pruning: config.pruning.clone(),
        }
    }
}

/// One look-ahead fetch in progress.
struct Slot {
    height: u64,
    rx: oneshot::Receiver<Result<Block>>,
    task: JoinHandle<()>,
}

/// The applier plus its fetch workers and pruner.
pub struct Syncer<C> {
    client: Arc<C>,
    store: Arc<IndexerStore>,
    options: SyncerOptions,
}

impl<C: NodeRpc> Syncer<C> {
    pub fn new(client: Arc<C>, store: Arc<IndexerStore>, options: SyncerOptions) -> Self {
        Self {
            client,
            store,
            options,
        }
    }

    /// Runs until the shutdown channel fires or a fatal error occurs.
    ///
    /// Cancellation is cooperative: the applier finishes the block in
    /// progress, aborts the in-flight fetches, and returns.
    pub async fn run(self, mut shutdown: oneshot::Receiver<()>) -> Result<()> {
        let pruner = tokio::spawn(prune_loop(
            self.client.clone(),
            self.store.clone(),
            self.options.pruning.clone(),
        ));

        let mut slots: VecDeque<Slot> = VecDeque::new();
        let result = self.sync_loop(&mut slots, &mut shutdown).await;

        drain_slots(&mut slots);
        pruner.abort();
        result
    }

    async fn sync_loop(
        &self,
        slots: &mut VecDeque<Slot>,
        shutdown: &mut oneshot::Receiver<()>,
    ) -> Result<()> {
        loop {
            self.refill_slots(slots);
            let mut slot = slots.pop_front().expect("ring has at least one slot; qed");

            tokio::select! {
                _ = &mut *shutdown => {
                    slot.task.abort();
                    tracing::info!("syncer shutting down");
                    return Ok(());
                }
                fetched = &mut slot.rx => {
                    let block = fetched.map_err(|_| Error::FetchAborted(slot.height))??;
                    self.process_block(block, slots).await?;
                }
            }
        }
    }

    /// Applies the block if it extends the head, otherwise reverts the head
    /// by one and invalidates the look-ahead ring.
    async fn process_block(&self, block: Block, slots: &mut VecDeque<Slot>) -> Result<()> {
        let head = self.store.head();
        let extends_head = match &head {
            None => true,
            Some(head) => block.parent_hash == head.hash,
        };

        if extends_head {
            return self.apply_with_refetch(block).await;
        }

        let head = head.expect("parent mismatch implies a head; qed");
        tracing::warn!(
            height = head.height,
            head = %head.hash,
            incoming = %block.hash,
            "reorg detected, reverting head"
        );
        self.store.revert_head()?;
        // The ring was fetched for the abandoned branch.
        drain_slots(slots);
        Ok(())
    }

    /// Applies a block; a missing referenced coin triggers one re-fetch of
    /// the block from the node before the error becomes fatal.
    async fn apply_with_refetch(&self, block: Block) -> Result<()> {
        match self.store.apply(&block) {
            Ok(()) => Ok(()),
            Err(thought_store::Error::CoinNotFound(outpoint)) => {
                tracing::warn!(
                    %outpoint,
                    height = block.height,
                    "input coin missing, re-fetching block"
                );
                let fresh = fetch_block(
                    self.client.as_ref(),
                    block.height,
                    self.options.poll_interval,
                )
                .await?;
                self.store.apply(&fresh).map_err(Error::from)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Tops the ring up to the configured look-ahead, fetching consecutive
    /// heights past the last slot.
    fn refill_slots(&self, slots: &mut VecDeque<Slot>) {
        let lookahead = self.options.lookahead.max(1);
        let base = self.store.head().map(|head| head.height + 1).unwrap_or(0);
        let mut next = base + slots.len() as u64;
        while slots.len() < lookahead {
            slots.push_back(self.spawn_fetch(next));
            next += 1;
        }
    }

    fn spawn_fetch(&self, height: u64) -> Slot {
        let (tx, rx) = oneshot::channel();
        let client = self.client.clone();
        let poll_interval = self.options.poll_interval;
        let task = tokio::spawn(async move {
            let result = fetch_block(client.as_ref(), height, poll_interval).await;
            // The applier may have dropped the slot during a reorg.
            let _ = tx.send(result);
        });
        Slot { height, rx, task }
    }
}

/// Fetches and decodes the block at a height, polling while the node has
/// not reached it yet.
async fn fetch_block<C: NodeRpc>(
    client: &C,
    height: u64,
    poll_interval: Duration,
) -> Result<Block> {
    let mut malformed_attempts = 0;
    loop {
        let hash = match client.get_block_hash(height).await {
            Ok(hash) => hash,
            Err(err) if err.is_not_found() => {
                tokio::time::sleep(poll_interval).await;
                continue;
            }
            Err(err) => return Err(err.into()),
        };

        let raw = match client.get_block(&hash).await {
            Ok(raw) => raw,
            Err(err) if err.is_not_found() => {
                // The block was pruned or reorged away between the two
                // calls; resolve the height again.
                tokio::time::sleep(poll_interval).await;
                continue;
            }
            Err(err) => return Err(err.into()),
        };

        match block_from_rpc(&raw) {
            Ok(block) => return Ok(block),
            Err(reason) => {
                malformed_attempts += 1;
                if malformed_attempts >= MALFORMED_FETCH_ATTEMPTS {
                    return Err(Error::MalformedBlock { height, reason });
                }
                tracing::warn!(height, %reason, "malformed block, re-fetching");
            }
        }
    }
}

/// Periodically asks the node to prune block storage the indexer no longer
/// needs. Failures are logged and retried on the next tick.
async fn prune_loop<C: NodeRpc>(client: Arc<C>, store: Arc<IndexerStore>, pruning: PruningConfig) {
    let mut interval = tokio::time::interval(pruning.frequency);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        let Some(head) = store.head() else { continue };
        if head.height <= pruning.min_height + pruning.depth {
            continue;
        }
        let target = head.height - pruning.depth;
        match client.prune_blockchain(target).await {
            Ok(pruned) => tracing::info!(target, pruned, "pruned node block storage"),
            Err(err) => tracing::warn!(%err, target, "prune failed, retrying on next tick"),
        }
    }
}

fn drain_slots(slots: &mut VecDeque<Slot>) {
    for slot in slots.drain(..) {
        slot.task.abort();
    }
}
