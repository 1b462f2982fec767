//! Indexer configuration.
//!
//! Environment parsing lives with the embedding binary; this module only
//! defines the typed values the core consumes.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Subdirectory of the data directory holding the indexer stores.
pub const INDEXER_DIR: &str = "indexer";

/// Subdirectory of the data directory holding the bundled node's state.
pub const NODE_DIR: &str = "thoughtd";

/// Whether the implementation may make outbound connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Outbound connections permitted; the indexer runs.
    Online,
    /// No outbound connections; only the offline Construction phases serve.
    Offline,
}

/// Node-side pruning policy driven by the indexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PruningConfig {
    /// How often to attempt a prune.
    pub frequency: Duration,
    /// How many blocks of history to retain on the node.
    pub depth: u64,
    /// The node refuses to prune below this height.
    pub min_height: u64,
}

impl Default for PruningConfig {
    fn default() -> Self {
        Self {
            frequency: Duration::from_secs(60 * 60),
            depth: 10_000,
            min_height: 100_000,
        }
    }
}

/// A trained compression dictionary registered for a value namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressorEntry {
    /// Namespace the dictionary applies to, e.g. `transaction`.
    pub namespace: String,
    /// Path of the precomputed dictionary artifact.
    pub dictionary_path: PathBuf,
}

/// Configuration of the online indexer.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// Root data directory; stores live under [`INDEXER_DIR`] below it.
    pub data_dir: PathBuf,
    /// Number of look-ahead fetch slots. Zero means "pick from parallelism".
    pub lookahead: usize,
    pub pruning: PruningConfig,
    /// Dictionary entries for the persistence codec.
    pub compression: Vec<CompressorEntry>,
}

impl IndexerConfig {
    /// Creates a configuration rooted at `data_dir` with default pruning and
    /// no trained dictionaries.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            lookahead: 0,
            pruning: PruningConfig::default(),
            compression: Vec::new(),
        }
    }

    /// Directory holding the indexer stores.
    pub fn indexer_path(&self) -> PathBuf {
        self.data_dir.join(INDEXER_DIR)
    }

    /// Directory holding the bundled node's state.
    pub fn node_path(&self) -> PathBuf {
        self.data_dir.join(NODE_DIR)
    }

    /// Effective look-ahead: the configured value, or twice the available
    /// parallelism when unset.
    pub fn effective_lookahead(&self) -> usize {
        if self.lookahead > 0 {
            return self.lookahead;
        }
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        cores * 2
    }

    /// Dictionary path registered for `namespace`, if any.
    pub fn dictionary_for(&self, namespace: &str) -> Option<&Path> {
        self.compression
            .iter()
            .find(|entry| entry.namespace == namespace)
            .map(|entry| entry.dictionary_path.as_path())
    }
}
