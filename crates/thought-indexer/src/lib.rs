//! Concurrent block indexer for the Thought Rosetta implementation.
//!
//! The [`Syncer`] pulls blocks from the node in parallel while applying them
//! in strict canonical order through the single-writer store; the
//! [`Indexer`] facade exposes the read-only views the Data API adapts.

mod convert;
mod error;
mod indexer;
mod syncer;

pub use convert::block_from_rpc;
pub use error::{Error, Result};
pub use indexer::Indexer;
pub use syncer::{Syncer, SyncerOptions};
