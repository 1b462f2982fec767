//! Indexer error types.

/// Errors that stop the syncer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Store failure; includes invariant violations such as a missing
    /// referenced coin. Fatal so the supervisor restarts the process.
    #[error(transparent)]
    Store(#[from] thought_store::Error),

    /// Node RPC failure that survived the client's retries.
    #[error(transparent)]
    Rpc(#[from] thought_node_rpc::Error),

    /// A block could not be decoded after repeated fetches.
    #[error("malformed block at height {height}: {reason}")]
    MalformedBlock { height: u64, reason: String },

    /// A fetch worker went away without delivering its slot.
    #[error("fetch worker for height {0} terminated unexpectedly")]
    FetchAborted(u64),

    /// Configured compression dictionary could not be loaded.
    #[error("unable to load compression dictionary {namespace}: {source}")]
    Dictionary {
        namespace: String,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
