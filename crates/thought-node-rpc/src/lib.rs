//! Typed JSON-RPC client for the Thought full node.
//!
//! The indexer and construction core consume the [`NodeRpc`] trait; the
//! [`Client`] implements it over HTTP with Basic authentication and retries
//! transient failures with jittered exponential backoff.

pub mod types;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use bitcoin::{BlockHash, Txid};
use types::{FeeEstimate, GetBlock, GetRawTransaction};

/// Number of attempts before a call is given up on.
const RETRY_ATTEMPTS: u32 = 5;

/// Delay before the second attempt; doubles each retry (100 ms -> 3.2 s).
const RETRY_BASE_DELAY: Duration = Duration::from_millis(100);

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// RPC error code the node returns for an out-of-range block height.
const RPC_INVALID_PARAMETER: i64 = -8;

/// RPC error code for a block or transaction the node does not have.
const RPC_INVALID_ADDRESS_OR_KEY: i64 = -5;

/// RPC error code while the node is still warming up.
const RPC_IN_WARMUP: i64 = -28;

/// Errors talking to the node.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport-level failure.
    #[error("node request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The node answered with a JSON-RPC error.
    #[error("node rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The response carried neither result nor error.
    #[error("malformed rpc response for {0}")]
    MalformedResponse(&'static str),
}

impl Error {
    /// Whether the call may succeed if simply retried.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            Error::Rpc { code, .. } => *code == RPC_IN_WARMUP,
            Error::MalformedResponse(_) => false,
        }
    }

    /// Whether the node reported not having the requested block or
    /// transaction yet. The syncer treats this as "node behind" and polls.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::Rpc { code, .. }
                if *code == RPC_INVALID_PARAMETER || *code == RPC_INVALID_ADDRESS_OR_KEY
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// The typed interface the indexer and construction core consume.
#[async_trait::async_trait]
pub trait NodeRpc: Send + Sync + 'static {
    /// `getblockhash`: hash of the block at the given height.
    async fn get_block_hash(&self, height: u64) -> Result<BlockHash>;

    /// `getblock` with verbosity 2: the block with decoded transactions.
    async fn get_block(&self, hash: &BlockHash) -> Result<GetBlock>;

    /// `getrawtransaction` with verbose output.
    async fn get_raw_transaction(&self, txid: &Txid) -> Result<GetRawTransaction>;

    /// `sendrawtransaction`: broadcasts a serialized transaction.
    async fn send_raw_transaction(&self, transaction_hex: &str) -> Result<Txid>;

    /// `estimatesmartfee`: fee rate estimate for a confirmation target.
    async fn estimate_smart_fee(&self, conf_target: u64) -> Result<FeeEstimate>;

    /// `pruneblockchain`: asks the node to prune up to the given height.
    async fn prune_blockchain(&self, height: u64) -> Result<u64>;
}

/// Basic-auth credentials for the node RPC port.
#[derive(Debug, Clone)]
pub struct Auth {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: &'static str,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcResponseError>,
}

#[derive(Deserialize)]
struct RpcResponseError {
    code: i64,
    message: String,
}

/// JSON-RPC client for the node.
pub struct Client {
    http: reqwest::Client,
    url: String,
    auth: Option<Auth>,
}

impl Client {
    /// Creates a client for the node RPC endpoint.
    pub fn new(url: impl Into<String>, auth: Option<Auth>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            url: url.into(),
            auth,
        })
    }

    /// Performs one JSON-RPC call with retries on transient failures.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: serde_json::Value,
    ) -> Result<T> {
        let mut delay = RETRY_BASE_DELAY;
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.call_once(method, params.clone()).await {
                Ok(result) => return Ok(result),
                Err(err) if err.is_transient() && attempt < RETRY_ATTEMPTS => {
                    tracing::debug!(method, attempt, ?delay, %err, "retrying node rpc call");
                    // Full jitter on top of the exponential step keeps
                    // concurrent fetchers from retrying in lockstep.
                    let jitter = delay.mul_f64(fastrand::f64() * 0.5);
                    tokio::time::sleep(delay + jitter).await;
                    delay *= 2;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn call_once<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: serde_json::Value,
    ) -> Result<T> {
        let request = RpcRequest {
            jsonrpc: "1.0",
            id: "rosetta-thought",
            method,
            params,
        };

        let mut builder = self.http.post(&self.url).json(&request);
        if let Some(auth) = &self.auth {
            builder = builder.basic_auth(&auth.username, Some(&auth.password));
        }

        let response: RpcResponse<T> = builder.send().await?.json().await?;
        if let Some(error) = response.error {
            return Err(Error::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        response.result.ok_or(Error::MalformedResponse(method))
    }
}

#[async_trait::async_trait]
impl NodeRpc for Client {
    async fn get_block_hash(&self, height: u64) -> Result<BlockHash> {
        self.call("getblockhash", serde_json::json!([height])).await
    }

    async fn get_block(&self, hash: &BlockHash) -> Result<GetBlock> {
        self.call("getblock", serde_json::json!([hash.to_string(), 2]))
            .await
    }

    async fn get_raw_transaction(&self, txid: &Txid) -> Result<GetRawTransaction> {
        self.call("getrawtransaction", serde_json::json!([txid.to_string(), true]))
            .await
    }

    async fn send_raw_transaction(&self, transaction_hex: &str) -> Result<Txid> {
        self.call("sendrawtransaction", serde_json::json!([transaction_hex]))
            .await
    }

    async fn estimate_smart_fee(&self, conf_target: u64) -> Result<FeeEstimate> {
        self.call("estimatesmartfee", serde_json::json!([conf_target]))
            .await
    }

    async fn prune_blockchain(&self, height: u64) -> Result<u64> {
        self.call("pruneblockchain", serde_json::json!([height]))
            .await
    }
}
