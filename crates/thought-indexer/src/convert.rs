//! Conversion from verbose RPC blocks to the canonical model.

use bitcoin::hashes::Hash;
use bitcoin::{BlockHash, OutPoint};
use thought_node_rpc::types::GetBlock;
use thought_primitives::{notions_from_tht, Block, Transaction, TxInput, TxOutput};

/// Decodes a verbose RPC block into the canonical model.
///
/// Returns a human-readable reason when the block is malformed; the syncer
/// re-fetches such blocks a bounded number of times before giving up.
pub fn block_from_rpc(rpc: &GetBlock) -> std::result::Result<Block, String> {
    let mut transactions = Vec::with_capacity(rpc.tx.len());

    for tx in &rpc.tx {
        let mut inputs = Vec::with_capacity(tx.vin.len());
        for vin in &tx.vin {
            let (previous_output, signature_script) = if let Some(coinbase) = &vin.coinbase {
                let script = hex::decode(coinbase)
                    .map_err(|e| format!("bad coinbase payload in {}: {e}", tx.txid))?;
                (None, script)
            } else {
                let txid = vin
                    .txid
                    .ok_or_else(|| format!("input without txid in {}", tx.txid))?;
                let vout = vin
                    .vout
                    .ok_or_else(|| format!("input without vout in {}", tx.txid))?;
                let script = match &vin.script_sig {
                    Some(script_sig) => hex::decode(&script_sig.hex)
                        .map_err(|e| format!("bad signature script in {}: {e}", tx.txid))?,
                    None => Vec::new(),
                };
                (Some(OutPoint { txid, vout }), script)
            };
            inputs.push(TxInput {
                previous_output,
                signature_script,
                sequence: vin.sequence,
            });
        }

        let mut outputs = Vec::with_capacity(tx.vout.len());
        for vout in &tx.vout {
            let value = notions_from_tht(vout.value)
                .map_err(|e| format!("bad output value in {}: {e}", tx.txid))?;
            let script_pubkey = hex::decode(&vout.script_pub_key.hex)
                .map_err(|e| format!("bad output script in {}: {e}", tx.txid))?;
            outputs.push(TxOutput {
                value,
                script_pubkey,
            });
        }

        transactions.push(Transaction {
            txid: tx.txid,
            version: tx.version,
            lock_time: tx.locktime,
            inputs,
            outputs,
        });
    }

    Ok(Block {
        hash: rpc.hash,
        parent_hash: rpc.previousblockhash.unwrap_or(BlockHash::all_zeros()),
        height: rpc.height,
        transactions,
    })
}
