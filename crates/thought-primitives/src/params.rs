//! Thought network parameters.
//!
//! These values differentiate the main and test networks and are threaded
//! through as a [`Params`] value rather than consulted as globals.

use serde::{Deserialize, Serialize};

/// The Thought networks an implementation can run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Network {
    /// The main Thought network.
    Mainnet,
    /// The test network (version 3).
    Testnet,
}

impl Network {
    /// Returns the parameters for this network.
    pub fn params(self) -> &'static Params {
        match self {
            Network::Mainnet => &MAINNET_PARAMS,
            Network::Testnet => &TESTNET_PARAMS,
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Network::Mainnet => write!(f, "MainNet"),
            Network::Testnet => write!(f, "TestNet3"),
        }
    }
}

/// Defines a Thought network by its parameters.
///
/// Applications use these to differentiate networks as well as addresses and
/// keys for one network from those intended for another.
#[derive(Debug, Clone, PartialEq)]
pub struct Params {
    /// Human-readable identifier for the network.
    pub name: &'static str,
    /// Magic bytes identifying network messages.
    pub magic: u32,
    /// Default peer-to-peer port.
    pub default_port: u16,
    /// Default JSON-RPC port of the node.
    pub rpc_port: u16,
    /// First byte of a P2PKH address.
    pub pubkey_hash_addr_id: u8,
    /// First byte of a P2SH address.
    pub script_hash_addr_id: u8,
    /// First byte of a WIF private key.
    pub private_key_id: u8,
    /// BIP32 extended public key version bytes.
    pub hd_public_key_id: [u8; 4],
    /// BIP32 extended private key version bytes.
    pub hd_private_key_id: [u8; 4],
    /// BIP44 coin type used in hierarchical deterministic derivation paths.
    pub hd_coin_type: u32,
    /// Minimum fee rate in THT/kB accepted by the chain.
    pub min_fee_rate: f64,
    /// Minimum relay fee rate in THT/kB of the bundled node.
    pub min_relay_fee_rate: f64,
}

/// Parameters of the main Thought network.
pub const MAINNET_PARAMS: Params = Params {
    name: "main",
    magic: 0x5947_2ee4,
    default_port: 10618,
    rpc_port: 10617,
    pubkey_hash_addr_id: 0x07,
    script_hash_addr_id: 0x09,
    private_key_id: 0x7b,
    hd_public_key_id: [0xfb, 0xc6, 0xa0, 0x0d],
    hd_private_key_id: [0x5a, 0xeb, 0xd8, 0xc6],
    hd_coin_type: 5,
    min_fee_rate: 0.00001,
    min_relay_fee_rate: 0.00001,
};

/// Parameters of the test Thought network (version 3).
pub const TESTNET_PARAMS: Params = Params {
    name: "test",
    magic: 0x2b99_39bf,
    default_port: 11618,
    rpc_port: 11617,
    pubkey_hash_addr_id: 0x6d,
    script_hash_addr_id: 0xc1,
    private_key_id: 0xeb,
    hd_public_key_id: [0x5d, 0x40, 0x5f, 0x7a],
    hd_private_key_id: [0xb6, 0xf1, 0x3f, 0x50],
    hd_coin_type: 1,
    min_fee_rate: 0.00001,
    min_relay_fee_rate: 0.00001,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_params_are_distinct() {
        assert_ne!(MAINNET_PARAMS.magic, TESTNET_PARAMS.magic);
        assert_ne!(
            MAINNET_PARAMS.pubkey_hash_addr_id,
            TESTNET_PARAMS.pubkey_hash_addr_id
        );
        assert_eq!(Network::Mainnet.params().rpc_port, 10617);
        assert_eq!(Network::Testnet.params().rpc_port, 11617);
    }
}
