//! Script handling for the Thought chain.
//!
//! Three concerns live here:
//! - [`solver`]: byte-template classification of output scripts into the
//!   standard classes the chain recognizes.
//! - [`address`]: Base58Check address derivation and the standard
//!   pay-to-pubkey-hash / pay-to-script-hash builders.
//! - [`sighash`]: the legacy (pre-witness) signature hash, including the
//!   consensus-mandated SIGHASH_SINGLE out-of-range behavior.

pub mod address;
pub mod constants;
pub mod sighash;
pub mod solver;

pub use address::{
    address_to_script, owner_account, pubkey_address, pubkey_hash_address, recover_signer,
    script_hash_address,
};
pub use sighash::{legacy_signature_hash, SigHashType};
pub use solver::{classify, ScriptClass};

use thiserror::Error;

/// Errors produced by the script layer.
#[derive(Debug, Error)]
pub enum Error {
    /// A script failed to parse (a push ran past the end of the script).
    #[error("malformed script")]
    MalformedScript,
    /// Sighash input index does not reference an input of the transaction.
    #[error("input index {0} out of range for {1} inputs")]
    InputIndexOutOfRange(usize, usize),
    /// An address failed Base58Check decoding.
    #[error("invalid address {0:?}")]
    InvalidAddress(String),
    /// An address carries a version byte unknown to the network.
    #[error("address version {0:#04x} not valid for network {1}")]
    UnknownAddressVersion(u8, &'static str),
    /// A public key is not a 33-byte compressed secp256k1 key.
    #[error("not a compressed public key")]
    InvalidPublicKey,
}

pub type Result<T> = std::result::Result<T, Error>;
