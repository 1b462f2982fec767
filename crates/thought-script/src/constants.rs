//! Script limits of the chain.

/// Maximum script length in bytes.
pub const MAX_SCRIPT_SIZE: usize = 10_000;

/// Maximum bytes pushable to the stack in a single element.
pub const MAX_SCRIPT_ELEMENT_SIZE: usize = 520;

/// Maximum number of non-push operations per script.
pub const MAX_OPS_PER_SCRIPT: usize = 201;

/// Maximum number of public keys in a bare multisig output.
pub const MAX_PUBKEYS_PER_MULTISIG: usize = 20;

/// Maximum number of bytes of pushed data for a script to count as nulldata.
pub const MAX_DATA_CARRIER_SIZE: usize = 80;

/// Length in bytes of a compressed secp256k1 public key.
pub const COMPRESSED_PUBKEY_SIZE: usize = 33;

/// Length in bytes of an uncompressed secp256k1 public key.
pub const UNCOMPRESSED_PUBKEY_SIZE: usize = 65;

/// Length of a standard pay-to-pubkey-hash script.
pub const PUBKEY_HASH_SCRIPT_LEN: usize = 25;

/// Length of a standard pay-to-script-hash script.
pub const SCRIPT_HASH_SCRIPT_LEN: usize = 23;
