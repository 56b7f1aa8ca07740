//! Cryptography module - BLAKE3 hashing, BIP-44 secp256k1 account keys, Ethereum addresses

mod hash;
mod keys;

pub use hash::*;
pub use keys::*;
