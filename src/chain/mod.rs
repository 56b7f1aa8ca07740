//! Chain module - per-chain aggregation of node facts and genesis synthesis

mod blockchain;
mod discovery;

pub use blockchain::*;
pub use discovery::*;

use crate::crypto::KeyError;
use crate::genesis::GenesisError;
use crate::storage::StorageError;
use thiserror::Error;

/// Chain errors
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("Node {node} of chain {chain} has no network interfaces")]
    NoNetworkInterfaces { chain: String, node: String },
    #[error("Node {node} is not a pending target of chain {chain}")]
    UnknownTarget { chain: String, node: String },
    #[error("Node {node} of chain {chain} was already collected")]
    AlreadyCollected { chain: String, node: String },
    #[error(
        "Chain {chain} cannot finalize: {} target(s) not collected: {}",
        .missing.len(),
        .missing.join(", ")
    )]
    CollectIncomplete { chain: String, missing: Vec<String> },
    #[error("Chain {chain} already has beacon setup node {existing}; {claimed} claimed it too")]
    BeaconSetupConflict {
        chain: String,
        existing: String,
        claimed: String,
    },
    #[error("No agent registered for node {node} of chain {chain}")]
    MissingAgent { chain: String, node: String },
    #[error("Genesis of chain {0} is not finalized")]
    NotFinalized(String),
    #[error("Genesis error: {0}")]
    Genesis(#[from] GenesisError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Account derivation error: {0}")]
    Key(#[from] KeyError),
}
