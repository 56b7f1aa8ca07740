//! Chain registry: chains, node agents and the configuration run

mod address_book;
mod arena;
mod service;

pub use address_book::*;
pub use arena::*;
pub use service::*;

use thiserror::Error;

use crate::chain::ChainError;
use crate::storage::StorageError;

/// Registry errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Chain not found: {0}")]
    ChainNotFound(String),

    #[error("Node {0} has no agent yet and no chain was given to create one")]
    AgentWithoutChain(String),

    #[error("Node {node} belongs to chain {owner}, cannot join chain {requested}")]
    NodeOnOtherChain {
        node: String,
        owner: String,
        requested: String,
    },

    #[error("No agent installed for node {0}")]
    UnknownAgent(String),

    #[error("Configuration already ran")]
    AlreadyConfigured,

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
