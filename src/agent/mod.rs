//! Node agents
//!
//! One agent per provisioned node. An agent knows its roles, owns the
//! accounts derived for it, and renders the node's startup command once the
//! chain facts it depends on are known.

mod command;

pub use command::*;

use crate::accounts::{Account, AccountSource};
use crate::constants::{BEACON_SETUP_HTTP_PORT, BOOT_NODE_HTTP_PORT};
use crate::consensus::ConsensusKind;
use crate::crypto::KeyError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::path::PathBuf;
use tracing::debug;

/// Stable handle to an agent in the registry arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(pub(crate) usize);

impl AgentId {
    /// Position in the arena
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Access to agents by handle
pub trait AgentLookup {
    fn agent(&self, id: AgentId) -> Option<&NodeAgent>;
    fn agent_mut(&mut self, id: AgentId) -> Option<&mut NodeAgent>;
}

/// Agent variant, fixed by the consensus kind of the chain it was created for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentKind {
    PoW,
    PoA,
    PoS,
}

impl AgentKind {
    /// Variant serving chains of the given consensus kind
    pub fn for_consensus(consensus: ConsensusKind) -> Self {
        match consensus {
            ConsensusKind::ProofOfWork => AgentKind::PoW,
            ConsensusKind::ProofOfAuthority => AgentKind::PoA,
            ConsensusKind::ProofOfStake => AgentKind::PoS,
        }
    }

    /// Consensus kind this variant serves
    pub fn consensus(&self) -> ConsensusKind {
        match self {
            AgentKind::PoW => ConsensusKind::ProofOfWork,
            AgentKind::PoA => ConsensusKind::ProofOfAuthority,
            AgentKind::PoS => ConsensusKind::ProofOfStake,
        }
    }

    /// Port the boot node serves its enode url on
    pub fn boot_http_port(&self) -> u16 {
        BOOT_NODE_HTTP_PORT
    }

    /// Port the beacon setup node serves on
    pub fn beacon_http_port(&self) -> u16 {
        BEACON_SETUP_HTTP_PORT
    }

    fn honors_validator_roles(&self) -> bool {
        matches!(self, AgentKind::PoS)
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentKind::PoW => write!(f, "PoW"),
            AgentKind::PoA => write!(f, "PoA"),
            AgentKind::PoS => write!(f, "PoS"),
        }
    }
}

/// Roles a node may declare
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeRoles {
    /// Publishes its address for discovery
    pub boot_node: bool,
    /// Mines (PoW) or signs (PoA/PoS) from the start
    pub start_miner: bool,
    /// Counted in the initial PoS validator set
    pub validator_at_genesis: bool,
    /// Hosts the PoS beacon setup service
    pub beacon_setup: bool,
}

impl NodeRoles {
    pub fn boot_node(mut self) -> Self {
        self.boot_node = true;
        self
    }

    pub fn start_miner(mut self) -> Self {
        self.start_miner = true;
        self
    }

    pub fn validator_at_genesis(mut self) -> Self {
        self.validator_at_genesis = true;
        self
    }

    pub fn beacon_setup(mut self) -> Self {
        self.beacon_setup = true;
        self
    }
}

/// Host directory mounted into the node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedFolder {
    /// Path inside the node
    pub node_path: String,
    /// Path on the host
    pub host_path: PathBuf,
}

/// One provisioned node
#[derive(Debug, Clone)]
pub struct NodeAgent {
    serial: u32,
    node_id: String,
    chain_name: String,
    kind: AgentKind,
    roles: NodeRoles,
    addresses: Vec<IpAddr>,
    accounts: Vec<Account>,
    startup: Option<StartupScript>,
    shared_folders: Vec<SharedFolder>,
}

impl NodeAgent {
    /// Create an agent for a node of the named chain
    pub fn new(
        serial: u32,
        node_id: impl Into<String>,
        chain_name: impl Into<String>,
        consensus: ConsensusKind,
        roles: NodeRoles,
    ) -> Self {
        Self {
            serial,
            node_id: node_id.into(),
            chain_name: chain_name.into(),
            kind: AgentKind::for_consensus(consensus),
            roles,
            addresses: Vec::new(),
            accounts: Vec::new(),
            startup: None,
            shared_folders: Vec::new(),
        }
    }

    /// Registry-wide serial
    pub fn serial(&self) -> u32 {
        self.serial
    }

    /// Serial rendered as a string, used for validator ids and paths
    pub fn numeric_id(&self) -> String {
        self.serial.to_string()
    }

    /// Node identifier in the topology
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Name of the chain this agent belongs to
    pub fn chain_name(&self) -> &str {
        &self.chain_name
    }

    pub fn kind(&self) -> AgentKind {
        self.kind
    }

    /// Roles as declared, before variant filtering
    pub fn roles(&self) -> NodeRoles {
        self.roles
    }

    pub fn set_boot_node(&mut self, value: bool) -> &mut Self {
        self.roles.boot_node = value;
        self
    }

    pub fn set_start_miner(&mut self, value: bool) -> &mut Self {
        self.roles.start_miner = value;
        self
    }

    pub fn set_validator_at_genesis(&mut self, value: bool) -> &mut Self {
        self.roles.validator_at_genesis = value;
        self
    }

    pub fn set_beacon_setup_node(&mut self, value: bool) -> &mut Self {
        self.roles.beacon_setup = value;
        self
    }

    pub fn is_boot_node(&self) -> bool {
        self.roles.boot_node
    }

    pub fn is_start_miner(&self) -> bool {
        self.roles.start_miner
    }

    /// Only honored by PoS agents
    pub fn is_validator_at_genesis(&self) -> bool {
        self.kind.honors_validator_roles() && self.roles.validator_at_genesis
    }

    /// Only honored by PoS agents
    pub fn is_beacon_setup_node(&self) -> bool {
        self.kind.honors_validator_roles() && self.roles.beacon_setup
    }

    pub fn boot_http_port(&self) -> u16 {
        self.kind.boot_http_port()
    }

    pub fn beacon_http_port(&self) -> u16 {
        self.kind.beacon_http_port()
    }

    /// Attach the addresses the topology assigned to this node
    pub fn bind_addresses(&mut self, addresses: Vec<IpAddr>) {
        self.addresses = addresses;
    }

    pub fn addresses(&self) -> &[IpAddr] {
        &self.addresses
    }

    pub fn has_network_interfaces(&self) -> bool {
        !self.addresses.is_empty()
    }

    pub fn first_address(&self) -> Option<IpAddr> {
        self.addresses.first().copied()
    }

    /// Derive this node's accounts from the emulator profile.
    ///
    /// Replaces any accounts derived earlier.
    pub fn create_accounts(&mut self, source: &AccountSource) -> Result<(), KeyError> {
        self.accounts = source.node_accounts(self.serial)?;
        debug!(
            "node {} derived {} account(s)",
            self.node_id,
            self.accounts.len()
        );
        Ok(())
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    /// Overwrite the balance of the first account, if any
    pub(crate) fn set_first_account_balance(&mut self, balance: u128) {
        if let Some(account) = self.accounts.first_mut() {
            account.balance = balance;
        }
    }

    /// Render the startup command against the chain facts known so far
    pub fn emit_startup_command(&mut self, ctx: &StartupContext<'_>) {
        self.startup = Some(StartupScript::render(self, ctx));
    }

    pub fn startup_command(&self) -> Option<&StartupScript> {
        self.startup.as_ref()
    }

    pub fn add_shared_folder(&mut self, node_path: impl Into<String>, host_path: PathBuf) {
        self.shared_folders.push(SharedFolder {
            node_path: node_path.into(),
            host_path,
        });
    }

    pub fn shared_folders(&self) -> &[SharedFolder] {
        &self.shared_folders
    }
}
