//! Chain registry
//!
//! Owns every chain and every node agent, hands out chain ids and agent
//! serials, and runs configuration: collect every node of every chain, then
//! finalize every chain.

use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::{AddressBook, AgentArena, RegistryError};
use crate::agent::{AgentId, NodeAgent, NodeRoles};
use crate::chain::Chain;
use crate::constants::{BASE_CHAIN_ID, DEFAULT_SAVE_PATH};
use crate::consensus::ConsensusKind;
use crate::storage::{prepare_save_dir, write_chain_artifacts, SaveDirOutcome};

/// State-saving options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveState {
    /// Keep node datadirs on the host
    pub enabled: bool,
    /// Host directory for the datadirs
    pub path: PathBuf,
    /// Move an existing directory aside instead of failing
    pub override_existing: bool,
}

impl Default for SaveState {
    fn default() -> Self {
        Self {
            enabled: false,
            path: PathBuf::from(DEFAULT_SAVE_PATH),
            override_existing: false,
        }
    }
}

/// What a configuration run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurationReport {
    /// Save directory handling, when state saving is on
    pub save_dir: Option<SaveDirOutcome>,
    /// Nodes collected across all chains
    pub collected: usize,
    /// Chains finalized, in name order
    pub finalized: Vec<String>,
}

/// Registry of chains and node agents
#[derive(Debug)]
pub struct ChainRegistry {
    chains: BTreeMap<String, Chain>,
    agents: AgentArena,
    next_chain_id: u64,
    serial: u32,
    save_state: SaveState,
    configured: bool,
}

impl Default for ChainRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainRegistry {
    /// Create a registry without state saving
    pub fn new() -> Self {
        Self::with_save_state(SaveState::default())
    }

    pub fn with_save_state(save_state: SaveState) -> Self {
        Self {
            chains: BTreeMap::new(),
            agents: AgentArena::new(),
            next_chain_id: BASE_CHAIN_ID,
            serial: 0,
            save_state,
            configured: false,
        }
    }

    pub fn save_state(&self) -> &SaveState {
        &self.save_state
    }

    pub fn set_save_state(&mut self, save_state: SaveState) {
        self.save_state = save_state;
    }

    /// Create a chain, replacing any chain of the same name.
    ///
    /// Without an explicit id the next auto id is used.
    pub fn create_chain(
        &mut self,
        name: &str,
        consensus: ConsensusKind,
        chain_id: Option<u64>,
    ) -> &mut Chain {
        let chain_id = chain_id.unwrap_or_else(|| {
            let id = self.next_chain_id;
            self.next_chain_id += 1;
            id
        });
        info!("creating {} chain {} with id {}", consensus, name, chain_id);

        let chain = Chain::new(name, chain_id, consensus);
        match self.chains.entry(name.to_string()) {
            Entry::Occupied(mut entry) => {
                warn!("chain {} already existed and was replaced", name);
                entry.insert(chain);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(chain),
        }
    }

    pub fn chain(&self, name: &str) -> Option<&Chain> {
        self.chains.get(name)
    }

    pub fn chain_mut(&mut self, name: &str) -> Option<&mut Chain> {
        self.chains.get_mut(name)
    }

    /// Chains in name order
    pub fn chains(&self) -> impl Iterator<Item = &Chain> {
        self.chains.values()
    }

    /// Register `node_id` on a chain and return its agent
    pub fn create_node(&mut self, chain: &str, node_id: &str) -> Result<AgentId, RegistryError> {
        self.create_node_with_roles(chain, node_id, NodeRoles::default())
    }

    /// Like `create_node`; `roles` only apply if the agent is created by this call
    pub fn create_node_with_roles(
        &mut self,
        chain: &str,
        node_id: &str,
        roles: NodeRoles,
    ) -> Result<AgentId, RegistryError> {
        let id = self.create_or_get_agent_with(node_id, Some(chain), roles)?;

        let owner = self
            .agents
            .get(id)
            .map(|agent| agent.chain_name().to_string())
            .ok_or_else(|| RegistryError::UnknownAgent(node_id.to_string()))?;
        if owner != chain {
            return Err(RegistryError::NodeOnOtherChain {
                node: node_id.to_string(),
                owner,
                requested: chain.to_string(),
            });
        }

        let target_chain = self
            .chains
            .get_mut(chain)
            .ok_or_else(|| RegistryError::ChainNotFound(chain.to_string()))?;
        target_chain.register_target(node_id, id);
        Ok(id)
    }

    /// Memoized agent for `node_id`, created for `chain` if there is none yet
    pub fn create_or_get_agent(
        &mut self,
        node_id: &str,
        chain: Option<&str>,
    ) -> Result<AgentId, RegistryError> {
        self.create_or_get_agent_with(node_id, chain, NodeRoles::default())
    }

    fn create_or_get_agent_with(
        &mut self,
        node_id: &str,
        chain: Option<&str>,
        roles: NodeRoles,
    ) -> Result<AgentId, RegistryError> {
        if let Some(id) = self.agents.lookup(node_id) {
            return Ok(id);
        }

        let chain_name =
            chain.ok_or_else(|| RegistryError::AgentWithoutChain(node_id.to_string()))?;
        let consensus = self
            .chains
            .get(chain_name)
            .map(Chain::consensus)
            .ok_or_else(|| RegistryError::ChainNotFound(chain_name.to_string()))?;

        let serial = &mut self.serial;
        let id = self.agents.get_or_create(node_id, || {
            *serial += 1;
            NodeAgent::new(*serial, node_id, chain_name, consensus, roles)
        });
        info!(
            "installing {} agent #{} on {} for chain {}",
            consensus, self.serial, node_id, chain_name
        );
        Ok(id)
    }

    pub fn agent(&self, id: AgentId) -> Option<&NodeAgent> {
        self.agents.get(id)
    }

    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut NodeAgent> {
        self.agents.get_mut(id)
    }

    pub fn agent_for(&self, node_id: &str) -> Option<&NodeAgent> {
        self.agents.lookup(node_id).and_then(|id| self.agents.get(id))
    }

    pub fn agents(&self) -> &AgentArena {
        &self.agents
    }

    /// Run both configuration phases.
    ///
    /// Every node of every chain is collected before any chain finalizes.
    /// The first error aborts the run.
    pub fn run_configuration(
        &mut self,
        book: &dyn AddressBook,
    ) -> Result<ConfigurationReport, RegistryError> {
        if self.configured {
            return Err(RegistryError::AlreadyConfigured);
        }

        let mut report = ConfigurationReport::default();

        let save_root = if self.save_state.enabled {
            let outcome =
                prepare_save_dir(&self.save_state.path, self.save_state.override_existing)?;
            report.save_dir = Some(outcome);
            Some(self.save_state.path.clone())
        } else {
            None
        };

        for agent in self.agents.iter_mut() {
            let addresses = book.addresses(agent.node_id());
            agent.bind_addresses(addresses);
        }

        for chain in self.chains.values_mut() {
            for target in chain.pending_targets().to_vec() {
                let agent = self
                    .agents
                    .get_mut(target.agent)
                    .ok_or_else(|| RegistryError::UnknownAgent(target.node_id.clone()))?;
                chain.collect(&target.node_id, agent, save_root.as_deref())?;
                report.collected += 1;
            }
        }

        for chain in self.chains.values_mut() {
            chain.finalize(&mut self.agents)?;
            report.finalized.push(chain.name().to_string());
        }

        self.configured = true;
        Ok(report)
    }

    /// Write every finalized chain's genesis and node scripts under `out_dir`
    pub fn write_artifacts(&self, out_dir: &Path) -> Result<Vec<PathBuf>, RegistryError> {
        let mut written = Vec::new();
        for chain in self.chains.values() {
            let genesis = chain.genesis()?;
            let agents = chain
                .pending_targets()
                .iter()
                .filter_map(|target| self.agents.get(target.agent));
            written.extend(write_chain_artifacts(out_dir, chain.name(), genesis, agents)?);
        }
        Ok(written)
    }

    /// Human-readable listing of chains and their boot nodes
    pub fn summary(&self) -> String {
        let mut out = String::from("ChainRegistry:\n");
        for chain in self.chains.values() {
            let _ = writeln!(
                out,
                "    {} ({}, id {}, {} node(s)):",
                chain.name(),
                chain.consensus(),
                chain.chain_id(),
                chain.pending_targets().len()
            );
            let _ = writeln!(out, "        Boot Nodes:");
            for boot in chain.boot_nodes() {
                let _ = writeln!(
                    out,
                    "            {}-{}",
                    chain.consensus().as_str().to_uppercase(),
                    boot
                );
            }
            if let Some(beacon) = chain.beacon_setup_node() {
                let _ = writeln!(out, "        Beacon Setup Node: {}", beacon);
            }
        }
        out
    }
}
