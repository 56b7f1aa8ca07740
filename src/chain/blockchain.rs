//! Chain aggregation
//!
//! A chain collects facts from each of its nodes in arbitrary order, then
//! finalizes them into one genesis document. Finalize refuses to run until
//! every pending target has been collected.

use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};

use super::{endpoint_ip, format_endpoint, ChainError};
use crate::accounts::{Account, AccountProfile, AccountSource, EthUnit};
use crate::agent::{AgentId, AgentLookup, NodeAgent, StartupContext};
use crate::constants::{
    DEFAULT_TERMINAL_TOTAL_DIFFICULTY, ETHASH_DIR, GETH_DATADIR, VALIDATOR_STAKE,
};
use crate::consensus::ConsensusKind;
use crate::crypto::EthAddress;
use crate::genesis::Genesis;
use crate::storage::create_node_dirs;

/// A node registered on a chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTarget {
    pub node_id: String,
    pub agent: AgentId,
}

/// One private blockchain
#[derive(Debug)]
pub struct Chain {
    name: String,
    chain_id: u64,
    consensus: ConsensusKind,
    genesis: Genesis,
    /// Append-only during collection
    boot_nodes: Vec<String>,
    beacon_setup_node: Option<String>,
    joined_accounts: Vec<Account>,
    joined_signer_accounts: Vec<Account>,
    validator_ids: Vec<String>,
    pending_targets: Vec<PendingTarget>,
    collected: HashSet<String>,
    local_profile: AccountProfile,
    emulator_profile: AccountProfile,
    /// Parsed emulator profile, reset whenever the profile changes
    emulator_source: Option<AccountSource>,
    terminal_total_difficulty: u64,
    exclusive_beacon_setup: bool,
    finalized: bool,
}

impl Chain {
    /// Create a chain. Id uniqueness is up to the caller.
    pub fn new(name: impl Into<String>, chain_id: u64, consensus: ConsensusKind) -> Self {
        Self {
            name: name.into(),
            chain_id,
            consensus,
            genesis: Genesis::new(consensus),
            boot_nodes: Vec::new(),
            beacon_setup_node: None,
            joined_accounts: Vec::new(),
            joined_signer_accounts: Vec::new(),
            validator_ids: Vec::new(),
            pending_targets: Vec::new(),
            collected: HashSet::new(),
            local_profile: AccountProfile::local_default(),
            emulator_profile: AccountProfile::emulator_default(),
            emulator_source: None,
            terminal_total_difficulty: DEFAULT_TERMINAL_TOTAL_DIFFICULTY,
            exclusive_beacon_setup: false,
            finalized: false,
        }
    }

    // ------------------------------------------------------------------
    // Parameters
    // ------------------------------------------------------------------

    pub fn set_chain_id(&mut self, chain_id: u64) -> &mut Self {
        self.chain_id = chain_id;
        self
    }

    pub fn set_gas_limit_per_block(&mut self, gas_limit: u64) -> &mut Self {
        self.genesis.set_gas_limit(gas_limit);
        self
    }

    /// Replace the genesis with a custom document
    pub fn set_custom_genesis(&mut self, json: &str) -> Result<&mut Self, ChainError> {
        self.genesis.set_custom(json)?;
        Ok(self)
    }

    /// Fund an external account in genesis
    pub fn add_local_account(
        &mut self,
        address: EthAddress,
        amount: u128,
        unit: EthUnit,
    ) -> &mut Self {
        self.genesis.add_local_account(address, unit.to_wei(amount));
        self
    }

    /// Fund extra accounts derived from a seed phrase, on top of the local set
    pub fn add_local_accounts_from_mnemonic(
        &mut self,
        mnemonic: &str,
        total: u32,
        amount: u128,
        unit: EthUnit,
    ) -> Result<&mut Self, ChainError> {
        let profile = AccountProfile::new(mnemonic, amount, unit, total);
        let accounts = AccountSource::from_profile(&profile)?.local_accounts()?;
        self.genesis.add_accounts(&accounts);
        Ok(self)
    }

    /// Profile used to derive per-node accounts
    pub fn set_emulator_account_parameters(
        &mut self,
        mnemonic: &str,
        amount: u128,
        total_per_node: u32,
        unit: EthUnit,
    ) -> &mut Self {
        self.emulator_profile = AccountProfile::new(mnemonic, amount, unit, total_per_node);
        self.emulator_source = None;
        self
    }

    pub fn emulator_account_parameters(&self) -> &AccountProfile {
        &self.emulator_profile
    }

    /// Profile of the local accounts added at finalize
    pub fn set_local_account_parameters(
        &mut self,
        mnemonic: &str,
        amount: u128,
        total: u32,
        unit: EthUnit,
    ) -> &mut Self {
        self.local_profile = AccountProfile::new(mnemonic, amount, unit, total);
        self
    }

    pub fn local_account_parameters(&self) -> &AccountProfile {
        &self.local_profile
    }

    pub fn set_terminal_total_difficulty(&mut self, ttd: u64) -> &mut Self {
        self.terminal_total_difficulty = ttd;
        self
    }

    pub fn terminal_total_difficulty(&self) -> u64 {
        self.terminal_total_difficulty
    }

    /// Reject a second beacon setup claim instead of letting the last one win
    pub fn set_exclusive_beacon_setup(&mut self, exclusive: bool) -> &mut Self {
        self.exclusive_beacon_setup = exclusive;
        self
    }

    // ------------------------------------------------------------------
    // Targets
    // ------------------------------------------------------------------

    /// Register a node as a pending target. Returns false if it already was.
    pub(crate) fn register_target(&mut self, node_id: &str, agent: AgentId) -> bool {
        if self.pending_targets.iter().any(|t| t.node_id == node_id) {
            return false;
        }
        self.pending_targets.push(PendingTarget {
            node_id: node_id.to_string(),
            agent,
        });
        true
    }

    pub fn pending_targets(&self) -> &[PendingTarget] {
        &self.pending_targets
    }

    /// Targets not collected yet, in registration order
    pub fn uncollected_targets(&self) -> Vec<String> {
        self.pending_targets
            .iter()
            .filter(|t| !self.collected.contains(&t.node_id))
            .map(|t| t.node_id.clone())
            .collect()
    }

    // ------------------------------------------------------------------
    // Phase 1
    // ------------------------------------------------------------------

    /// Collect one node's contribution.
    ///
    /// When `save_root` is set the node's datadirs are created under it and
    /// mounted into the agent. Chain state is only touched once every fallible
    /// step has succeeded, so a failed collect can be retried.
    pub fn collect(
        &mut self,
        node_id: &str,
        agent: &mut NodeAgent,
        save_root: Option<&Path>,
    ) -> Result<(), ChainError> {
        if !self.pending_targets.iter().any(|t| t.node_id == node_id) {
            return Err(ChainError::UnknownTarget {
                chain: self.name.clone(),
                node: node_id.to_string(),
            });
        }
        if self.collected.contains(node_id) {
            return Err(ChainError::AlreadyCollected {
                chain: self.name.clone(),
                node: node_id.to_string(),
            });
        }

        info!(
            "configuring {} as a {} node of chain {}",
            node_id,
            agent.kind(),
            self.name
        );

        let ip = agent
            .first_address()
            .ok_or_else(|| ChainError::NoNetworkInterfaces {
                chain: self.name.clone(),
                node: node_id.to_string(),
            })?;

        let beacon_claim = if self.consensus.tracks_validators() && agent.is_beacon_setup_node() {
            let endpoint = format_endpoint(ip, agent.beacon_http_port());
            self.check_beacon_claim(&endpoint)?;
            Some(endpoint)
        } else {
            None
        };

        agent.create_accounts(self.emulator_source()?)?;

        let dirs = match save_root {
            Some(root) => Some(create_node_dirs(root, &self.name, agent.serial())?),
            None => None,
        };

        if agent.is_boot_node() {
            let endpoint = format_endpoint(ip, agent.boot_http_port());
            info!("adding {} as {} boot node {}", node_id, self.consensus, endpoint);
            self.boot_nodes.push(endpoint);
        }

        if let Some(endpoint) = beacon_claim {
            if let Some(existing) = &self.beacon_setup_node {
                warn!(
                    "chain {}: beacon setup node {} replaced by {} ({})",
                    self.name, existing, endpoint, node_id
                );
            }
            self.beacon_setup_node = Some(endpoint);
        }

        if let Some(first) = agent.accounts().first() {
            self.joined_accounts.extend_from_slice(agent.accounts());
            if self.consensus.requires_signers() && agent.is_start_miner() {
                debug!("{} signs for chain {} as {}", node_id, self.name, first.address);
                self.joined_signer_accounts.push(first.clone());
            }
        }

        if self.consensus.tracks_validators() && agent.is_validator_at_genesis() {
            self.validator_ids.push(agent.numeric_id());
        }

        agent.emit_startup_command(&self.startup_context());

        if let Some(dirs) = dirs {
            agent.add_shared_folder(GETH_DATADIR, dirs.ethereum);
            agent.add_shared_folder(ETHASH_DIR, dirs.ethash);
        }

        self.collected.insert(node_id.to_string());
        Ok(())
    }

    /// Fails when an exclusive beacon setup node is already set
    fn check_beacon_claim(&self, endpoint: &str) -> Result<(), ChainError> {
        match &self.beacon_setup_node {
            Some(existing) if self.exclusive_beacon_setup => Err(ChainError::BeaconSetupConflict {
                chain: self.name.clone(),
                existing: existing.clone(),
                claimed: endpoint.to_string(),
            }),
            _ => Ok(()),
        }
    }

    fn emulator_source(&mut self) -> Result<&AccountSource, ChainError> {
        let source = match self.emulator_source.take() {
            Some(source) => source,
            None => AccountSource::from_profile(&self.emulator_profile)?,
        };
        let source: &AccountSource = self.emulator_source.insert(source);
        Ok(source)
    }

    /// Facts a node may use while rendering its startup command
    pub fn startup_context(&self) -> StartupContext<'_> {
        StartupContext {
            chain_id: self.chain_id,
            consensus: self.consensus,
            boot_nodes: &self.boot_nodes,
            beacon_setup_node: self.beacon_setup_node.as_deref(),
            terminal_total_difficulty: self.terminal_total_difficulty,
        }
    }

    // ------------------------------------------------------------------
    // Phase 2
    // ------------------------------------------------------------------

    /// Synthesize the genesis document.
    ///
    /// Running it again without new collections yields the same document.
    pub fn finalize(&mut self, agents: &mut dyn AgentLookup) -> Result<(), ChainError> {
        let missing = self.uncollected_targets();
        if !missing.is_empty() {
            return Err(ChainError::CollectIncomplete {
                chain: self.name.clone(),
                missing,
            });
        }

        let local_accounts = AccountSource::from_profile(&self.local_profile)?.local_accounts()?;
        self.genesis.add_accounts(&local_accounts);
        self.genesis.set_chain_id(self.chain_id);

        if self.consensus.tracks_validators() {
            self.fund_validator_anchor(agents)?;
        }

        if self.consensus.funds_joined_accounts() {
            self.genesis.add_accounts(&self.joined_accounts);
            self.genesis.set_signers(&self.joined_signer_accounts);
        }

        self.finalized = true;
        info!(
            "chain {} (id {}) finalized: {} allocation(s), {} signer(s), {} boot node(s)",
            self.name,
            self.chain_id,
            self.genesis.allocation_count(),
            self.joined_signer_accounts.len(),
            self.boot_nodes.len()
        );
        Ok(())
    }

    /// Fund the node anchoring the first boot node with the initial validator stake.
    ///
    /// The new balance is written to the agent's own account and to the joined set.
    fn fund_validator_anchor(&mut self, agents: &mut dyn AgentLookup) -> Result<(), ChainError> {
        let Some(anchor_ip) = self.boot_nodes.first().and_then(|b| endpoint_ip(b)) else {
            return Ok(());
        };

        let mut anchor = None;
        for target in &self.pending_targets {
            let agent = agents
                .agent(target.agent)
                .ok_or_else(|| ChainError::MissingAgent {
                    chain: self.name.clone(),
                    node: target.node_id.clone(),
                })?;

            if !agent.is_boot_node() || agent.first_address() != Some(anchor_ip) {
                continue;
            }
            let Some(first) = agent.accounts().first() else {
                continue;
            };
            anchor = Some((target.agent, target.node_id.clone(), first.address));
            break;
        }
        let Some((id, node_id, address)) = anchor else {
            return Ok(());
        };

        let stake = VALIDATOR_STAKE.saturating_mul(1 + self.validator_ids.len() as u128);
        if let Some(agent) = agents.agent_mut(id) {
            agent.set_first_account_balance(stake);
        }
        if let Some(joined) = self.joined_accounts.iter_mut().find(|a| a.address == address) {
            joined.balance = stake;
        }
        info!(
            "chain {}: funding boot node {} ({}) with {} wei for {} validator(s)",
            self.name,
            node_id,
            address,
            stake,
            self.validator_ids.len()
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn consensus(&self) -> ConsensusKind {
        self.consensus
    }

    /// Boot node endpoints. Partial while collection is running.
    pub fn boot_nodes(&self) -> &[String] {
        &self.boot_nodes
    }

    pub fn all_accounts(&self) -> &[Account] {
        &self.joined_accounts
    }

    pub fn all_signer_accounts(&self) -> &[Account] {
        &self.joined_signer_accounts
    }

    pub fn validator_ids(&self) -> &[String] {
        &self.validator_ids
    }

    pub fn beacon_setup_node(&self) -> Option<&str> {
        self.beacon_setup_node.as_deref()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Finalized genesis
    pub fn genesis(&self) -> Result<&Genesis, ChainError> {
        if !self.finalized {
            return Err(ChainError::NotFinalized(self.name.clone()));
        }
        Ok(&self.genesis)
    }
}
