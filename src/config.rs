//! Emulation configuration
//!
//! A TOML file describing the chains to bootstrap, their nodes and the
//! save-state options. `build` turns it into a registry ready for
//! `run_configuration` plus the address book the nodes were given.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::accounts::{AccountProfile, EthUnit};
use crate::agent::NodeRoles;
use crate::chain::{Chain, ChainError};
use crate::consensus::ConsensusKind;
use crate::crypto::EthAddress;
use crate::registry::{ChainRegistry, RegistryError, SaveState, StaticAddressBook};

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Chain(#[from] ChainError),
}

/// Account profile override; unset fields keep the chain default
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    pub mnemonic: Option<String>,
    pub amount: Option<u64>,
    pub unit: EthUnit,
    pub count: Option<u32>,
}

impl ProfileConfig {
    fn merge(&self, base: &AccountProfile) -> AccountProfile {
        let balance = match self.amount {
            Some(amount) => self.unit.to_wei(u128::from(amount)),
            None => base.balance,
        };
        AccountProfile {
            mnemonic: self.mnemonic.clone().unwrap_or_else(|| base.mnemonic.clone()),
            balance,
            count: self.count.unwrap_or(base.count),
        }
    }
}

/// A single funded external account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtraAccount {
    pub address: EthAddress,
    pub amount: u64,
    #[serde(default)]
    pub unit: EthUnit,
}

/// Extra accounts derived from their own seed phrase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MnemonicAccounts {
    pub mnemonic: String,
    pub count: u32,
    pub amount: u64,
    #[serde(default)]
    pub unit: EthUnit,
}

/// A node of a chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub id: String,
    /// Interface addresses, first one is used for discovery
    #[serde(default)]
    pub addresses: Vec<IpAddr>,
    #[serde(flatten)]
    pub roles: NodeRoles,
}

/// One chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    pub name: String,
    pub consensus: ConsensusKind,
    #[serde(default)]
    pub chain_id: Option<u64>,
    #[serde(default)]
    pub gas_limit: Option<u64>,
    #[serde(default)]
    pub terminal_total_difficulty: Option<u64>,
    #[serde(default)]
    pub exclusive_beacon_setup: bool,
    /// Genesis file replacing the built-in template, relative to the config file
    #[serde(default)]
    pub custom_genesis: Option<PathBuf>,
    #[serde(default)]
    pub local_accounts: Option<ProfileConfig>,
    #[serde(default)]
    pub emulator_accounts: Option<ProfileConfig>,
    #[serde(default)]
    pub extra_accounts: Vec<ExtraAccount>,
    #[serde(default)]
    pub mnemonic_accounts: Vec<MnemonicAccounts>,
    #[serde(default)]
    pub nodes: Vec<NodeConfig>,
}

impl ChainConfig {
    fn apply(&self, chain: &mut Chain, base_dir: &Path) -> Result<(), ConfigError> {
        if let Some(path) = &self.custom_genesis {
            let path = base_dir.join(path);
            let json = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
            chain.set_custom_genesis(&json)?;
        }
        if let Some(gas_limit) = self.gas_limit {
            chain.set_gas_limit_per_block(gas_limit);
        }
        if let Some(ttd) = self.terminal_total_difficulty {
            chain.set_terminal_total_difficulty(ttd);
        }
        chain.set_exclusive_beacon_setup(self.exclusive_beacon_setup);

        if let Some(profile) = &self.local_accounts {
            let merged = profile.merge(chain.local_account_parameters());
            chain.set_local_account_parameters(
                &merged.mnemonic,
                merged.balance,
                merged.count,
                EthUnit::Wei,
            );
        }
        if let Some(profile) = &self.emulator_accounts {
            let merged = profile.merge(chain.emulator_account_parameters());
            chain.set_emulator_account_parameters(
                &merged.mnemonic,
                merged.balance,
                merged.count,
                EthUnit::Wei,
            );
        }
        for extra in &self.extra_accounts {
            chain.add_local_account(extra.address, u128::from(extra.amount), extra.unit);
        }
        for set in &self.mnemonic_accounts {
            let amount = u128::from(set.amount);
            chain.add_local_accounts_from_mnemonic(&set.mnemonic, set.count, amount, set.unit)?;
        }
        Ok(())
    }
}

/// Top-level emulation file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmulationConfig {
    #[serde(default)]
    pub save_state: SaveState,
    #[serde(default)]
    pub chains: Vec<ChainConfig>,
    /// Directory relative paths are resolved against
    #[serde(skip)]
    base_dir: PathBuf,
}

impl EmulationConfig {
    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&content)?;
        config.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        debug!("loaded {} chain(s) from {}", config.chains.len(), path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Create the chains and nodes. Nothing is collected yet.
    pub fn build(&self) -> Result<(ChainRegistry, StaticAddressBook), ConfigError> {
        let mut registry = ChainRegistry::with_save_state(self.save_state.clone());
        let mut book = StaticAddressBook::new();
        let mut names = HashSet::new();

        for chain_config in &self.chains {
            if !names.insert(chain_config.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "chain {} is defined twice",
                    chain_config.name
                )));
            }

            let chain = registry.create_chain(
                &chain_config.name,
                chain_config.consensus,
                chain_config.chain_id,
            );
            chain_config.apply(chain, &self.base_dir)?;

            for node in &chain_config.nodes {
                registry.create_node_with_roles(&chain_config.name, &node.id, node.roles)?;
                book.insert(node.id.clone(), node.addresses.clone());
            }
        }

        Ok((registry, book))
    }
}
