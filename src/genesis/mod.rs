//! Genesis builder
//!
//! Accumulates accounts and chain parameters for one chain and serializes
//! the result. Every operation is idempotent with respect to the document:
//! adding an account twice leaves one allocation, setting signers replaces
//! the previous list.

mod document;

pub use document::*;

use crate::accounts::Account;
use crate::consensus::ConsensusKind;
use crate::crypto::{hash_bytes, EthAddress, Hash};
use thiserror::Error;
use tracing::debug;

/// Genesis errors
#[derive(Debug, Error)]
pub enum GenesisError {
    #[error("Invalid custom genesis: {0}")]
    InvalidCustomGenesis(#[source] serde_json::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),
}

/// Genesis document under construction
#[derive(Debug, Clone, PartialEq)]
pub struct Genesis {
    layout: ConsensusKind,
    document: GenesisDocument,
}

impl Genesis {
    /// Create an empty genesis for a chain of the given consensus kind
    pub fn new(consensus: ConsensusKind) -> Self {
        let layout = consensus.genesis_layout();
        Self {
            layout,
            document: GenesisDocument::template(layout),
        }
    }

    /// Replace the document with a user-supplied genesis file.
    ///
    /// Later builder calls keep applying on top of it.
    pub fn set_custom(&mut self, json: &str) -> Result<(), GenesisError> {
        self.document = serde_json::from_str(json).map_err(GenesisError::InvalidCustomGenesis)?;
        Ok(())
    }

    /// Fund every account in the list
    pub fn add_accounts(&mut self, accounts: &[Account]) {
        for account in accounts {
            self.add_local_account(account.address, account.balance);
        }
    }

    /// Fund a single address
    pub fn add_local_account(&mut self, address: EthAddress, balance: u128) {
        self.document
            .alloc
            .insert(address.to_plain_hex(), AllocEntry { balance });
    }

    /// Set the chain id
    pub fn set_chain_id(&mut self, chain_id: u64) {
        self.document.config.chain_id = chain_id;
    }

    /// Set the clique signer list. Ignored for ethash layouts.
    pub fn set_signers(&mut self, signers: &[Account]) {
        if self.document.config.clique.is_none() {
            debug!("ignoring {} signers for a non-clique genesis", signers.len());
            return;
        }
        self.document.extra_data = clique_extra_data(signers.iter().map(|s| s.address.as_bytes()));
    }

    /// Set the gas limit per block
    pub fn set_gas_limit(&mut self, gas_limit: u64) {
        self.document.gas_limit = format!("{:#x}", gas_limit);
    }

    /// Genesis layout (PoS chains use the PoA layout)
    pub fn layout(&self) -> ConsensusKind {
        self.layout
    }

    /// Read-only view of the document
    pub fn document(&self) -> &GenesisDocument {
        &self.document
    }

    /// Chain id currently written in the document
    pub fn chain_id(&self) -> u64 {
        self.document.config.chain_id
    }

    /// Allocated balance of an address, if funded
    pub fn balance_of(&self, address: &EthAddress) -> Option<u128> {
        self.document
            .alloc
            .get(&address.to_plain_hex())
            .map(|entry| entry.balance)
    }

    /// Number of funded addresses
    pub fn allocation_count(&self) -> usize {
        self.document.alloc.len()
    }

    /// Serialize to pretty-printed JSON
    pub fn serialize(&self) -> Result<String, GenesisError> {
        serde_json::to_string_pretty(&self.document).map_err(GenesisError::Serialization)
    }

    /// BLAKE3 digest of the serialized document
    pub fn fingerprint(&self) -> Result<Hash, GenesisError> {
        Ok(hash_bytes(self.serialize()?.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accounts(balance: u128, count: u8) -> Vec<Account> {
        (1..=count).map(|i| Account::new(EthAddress([i; 20]), balance)).collect()
    }

    #[test]
    fn test_add_accounts_is_idempotent() {
        let mut genesis = Genesis::new(ConsensusKind::ProofOfAuthority);
        let accounts = accounts(5, 3);
        genesis.add_accounts(&accounts);
        genesis.add_accounts(&accounts);
        assert_eq!(genesis.allocation_count(), 3);
    }

    #[test]
    fn test_later_balance_wins() {
        let mut genesis = Genesis::new(ConsensusKind::ProofOfWork);
        let address = EthAddress([1; 20]);
        genesis.add_local_account(address, 1);
        genesis.add_local_account(address, 2);
        assert_eq!(genesis.balance_of(&address), Some(2));
    }

    #[test]
    fn test_set_signers_on_clique() {
        let mut genesis = Genesis::new(ConsensusKind::ProofOfStake);
        assert_eq!(genesis.layout(), ConsensusKind::ProofOfAuthority);

        let signers = accounts(1, 2);
        genesis.set_signers(&signers);
        let extra = &genesis.document().extra_data;
        assert!(extra.contains(&signers[0].address.to_plain_hex()));
        assert!(extra.contains(&signers[1].address.to_plain_hex()));
    }

    #[test]
    fn test_set_signers_ignored_on_ethash() {
        let mut genesis = Genesis::new(ConsensusKind::ProofOfWork);
        genesis.set_signers(&accounts(1, 1));
        assert_eq!(genesis.document().extra_data, "0x");
    }

    #[test]
    fn test_gas_limit_and_chain_id() {
        let mut genesis = Genesis::new(ConsensusKind::ProofOfAuthority);
        genesis.set_gas_limit(30_000_000);
        genesis.set_chain_id(1338);
        assert_eq!(genesis.document().gas_limit, "0x1c9c380");
        assert_eq!(genesis.chain_id(), 1338);
    }

    #[test]
    fn test_serialize_is_stable() {
        let mut genesis = Genesis::new(ConsensusKind::ProofOfAuthority);
        genesis.add_accounts(&accounts(7, 4));
        assert_eq!(genesis.serialize().unwrap(), genesis.serialize().unwrap());
        assert_eq!(genesis.fingerprint().unwrap(), genesis.fingerprint().unwrap());
    }

    #[test]
    fn test_custom_genesis_keeps_unknown_fields() {
        let mut genesis = Genesis::new(ConsensusKind::ProofOfAuthority);
        let mut doc = serde_json::to_value(genesis.document()).unwrap();
        doc["baseFeePerGas"] = serde_json::json!("0x3b9aca00");
        doc["config"]["shanghaiTime"] = serde_json::json!(0);

        genesis.set_custom(&doc.to_string()).unwrap();
        genesis.set_chain_id(4242);

        let out: serde_json::Value = serde_json::from_str(&genesis.serialize().unwrap()).unwrap();
        assert_eq!(out["baseFeePerGas"], "0x3b9aca00");
        assert_eq!(out["config"]["shanghaiTime"], 0);
        assert_eq!(out["config"]["chainId"], 4242);
    }

    #[test]
    fn test_custom_genesis_rejects_garbage() {
        let mut genesis = Genesis::new(ConsensusKind::ProofOfWork);
        assert!(matches!(
            genesis.set_custom("{not json"),
            Err(GenesisError::InvalidCustomGenesis(_))
        ));
    }
}
