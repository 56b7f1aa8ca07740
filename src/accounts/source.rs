//! Account source
//!
//! Derives funded accounts from a profile's seed phrase over an index range.
//! The same phrase, balance, count, and start index always yield the same list.

use super::{Account, EthUnit};
use crate::constants::{
    DEFAULT_ACCOUNTS_PER_NODE, DEFAULT_EMULATOR_BALANCE, DEFAULT_EMULATOR_MNEMONIC,
    DEFAULT_LOCAL_ACCOUNTS, DEFAULT_LOCAL_BALANCE, DEFAULT_LOCAL_MNEMONIC,
};
use crate::crypto::{KeyError, SeedPhrase};
use serde::{Deserialize, Serialize};

/// Parameters of one account-generation profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountProfile {
    /// Seed phrase accounts are derived from
    pub mnemonic: String,
    /// Balance of every derived account, in wei
    #[serde(with = "super::wei_string")]
    pub balance: u128,
    /// Number of accounts (total for local, per node for emulator)
    pub count: u32,
}

impl AccountProfile {
    /// Create a profile with the balance given in `unit`
    pub fn new(mnemonic: impl Into<String>, amount: u128, unit: EthUnit, count: u32) -> Self {
        Self {
            mnemonic: mnemonic.into(),
            balance: unit.to_wei(amount),
            count,
        }
    }

    /// Externally reachable test accounts written into every genesis
    pub fn local_default() -> Self {
        Self {
            mnemonic: DEFAULT_LOCAL_MNEMONIC.to_string(),
            balance: DEFAULT_LOCAL_BALANCE,
            count: DEFAULT_LOCAL_ACCOUNTS,
        }
    }

    /// Per-node funded accounts
    pub fn emulator_default() -> Self {
        Self {
            mnemonic: DEFAULT_EMULATOR_MNEMONIC.to_string(),
            balance: DEFAULT_EMULATOR_BALANCE,
            count: DEFAULT_ACCOUNTS_PER_NODE,
        }
    }
}

/// Deterministic account derivation for one profile
#[derive(Debug, Clone)]
pub struct AccountSource {
    profile: AccountProfile,
    seed: SeedPhrase,
}

impl AccountSource {
    /// Parse the profile's seed phrase
    pub fn from_profile(profile: &AccountProfile) -> Result<Self, KeyError> {
        Ok(Self {
            seed: SeedPhrase::parse(&profile.mnemonic)?,
            profile: profile.clone(),
        })
    }

    pub fn profile(&self) -> &AccountProfile {
        &self.profile
    }

    /// Derive `count` accounts starting at `start_index`, funded with the profile balance
    pub fn derive(&self, start_index: u32, count: u32) -> Result<Vec<Account>, KeyError> {
        (0..count)
            .map(|offset| {
                let key = self.seed.account(start_index.saturating_add(offset))?;
                Ok(Account::new(key.address(), self.profile.balance))
            })
            .collect()
    }

    /// Accounts `0 .. count` of a local profile
    pub fn local_accounts(&self) -> Result<Vec<Account>, KeyError> {
        self.derive(0, self.profile.count)
    }

    /// Derive the accounts of the node with the given serial.
    ///
    /// Each node owns the index window `serial * count .. serial * count + count`
    /// so nodes sharing a profile never collide.
    pub fn node_accounts(&self, serial: u32) -> Result<Vec<Account>, KeyError> {
        let start = serial.saturating_mul(self.profile.count);
        self.derive(start, self.profile.count)
    }
}
