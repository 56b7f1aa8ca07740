//! Accounts module - funded accounts, denominations, and deterministic derivation

mod source;

pub use source::*;

use crate::constants::{WEI_PER_ETHER, WEI_PER_GWEI};
use crate::crypto::EthAddress;
use serde::{Deserialize, Serialize};

/// A funded account as it appears in genesis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account address
    pub address: EthAddress,
    /// Balance in wei
    #[serde(with = "wei_string")]
    pub balance: u128,
}

impl Account {
    /// Create a new account entry
    pub fn new(address: EthAddress, balance: u128) -> Self {
        Self { address, balance }
    }
}

/// Ether denominations accepted wherever a balance is configured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EthUnit {
    Wei,
    Gwei,
    #[default]
    Ether,
}

impl EthUnit {
    /// Number of wei in one unit
    pub fn wei(self) -> u128 {
        match self {
            EthUnit::Wei => 1,
            EthUnit::Gwei => WEI_PER_GWEI,
            EthUnit::Ether => WEI_PER_ETHER,
        }
    }

    /// Convert an amount in this unit to wei, saturating on overflow
    pub fn to_wei(self, amount: u128) -> u128 {
        amount.saturating_mul(self.wei())
    }
}

/// Balances are kept as decimal strings on the wire so they survive JSON
/// consumers limited to 53-bit integers.
pub(crate) mod wei_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &u128, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u128, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.strip_prefix("0x") {
            Some(digits) => u128::from_str_radix(digits, 16),
            None => s.parse(),
        }
        .map_err(serde::de::Error::custom)
    }
}
