//! Genesis document
//!
//! Geth-style genesis file. Allocations are kept in a sorted map so the
//! same inputs always serialize to the same bytes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::accounts::wei_string;
use crate::constants::{CLIQUE_EPOCH, CLIQUE_PERIOD, DEFAULT_GAS_LIMIT};
use crate::consensus::ConsensusKind;

/// Bytes of vanity prefix in clique extra data
pub const CLIQUE_VANITY_BYTES: usize = 32;

/// Bytes of seal suffix in clique extra data
pub const CLIQUE_SEAL_BYTES: usize = 65;

/// Clique engine parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliqueConfig {
    /// Seconds between blocks
    pub period: u64,
    /// Blocks after which votes reset
    pub epoch: u64,
}

/// The `config` section of a genesis file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainParams {
    pub chain_id: u64,
    pub homestead_block: u64,
    pub eip150_block: u64,
    pub eip155_block: u64,
    pub eip158_block: u64,
    pub byzantium_block: u64,
    pub constantinople_block: u64,
    pub petersburg_block: u64,
    pub istanbul_block: u64,
    pub berlin_block: u64,
    pub london_block: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ethash: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clique: Option<CliqueConfig>,
    /// Fields of a custom genesis this crate does not model
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// One `alloc` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocEntry {
    #[serde(with = "wei_string")]
    pub balance: u128,
}

/// Full genesis file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenesisDocument {
    pub config: ChainParams,
    pub nonce: String,
    pub timestamp: String,
    pub extra_data: String,
    pub gas_limit: String,
    pub difficulty: String,
    pub mix_hash: String,
    pub coinbase: String,
    /// Address (lowercase hex, no prefix) to allocation
    pub alloc: BTreeMap<String, AllocEntry>,
    pub number: String,
    pub gas_used: String,
    pub parent_hash: String,
    /// Fields of a custom genesis this crate does not model
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

fn zero_hex(bytes: usize) -> String {
    format!("0x{}", "00".repeat(bytes))
}

impl GenesisDocument {
    /// Template for the given genesis layout
    pub fn template(layout: ConsensusKind) -> Self {
        let (ethash, clique, difficulty, extra_data) = match layout {
            ConsensusKind::ProofOfWork => (
                Some(BTreeMap::new()),
                None,
                "0x400".to_string(),
                "0x".to_string(),
            ),
            ConsensusKind::ProofOfAuthority | ConsensusKind::ProofOfStake => (
                None,
                Some(CliqueConfig {
                    period: CLIQUE_PERIOD,
                    epoch: CLIQUE_EPOCH,
                }),
                "0x1".to_string(),
                clique_extra_data(std::iter::empty::<&[u8; 20]>()),
            ),
        };

        Self {
            config: ChainParams {
                chain_id: 0,
                homestead_block: 0,
                eip150_block: 0,
                eip155_block: 0,
                eip158_block: 0,
                byzantium_block: 0,
                constantinople_block: 0,
                petersburg_block: 0,
                istanbul_block: 0,
                berlin_block: 0,
                london_block: 0,
                ethash,
                clique,
                extra: BTreeMap::new(),
            },
            nonce: "0x0".to_string(),
            timestamp: "0x0".to_string(),
            extra_data,
            gas_limit: format!("{:#x}", DEFAULT_GAS_LIMIT),
            difficulty,
            mix_hash: zero_hex(32),
            coinbase: zero_hex(20),
            alloc: BTreeMap::new(),
            number: "0x0".to_string(),
            gas_used: "0x0".to_string(),
            parent_hash: zero_hex(32),
            extra: BTreeMap::new(),
        }
    }
}

/// Clique extra data: vanity, concatenated signer addresses, empty seal
pub fn clique_extra_data<'a, I>(signers: I) -> String
where
    I: IntoIterator<Item = &'a [u8; 20]>,
{
    let mut out = String::from("0x");
    out.push_str(&"00".repeat(CLIQUE_VANITY_BYTES));
    for signer in signers {
        out.push_str(&hex::encode(signer));
    }
    out.push_str(&"00".repeat(CLIQUE_SEAL_BYTES));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pow_template_uses_ethash() {
        let doc = GenesisDocument::template(ConsensusKind::ProofOfWork);
        assert!(doc.config.ethash.is_some());
        assert!(doc.config.clique.is_none());
        assert_eq!(doc.extra_data, "0x");
    }

    #[test]
    fn test_clique_template() {
        let doc = GenesisDocument::template(ConsensusKind::ProofOfAuthority);
        let clique = doc.config.clique.clone().unwrap();
        assert_eq!(clique.period, CLIQUE_PERIOD);
        assert_eq!(doc.extra_data.len(), 2 + 2 * (CLIQUE_VANITY_BYTES + CLIQUE_SEAL_BYTES));
    }

    #[test]
    fn test_clique_extra_data_embeds_signers() {
        let a = [0xaa; 20];
        let b = [0xbb; 20];
        let extra = clique_extra_data([&a, &b]);
        let body = &extra[2 + 2 * CLIQUE_VANITY_BYTES..extra.len() - 2 * CLIQUE_SEAL_BYTES];
        assert_eq!(body, format!("{}{}", "aa".repeat(20), "bb".repeat(20)));
    }

    #[test]
    fn test_field_names_follow_geth() {
        let doc = GenesisDocument::template(ConsensusKind::ProofOfAuthority);
        let json = serde_json::to_value(&doc).unwrap();
        assert!(json.get("extraData").is_some());
        assert!(json.get("gasLimit").is_some());
        assert!(json["config"].get("chainId").is_some());
        assert!(json["config"].get("eip150Block").is_some());
        assert!(json["config"].get("ethash").is_none());
    }
}
