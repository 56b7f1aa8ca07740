//! Consensus kinds
//!
//! The consensus kind of a chain decides which node roles count, which
//! aggregation steps run at finalize, and which genesis layout is written.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Consensus mechanism of a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConsensusKind {
    /// Ethash mining
    #[serde(rename = "pow", alias = "POW", alias = "ProofOfWork")]
    ProofOfWork,
    /// Clique signers
    #[serde(rename = "poa", alias = "POA", alias = "ProofOfAuthority")]
    ProofOfAuthority,
    /// Clique until the merge, beacon validators after
    #[serde(rename = "pos", alias = "POS", alias = "ProofOfStake")]
    ProofOfStake,
}

impl ConsensusKind {
    /// Short lowercase tag
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsensusKind::ProofOfWork => "pow",
            ConsensusKind::ProofOfAuthority => "poa",
            ConsensusKind::ProofOfStake => "pos",
        }
    }

    /// Whether miner/signer nodes contribute to the genesis signer list
    pub fn requires_signers(&self) -> bool {
        matches!(
            self,
            ConsensusKind::ProofOfAuthority | ConsensusKind::ProofOfStake
        )
    }

    /// Whether validator ids and the beacon setup node are tracked
    pub fn tracks_validators(&self) -> bool {
        matches!(self, ConsensusKind::ProofOfStake)
    }

    /// Whether joined node accounts are funded in genesis
    pub fn funds_joined_accounts(&self) -> bool {
        self.requires_signers()
    }

    /// Genesis layout used by this kind. PoS starts out on clique.
    pub fn genesis_layout(&self) -> ConsensusKind {
        match self {
            ConsensusKind::ProofOfStake => ConsensusKind::ProofOfAuthority,
            other => *other,
        }
    }
}

impl fmt::Display for ConsensusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConsensusKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pow" | "proofofwork" => Ok(ConsensusKind::ProofOfWork),
            "poa" | "proofofauthority" => Ok(ConsensusKind::ProofOfAuthority),
            "pos" | "proofofstake" => Ok(ConsensusKind::ProofOfStake),
            other => Err(format!("Unknown consensus kind: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signer_rules() {
        assert!(!ConsensusKind::ProofOfWork.requires_signers());
        assert!(ConsensusKind::ProofOfAuthority.requires_signers());
        assert!(ConsensusKind::ProofOfStake.requires_signers());
    }

    #[test]
    fn test_only_pos_tracks_validators() {
        assert!(ConsensusKind::ProofOfStake.tracks_validators());
        assert!(!ConsensusKind::ProofOfAuthority.tracks_validators());
        assert!(!ConsensusKind::ProofOfWork.tracks_validators());
    }

    #[test]
    fn test_pos_uses_clique_layout() {
        assert_eq!(
            ConsensusKind::ProofOfStake.genesis_layout(),
            ConsensusKind::ProofOfAuthority
        );
        assert_eq!(
            ConsensusKind::ProofOfWork.genesis_layout(),
            ConsensusKind::ProofOfWork
        );
    }

    #[test]
    fn test_parse_and_display() {
        for kind in [
            ConsensusKind::ProofOfWork,
            ConsensusKind::ProofOfAuthority,
            ConsensusKind::ProofOfStake,
        ] {
            assert_eq!(kind.to_string().parse::<ConsensusKind>(), Ok(kind));
        }
        assert_eq!("PoA".parse::<ConsensusKind>(), Ok(ConsensusKind::ProofOfAuthority));
        assert!("raft".parse::<ConsensusKind>().is_err());
    }

    #[test]
    fn test_serde_tags() {
        let kind: ConsensusKind = serde_json::from_str("\"pos\"").unwrap();
        assert_eq!(kind, ConsensusKind::ProofOfStake);
        assert_eq!(serde_json::to_string(&ConsensusKind::ProofOfWork).unwrap(), "\"pow\"");
    }
}
