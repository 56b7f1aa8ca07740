//! Property-based and adversarial tests for chain configuration
//!
//! These tests verify invariants hold for arbitrary node layouts and
//! registration orders.

use proptest::prelude::*;
use chainseed_core::agent::NodeRoles;
use chainseed_core::chain::ChainError;
use chainseed_core::constants::{BASE_CHAIN_ID, DEFAULT_LOCAL_ACCOUNTS};
use chainseed_core::consensus::ConsensusKind;
use chainseed_core::genesis::{CLIQUE_SEAL_BYTES, CLIQUE_VANITY_BYTES};
use chainseed_core::registry::{ChainRegistry, RegistryError, StaticAddressBook};
use std::net::{IpAddr, Ipv4Addr};

fn consensus_strategy() -> impl Strategy<Value = ConsensusKind> {
    prop_oneof![
        Just(ConsensusKind::ProofOfWork),
        Just(ConsensusKind::ProofOfAuthority),
        Just(ConsensusKind::ProofOfStake),
    ]
}

fn ip(i: usize) -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(10, 150, 0, 10 + i as u8))
}

/// One chain named `c` with a node per entry of `miners`
fn single_chain(consensus: ConsensusKind, miners: &[bool]) -> (ChainRegistry, StaticAddressBook) {
    let mut registry = ChainRegistry::new();
    registry.create_chain("c", consensus, None);
    let mut book = StaticAddressBook::new();
    for (i, miner) in miners.iter().enumerate() {
        let node = format!("host_{}", i);
        let mut roles = NodeRoles::default();
        roles.start_miner = *miner;
        roles.boot_node = i == 0;
        registry.create_node_with_roles("c", &node, roles).unwrap();
        book.insert(node, vec![ip(i)]);
    }
    (registry, book)
}

// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Auto ids are handed out in creation order regardless of consensus
    #[test]
    fn prop_auto_chain_ids_increase(kinds in prop::collection::vec(consensus_strategy(), 1..8)) {
        let mut registry = ChainRegistry::new();
        for (i, kind) in kinds.iter().enumerate() {
            let id = registry.create_chain(&format!("chain_{}", i), *kind, None).chain_id();
            prop_assert_eq!(id, BASE_CHAIN_ID + i as u64);
        }
    }

    /// Explicit ids never consume an auto id
    #[test]
    fn prop_explicit_ids_skip_counter(explicit in prop::collection::vec(any::<bool>(), 1..8)) {
        let mut registry = ChainRegistry::new();
        let mut expected = BASE_CHAIN_ID;
        for (i, is_explicit) in explicit.iter().enumerate() {
            let name = format!("chain_{}", i);
            if *is_explicit {
                let id = registry.create_chain(&name, ConsensusKind::ProofOfWork, Some(9));
                prop_assert_eq!(id.chain_id(), 9);
            } else {
                let id = registry.create_chain(&name, ConsensusKind::ProofOfWork, None).chain_id();
                prop_assert_eq!(id, expected);
                expected += 1;
            }
        }
    }

    /// Clique chains seal with exactly the miner nodes, in collect order
    #[test]
    fn prop_signers_match_miner_nodes(
        consensus in prop_oneof![
            Just(ConsensusKind::ProofOfAuthority),
            Just(ConsensusKind::ProofOfStake),
        ],
        miners in prop::collection::vec(any::<bool>(), 1..6),
    ) {
        let (mut registry, book) = single_chain(consensus, &miners);
        registry.run_configuration(&book).unwrap();

        let chain = registry.chain("c").unwrap();
        let expected: Vec<_> = miners
            .iter()
            .enumerate()
            .filter(|(_, m)| **m)
            .map(|(i, _)| registry.agent_for(&format!("host_{}", i)).unwrap().accounts()[0].address)
            .collect();
        let signers: Vec<_> = chain.all_signer_accounts().iter().map(|a| a.address).collect();
        prop_assert_eq!(&signers, &expected);

        let extra = &chain.genesis().unwrap().document().extra_data;
        let expected_len = 2 + 2 * (CLIQUE_VANITY_BYTES + 20 * expected.len() + CLIQUE_SEAL_BYTES);
        prop_assert_eq!(extra.len(), expected_len);
        for signer in &expected {
            prop_assert!(extra.contains(&signer.to_plain_hex()));
        }
    }

    /// PoW genesis funds only the local accounts, no matter how many nodes join
    #[test]
    fn prop_pow_genesis_only_local_accounts(miners in prop::collection::vec(any::<bool>(), 0..6)) {
        let (mut registry, book) = single_chain(ConsensusKind::ProofOfWork, &miners);
        registry.run_configuration(&book).unwrap();

        let chain = registry.chain("c").unwrap();
        let genesis = chain.genesis().unwrap();
        prop_assert_eq!(genesis.allocation_count(), DEFAULT_LOCAL_ACCOUNTS as usize);
        prop_assert!(chain.all_signer_accounts().is_empty());
        for account in chain.all_accounts() {
            prop_assert_eq!(genesis.balance_of(&account.address), None);
        }
    }

    /// Two registries built the same way produce byte-identical genesis files
    #[test]
    fn prop_genesis_is_deterministic(
        consensus in consensus_strategy(),
        miners in prop::collection::vec(any::<bool>(), 1..5),
    ) {
        let (mut a, book_a) = single_chain(consensus, &miners);
        let (mut b, book_b) = single_chain(consensus, &miners);
        a.run_configuration(&book_a).unwrap();
        b.run_configuration(&book_b).unwrap();

        let left = a.chain("c").unwrap().genesis().unwrap().serialize().unwrap();
        let right = b.chain("c").unwrap().genesis().unwrap().serialize().unwrap();
        prop_assert_eq!(left, right);
    }

    /// Every agent gets a distinct serial and therefore distinct accounts
    #[test]
    fn prop_agent_accounts_are_disjoint(count in 1usize..6) {
        let miners = vec![false; count];
        let (mut registry, book) = single_chain(ConsensusKind::ProofOfAuthority, &miners);
        registry.run_configuration(&book).unwrap();

        let mut seen = std::collections::HashSet::new();
        for agent in registry.agents().iter() {
            for account in agent.accounts() {
                prop_assert!(seen.insert(account.address));
            }
        }
        prop_assert_eq!(seen.len(), count);
    }
}

// ============================================================================
// ADVERSARIAL TESTS
// ============================================================================

#[test]
fn test_node_without_interfaces_aborts_run() {
    let mut registry = ChainRegistry::new();
    registry.create_chain("c", ConsensusKind::ProofOfAuthority, None);
    registry.create_node("c", "ghost").unwrap();

    let result = registry.run_configuration(&StaticAddressBook::new());
    assert!(matches!(
        result,
        Err(RegistryError::Chain(ChainError::NoNetworkInterfaces { .. }))
    ));
    assert!(!registry.chain("c").unwrap().is_finalized());
}

#[test]
fn test_one_bad_chain_blocks_every_finalize() {
    let mut registry = ChainRegistry::new();
    registry.create_chain("good", ConsensusKind::ProofOfWork, None);
    registry.create_chain("bad", ConsensusKind::ProofOfWork, None);
    registry.create_node("good", "a").unwrap();
    registry.create_node("bad", "b").unwrap();
    let book = StaticAddressBook::new().with("a", vec![ip(0)]);

    assert!(registry.run_configuration(&book).is_err());
    assert!(registry.chains().all(|c| !c.is_finalized()));
}

#[test]
fn test_exclusive_beacon_setup_rejects_second_claim() {
    let mut registry = ChainRegistry::new();
    registry
        .create_chain("pos", ConsensusKind::ProofOfStake, None)
        .set_exclusive_beacon_setup(true);
    registry
        .create_node_with_roles("pos", "a", NodeRoles::default().beacon_setup())
        .unwrap();
    registry
        .create_node_with_roles("pos", "b", NodeRoles::default().beacon_setup())
        .unwrap();
    let book = StaticAddressBook::new()
        .with("a", vec![ip(0)])
        .with("b", vec![ip(1)]);

    assert!(matches!(
        registry.run_configuration(&book),
        Err(RegistryError::Chain(ChainError::BeaconSetupConflict { .. }))
    ));
}

#[test]
fn test_beacon_setup_last_writer_wins_by_default() {
    let mut registry = ChainRegistry::new();
    registry.create_chain("pos", ConsensusKind::ProofOfStake, None);
    registry
        .create_node_with_roles("pos", "a", NodeRoles::default().beacon_setup())
        .unwrap();
    registry
        .create_node_with_roles("pos", "b", NodeRoles::default().beacon_setup())
        .unwrap();
    let book = StaticAddressBook::new()
        .with("a", vec![ip(0)])
        .with("b", vec![ip(1)]);

    registry.run_configuration(&book).unwrap();
    assert_eq!(
        registry.chain("pos").unwrap().beacon_setup_node(),
        Some("10.150.0.11:8090")
    );
}
