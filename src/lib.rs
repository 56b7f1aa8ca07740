//! Chainseed Core Library
//!
//! Coordinates the bootstrap of emulated private Ethereum networks: nodes are
//! provisioned one by one, their facts are collected per chain, and each chain
//! is finalized into a single genesis document plus discovery addresses.

pub mod accounts;
pub mod agent;
pub mod chain;
pub mod config;
pub mod consensus;
pub mod crypto;
pub mod genesis;
pub mod registry;
pub mod storage;

/// Protocol constants and defaults
pub mod constants {
    /// Wei per ether
    pub const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

    /// Wei per gwei
    pub const WEI_PER_GWEI: u128 = 1_000_000_000;

    /// Stake required per validator (32 ETH)
    pub const VALIDATOR_STAKE: u128 = 32 * WEI_PER_ETHER;

    /// First chain id handed out when a chain is created without one
    pub const BASE_CHAIN_ID: u64 = 1337;

    /// Seed phrase for per-node funded accounts
    pub const DEFAULT_EMULATOR_MNEMONIC: &str =
        "great awesome fun seed security lab protect system network prevent attack future";

    /// Balance of each per-node account
    pub const DEFAULT_EMULATOR_BALANCE: u128 = 32 * WEI_PER_ETHER;

    /// Accounts derived for every node
    pub const DEFAULT_ACCOUNTS_PER_NODE: u32 = 1;

    /// Seed phrase for externally reachable test accounts
    pub const DEFAULT_LOCAL_MNEMONIC: &str =
        "great amazing fun seed lab protect network system security prevent attack future";

    /// Balance of each local account
    pub const DEFAULT_LOCAL_BALANCE: u128 = 10 * WEI_PER_ETHER;

    /// Number of local accounts per chain
    pub const DEFAULT_LOCAL_ACCOUNTS: u32 = 5;

    /// Port of the boot node's enode http server
    pub const BOOT_NODE_HTTP_PORT: u16 = 8088;

    /// Port of the beacon setup node's http server
    pub const BEACON_SETUP_HTTP_PORT: u16 = 8090;

    /// Terminal total difficulty for the merge on PoS chains
    pub const DEFAULT_TERMINAL_TOTAL_DIFFICULTY: u64 = 20;

    /// Gas limit per block written into genesis
    pub const DEFAULT_GAS_LIMIT: u64 = 0x47b760;

    /// Clique block period in seconds
    pub const CLIQUE_PERIOD: u64 = 15;

    /// Clique epoch length in blocks
    pub const CLIQUE_EPOCH: u64 = 30_000;

    /// Where node datadirs are kept on the host when state saving is on
    pub const DEFAULT_SAVE_PATH: &str = "./eth-states";

    /// Geth datadir inside the node
    pub const GETH_DATADIR: &str = "/root/.ethereum";

    /// Ethash DAG directory inside the node
    pub const ETHASH_DIR: &str = "/root/.ethash";

    /// devp2p listening port
    pub const P2P_PORT: u16 = 30303;

    /// JSON-RPC http port
    pub const HTTP_PORT: u16 = 8545;

    /// JSON-RPC websocket port
    pub const WS_PORT: u16 = 8546;
}
