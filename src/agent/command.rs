//! Startup command rendering
//!
//! Produces the shell script a node runs at boot. The script fetches enode
//! urls from the boot nodes known when it was rendered, initializes the
//! datadir from the chain genesis, and launches geth with flags that depend
//! on the agent variant and roles.

use std::fmt;

use super::{AgentKind, NodeAgent};
use crate::chain::endpoint_ip;
use crate::constants::{GETH_DATADIR, HTTP_PORT, P2P_PORT, WS_PORT};
use crate::consensus::ConsensusKind;

/// Where the node expects the genesis file
pub const GENESIS_PATH: &str = "/tmp/eth-genesis.json";

/// Collected enode urls, one per line
pub const NODE_URLS_PATH: &str = "/tmp/eth-node-urls";

/// Password file for unlocking signer accounts
pub const PASSWORD_PATH: &str = "/tmp/eth-password";

const HTTP_APIS: &str = "web3,eth,debug,personal,net,clique,engine,admin,txpool";

/// Chain facts visible to a node while its command is rendered
#[derive(Debug, Clone, Copy)]
pub struct StartupContext<'a> {
    pub chain_id: u64,
    pub consensus: ConsensusKind,
    /// Boot nodes collected so far; may be partial during collection
    pub boot_nodes: &'a [String],
    pub beacon_setup_node: Option<&'a str>,
    pub terminal_total_difficulty: u64,
}

/// Rendered startup script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupScript {
    lines: Vec<String>,
    peers: Vec<String>,
}

impl StartupScript {
    /// Render the script for `agent`
    pub fn render(agent: &NodeAgent, ctx: &StartupContext<'_>) -> Self {
        let own_ip = agent.first_address();
        let peers: Vec<String> = ctx
            .boot_nodes
            .iter()
            .filter(|addr| own_ip.is_none() || endpoint_ip(addr) != own_ip)
            .cloned()
            .collect();

        let mut lines = vec!["#!/bin/bash".to_string()];

        for peer in &peers {
            lines.push(format!(
                "curl -s --retry 10 --retry-connrefused http://{}/eth-enode-url >> {}",
                peer, NODE_URLS_PATH
            ));
        }

        lines.push(format!("geth --datadir {} init {}", GETH_DATADIR, GENESIS_PATH));

        if agent.kind() == AgentKind::PoS {
            if let Some(beacon) = ctx.beacon_setup_node {
                lines.push(format!("export BEACON_SETUP_NODE={}", beacon));
            }
        }

        lines.push(Self::geth_command(agent, ctx, !peers.is_empty()));

        Self { lines, peers }
    }

    fn geth_command(agent: &NodeAgent, ctx: &StartupContext<'_>, has_peers: bool) -> String {
        let mut args = vec![
            "geth".to_string(),
            format!("--datadir {}", GETH_DATADIR),
            format!("--identity=\"NODE_{}\"", agent.serial()),
            format!("--networkid={}", ctx.chain_id),
            "--syncmode full".to_string(),
            "--snapshot=false".to_string(),
            "--verbosity=2".to_string(),
            "--allow-insecure-unlock".to_string(),
            format!("--port {}", P2P_PORT),
            "--http --http.addr 0.0.0.0".to_string(),
            format!("--http.port {}", HTTP_PORT),
            "--http.corsdomain \"*\"".to_string(),
            format!("--http.api {}", HTTP_APIS),
            "--ws --ws.addr 0.0.0.0".to_string(),
            format!("--ws.port {}", WS_PORT),
            "--ws.origins \"*\"".to_string(),
            format!("--ws.api {}", HTTP_APIS),
        ];

        if has_peers {
            args.push(format!("--bootnodes \"$(paste -sd, {})\"", NODE_URLS_PATH));
        } else {
            args.push("--nodiscover".to_string());
        }

        if agent.kind() == AgentKind::PoS {
            args.push(format!(
                "--override.terminaltotaldifficulty {}",
                ctx.terminal_total_difficulty
            ));
        }

        if agent.is_start_miner() {
            if let Some(account) = agent.accounts().first() {
                if agent.kind() != AgentKind::PoW {
                    args.push(format!(
                        "--unlock \"{}\" --password {}",
                        account.address, PASSWORD_PATH
                    ));
                }
                args.push(format!("--mine --miner.etherbase {}", account.address));
                if agent.kind() == AgentKind::PoW {
                    args.push("--miner.threads=1".to_string());
                }
            }
        }

        args.join(" ")
    }

    /// Script lines in execution order
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Boot node endpoints this script contacts
    pub fn peers(&self) -> &[String] {
        &self.peers
    }
}

impl fmt::Display for StartupScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
